//! Background candidate generator.
//!
//! While running, adds a randomly composed candidate to the directory on a
//! fixed interval. Toggled through the API and stopped at shutdown.

use std::sync::Arc;
use std::time::Duration;

use rand::seq::SliceRandom;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

use super::candidate::{CandidateInput, CandidateService, placeholder_image};

const FIRST_NAMES: &[&str] = &[
    "Alexandru", "Maria", "Ion", "Ana", "Mihai", "Elena", "Gheorghe", "Ioana", "Vasile",
    "Carmen", "Nicolae", "Cristina", "Stefan", "Andreea", "Florin", "Diana", "Marian", "Laura",
    "Adrian", "Monica", "Daniel", "Oana",
];

const LAST_NAMES: &[&str] = &[
    "Popescu", "Ionescu", "Georgescu", "Stoica", "Constantinescu", "Munteanu", "Stanciu",
    "Florea", "Dinu", "Nedelcu", "Petrescu", "Andrei", "Manole", "Bogdan", "Preda", "Moldovan",
    "Popa", "Radu", "Cojocaru", "Dumitrescu",
];

const DESCRIPTIONS: &[&str] = &[
    "A dedicated politician with years of experience in public service.",
    "Former business leader turned political activist.",
    "Long-time advocate for social justice and economic reform.",
    "Career diplomat with extensive international experience.",
    "Former mayor known for urban development initiatives.",
    "Academic turned politician with expertise in education policy.",
    "Military veteran with a strong focus on national security.",
    "Environmental activist committed to sustainable development.",
];

const FALLBACK_PARTY: &str = "Independent";

const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// Start/stop handle for the candidate generator.
#[derive(Clone)]
pub struct CandidateGenerator {
    candidates: CandidateService,
    interval: Duration,
    task: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl CandidateGenerator {
    /// Create a stopped generator. A zero interval is raised to 1ms.
    #[must_use]
    pub fn new(candidates: CandidateService, interval: Duration) -> Self {
        Self {
            candidates,
            interval: interval.max(MIN_INTERVAL),
            task: Arc::new(Mutex::new(None)),
        }
    }

    /// Start generating. Returns `false` if already running.
    pub async fn start(&self) -> bool {
        let mut task = self.task.lock().await;
        if task.as_ref().is_some_and(|t| !t.is_finished()) {
            return false;
        }

        let candidates = self.candidates.clone();
        let period = self.interval;
        *task = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately.
            ticker.tick().await;

            loop {
                ticker.tick().await;
                let parties = candidates.parties().await;
                if let Err(e) = candidates.create(random_candidate(&parties)).await {
                    warn!(error = %e, "Failed to add generated candidate");
                }
            }
        }));

        info!(interval_ms = period.as_millis() as u64, "Candidate generation started");
        true
    }

    /// Stop generating. Returns `false` if it was not running.
    pub async fn stop(&self) -> bool {
        let Some(handle) = self.task.lock().await.take() else {
            return false;
        };
        handle.abort();
        info!("Candidate generation stopped");
        true
    }

    /// Whether the generator task is alive.
    pub async fn is_running(&self) -> bool {
        self.task
            .lock()
            .await
            .as_ref()
            .is_some_and(|t| !t.is_finished())
    }
}

/// Compose a candidate from the fixed pools. `parties` are the parties
/// already present in the directory.
#[must_use]
pub fn random_candidate(parties: &[String]) -> CandidateInput {
    let mut rng = rand::thread_rng();

    let first = FIRST_NAMES.choose(&mut rng).copied().unwrap_or("Ion");
    let last = LAST_NAMES.choose(&mut rng).copied().unwrap_or("Popescu");
    let name = format!("{first} {last}");

    let party = parties
        .choose(&mut rng)
        .cloned()
        .unwrap_or_else(|| FALLBACK_PARTY.to_string());
    let description = DESCRIPTIONS.choose(&mut rng).copied().unwrap_or_default();

    CandidateInput {
        image: placeholder_image(&initials(&name)),
        name,
        party,
        description: description.to_string(),
    }
}

fn initials(name: &str) -> String {
    name.split_whitespace()
        .filter_map(|word| word.chars().next())
        .flat_map(char::to_uppercase)
        .collect()
}
