//! Candidate directory.
//!
//! An in-memory candidate list owned by the application state. Every
//! mutation pushes the full snapshot to the [`CandidateNotifier`].

use std::sync::Arc;

use async_trait::async_trait;
use election_common::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::info;
use validator::Validate;

use super::notifier::{CandidateEvent, CandidateNotifier};

/// A candidate in the mock election.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub id: String,
    pub name: String,
    pub image: String,
    pub party: String,
    pub description: String,
}

/// Input for creating or replacing a candidate.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CandidateInput {
    #[validate(length(min = 1, message = "Candidate name is required"))]
    pub name: String,
    #[validate(length(min = 1, message = "Candidate party is required"))]
    pub party: String,
    #[validate(length(min = 1, message = "Candidate description is required"))]
    pub description: String,
    #[serde(default)]
    pub image: String,
}

impl CandidateInput {
    fn into_candidate(self, id: String) -> Candidate {
        Candidate {
            id,
            name: self.name,
            image: self.image,
            party: self.party,
            description: self.description,
        }
    }
}

/// Existence check against the candidate directory.
#[async_trait]
pub trait CandidateLookup: Send + Sync {
    /// Whether a candidate with this id is currently listed.
    async fn contains(&self, candidate_id: &str) -> bool;
}

/// Candidate directory service.
#[derive(Clone)]
pub struct CandidateService {
    candidates: Arc<RwLock<Vec<Candidate>>>,
    notifier: CandidateNotifier,
}

impl CandidateService {
    /// Create a directory seeded with the default candidates.
    #[must_use]
    pub fn new(notifier: CandidateNotifier) -> Self {
        Self::with_candidates(default_candidates(), notifier)
    }

    /// Create a directory holding exactly `candidates`.
    #[must_use]
    pub fn with_candidates(candidates: Vec<Candidate>, notifier: CandidateNotifier) -> Self {
        Self {
            candidates: Arc::new(RwLock::new(candidates)),
            notifier,
        }
    }

    /// The notifier this directory publishes to.
    #[must_use]
    pub const fn notifier(&self) -> &CandidateNotifier {
        &self.notifier
    }

    /// Snapshot of all candidates in insertion order.
    pub async fn list(&self) -> Vec<Candidate> {
        self.candidates.read().await.clone()
    }

    /// Get a candidate by id.
    pub async fn get(&self, id: &str) -> AppResult<Candidate> {
        self.candidates
            .read()
            .await
            .iter()
            .find(|c| c.id == id)
            .cloned()
            .ok_or_else(|| AppError::NotFound("Candidate not found".to_string()))
    }

    /// Distinct parties, in order of first appearance.
    pub async fn parties(&self) -> Vec<String> {
        let candidates = self.candidates.read().await;
        let mut parties: Vec<String> = Vec::new();
        for candidate in candidates.iter() {
            if !parties.contains(&candidate.party) {
                parties.push(candidate.party.clone());
            }
        }
        parties
    }

    /// Add a candidate with the next free numeric id.
    pub async fn create(&self, input: CandidateInput) -> AppResult<Candidate> {
        input.validate()?;

        let mut candidates = self.candidates.write().await;
        let candidate = input.into_candidate(next_id(&candidates));
        candidates.push(candidate.clone());
        self.publish(&candidates).await;
        drop(candidates);

        info!(id = %candidate.id, name = %candidate.name, "Candidate added");
        Ok(candidate)
    }

    /// Replace a candidate's fields, keeping its id.
    pub async fn update(&self, id: &str, input: CandidateInput) -> AppResult<Candidate> {
        input.validate()?;

        let mut candidates = self.candidates.write().await;
        let slot = candidates
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| AppError::NotFound("Candidate not found".to_string()))?;
        *slot = input.into_candidate(id.to_string());
        let candidate = slot.clone();
        self.publish(&candidates).await;
        drop(candidates);

        info!(id = %candidate.id, "Candidate updated");
        Ok(candidate)
    }

    /// Remove a candidate.
    pub async fn delete(&self, id: &str) -> AppResult<()> {
        let mut candidates = self.candidates.write().await;
        let index = candidates
            .iter()
            .position(|c| c.id == id)
            .ok_or_else(|| AppError::NotFound("Candidate not found".to_string()))?;
        candidates.remove(index);
        self.publish(&candidates).await;
        drop(candidates);

        info!(id, "Candidate deleted");
        Ok(())
    }

    /// Notify subscribers. Called with the write guard held so snapshots
    /// are delivered in mutation order.
    async fn publish(&self, snapshot: &[Candidate]) {
        self.notifier
            .notify(CandidateEvent::CandidatesUpdated {
                data: snapshot.to_vec(),
            })
            .await;
    }
}

#[async_trait]
impl CandidateLookup for CandidateService {
    async fn contains(&self, candidate_id: &str) -> bool {
        self.candidates
            .read()
            .await
            .iter()
            .any(|c| c.id == candidate_id)
    }
}

/// Largest numeric id plus one; `"1"` when no id is numeric.
fn next_id(candidates: &[Candidate]) -> String {
    let max = candidates
        .iter()
        .filter_map(|c| c.id.parse::<u64>().ok())
        .max()
        .unwrap_or(0);
    (max + 1).to_string()
}

fn seed(id: &str, name: &str, initials: &str, party: &str, description: &str) -> Candidate {
    Candidate {
        id: id.to_string(),
        name: name.to_string(),
        image: placeholder_image(initials),
        party: party.to_string(),
        description: description.to_string(),
    }
}

/// Placeholder portrait showing the given initials.
#[must_use]
pub fn placeholder_image(initials: &str) -> String {
    format!("https://placehold.co/600x400/000000/FFFFFF.png?text={initials}")
}

/// Candidates the directory starts with.
#[must_use]
pub fn default_candidates() -> Vec<Candidate> {
    vec![
        seed(
            "1",
            "Klaus Iohannis",
            "KL",
            "PNL (Partidul Național Liberal)",
            "Current President of Romania serving since 2014. Former mayor of Sibiu and leader of the National Liberal Party. Known for his pro-European stance and efforts to strengthen Romania's position within the EU and NATO.",
        ),
        seed(
            "2",
            "Marcel Ciolacu",
            "MC",
            "PSD (Partidul Social Democrat)",
            "Prime Minister of Romania and President of the Social Democratic Party (PSD). He has been a prominent figure in Romanian politics, focusing on social policies and economic development.",
        ),
        seed(
            "3",
            "Elena Lasconi",
            "EL",
            "USR (Uniunea Salvați România)",
            "Mayor of Câmpulung and presidential candidate for the 2024 Romanian presidential election. Former journalist and advocate for transparency and good governance in public administration.",
        ),
        seed(
            "4",
            "George Simion",
            "GS",
            "AUR (Alianța pentru Unirea Românilor)",
            "Co-president of the Alliance for the Union of Romanians (AUR) party and candidate for the 2024 presidential elections. Known for his nationalist positions and advocacy for traditional Romanian values.",
        ),
        seed(
            "5",
            "Nicolae Ciucă",
            "NC",
            "PNL (Partidul Național Liberal)",
            "Former Prime Minister of Romania, current President of the Senate and head of the National Liberal Party (PNL). A retired army general with extensive experience in military and political leadership.",
        ),
        seed(
            "6",
            "Diana Șoșoacă",
            "DS",
            "SOS România",
            "Leader of SOS România party and former senator. Known for her controversial statements and strong opposition to various government policies, particularly during the COVID-19 pandemic.",
        ),
    ]
}
