//! Mock election server entry point.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::Router;
use election_api::{AppState, health_router, middleware::apply_layers, router as api_router};
use election_common::{Config, config::LoggingConfig};
use election_core::{
    CandidateGenerator, CandidateLookup, CandidateNotifier, CandidateService, VotingService,
};
use election_db::repositories::{VoteRepository, VoterRepository};
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Waits for a shutdown signal (SIGINT or SIGTERM).
///
/// On Unix systems, this listens for both SIGINT (Ctrl+C) and SIGTERM.
/// On Windows, this only listens for Ctrl+C.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received SIGINT, initiating graceful shutdown...");
        },
        () = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}

/// `RUST_LOG` wins over the configured filter.
fn init_tracing(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.filter));

    let registry = tracing_subscriber::registry().with(filter);
    if logging.json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration; ELECTION_CONFIG names an explicit file
    let config = match std::env::var("ELECTION_CONFIG") {
        Ok(path) => Config::from_file(&path),
        Err(_) => Config::load(),
    }
    .context("failed to load configuration")?;

    init_tracing(&config.logging);
    info!("Starting mock election server...");

    // Connect to database
    let db = election_db::init(&config).await?;
    info!("Connected to database");

    // Run migrations
    info!("Running database migrations...");
    election_db::migrate(&db).await?;
    info!("Migrations completed");

    let db = Arc::new(db);

    // Candidate directory and live feed
    let notifier = CandidateNotifier::new(config.streaming.subscriber_buffer);
    let candidate_service = CandidateService::new(notifier);
    let generator = CandidateGenerator::new(
        candidate_service.clone(),
        Duration::from_millis(config.generator.interval_ms),
    );

    // Voting
    let mut voting_service = VotingService::new(
        VoterRepository::new(Arc::clone(&db)),
        VoteRepository::new(Arc::clone(&db)),
    );
    if config.voting.validate_candidates {
        let lookup: Arc<dyn CandidateLookup> = Arc::new(candidate_service.clone());
        voting_service = voting_service.with_candidate_lookup(lookup);
    } else {
        info!("Candidate validation disabled");
    }

    let state = AppState::new(
        voting_service,
        candidate_service,
        generator,
        config.streaming.clone(),
    );
    let shutdown_state = state.clone();

    // Build router
    let app = Router::new()
        .merge(health_router())
        .nest("/api", api_router())
        .with_state(state);
    let app = apply_layers(app, &config.server);

    // Start server with graceful shutdown
    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_signal().await;
            shutdown_state.shutdown().await;
        })
        .await?;

    info!("Server shutdown complete");
    Ok(())
}
