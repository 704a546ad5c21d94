//! Shared application state and HTTP layers.

use std::time::Duration;

use axum::Router;
use election_common::config::{ServerConfig, StreamingConfig};
use election_core::{CandidateGenerator, CandidateNotifier, CandidateService, VotingService};
use tower_http::{
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::info;

/// Application state.
#[derive(Clone)]
pub struct AppState {
    pub voting_service: VotingService,
    pub candidate_service: CandidateService,
    pub generator: CandidateGenerator,
    pub streaming: StreamingConfig,
}

impl AppState {
    /// Assemble the state. The notifier is taken from the candidate directory.
    #[must_use]
    pub const fn new(
        voting_service: VotingService,
        candidate_service: CandidateService,
        generator: CandidateGenerator,
        streaming: StreamingConfig,
    ) -> Self {
        Self {
            voting_service,
            candidate_service,
            generator,
            streaming,
        }
    }

    /// Subscriber registry of the live candidate feed.
    #[must_use]
    pub const fn notifier(&self) -> &CandidateNotifier {
        self.candidate_service.notifier()
    }

    /// Stop background work and end every open candidate feed, so a
    /// graceful drain is not held up by streaming clients.
    pub async fn shutdown(&self) {
        if self.generator.stop().await {
            info!("Candidate generator stopped");
        }
        let closed = self.notifier().close_all().await;
        info!(closed, "Candidate feeds closed");
    }

    /// Keep-alive interval of the candidate feed, at least one second.
    #[must_use]
    pub const fn keep_alive(&self) -> Duration {
        let secs = self.streaming.keep_alive_secs;
        Duration::from_secs(if secs == 0 { 1 } else { secs })
    }
}

/// Largest accepted request body.
const MAX_BODY_BYTES: usize = 64 * 1024;

/// Wrap a router with request tracing, CORS, a body limit and a timeout.
///
/// The timeout bounds the time to the response head, so open candidate
/// feeds are not cut off.
pub fn apply_layers(router: Router, server: &ServerConfig) -> Router {
    router
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(TimeoutLayer::new(Duration::from_secs(
            server.request_timeout_secs,
        )))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
}
