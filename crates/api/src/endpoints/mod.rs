//! API endpoints.

mod candidates;
mod health;
mod voters;
mod votes;

use axum::Router;

use crate::middleware::AppState;

/// Create the API router, mounted under `/api`.
pub fn router() -> Router<AppState> {
    Router::new()
        .nest("/voters", voters::router())
        .nest("/votes", votes::router())
        .nest("/candidates", candidates::router())
}

/// Liveness probe, mounted at the root.
pub fn health_router() -> Router<AppState> {
    health::router()
}
