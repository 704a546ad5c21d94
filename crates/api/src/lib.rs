//! HTTP API layer for the mock election service.
//!
//! - **Endpoints**: voter registration and login, vote casting, tally,
//!   candidate directory and generator control
//! - **Streaming**: live candidate feed over Server-Sent Events
//! - **Responses**: success envelopes matching the error body of
//!   [`election_common::AppError`]
//!
//! Built on Axum 0.8 with Tower middleware stack.

pub mod endpoints;
pub mod extractors;
pub mod middleware;
pub mod response;
pub mod sse;

pub use endpoints::{health_router, router};
pub use middleware::AppState;
