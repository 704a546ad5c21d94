//! Voter endpoints.

use axum::{Router, extract::State, routing::post};
use election_common::AppResult;
use election_core::{LoginInput, RegisterVoterInput, VoterProfile};
use serde::Serialize;

use crate::{
    extractors::ApiJson,
    middleware::AppState,
    response::{ApiResponse, Success, success},
};

/// `{"voter": {...}}` payload.
#[derive(Serialize)]
pub struct VoterPayload {
    pub voter: VoterProfile,
}

/// Register a voter.
async fn register(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<RegisterVoterInput>,
) -> AppResult<ApiResponse<Success<VoterPayload>>> {
    let voter = state.voting_service.register(req).await?;
    Ok(success(VoterPayload { voter }))
}

/// Log in with a CNP.
async fn login(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<LoginInput>,
) -> AppResult<ApiResponse<Success<VoterPayload>>> {
    let voter = state.voting_service.login(req).await?;
    Ok(success(VoterPayload { voter }))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(register))
        .route("/login", post(login))
}
