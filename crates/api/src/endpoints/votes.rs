//! Vote endpoints.

use axum::{Router, extract::State, routing::get};
use election_common::AppResult;
use election_core::{CastVote, CastVoteInput, VoteStatistics};
use serde::Serialize;

use crate::{
    extractors::ApiJson,
    middleware::AppState,
    response::{ApiResponse, Success, success},
};

/// `{"message": ..., "vote": {...}}` payload.
#[derive(Serialize)]
pub struct VotePayload {
    pub message: &'static str,
    pub vote: CastVote,
}

/// Cast a vote.
async fn cast(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<CastVoteInput>,
) -> AppResult<ApiResponse<Success<VotePayload>>> {
    let vote = state.voting_service.cast_vote(req).await?;
    Ok(success(VotePayload {
        message: "Vote cast successfully",
        vote,
    }))
}

/// Current tally and turnout.
async fn statistics(State(state): State<AppState>) -> AppResult<ApiResponse<VoteStatistics>> {
    let stats = state.voting_service.statistics().await?;
    Ok(ApiResponse::ok(stats))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(statistics).post(cast))
}
