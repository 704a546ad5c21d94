//! Candidate directory endpoints.

use axum::{
    Router,
    extract::{Path, State},
    routing::get,
};
use election_common::{AppError, AppResult};
use election_core::{Candidate, CandidateInput};
use serde::{Deserialize, Serialize};

use crate::{
    extractors::ApiJson,
    middleware::AppState,
    response::{ApiResponse, Message},
    sse,
};

/// Generator control request.
#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    pub action: String,
}

/// Generator state.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
    pub is_generating: bool,
}

async fn list(State(state): State<AppState>) -> ApiResponse<Vec<Candidate>> {
    ApiResponse::ok(state.candidate_service.list().await)
}

async fn create(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<CandidateInput>,
) -> AppResult<ApiResponse<Candidate>> {
    let candidate = state.candidate_service.create(req).await?;
    Ok(ApiResponse::created(candidate))
}

async fn show(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<Candidate>> {
    Ok(ApiResponse::ok(state.candidate_service.get(&id).await?))
}

async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<CandidateInput>,
) -> AppResult<ApiResponse<Candidate>> {
    Ok(ApiResponse::ok(
        state.candidate_service.update(&id, req).await?,
    ))
}

async fn delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<Message>> {
    state.candidate_service.delete(&id).await?;
    Ok(ApiResponse::ok(Message::new("Candidate deleted successfully")))
}

/// Start or stop the background generator.
async fn control_generator(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<GenerateRequest>,
) -> AppResult<ApiResponse<GenerateResponse>> {
    let response = match req.action.as_str() {
        "start" => {
            let message = if state.generator.start().await {
                "Generation started"
            } else {
                "Generation already running"
            };
            GenerateResponse {
                message: Some(message),
                is_generating: true,
            }
        }
        "stop" => {
            state.generator.stop().await;
            GenerateResponse {
                message: Some("Generation stopped"),
                is_generating: false,
            }
        }
        _ => return Err(AppError::BadRequest("Invalid action".to_string())),
    };

    Ok(ApiResponse::ok(response))
}

async fn generator_status(State(state): State<AppState>) -> ApiResponse<GenerateResponse> {
    ApiResponse::ok(GenerateResponse {
        message: None,
        is_generating: state.generator.is_running().await,
    })
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/events", get(sse::candidate_feed))
        .route("/generate", get(generator_status).post(control_generator))
        .route("/{id}", get(show).put(update).delete(delete))
}
