//! API response types.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

/// JSON body with an explicit status.
#[derive(Debug)]
pub struct ApiResponse<T: Serialize> {
    status: StatusCode,
    body: T,
}

impl<T: Serialize> ApiResponse<T> {
    /// `200 OK` with `body`.
    pub const fn ok(body: T) -> Self {
        Self {
            status: StatusCode::OK,
            body,
        }
    }

    /// `201 Created` with `body`.
    pub const fn created(body: T) -> Self {
        Self {
            status: StatusCode::CREATED,
            body,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

/// `{"success": true, ...payload}`; the counterpart of the error body.
#[derive(Debug, Serialize)]
pub struct Success<T: Serialize> {
    success: bool,
    #[serde(flatten)]
    payload: T,
}

/// Wrap a payload in a success envelope.
pub const fn success<T: Serialize>(payload: T) -> ApiResponse<Success<T>> {
    ApiResponse::ok(Success {
        success: true,
        payload,
    })
}

/// `{"message": ...}` body.
#[derive(Debug, Serialize)]
pub struct Message {
    pub message: String,
}

impl Message {
    /// Body carrying `message`.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[derive(Serialize)]
    struct Payload {
        voter: &'static str,
    }

    #[tokio::test]
    async fn test_success_envelope_flattens_payload() {
        let response = success(Payload { voter: "ana" }).into_response();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body, serde_json::json!({ "success": true, "voter": "ana" }));
    }

    #[test]
    fn test_created_status() {
        let response = ApiResponse::created(Message::new("ok")).into_response();
        assert_eq!(response.status(), StatusCode::CREATED);
    }
}
