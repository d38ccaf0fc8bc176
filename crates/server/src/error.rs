// crates/server/src/error.rs
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use study_partner_db::{DbError, SessionError};

/// Structured JSON error response for API errors.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(test, derive(serde::Deserialize))]
pub struct ErrorResponse {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    /// Set on `SessionConflict` so the caller can offer "resume instead".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub existing_session_id: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: None,
            existing_session_id: None,
        }
    }

    pub fn with_details(error: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: Some(details.into()),
            existing_session_id: None,
        }
    }
}

/// API error types that map to HTTP status codes.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    #[error("Database error: {0}")]
    Database(#[from] DbError),

    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_response) = match &self {
            ApiError::Session(session_err) => match session_err {
                SessionError::NotFound => {
                    tracing::warn!("Session not found");
                    (
                        StatusCode::NOT_FOUND,
                        ErrorResponse::new("Session not found"),
                    )
                }
                SessionError::InvalidTransition { from } => {
                    tracing::warn!(from = from.as_str(), "Invalid session transition");
                    (
                        StatusCode::CONFLICT,
                        ErrorResponse::with_details(
                            "Invalid transition",
                            format!("Session is {}", from.as_str()),
                        ),
                    )
                }
                SessionError::Conflict {
                    existing_session_id,
                } => {
                    tracing::warn!(existing_session_id = %existing_session_id, "Session conflict");
                    (
                        StatusCode::CONFLICT,
                        ErrorResponse {
                            error: "An open session already exists".to_string(),
                            details: Some("Offer to resume the existing session".to_string()),
                            existing_session_id: Some(existing_session_id.clone()),
                        },
                    )
                }
                SessionError::Db(db_err) => {
                    tracing::error!(error = %db_err, "Database error");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        ErrorResponse::new("Database error"),
                    )
                }
            },
            ApiError::Database(db_err) => {
                tracing::error!(error = %db_err, "Database error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse::new("Database error"),
                )
            }
            ApiError::BadRequest(msg) => {
                tracing::warn!(message = %msg, "Bad request");
                (
                    StatusCode::BAD_REQUEST,
                    ErrorResponse::with_details("Bad request", msg.clone()),
                )
            }
        };

        (status, Json(error_response)).into_response()
    }
}

/// Result type alias for API handlers.
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use study_partner_core::SessionStatus;

    async fn extract_response(response: Response) -> (StatusCode, ErrorResponse) {
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let error_response: ErrorResponse = serde_json::from_slice(&body).unwrap();
        (status, error_response)
    }

    #[tokio::test]
    async fn test_not_found_returns_404() {
        let error = ApiError::Session(SessionError::NotFound);
        let (status, body) = extract_response(error.into_response()).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body.error, "Session not found");
        assert!(body.existing_session_id.is_none());
    }

    #[tokio::test]
    async fn test_invalid_transition_returns_409() {
        let error = ApiError::Session(SessionError::InvalidTransition {
            from: SessionStatus::Active,
        });
        let (status, body) = extract_response(error.into_response()).await;

        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body.error, "Invalid transition");
        assert!(body.details.unwrap().contains("active"));
    }

    #[tokio::test]
    async fn test_conflict_carries_existing_session_id() {
        let error = ApiError::Session(SessionError::Conflict {
            existing_session_id: "sess-42".to_string(),
        });
        let (status, body) = extract_response(error.into_response()).await;

        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body.existing_session_id.as_deref(), Some("sess-42"));
    }

    #[tokio::test]
    async fn test_bad_request_returns_400() {
        let error = ApiError::BadRequest("userId is required".to_string());
        let (status, body) = extract_response(error.into_response()).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.details.unwrap().contains("userId"));
    }

    #[test]
    fn test_error_response_serialization() {
        let response = ErrorResponse::new("Test error");
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"error\":\"Test error\""));
        assert!(!json.contains("details"));
        assert!(!json.contains("existingSessionId"));

        let response = ErrorResponse {
            error: "Conflict".to_string(),
            details: None,
            existing_session_id: Some("abc".to_string()),
        };
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"existingSessionId\":\"abc\""));
    }
}
