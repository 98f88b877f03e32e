use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

/// Errors surfaced by the submission and status endpoints.
#[derive(Debug, thiserror::Error)]
pub enum JobError {
    #[error("Invalid JSON")]
    InvalidJson,

    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    #[error("Missing jobid")]
    MissingJobId,

    #[error("Job not found")]
    JobNotFound,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl JobError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            // Unknown jobs are a client error on this API, not a 404.
            JobError::InvalidJson
            | JobError::InvalidPayload(_)
            | JobError::MissingJobId
            | JobError::JobNotFound => StatusCode::BAD_REQUEST,
            JobError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for JobError {
    fn into_response(self) -> Response {
        let message = match &self {
            JobError::Database(e) => {
                tracing::error!(error = %e, "Database error");
                "Database transaction failed".to_string()
            }
            other => other.to_string(),
        };

        (self.status_code(), Json(json!({ "error": message }))).into_response()
    }
}
