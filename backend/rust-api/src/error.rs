use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExamError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid: {0}")]
    Invalid(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl ExamError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ExamError::NotFound(_) => StatusCode::NOT_FOUND,
            ExamError::Invalid(_) => StatusCode::BAD_REQUEST,
            ExamError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Short label used for metrics and structured logs
    pub fn kind(&self) -> &'static str {
        match self {
            ExamError::NotFound(_) => "not_found",
            ExamError::Invalid(_) => "invalid",
            ExamError::Database(_) => "database",
        }
    }
}

impl IntoResponse for ExamError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match &self {
            // Driver errors can carry connection details
            ExamError::Database(e) => {
                tracing::error!(error = %e, "database failure");
                "An internal database error occurred".to_string()
            }
            other => other.to_string(),
        };

        let body = Json(json!({
            "message": message,
            "status": status.as_u16(),
        }));

        (status, body).into_response()
    }
}

pub type ExamResult<T> = Result<T, ExamError>;
