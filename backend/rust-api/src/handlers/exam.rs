use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use std::sync::Arc;
use validator::Validate;

use crate::{
    error::ExamError,
    extractors::AppJson,
    models::{AnswerAck, AnswerSubmission, QuestionRequest},
    services::AppState,
};

/// POST /question - Fetch the rendered question for an attempt slot
pub async fn get_question(
    State(state): State<Arc<AppState>>,
    AppJson(req): AppJson<QuestionRequest>,
) -> Result<impl IntoResponse, ExamError> {
    tracing::info!(attempt_id = req.attempt_id, slot = req.slot, "Fetching question");

    // Unusable ids go through the same degrade policy as a failed lookup
    let payload = match req.validate() {
        Ok(()) => {
            state
                .exam
                .get_question_payload(req.attempt_id, req.slot)
                .await?
        }
        Err(e) => state.exam.degrade(
            req.attempt_id,
            req.slot,
            ExamError::Invalid(format!("Validation error: {}", e)),
        )?,
    };

    Ok((StatusCode::OK, Json(payload)))
}

/// POST /answer - Record a response as a new question attempt step
pub async fn submit_answer(
    State(state): State<Arc<AppState>>,
    AppJson(req): AppJson<AnswerSubmission>,
) -> Result<impl IntoResponse, ExamError> {
    req.validate()
        .map_err(|e| ExamError::Invalid(format!("Validation error: {}", e)))?;

    tracing::info!(attempt_id = req.attempt_id, slot = req.slot, "Submitting answer");
    if let Some(ts) = req.client_timestamp {
        tracing::debug!(client_timestamp = ts, "Ignoring client timestamp");
    }

    match state
        .adapter
        .save_answer(req.attempt_id, req.slot, &req.response)
        .await
    {
        Ok(()) => Ok((StatusCode::OK, Json(AnswerAck::ok()))),
        Err(e) => {
            tracing::warn!(
                attempt_id = req.attempt_id,
                slot = req.slot,
                error = %e,
                "Failed to save answer"
            );
            Err(e)
        }
    }
}
