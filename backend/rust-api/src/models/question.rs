use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct QuestionRequest {
    #[validate(range(min = 1, message = "attempt_id must be positive"))]
    pub attempt_id: i64,
    #[validate(range(min = 1, message = "slot must be positive"))]
    pub slot: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionMeta {
    pub max_mark: f64,
}

/// Question content handed to the exam client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionPayload {
    pub attempt_id: i64,
    pub slot: i64,
    pub question_html: String,
    pub meta: QuestionMeta,
}

impl QuestionPayload {
    pub fn new(attempt_id: i64, slot: i64, question_html: String, max_mark: f64) -> Self {
        Self {
            attempt_id,
            slot,
            question_html,
            meta: QuestionMeta { max_mark },
        }
    }
}
