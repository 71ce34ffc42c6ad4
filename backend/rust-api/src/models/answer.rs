use serde::{Deserialize, Serialize};
use serde_json::Value;
use validator::Validate;

use crate::error::{ExamError, ExamResult};

#[derive(Debug, Deserialize, Validate)]
pub struct AnswerSubmission {
    #[validate(range(min = 1, message = "attempt_id must be positive"))]
    pub attempt_id: i64,
    #[validate(range(min = 1, message = "slot must be positive"))]
    pub slot: i64,
    pub response: Value,
    /// Accepted for client compatibility, never persisted
    #[serde(default)]
    pub client_timestamp: Option<f64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AnswerAck {
    pub status: String,
}

impl AnswerAck {
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
        }
    }
}

/// Response keys recorded as step data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepResponse {
    pub answer_id: Option<i64>,
    pub text: Option<String>,
}

impl StepResponse {
    pub const ANSWER_ID_KEY: &'static str = "answer_id";
    pub const TEXT_KEY: &'static str = "text";

    /// Extracts `answer_id` and `text` from a raw client response.
    ///
    /// The response must be a JSON object carrying at least an `answer_id`
    /// or a non-empty `text`. An empty `text` counts as absent.
    pub fn from_value(response: &Value) -> ExamResult<Self> {
        let map = response
            .as_object()
            .ok_or_else(|| ExamError::Invalid("response must be a JSON object".to_string()))?;

        let answer_id = match map.get(Self::ANSWER_ID_KEY) {
            None | Some(Value::Null) => None,
            Some(value) => Some(coerce_answer_id(value)?),
        };

        let text = match map.get(Self::TEXT_KEY) {
            None | Some(Value::Null) => None,
            Some(value) => Some(coerce_text(value)?),
        }
        .filter(|t| !t.is_empty());

        if answer_id.is_none() && text.is_none() {
            return Err(ExamError::Invalid(
                "response needs an answer_id or a non-empty text".to_string(),
            ));
        }

        Ok(Self { answer_id, text })
    }

    /// Step data rows in insertion order
    pub fn step_data(&self) -> Vec<(&'static str, String)> {
        let mut rows = Vec::with_capacity(2);
        if let Some(id) = self.answer_id {
            rows.push((Self::ANSWER_ID_KEY, id.to_string()));
        }
        if let Some(text) = &self.text {
            rows.push((Self::TEXT_KEY, text.clone()));
        }
        rows
    }
}

fn coerce_answer_id(value: &Value) -> ExamResult<i64> {
    let parsed = match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
                .map(|f| f as i64)
        }),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| ExamError::Invalid(format!("answer_id is not an integer: {}", value)))
}

fn coerce_text(value: &Value) -> ExamResult<String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        _ => Err(ExamError::Invalid(format!(
            "text must be a scalar value, got {}",
            value
        ))),
    }
}
