use async_trait::async_trait;
use std::sync::Arc;

use crate::error::{ExamError, ExamResult};
use crate::metrics::{record_cache_hit, record_cache_miss, DEGRADED_PAYLOADS_TOTAL};
use crate::models::QuestionPayload;
use crate::services::question_cache::QuestionCache;
use crate::services::render;

/// Anything that can produce a question payload for an attempt slot
#[async_trait]
pub trait QuestionSource: Send + Sync {
    async fn load_question(&self, attempt_id: i64, slot: i64) -> ExamResult<QuestionPayload>;
}

/// Read side of exam delivery: cached question lookups.
///
/// Answer submission deliberately bypasses this type and goes straight to
/// the LMS adapter.
#[derive(Clone)]
pub struct ExamService {
    source: Arc<dyn QuestionSource>,
    cache: QuestionCache,
    degrade_on_error: bool,
}

impl ExamService {
    pub fn new(source: Arc<dyn QuestionSource>, cache: QuestionCache, degrade_on_error: bool) -> Self {
        Self {
            source,
            cache,
            degrade_on_error,
        }
    }

    pub fn cache(&self) -> &QuestionCache {
        &self.cache
    }

    pub async fn get_question_payload(
        &self,
        attempt_id: i64,
        slot: i64,
    ) -> ExamResult<QuestionPayload> {
        if let Some(payload) = self.cache.get(attempt_id, slot).await {
            record_cache_hit();
            return Ok(payload);
        }
        record_cache_miss();

        match self.source.load_question(attempt_id, slot).await {
            Ok(payload) => {
                self.cache.insert(attempt_id, slot, payload.clone()).await;
                Ok(payload)
            }
            // Not cached: the next request retries the LMS
            Err(e) => self.degrade(attempt_id, slot, e),
        }
    }

    /// Applies the read-path degrade policy to a failed question request.
    ///
    /// With degradation on, the error becomes a fallback payload. Otherwise it
    /// is returned unchanged.
    pub fn degrade(
        &self,
        attempt_id: i64,
        slot: i64,
        error: ExamError,
    ) -> ExamResult<QuestionPayload> {
        if !self.degrade_on_error {
            tracing::error!(attempt_id, slot, error = %error, "Question lookup failed");
            return Err(error);
        }

        tracing::warn!(
            attempt_id,
            slot,
            error = %error,
            "Question lookup failed, serving fallback payload"
        );
        DEGRADED_PAYLOADS_TOTAL.with_label_values(&[error.kind()]).inc();
        Ok(fallback_payload(attempt_id, slot, &error))
    }
}

pub fn fallback_payload(attempt_id: i64, slot: i64, error: &ExamError) -> QuestionPayload {
    QuestionPayload::new(
        attempt_id,
        slot,
        render::render_fallback(attempt_id, slot, &error.to_string()),
        0.0,
    )
}
