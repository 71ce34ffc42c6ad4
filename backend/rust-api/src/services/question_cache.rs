use moka::future::Cache;
use moka::policy::EvictionPolicy;

use crate::metrics::QUESTION_CACHE_ENTRIES;
use crate::models::QuestionPayload;

/// `(attempt_id, slot)`
pub type QuestionKey = (i64, i64);

/// Bounded LRU memo of rendered question payloads.
///
/// Shared by every request in the process through `AppState`. Entries are
/// never invalidated: question content is fixed once an attempt slot exists.
#[derive(Clone)]
pub struct QuestionCache {
    inner: Cache<QuestionKey, QuestionPayload>,
    capacity: u64,
}

impl QuestionCache {
    pub fn new(capacity: u64) -> Self {
        let inner = Cache::builder()
            .name("question_payloads")
            .max_capacity(capacity)
            .eviction_policy(EvictionPolicy::lru())
            .build();

        Self { inner, capacity }
    }

    pub async fn get(&self, attempt_id: i64, slot: i64) -> Option<QuestionPayload> {
        self.inner.get(&(attempt_id, slot)).await
    }

    pub async fn insert(&self, attempt_id: i64, slot: i64, payload: QuestionPayload) {
        self.inner.insert((attempt_id, slot), payload).await;
        QUESTION_CACHE_ENTRIES.set(self.inner.entry_count() as i64);
    }

    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    /// Approximate until pending maintenance has run, see [`Self::sync`]
    pub fn entry_count(&self) -> u64 {
        self.inner.entry_count()
    }

    /// Applies pending evictions so `entry_count` is exact
    pub async fn sync(&self) {
        self.inner.run_pending_tasks().await;
        QUESTION_CACHE_ENTRIES.set(self.inner.entry_count() as i64);
    }
}
