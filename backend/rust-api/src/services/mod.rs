use sqlx::AnyPool;
use std::sync::Arc;

use crate::config::Config;

pub mod exam_service;
pub mod lms_adapter;
pub mod question_cache;
pub mod render;

use exam_service::ExamService;
use lms_adapter::LmsAdapter;
use question_cache::QuestionCache;

pub struct AppState {
    pub config: Config,
    pub pool: AnyPool,
    pub adapter: Arc<LmsAdapter>,
    pub exam: ExamService,
}

impl AppState {
    pub fn new(config: Config, pool: AnyPool) -> Self {
        let adapter = Arc::new(LmsAdapter::new(pool.clone(), &config.table_prefix));
        let cache = QuestionCache::new(config.cache_capacity);
        let exam = ExamService::new(adapter.clone(), cache, config.degrade_on_error);

        tracing::info!(
            table_prefix = %config.table_prefix,
            cache_capacity = config.cache_capacity,
            degrade_on_error = config.degrade_on_error,
            "Exam service state initialized"
        );

        Self {
            config,
            pool,
            adapter,
            exam,
        }
    }
}
