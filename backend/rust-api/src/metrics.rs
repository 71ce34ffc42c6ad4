use lazy_static::lazy_static;
use prometheus::{
    register_histogram_vec, register_int_counter, register_int_counter_vec, register_int_gauge,
    Encoder, HistogramVec, IntCounter, IntCounterVec, IntGauge, TextEncoder,
};

use crate::error::ExamResult;

lazy_static! {
    // HTTP Metrics
    pub static ref HTTP_REQUESTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "http_requests_total",
        "Total number of HTTP requests",
        &["method", "path", "status"]
    )
    .unwrap();

    pub static ref HTTP_REQUEST_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "http_request_duration_seconds",
        "HTTP request duration in seconds",
        &["method", "path"],
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]
    )
    .unwrap();

    // LMS database metrics
    pub static ref DB_OPERATIONS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "lms_db_operations_total",
        "Total number of LMS database operations",
        &["operation", "status"]
    )
    .unwrap();

    pub static ref DB_OPERATION_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "lms_db_operation_duration_seconds",
        "LMS database operation duration in seconds",
        &["operation"],
        vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0]
    )
    .unwrap();

    // Question cache metrics
    pub static ref QUESTION_CACHE_LOOKUPS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "question_cache_lookups_total",
        "Question cache lookups by result",
        &["result"]
    )
    .unwrap();

    pub static ref QUESTION_CACHE_ENTRIES: IntGauge = register_int_gauge!(
        "question_cache_entries",
        "Approximate number of cached question payloads"
    )
    .unwrap();

    // Exam metrics
    pub static ref DEGRADED_PAYLOADS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "degraded_question_payloads_total",
        "Fallback payloads served instead of an error",
        &["reason"]
    )
    .unwrap();

    pub static ref ANSWERS_SAVED_TOTAL: IntCounter = register_int_counter!(
        "answers_saved_total",
        "Total number of answers written to the LMS"
    )
    .unwrap();
}

/// Renders all metrics in Prometheus text format
pub fn render_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    String::from_utf8(buffer)
        .map_err(|e| prometheus::Error::Msg(format!("Failed to convert metrics to UTF-8: {}", e)))
}

/// Helper: track LMS database operation with metrics
pub async fn track_db_operation<F, T>(operation: &str, future: F) -> ExamResult<T>
where
    F: std::future::Future<Output = ExamResult<T>>,
{
    let start = std::time::Instant::now();
    let result = future.await;
    let duration = start.elapsed().as_secs_f64();

    let status = match &result {
        Ok(_) => "success",
        Err(e) => e.kind(),
    };

    DB_OPERATIONS_TOTAL
        .with_label_values(&[operation, status])
        .inc();

    DB_OPERATION_DURATION_SECONDS
        .with_label_values(&[operation])
        .observe(duration);

    result
}

/// Record cache hit
pub fn record_cache_hit() {
    QUESTION_CACHE_LOOKUPS_TOTAL.with_label_values(&["hit"]).inc();
}

/// Record cache miss
pub fn record_cache_miss() {
    QUESTION_CACHE_LOOKUPS_TOTAL.with_label_values(&["miss"]).inc();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ExamError;

    #[test]
    fn test_render_metrics() {
        HTTP_REQUESTS_TOTAL
            .with_label_values(&["GET", "/test", "200"])
            .inc();

        let output = render_metrics().unwrap();
        assert!(output.contains("http_requests_total"));
    }

    #[tokio::test]
    async fn test_track_db_operation_labels_errors() {
        let before = DB_OPERATIONS_TOTAL
            .with_label_values(&["unit_probe", "not_found"])
            .get();

        let result: ExamResult<()> = track_db_operation("unit_probe", async {
            Err(ExamError::NotFound("probe".into()))
        })
        .await;

        assert!(result.is_err());
        assert_eq!(
            DB_OPERATIONS_TOTAL
                .with_label_values(&["unit_probe", "not_found"])
                .get(),
            before + 1
        );
    }
}
