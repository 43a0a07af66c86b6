use axum::response::IntoResponse;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;

/// Prometheus metrics scrape endpoint.
pub async fn prometheus_metrics(
    axum::extract::State(handle): axum::extract::State<Arc<PrometheusHandle>>,
) -> impl IntoResponse {
    handle.render()
}

/// Register descriptions for every metric the engine records.
pub fn describe() {
    metrics::describe_counter!(
        "transcription_jobs_submitted",
        "Total transcription jobs accepted"
    );
    metrics::describe_counter!(
        "transcription_jobs_rejected",
        "Uploads rejected by validation"
    );
    metrics::describe_counter!(
        "transcription_jobs_completed",
        "Transcription jobs that succeeded"
    );
    metrics::describe_counter!(
        "transcription_jobs_failed",
        "Transcription jobs that hit a processing fault"
    );
    metrics::describe_counter!(
        "transcription_jobs_cancelled",
        "Transcription jobs cancelled before completion"
    );
    metrics::describe_histogram!(
        "transcription_processing_seconds",
        "Time from running to a backend result"
    );
    metrics::describe_gauge!(
        "transcription_active_jobs",
        "Jobs currently validating or running"
    );
}
