use axum::extract::State;
use axum::http::header;
use axum::response::IntoResponse;
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;

/// GET /metrics — job and image counters in Prometheus text format.
pub async fn prometheus_metrics(State(handle): State<Arc<PrometheusHandle>>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        handle.render(),
    )
}

/// Register descriptions for every metric the pipeline records.
pub fn describe_metrics() {
    metrics::describe_counter!("visit_jobs_submitted_total", "Jobs accepted by the submission endpoint");
    metrics::describe_counter!("visit_jobs_completed_total", "Jobs whose images all completed");
    metrics::describe_counter!("visit_jobs_failed_total", "Jobs with at least one failed image");
    metrics::describe_counter!(
        "visit_images_processed_total",
        "Images processed, labelled by outcome"
    );
    metrics::describe_histogram!(
        "visit_job_processing_seconds",
        "Time from processing start to the terminal job status"
    );
}
