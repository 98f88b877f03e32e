use garde::Validate;
use sqlx::SqlitePool;
use std::sync::Arc;
use tokio::task::JoinHandle;

use crate::db::submission_queries;
use crate::error::JobError;
use crate::models::submission::SubmitRequest;
use crate::services::processor::ImageProcessor;

/// A committed job whose processing has been handed off.
#[derive(Debug)]
pub struct Submission {
    pub job_id: i64,
    /// Handle to the background processing task. Dropping it detaches the task.
    pub processing: JoinHandle<()>,
}

/// Decode a raw request body into a batch. Validation happens in [`submit_batch`].
pub fn parse_request(body: &[u8]) -> Result<SubmitRequest, JobError> {
    let request: SubmitRequest = serde_json::from_slice(body).map_err(|e| {
        tracing::debug!(error = %e, "Rejected malformed submission");
        JobError::InvalidJson
    })?;
    Ok(request)
}

/// Validate and persist a batch, then start processing it in the background.
pub async fn submit_batch(
    db: &SqlitePool,
    processor: &Arc<ImageProcessor>,
    request: &SubmitRequest,
) -> Result<Submission, JobError> {
    request
        .validate()
        .map_err(|report| JobError::InvalidPayload(report.to_string()))?;

    let job_id = submission_queries::insert_job_tree(db, request)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, visits = request.visits.len(), "Submission rolled back");
            JobError::Database(e)
        })?;

    metrics::counter!("visit_jobs_submitted_total").increment(1);
    tracing::info!(
        job_id,
        count = request.count,
        visits = request.visits.len(),
        images = request.image_count(),
        "Created job"
    );

    let processing = processor.spawn(job_id);
    Ok(Submission { job_id, processing })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_request_only_decodes() {
        // Decodes fine; the empty store_id is left for submit_batch to reject.
        let request = parse_request(br#"{"visits":[{"store_id":"","image_url":["u1"]}]}"#).unwrap();
        assert_eq!(request.visits.len(), 1);
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_parse_request_rejects_malformed_json() {
        assert!(matches!(parse_request(b"{\"visits\": ["), Err(JobError::InvalidJson)));
        assert!(matches!(parse_request(b""), Err(JobError::InvalidJson)));
    }
}
