use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use crate::app_state::AppState;
use crate::error::JobError;
use crate::models::submission::{JobStatusResponse, SubmitResponse};
use crate::services::{status, submission};

#[derive(Debug, Deserialize)]
pub struct StatusQuery {
    pub jobid: Option<String>,
}

/// POST /api/submit — persist a batch of store visits and start processing it.
///
/// The body is decoded by hand so that any malformed payload, including a
/// missing content type, maps to the same `Invalid JSON` error.
pub async fn submit_job(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<(StatusCode, Json<SubmitResponse>), JobError> {
    let request = submission::parse_request(&body)?;
    let submitted = submission::submit_batch(&state.db, &state.processor, &request).await?;

    // Processing continues after the response is sent.
    drop(submitted.processing);

    Ok((
        StatusCode::CREATED,
        Json(SubmitResponse {
            job_id: submitted.job_id,
        }),
    ))
}

/// GET /api/status?jobid=<id> — current status of a job.
pub async fn get_job_status(
    State(state): State<AppState>,
    Query(query): Query<StatusQuery>,
) -> Result<Json<JobStatusResponse>, JobError> {
    let job = status::job_status(&state.db, query.jobid.as_deref()).await?;
    Ok(Json(job.into()))
}
