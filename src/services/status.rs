use sqlx::SqlitePool;

use crate::db::queries;
use crate::error::JobError;
use crate::models::job::Job;

/// Look up a job by the raw `jobid` query value.
///
/// Absent or empty input is a missing id; anything that cannot name a job,
/// including non-numeric input, is reported as not found.
pub async fn job_status(db: &SqlitePool, raw_job_id: Option<&str>) -> Result<Job, JobError> {
    let raw = raw_job_id
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or(JobError::MissingJobId)?;

    let job_id: i64 = raw.parse().map_err(|_| JobError::JobNotFound)?;

    queries::get_job(db, job_id)
        .await?
        .ok_or(JobError::JobNotFound)
}
