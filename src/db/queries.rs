use sqlx::{Row, SqlitePool};

use crate::models::job::{Job, JobStatus, PendingImage};

/// Get a job by ID
pub async fn get_job(pool: &SqlitePool, job_id: i64) -> Result<Option<Job>, sqlx::Error> {
    let row = sqlx::query(
        r#"
        SELECT id, status
        FROM jobs
        WHERE id = ?
        "#,
    )
    .bind(job_id)
    .fetch_optional(pool)
    .await?;

    match row {
        Some(r) => Ok(Some(Job {
            id: r.try_get("id")?,
            status: decode_status(&r)?,
        })),
        None => Ok(None),
    }
}

/// Load every image of a job, resolved through the job's visits.
pub async fn images_for_job(
    pool: &SqlitePool,
    job_id: i64,
) -> Result<Vec<PendingImage>, sqlx::Error> {
    sqlx::query_as::<_, PendingImage>(
        r#"
        SELECT i.id, i.image_url
        FROM images i
        JOIN store_visits v ON v.id = i.visit_id
        WHERE v.job_id = ?
        ORDER BY i.id
        "#,
    )
    .bind(job_id)
    .fetch_all(pool)
    .await
}

/// Move an image out of `ongoing`. Returns false if the image was already terminal
/// or does not exist.
pub async fn update_image_status(
    pool: &SqlitePool,
    image_id: i64,
    status: JobStatus,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE images
        SET status = ?
        WHERE id = ? AND status = 'ongoing'
        "#,
    )
    .bind(status.as_ref())
    .bind(image_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Move a job out of `ongoing`. Returns false if the job was already terminal
/// or does not exist.
pub async fn update_job_status(
    pool: &SqlitePool,
    job_id: i64,
    status: JobStatus,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE jobs
        SET status = ?
        WHERE id = ? AND status = 'ongoing'
        "#,
    )
    .bind(status.as_ref())
    .bind(job_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Image statuses of a job, in insertion order.
pub async fn image_statuses(
    pool: &SqlitePool,
    job_id: i64,
) -> Result<Vec<JobStatus>, sqlx::Error> {
    let rows = sqlx::query(
        r#"
        SELECT i.status
        FROM images i
        JOIN store_visits v ON v.id = i.visit_id
        WHERE v.job_id = ?
        ORDER BY i.id
        "#,
    )
    .bind(job_id)
    .fetch_all(pool)
    .await?;

    rows.iter().map(decode_status).collect()
}

fn decode_status(row: &sqlx::sqlite::SqliteRow) -> Result<JobStatus, sqlx::Error> {
    let status: String = row.try_get("status")?;
    status
        .parse()
        .map_err(|e: strum::ParseError| sqlx::Error::Decode(Box::new(e)))
}
