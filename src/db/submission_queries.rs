use sqlx::{Sqlite, SqlitePool, Transaction};

use crate::models::job::JobStatus;
use crate::models::submission::{SubmitRequest, VisitInput};

/// Insert a job together with all of its visits and images in one transaction.
///
/// Returns the new job ID. On any error the transaction is dropped without
/// committing, which rolls back every row written so far.
pub async fn insert_job_tree(pool: &SqlitePool, request: &SubmitRequest) -> Result<i64, sqlx::Error> {
    let mut tx = pool.begin().await?;

    let job_id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO jobs (status)
        VALUES (?)
        RETURNING id
        "#,
    )
    .bind(JobStatus::Ongoing.as_ref())
    .fetch_one(&mut *tx)
    .await?;

    for visit in &request.visits {
        insert_visit(&mut tx, job_id, visit).await?;
    }

    tx.commit().await?;
    Ok(job_id)
}

async fn insert_visit(
    tx: &mut Transaction<'_, Sqlite>,
    job_id: i64,
    visit: &VisitInput,
) -> Result<i64, sqlx::Error> {
    let visit_id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO store_visits (job_id, store_id, visit_time)
        VALUES (?, ?, ?)
        RETURNING id
        "#,
    )
    .bind(job_id)
    .bind(&visit.store_id)
    .bind(visit.visit_time.as_deref())
    .fetch_one(&mut **tx)
    .await?;

    for image_url in &visit.image_url {
        sqlx::query(
            r#"
            INSERT INTO images (visit_id, image_url, status)
            VALUES (?, ?, ?)
            "#,
        )
        .bind(visit_id)
        .bind(image_url)
        .bind(JobStatus::Ongoing.as_ref())
        .execute(&mut **tx)
        .await?;
    }

    tracing::debug!(
        job_id,
        visit_id,
        store_id = %visit.store_id,
        images = visit.image_url.len(),
        "Inserted store visit"
    );

    Ok(visit_id)
}
