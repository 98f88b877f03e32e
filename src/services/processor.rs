//! Fan-out/fan-in processing of a job's images.
//!
//! Every image gets its own task. Each job owns a semaphore that bounds how
//! many of its tasks are doing work at the same time, so a backlog in one job
//! never holds back another. The job status is only written once every task
//! has reported back.

use futures::FutureExt;
use sqlx::SqlitePool;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tokio::task::{JoinHandle, JoinSet};

use crate::config::AppConfig;
use crate::db::queries;
use crate::models::job::{JobStatus, PendingImage};
use crate::services::analyzer::ImageAnalyzer;

pub struct ImageProcessor {
    db: SqlitePool,
    analyzer: Arc<dyn ImageAnalyzer>,
    max_concurrent_images: usize,
    image_timeout: Duration,
}

impl ImageProcessor {
    pub fn new(
        db: SqlitePool,
        analyzer: Arc<dyn ImageAnalyzer>,
        max_concurrent_images: usize,
        image_timeout: Duration,
    ) -> Self {
        Self {
            db,
            analyzer,
            max_concurrent_images: max_concurrent_images.max(1),
            image_timeout,
        }
    }

    pub fn from_config(
        db: SqlitePool,
        analyzer: Arc<dyn ImageAnalyzer>,
        config: &AppConfig,
    ) -> Self {
        Self::new(db, analyzer, config.max_concurrent_images, config.image_timeout())
    }

    /// Process a job in the background. Dropping the handle detaches the task.
    pub fn spawn(self: &Arc<Self>, job_id: i64) -> JoinHandle<()> {
        let processor = Arc::clone(self);
        tokio::spawn(async move { processor.process_job(job_id).await })
    }

    /// Process every image of a job and persist the aggregate job status.
    pub async fn process_job(&self, job_id: i64) {
        let started = Instant::now();

        let images = match queries::images_for_job(&self.db, job_id).await {
            Ok(images) if images.is_empty() => {
                tracing::warn!(job_id, "Job has no images, marking failed");
                self.finish(job_id, JobStatus::Failed, started).await;
                return;
            }
            Ok(images) => images,
            Err(e) => {
                tracing::error!(job_id, error = %e, "Failed to load job images");
                self.finish(job_id, JobStatus::Failed, started).await;
                return;
            }
        };

        tracing::info!(job_id, images = images.len(), "Processing job");

        let permits = Arc::new(Semaphore::new(self.max_concurrent_images));
        let mut tasks = JoinSet::new();
        for image in images {
            tasks.spawn(process_image(
                self.db.clone(),
                Arc::clone(&self.analyzer),
                Arc::clone(&permits),
                self.image_timeout,
                job_id,
                image,
            ));
        }

        let mut outcomes = Vec::with_capacity(tasks.len());
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(succeeded) => outcomes.push(succeeded),
                Err(e) => {
                    tracing::error!(job_id, error = %e, "Image task did not finish");
                    outcomes.push(false);
                }
            }
        }

        self.finish(job_id, JobStatus::aggregate(outcomes), started).await;
    }

    async fn finish(&self, job_id: i64, status: JobStatus, started: Instant) {
        match queries::update_job_status(&self.db, job_id, status).await {
            Ok(true) => {
                let elapsed = started.elapsed();
                metrics::histogram!("visit_job_processing_seconds").record(elapsed.as_secs_f64());
                match status {
                    JobStatus::Completed => {
                        metrics::counter!("visit_jobs_completed_total").increment(1)
                    }
                    _ => metrics::counter!("visit_jobs_failed_total").increment(1),
                }
                tracing::info!(
                    job_id,
                    status = %status,
                    duration_ms = elapsed.as_millis() as u64,
                    "Job finished"
                );
            }
            Ok(false) => {
                tracing::warn!(job_id, status = %status, "Job missing or already terminal")
            }
            Err(e) => {
                tracing::error!(job_id, status = %status, error = %e, "Failed to persist job status")
            }
        }
    }
}

async fn process_image(
    db: SqlitePool,
    analyzer: Arc<dyn ImageAnalyzer>,
    permits: Arc<Semaphore>,
    image_timeout: Duration,
    job_id: i64,
    image: PendingImage,
) -> bool {
    let _permit = match permits.acquire_owned().await {
        Ok(permit) => permit,
        Err(e) => {
            tracing::error!(job_id, image_id = image.id, error = %e, "Concurrency limiter closed");
            return false;
        }
    };

    // A panicking analyzer still has to leave a terminal status behind.
    let analysis = AssertUnwindSafe(analyzer.analyze(&image.image_url)).catch_unwind();
    let succeeded = match tokio::time::timeout(image_timeout, analysis).await {
        Ok(Ok(succeeded)) => succeeded,
        Ok(Err(_)) => {
            tracing::error!(job_id, image_id = image.id, "Image analysis panicked");
            false
        }
        Err(_) => {
            tracing::warn!(
                job_id,
                image_id = image.id,
                timeout_ms = image_timeout.as_millis() as u64,
                "Image processing timed out"
            );
            false
        }
    };

    let status = JobStatus::from_outcome(succeeded);
    metrics::counter!("visit_images_processed_total", "outcome" => status.to_string()).increment(1);

    if let Err(e) = queries::update_image_status(&db, image.id, status).await {
        tracing::error!(job_id, image_id = image.id, error = %e, "Failed to persist image status");
    } else {
        tracing::debug!(job_id, image_id = image.id, status = %status, "Image processed");
    }

    succeeded
}
