use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

/// Lifecycle status shared by jobs and images.
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum JobStatus {
    Ongoing,
    Completed,
    Failed,
}

impl JobStatus {
    /// Terminal status for a single image outcome.
    pub fn from_outcome(succeeded: bool) -> Self {
        if succeeded {
            JobStatus::Completed
        } else {
            JobStatus::Failed
        }
    }

    /// Roll image outcomes up into a job status.
    ///
    /// A job completes only if it had at least one image and every image
    /// succeeded. An empty outcome set fails the job.
    pub fn aggregate<I>(outcomes: I) -> Self
    where
        I: IntoIterator<Item = bool>,
    {
        let mut seen_any = false;
        for succeeded in outcomes {
            if !succeeded {
                return JobStatus::Failed;
            }
            seen_any = true;
        }
        Self::from_outcome(seen_any)
    }

    pub fn is_terminal(self) -> bool {
        self != JobStatus::Ongoing
    }
}

/// A job row.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Job {
    pub id: i64,
    pub status: JobStatus,
}

/// An image row scheduled for processing, already resolved through its visit.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PendingImage {
    pub id: i64,
    pub image_url: String,
}
