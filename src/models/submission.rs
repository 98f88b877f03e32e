use garde::Validate;
use serde::{Deserialize, Deserializer, Serialize};

use crate::models::job::{Job, JobStatus};

/// Batch of store visits submitted as one job.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SubmitRequest {
    /// Informational only, never compared against `visits.len()`.
    #[serde(default, deserialize_with = "null_as_default")]
    #[garde(skip)]
    pub count: i64,

    #[serde(default, deserialize_with = "null_as_default")]
    #[garde(dive)]
    pub visits: Vec<VisitInput>,
}

impl SubmitRequest {
    pub fn image_count(&self) -> usize {
        self.visits.iter().map(|v| v.image_url.len()).sum()
    }
}

/// One store's entry within a submission.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct VisitInput {
    /// Absent or null decodes to empty, which validation then rejects.
    #[serde(default, deserialize_with = "null_as_default")]
    #[garde(length(min = 1))]
    pub store_id: String,

    #[serde(default, deserialize_with = "null_as_default")]
    #[garde(inner(length(min = 1)))]
    pub image_url: Vec<String>,

    #[serde(default)]
    #[garde(skip)]
    pub visit_time: Option<String>,
}

/// Explicit `null` decodes the same as an absent field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Response after a batch has been accepted.
#[derive(Debug, Serialize, Deserialize)]
pub struct SubmitResponse {
    pub job_id: i64,
}

/// Response for a job status lookup.
#[derive(Debug, Serialize, Deserialize)]
pub struct JobStatusResponse {
    pub job_id: i64,
    pub status: JobStatus,
}

impl From<Job> for JobStatusResponse {
    fn from(job: Job) -> Self {
        Self {
            job_id: job.id,
            status: job.status,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal_payload() {
        let req: SubmitRequest = serde_json::from_str(
            r#"{"count":1,"visits":[{"store_id":"S1","image_url":["u1","u2"]}]}"#,
        )
        .unwrap();
        assert_eq!(req.count, 1);
        assert_eq!(req.visits.len(), 1);
        assert_eq!(req.visits[0].visit_time, None);
        assert_eq!(req.image_count(), 2);
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_count_is_not_checked_against_visits() {
        let req: SubmitRequest = serde_json::from_str(
            r#"{"count":7,"visits":[{"store_id":"S1","image_url":["u1"],"visit_time":"2024-01-01"}]}"#,
        )
        .unwrap();
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_empty_store_id_rejected() {
        let req: SubmitRequest =
            serde_json::from_str(r#"{"visits":[{"store_id":"","image_url":["u1"]}]}"#).unwrap();
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_empty_image_reference_rejected() {
        let req: SubmitRequest =
            serde_json::from_str(r#"{"visits":[{"store_id":"S1","image_url":["u1",""]}]}"#)
                .unwrap();
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_wrong_types_fail_to_parse() {
        assert!(serde_json::from_str::<SubmitRequest>(r#"{"visits":"nope"}"#).is_err());
        assert!(serde_json::from_str::<SubmitRequest>(r#"{"visits":[{"store_id":7}]}"#).is_err());
        assert!(serde_json::from_str::<SubmitRequest>(r#"{"count":"1"}"#).is_err());
    }

    #[test]
    fn test_nulls_decode_as_empty() {
        let req: SubmitRequest =
            serde_json::from_str(r#"{"count":null,"visits":null}"#).unwrap();
        assert_eq!(req.count, 0);
        assert!(req.visits.is_empty());

        let req: SubmitRequest = serde_json::from_str(
            r#"{"visits":[{"store_id":"S1","image_url":null,"visit_time":null}]}"#,
        )
        .unwrap();
        assert!(req.visits[0].image_url.is_empty());
        assert_eq!(req.visits[0].visit_time, None);
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_missing_store_id_decodes_then_fails_validation() {
        for body in [
            r#"{"visits":[{"image_url":["u1"]}]}"#,
            r#"{"visits":[{"store_id":null,"image_url":["u1"]}]}"#,
        ] {
            let req: SubmitRequest = serde_json::from_str(body).unwrap();
            assert_eq!(req.visits[0].store_id, "");
            assert!(req.validate().is_err());
        }
    }
}
