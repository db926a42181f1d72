//! Job objects read back from the orchestration API
//!
//! Deserialised from `kubectl get job -o json`. Everything not listed here is
//! ignored, and every field is optional so partially populated objects (a job
//! created a moment ago has no status yet) still parse.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::domain::job::{JobIdentity, JobState};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobObject {
    #[serde(default)]
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub status: JobObjectStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObjectMeta {
    #[serde(default)]
    pub name: String,
    pub namespace: Option<String>,
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    pub creation_timestamp: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobObjectStatus {
    pub active: Option<u32>,
    pub ready: Option<u32>,
    pub succeeded: Option<u32>,
    pub failed: Option<u32>,
    pub start_time: Option<DateTime<Utc>>,
    pub completion_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub conditions: Vec<JobCondition>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobCondition {
    #[serde(rename = "type")]
    pub condition_type: String,
    #[serde(default)]
    pub status: String,
    pub reason: Option<String>,
    pub message: Option<String>,
}

/// `kubectl get jobs -o json` returns a `List`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobList {
    #[serde(default)]
    pub items: Vec<JobObject>,
}

impl JobObject {
    /// Observed state, taken from the first reported condition
    ///
    /// A job without conditions (including one with active pods) is Unknown.
    pub fn state(&self) -> JobState {
        self.status
            .conditions
            .first()
            .map(|first| JobState::from_condition(&first.condition_type))
            .unwrap_or(JobState::Unknown)
    }

    /// True once any pod has succeeded or failed
    pub fn is_finished(&self) -> bool {
        self.status.succeeded.unwrap_or(0) > 0 || self.status.failed.unwrap_or(0) > 0
    }

    pub fn is_succeeded(&self) -> bool {
        self.status.succeeded.unwrap_or(0) > 0
    }

    /// Identity of this object, falling back to `namespace` when the object
    /// does not carry one
    pub fn identity(&self, namespace: &str) -> JobIdentity {
        JobIdentity::new(
            &self.metadata.name,
            self.metadata.namespace.as_deref().unwrap_or(namespace),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(value: serde_json::Value) -> JobObject {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_fresh_job_is_unknown() {
        let job = parse(json!({
            "metadata": {"name": "stellar-20251201-120000", "namespace": "jobs"},
            "status": {}
        }));
        assert_eq!(job.state(), JobState::Unknown);
        assert!(!job.is_finished());
    }

    #[test]
    fn test_missing_status_is_unknown() {
        let job = parse(json!({"metadata": {"name": "x"}}));
        assert_eq!(job.state(), JobState::Unknown);
    }

    #[test]
    fn test_active_pods_without_conditions_are_unknown() {
        let job = parse(json!({"status": {"active": 1, "ready": 1}}));
        assert_eq!(job.state(), JobState::Unknown);
        assert!(!job.is_finished());
    }

    #[test]
    fn test_first_condition_decides() {
        let job = parse(json!({
            "metadata": {
                "name": "stellar-20251201-120000",
                "namespace": "jobs",
                "creationTimestamp": "2025-12-01T12:00:00Z",
                "labels": {"app": "stellar"},
                "uid": "ignored"
            },
            "status": {
                "succeeded": 1,
                "startTime": "2025-12-01T12:00:01Z",
                "completionTime": "2025-12-01T12:10:00Z",
                "conditions": [
                    {"type": "SuccessCriteriaMet", "status": "True"},
                    {"type": "Complete", "status": "True"}
                ]
            }
        }));
        assert_eq!(job.state(), JobState::Succeeded);
        assert!(job.is_finished());
        assert!(job.is_succeeded());
        assert_eq!(job.metadata.labels["app"], "stellar");
        assert!(job.metadata.creation_timestamp.is_some());
    }

    #[test]
    fn test_failed_job() {
        let job = parse(json!({
            "status": {
                "failed": 3,
                "conditions": [{"type": "Failed", "status": "True", "reason": "BackoffLimitExceeded"}]
            }
        }));
        assert_eq!(job.state(), JobState::Failed);
        assert!(job.is_finished());
        assert!(!job.is_succeeded());
        assert_eq!(
            job.status.conditions[0].reason.as_deref(),
            Some("BackoffLimitExceeded")
        );
    }

    #[test]
    fn test_unrecognized_condition() {
        let job = parse(json!({"status": {"active": 1, "conditions": [{"type": "Suspended"}]}}));
        assert_eq!(job.state(), JobState::Unknown);
    }

    #[test]
    fn test_identity_fallback_namespace() {
        let job = parse(json!({"metadata": {"name": "x"}}));
        assert_eq!(job.identity("jobs"), JobIdentity::new("x", "jobs"));
    }

    #[test]
    fn test_job_list() {
        let list: JobList = serde_json::from_value(json!({
            "apiVersion": "v1",
            "kind": "List",
            "items": [{"metadata": {"name": "a"}}, {"metadata": {"name": "b"}}]
        }))
        .unwrap();
        assert_eq!(list.items.len(), 2);
    }
}
