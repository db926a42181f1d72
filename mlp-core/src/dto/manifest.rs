//! `batch/v1` Job manifest
//!
//! Only the fields the platform sets are modelled. The manifest is applied as
//! JSON through `kubectl apply -f -`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::domain::job::{JobIdentity, JobSpec, ResourceRequirements};

pub const API_VERSION: &str = "batch/v1";
pub const KIND: &str = "Job";

/// Name of the single container in every job pod
pub const CONTAINER_NAME: &str = "worker";

/// Failed pods are not restarted in place; the Job controller re-creates
/// them until `backoffLimit` is exhausted
pub const RESTART_POLICY: &str = "Never";

/// A `name`/`value` environment entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvVar {
    pub name: String,
    pub value: String,
}

impl EnvVar {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobManifest {
    pub api_version: String,
    pub kind: String,
    pub metadata: ManifestMetadata,
    pub spec: JobManifestSpec,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestMetadata {
    pub name: String,
    pub namespace: String,
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobManifestSpec {
    pub ttl_seconds_after_finished: u32,
    pub backoff_limit: u32,
    pub template: PodTemplate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PodTemplate {
    pub spec: PodSpec,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PodSpec {
    pub restart_policy: String,
    pub service_account_name: String,
    pub containers: Vec<Container>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Container {
    pub name: String,
    pub image: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<Vec<String>>,
    #[serde(default)]
    pub env: Vec<EnvVar>,
    pub resources: ResourceRequirements,
}

impl JobManifest {
    /// Builds the manifest for `spec` under `identity`
    ///
    /// # Arguments
    /// * `identity` - Derived job name and namespace
    /// * `spec` - The caller's job description
    /// * `service_account` - Execution identity for the job pods
    /// * `platform_env` - Injected defaults, emitted before the caller's env
    ///
    /// Duplicate keys are kept in order; the orchestration API resolves them
    /// last-wins, so caller values override injected ones.
    pub fn build(
        identity: &JobIdentity,
        spec: &JobSpec,
        service_account: &str,
        platform_env: &[EnvVar],
    ) -> Self {
        let env = platform_env
            .iter()
            .cloned()
            .chain(spec.env.iter().map(|(k, v)| EnvVar::new(k, v)))
            .collect();

        let mut labels = BTreeMap::new();
        labels.insert("app".to_string(), spec.name_prefix.clone());

        Self {
            api_version: API_VERSION.to_string(),
            kind: KIND.to_string(),
            metadata: ManifestMetadata {
                name: identity.name.clone(),
                namespace: identity.namespace.clone(),
                labels,
            },
            spec: JobManifestSpec {
                ttl_seconds_after_finished: spec.ttl_seconds,
                backoff_limit: spec.backoff_limit,
                template: PodTemplate {
                    spec: PodSpec {
                        restart_policy: RESTART_POLICY.to_string(),
                        service_account_name: service_account.to_string(),
                        containers: vec![Container {
                            name: CONTAINER_NAME.to_string(),
                            image: spec.image.clone(),
                            command: spec.command.clone(),
                            env,
                            resources: spec.resources.clone(),
                        }],
                    },
                },
            },
        }
    }

    pub fn identity(&self) -> JobIdentity {
        JobIdentity::new(&self.metadata.name, &self.metadata.namespace)
    }

    /// The worker container
    pub fn container(&self) -> Option<&Container> {
        self.spec.template.spec.containers.first()
    }

    /// Environment as the container will see it (last entry wins per key)
    pub fn effective_env(&self) -> BTreeMap<String, String> {
        self.container()
            .map(|c| {
                c.env
                    .iter()
                    .map(|e| (e.name.clone(), e.value.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn platform_env() -> Vec<EnvVar> {
        vec![
            EnvVar::new(
                "RAY_ADDRESS",
                "ray://ray-cluster-head-svc.ray-system.svc.cluster.local:10001",
            ),
            EnvVar::new("GCS_BUCKET", "gs://proj-ml-artifacts"),
        ]
    }

    #[test]
    fn test_manifest_shape() {
        let spec = JobSpec::new("stellar", "img:v1")
            .with_ttl_seconds(3600)
            .with_backoff_limit(2);
        let id = JobIdentity::new("stellar-20251201-120000", "jobs");
        let manifest = JobManifest::build(&id, &spec, "job-runner", &platform_env());

        let value = serde_json::to_value(&manifest).unwrap();
        assert_eq!(value["apiVersion"], "batch/v1");
        assert_eq!(value["kind"], "Job");
        assert_eq!(value["metadata"]["name"], "stellar-20251201-120000");
        assert_eq!(value["metadata"]["labels"]["app"], "stellar");
        assert_eq!(value["spec"]["ttlSecondsAfterFinished"], 3600);
        assert_eq!(value["spec"]["backoffLimit"], 2);

        let pod = &value["spec"]["template"]["spec"];
        assert_eq!(pod["restartPolicy"], "Never");
        assert_eq!(pod["serviceAccountName"], "job-runner");
        assert_eq!(pod["containers"][0]["name"], "worker");
        assert!(pod["containers"][0].get("command").is_none());
        assert_eq!(
            pod["containers"][0]["resources"],
            json!({
                "requests": {"cpu": "4", "memory": "16Gi"},
                "limits": {"cpu": "8", "memory": "32Gi"}
            })
        );
    }

    #[test]
    fn test_command_is_emitted_when_set() {
        let spec = JobSpec::new("stellar", "img:v1").with_command(["python", "train.py"]);
        let id = JobIdentity::new("stellar-x", "jobs");
        let manifest = JobManifest::build(&id, &spec, "job-runner", &[]);

        let value = serde_json::to_value(&manifest).unwrap();
        assert_eq!(
            value["spec"]["template"]["spec"]["containers"][0]["command"],
            json!(["python", "train.py"])
        );
    }

    #[test]
    fn test_platform_env_comes_first() {
        let spec = JobSpec::new("stellar", "img:v1").with_env("EPOCHS", "5");
        let id = JobIdentity::new("stellar-x", "jobs");
        let manifest = JobManifest::build(&id, &spec, "job-runner", &platform_env());

        let names: Vec<_> = manifest
            .container()
            .unwrap()
            .env
            .iter()
            .map(|e| e.name.as_str())
            .collect();
        assert_eq!(names, vec!["RAY_ADDRESS", "GCS_BUCKET", "EPOCHS"]);
    }

    #[test]
    fn test_caller_env_wins_on_collision() {
        let spec = JobSpec::new("stellar", "img:v1").with_env("GCS_BUCKET", "gs://override");
        let id = JobIdentity::new("stellar-x", "jobs");
        let manifest = JobManifest::build(&id, &spec, "job-runner", &platform_env());

        assert_eq!(manifest.container().unwrap().env.len(), 3);
        let env = manifest.effective_env();
        assert_eq!(env["GCS_BUCKET"], "gs://override");
        assert!(env["RAY_ADDRESS"].starts_with("ray://"));
    }

    #[test]
    fn test_manifest_json_parses_back() {
        let spec = JobSpec::new("stellar", "img:v1");
        let id = JobIdentity::new("stellar-x", "ml");
        let manifest = JobManifest::build(&id, &spec, "job-runner", &platform_env());

        let parsed: JobManifest = serde_json::from_str(&manifest.to_json().unwrap()).unwrap();
        assert_eq!(parsed.identity(), id);
    }
}
