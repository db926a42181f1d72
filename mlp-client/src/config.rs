//! Platform configuration
//!
//! Everything the client needs to know about the target platform: the GCP
//! project behind the artifact bucket and registry, where jobs and the Ray
//! cluster live, and how to reach `kubectl`. Passed explicitly to
//! [`PlatformClient`](crate::PlatformClient) so nothing is read from globals.

use mlp_core::domain::job::DEFAULT_NAMESPACE;
use mlp_core::dto::manifest::EnvVar;

use crate::error::{ClientError, Result};

pub const DEFAULT_REGION: &str = "us-central1";
pub const DEFAULT_SERVICE_ACCOUNT: &str = "job-runner";
pub const DEFAULT_RAY_NAMESPACE: &str = "ray-system";
pub const DEFAULT_RAY_CLUSTER: &str = "ray-cluster-kuberay";
pub const DEFAULT_RAY_HEAD_SERVICE: &str = "ray-cluster-head-svc";
pub const DEFAULT_RAY_CLIENT_PORT: u16 = 10001;
pub const DEFAULT_PREFERRED_CONTEXT: &str = "workload";
pub const DEFAULT_KUBECTL: &str = "kubectl";

/// Env var injected with the Ray client address
pub const RAY_ADDRESS_ENV: &str = "RAY_ADDRESS";

/// Env var injected with the artifact bucket
pub const GCS_BUCKET_ENV: &str = "GCS_BUCKET";

/// Platform configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformConfig {
    /// GCP project; required for submissions (bucket and registry derive from it)
    pub project_id: String,

    /// Artifact Registry region
    pub region: String,

    /// Namespace jobs are submitted to and listed from
    pub namespace: String,

    /// Service account job pods run as
    pub service_account: String,

    /// Namespace of the Ray cluster
    pub ray_namespace: String,

    /// Name of the RayCluster resource scaled by `scale_ray`
    pub ray_cluster_name: String,

    /// Head service the injected `RAY_ADDRESS` points at
    pub ray_head_service: String,

    pub ray_client_port: u16,

    /// Explicit kube context; skips context discovery when set
    pub kube_context: Option<String>,

    /// Context used when it exists in the kubeconfig
    pub preferred_context: String,

    /// Path or name of the kubectl binary
    pub kubectl_path: String,
}

impl PlatformConfig {
    /// Creates a configuration with defaults for everything but the project
    pub fn new(project_id: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            region: DEFAULT_REGION.to_string(),
            namespace: DEFAULT_NAMESPACE.to_string(),
            service_account: DEFAULT_SERVICE_ACCOUNT.to_string(),
            ray_namespace: DEFAULT_RAY_NAMESPACE.to_string(),
            ray_cluster_name: DEFAULT_RAY_CLUSTER.to_string(),
            ray_head_service: DEFAULT_RAY_HEAD_SERVICE.to_string(),
            ray_client_port: DEFAULT_RAY_CLIENT_PORT,
            kube_context: None,
            preferred_context: DEFAULT_PREFERRED_CONTEXT.to_string(),
            kubectl_path: DEFAULT_KUBECTL.to_string(),
        }
    }

    /// Creates configuration from environment variables
    ///
    /// Expected environment variables:
    /// - MLP_PROJECT_ID (required)
    /// - MLP_REGION (optional, default: us-central1)
    /// - MLP_NAMESPACE (optional, default: jobs)
    /// - MLP_KUBE_CONTEXT (optional)
    /// - MLP_KUBECTL (optional, default: kubectl)
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with a custom variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let project_id = lookup("MLP_PROJECT_ID")
            .filter(|v| !v.is_empty())
            .ok_or_else(|| {
                ClientError::InvalidConfig("MLP_PROJECT_ID environment variable not set".into())
            })?;

        let mut config = Self::new(project_id);
        if let Some(region) = lookup("MLP_REGION") {
            config.region = region;
        }
        if let Some(namespace) = lookup("MLP_NAMESPACE") {
            config.namespace = namespace;
        }
        config.kube_context = lookup("MLP_KUBE_CONTEXT").filter(|v| !v.is_empty());
        if let Some(kubectl) = lookup("MLP_KUBECTL") {
            config.kubectl_path = kubectl;
        }

        Ok(config)
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    pub fn with_kube_context(mut self, context: Option<String>) -> Self {
        self.kube_context = context;
        self
    }

    pub fn with_kubectl_path(mut self, path: impl Into<String>) -> Self {
        self.kubectl_path = path.into();
        self
    }

    /// Validates the configuration
    ///
    /// The project is not checked here; operations that need it call
    /// [`require_project`](Self::require_project).
    pub fn validate(&self) -> Result<()> {
        let required = [
            ("region", &self.region),
            ("namespace", &self.namespace),
            ("service_account", &self.service_account),
            ("ray_namespace", &self.ray_namespace),
            ("ray_cluster_name", &self.ray_cluster_name),
            ("ray_head_service", &self.ray_head_service),
            ("kubectl_path", &self.kubectl_path),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(ClientError::InvalidConfig(format!(
                    "{} cannot be empty",
                    field
                )));
            }
        }

        if self.ray_client_port == 0 {
            return Err(ClientError::InvalidConfig(
                "ray_client_port must be greater than 0".into(),
            ));
        }

        Ok(())
    }

    pub fn require_project(&self) -> Result<&str> {
        let project = self.project_id.trim();
        if project.is_empty() {
            return Err(ClientError::InvalidConfig(
                "no GCP project configured".into(),
            ));
        }
        Ok(project)
    }

    /// Artifact Registry repository for workload images
    pub fn registry(&self) -> Result<String> {
        Ok(format!(
            "{}-docker.pkg.dev/{}/ml-platform-ml",
            self.region,
            self.require_project()?
        ))
    }

    /// Full image reference for `workload:version`
    pub fn image_for(&self, workload: &str, version: &str) -> Result<String> {
        Ok(format!("{}/{}:{}", self.registry()?, workload, version))
    }

    pub fn ray_address(&self) -> String {
        format!(
            "ray://{}.{}.svc.cluster.local:{}",
            self.ray_head_service, self.ray_namespace, self.ray_client_port
        )
    }

    pub fn artifact_bucket(&self) -> Result<String> {
        Ok(format!("gs://{}-ml-artifacts", self.require_project()?))
    }

    /// Environment injected into every job ahead of the caller's entries
    pub fn platform_env(&self) -> Result<Vec<EnvVar>> {
        Ok(vec![
            EnvVar::new(RAY_ADDRESS_ENV, self.ray_address()),
            EnvVar::new(GCS_BUCKET_ENV, self.artifact_bucket()?),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = PlatformConfig::new("proj");
        assert_eq!(config.namespace, "jobs");
        assert_eq!(config.service_account, "job-runner");
        assert_eq!(config.preferred_context, "workload");
        assert!(config.kube_context.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_derived_values() {
        let config = PlatformConfig::new("proj");
        assert_eq!(
            config.ray_address(),
            "ray://ray-cluster-head-svc.ray-system.svc.cluster.local:10001"
        );
        assert_eq!(config.artifact_bucket().unwrap(), "gs://proj-ml-artifacts");
        assert_eq!(
            config.image_for("stellar_optimization", "v1").unwrap(),
            "us-central1-docker.pkg.dev/proj/ml-platform-ml/stellar_optimization:v1"
        );

        let env = config.platform_env().unwrap();
        assert_eq!(env[0].name, "RAY_ADDRESS");
        assert_eq!(env[1], EnvVar::new("GCS_BUCKET", "gs://proj-ml-artifacts"));
    }

    #[test]
    fn test_missing_project() {
        let config = PlatformConfig::new("");
        assert!(config.validate().is_ok());
        assert!(matches!(
            config.platform_env(),
            Err(ClientError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_validation() {
        let mut config = PlatformConfig::new("proj");
        config.namespace = String::new();
        assert!(config.validate().is_err());

        config.namespace = "jobs".into();
        config.ray_client_port = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_lookup() {
        let vars: HashMap<&str, &str> = [
            ("MLP_PROJECT_ID", "proj"),
            ("MLP_REGION", "europe-west3"),
            ("MLP_KUBE_CONTEXT", "management"),
        ]
        .into_iter()
        .collect();

        let config =
            PlatformConfig::from_lookup(|key| vars.get(key).map(|v| v.to_string())).unwrap();
        assert_eq!(config.project_id, "proj");
        assert_eq!(config.region, "europe-west3");
        assert_eq!(config.namespace, "jobs");
        assert_eq!(config.kube_context.as_deref(), Some("management"));
        assert_eq!(config.kubectl_path, "kubectl");
    }

    #[test]
    fn test_from_lookup_requires_project() {
        assert!(PlatformConfig::from_lookup(|_| None).is_err());
    }
}
