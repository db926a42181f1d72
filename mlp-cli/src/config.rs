//! Configuration module
//!
//! Global CLI settings and how they become a [`PlatformConfig`].

use anyhow::{Context, Result, bail};
use mlp_client::{PlatformClient, PlatformConfig};
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

/// CLI configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// GCP project; resolved through gcloud when absent and needed
    pub project: Option<String>,
    pub region: String,
    /// Namespace jobs live in
    pub namespace: String,
    /// Explicit kube context; discovered when absent
    pub context: Option<String>,
    /// kubectl binary
    pub kubectl: String,
}

impl Config {
    /// Resolves the platform configuration
    ///
    /// # Arguments
    /// * `require_project` - Ask gcloud for the project if none was given
    pub async fn platform_config(&self, require_project: bool) -> Result<PlatformConfig> {
        let project = match &self.project {
            Some(project) => project.clone(),
            None if require_project => gcloud_project().await?,
            None => String::new(),
        };

        Ok(PlatformConfig::new(project)
            .with_region(&self.region)
            .with_namespace(&self.namespace)
            .with_kube_context(self.context.clone())
            .with_kubectl_path(&self.kubectl))
    }

    /// Connects a platform client
    pub async fn client(&self, require_project: bool) -> Result<PlatformClient> {
        let config = self.platform_config(require_project).await?;
        PlatformClient::connect(config)
            .await
            .context("Failed to connect to the platform")
    }
}

/// Reads the active project from `gcloud config get-value project`
async fn gcloud_project() -> Result<String> {
    let output = Command::new("gcloud")
        .args(["config", "get-value", "project"])
        .stdin(Stdio::null())
        .stderr(Stdio::null())
        .output()
        .await
        .context("Failed to execute 'gcloud config get-value project'. Is the Google Cloud SDK installed?")?;

    let project = String::from_utf8_lossy(&output.stdout).trim().to_string();
    debug!("gcloud project: '{}'", project);

    if !output.status.success() || project.is_empty() || project == "(unset)" {
        bail!(
            "No GCP project configured. Run: gcloud config set project PROJECT_ID (or pass --project)"
        );
    }

    Ok(project)
}
