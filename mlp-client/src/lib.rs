//! ML Platform Client
//!
//! SDK for submitting and tracking batch jobs on the platform's Kubernetes
//! cluster, and for the handful of cluster operations the CLI exposes.
//!
//! All cluster access goes through the [`Orchestrator`] trait. The default
//! implementation, [`Kubectl`], runs the `kubectl` binary.
//!
//! # Example
//!
//! ```no_run
//! use mlp_client::{PlatformClient, PlatformConfig};
//! use mlp_core::domain::job::JobSpec;
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = PlatformClient::connect(PlatformConfig::new("my-project")).await?;
//!
//!     let job = client
//!         .submit(JobSpec::new("stellar", "img:v1").with_ttl_seconds(3600))
//!         .await?;
//!     println!("Submitted {}", job.name());
//!
//!     job.wait(Duration::from_secs(3600)).await?;
//!     println!("Finished: {}", job.status().await?);
//!     Ok(())
//! }
//! ```

mod cluster;
pub mod config;
pub mod error;
mod jobs;
pub mod kubectl;
pub mod logs;
pub mod orchestrator;

mod handle;

#[cfg(test)]
mod fake;

// Re-export commonly used types
pub use config::PlatformConfig;
pub use error::{ClientError, Result};
pub use handle::JobHandle;
pub use kubectl::Kubectl;
pub use logs::LogStream;
pub use orchestrator::Orchestrator;

use std::sync::Arc;

/// Entry point of the SDK
///
/// Cheap to clone. Methods are grouped by concern:
/// - Job submission and management (submit, handle, list, delete, cleanup)
/// - Cluster operations (Ray scaling, status summary)
#[derive(Clone)]
pub struct PlatformClient {
    config: Arc<PlatformConfig>,
    orchestrator: Arc<dyn Orchestrator>,
}

impl PlatformClient {
    /// Creates a client backed by kubectl
    ///
    /// Validates the configuration and resolves the kube context (explicit
    /// or discovered).
    pub async fn connect(config: PlatformConfig) -> Result<Self> {
        config.validate()?;
        let kubectl = Kubectl::from_config(&config).await?;
        Self::with_orchestrator(config, Arc::new(kubectl))
    }

    /// Creates a client over a custom orchestration API implementation
    pub fn with_orchestrator(
        config: PlatformConfig,
        orchestrator: Arc<dyn Orchestrator>,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config: Arc::new(config),
            orchestrator,
        })
    }

    pub fn config(&self) -> &PlatformConfig {
        &self.config
    }
}

impl std::fmt::Debug for PlatformClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlatformClient")
            .field("config", &self.config)
            .finish()
    }
}
