//! Job submission and management

use chrono::{DateTime, Local, TimeZone};
use mlp_core::domain::job::{JobIdentity, JobSpec};
use mlp_core::dto::manifest::JobManifest;
use mlp_core::dto::object::JobObject;
use std::fmt;
use tracing::{debug, info, warn};

use crate::PlatformClient;
use crate::error::Result;
use crate::handle::JobHandle;

impl PlatformClient {
    // =============================================================================
    // Submission
    // =============================================================================

    /// Submits a job
    ///
    /// Derives the job name from `spec.name_prefix` and the current time,
    /// applies the manifest, and returns a handle once the apply is
    /// acknowledged. A rejected manifest fails with `Submission` carrying the
    /// orchestration API's diagnostic. Nothing is retried.
    pub async fn submit(&self, spec: JobSpec) -> Result<JobHandle> {
        self.submit_at(spec, &Local::now()).await
    }

    pub(crate) async fn submit_at<Tz>(&self, spec: JobSpec, at: &DateTime<Tz>) -> Result<JobHandle>
    where
        Tz: TimeZone,
        Tz::Offset: fmt::Display,
    {
        spec.validate()?;

        let identity = JobIdentity::derive(&spec.name_prefix, &spec.namespace, at);
        let manifest = self.build_manifest(&identity, &spec)?;

        debug!("Submitting job {} with image {}", identity, spec.image);
        self.orchestrator.apply(&manifest).await?;
        info!("Job submitted: {}", identity);

        Ok(JobHandle::new(identity, self.orchestrator.clone()))
    }

    /// Builds the manifest `submit` would apply for `spec` under `identity`
    ///
    /// Warns when the caller's env shadows an injected default.
    pub fn build_manifest(&self, identity: &JobIdentity, spec: &JobSpec) -> Result<JobManifest> {
        let platform_env = self.config.platform_env()?;

        let collisions = spec.env_collisions(platform_env.iter().map(|e| e.name.as_str()));
        for key in &collisions {
            warn!(
                "Job {} overrides platform environment variable {}",
                identity, key
            );
        }

        Ok(JobManifest::build(
            identity,
            spec,
            &self.config.service_account,
            &platform_env,
        ))
    }

    // =============================================================================
    // Existing jobs
    // =============================================================================

    /// Handle to an existing job
    ///
    /// # Arguments
    /// * `name` - Full job name
    /// * `namespace` - Namespace, or the configured default when `None`
    pub fn handle(&self, name: &str, namespace: Option<&str>) -> JobHandle {
        let namespace = namespace.unwrap_or(&self.config.namespace);
        JobHandle::new(
            JobIdentity::new(name, namespace),
            self.orchestrator.clone(),
        )
    }

    /// Lists all jobs in a namespace
    pub async fn list_jobs(&self, namespace: &str) -> Result<Vec<JobObject>> {
        self.orchestrator.list(namespace).await
    }

    /// Deletes a job by name
    ///
    /// Unlike [`JobHandle::delete`], a missing job is an error here.
    pub async fn delete_job(&self, name: &str, namespace: &str) -> Result<()> {
        let identity = JobIdentity::new(name, namespace);
        self.orchestrator.delete(&identity).await?;
        info!("Deleted job {}", identity);
        Ok(())
    }

    /// Deletes every finished (succeeded or failed) job in a namespace
    ///
    /// Jobs that fail to delete are skipped.
    ///
    /// # Returns
    /// The number of jobs deleted
    pub async fn cleanup_completed_jobs(&self, namespace: &str) -> Result<usize> {
        let jobs = self.list_jobs(namespace).await?;
        let mut deleted = 0;

        for job in jobs.iter().filter(|job| job.is_finished()) {
            let identity = job.identity(namespace);
            match self.orchestrator.delete(&identity).await {
                Ok(()) => {
                    debug!("Deleted finished job {}", identity);
                    deleted += 1;
                }
                Err(e) => warn!("Failed to delete job {}: {}", identity, e),
            }
        }

        info!("Cleaned up {} finished job(s) in {}", deleted, namespace);
        Ok(deleted)
    }
}
