//! Job handle
//!
//! A [`JobHandle`] is a reference to a submitted job. It holds no state of
//! its own beyond the job's identity; every call goes back to the
//! orchestration API.

use mlp_core::domain::job::{JobIdentity, JobState};
use mlp_core::dto::object::JobObject;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

use crate::error::Result;
use crate::logs::LogStream;
use crate::orchestrator::{COMPLETE_CONDITION, Orchestrator};

/// Reference to a submitted job
#[derive(Clone)]
pub struct JobHandle {
    identity: JobIdentity,
    orchestrator: Arc<dyn Orchestrator>,
}

impl JobHandle {
    /// Binds a handle to an existing job
    pub fn new(identity: JobIdentity, orchestrator: Arc<dyn Orchestrator>) -> Self {
        Self {
            identity,
            orchestrator,
        }
    }

    pub fn identity(&self) -> &JobIdentity {
        &self.identity
    }

    pub fn name(&self) -> &str {
        &self.identity.name
    }

    pub fn namespace(&self) -> &str {
        &self.identity.namespace
    }

    /// Current state of the job
    ///
    /// A job that has not reported a condition yet is `Unknown`. A job that does
    /// not exist fails with `NotFound`.
    pub async fn status(&self) -> Result<JobState> {
        let object = self.orchestrator.get(&self.identity).await?;
        Ok(object.state())
    }

    /// The raw job object as reported by the orchestration API
    pub async fn describe(&self) -> Result<JobObject> {
        self.orchestrator.get(&self.identity).await
    }

    /// Logs produced so far
    pub async fn logs(&self) -> Result<Vec<String>> {
        self.orchestrator.logs(&self.identity).await
    }

    /// Follows the logs
    ///
    /// The stream ends when the job's log stream closes. Drop it to stop
    /// following.
    pub async fn follow_logs(&self) -> Result<LogStream> {
        self.orchestrator.stream_logs(&self.identity).await
    }

    /// Waits for the job to complete
    ///
    /// Delegates to the orchestration API's own wait. A zero timeout checks
    /// once. Fails with `WaitTimeout` when completion is not observed.
    pub async fn wait(&self, timeout: Duration) -> Result<()> {
        debug!("Waiting up to {:?} for job {}", timeout, self.identity);
        self.orchestrator
            .wait_for_condition(&self.identity, COMPLETE_CONDITION, timeout)
            .await
    }

    /// Deletes the job
    ///
    /// A job that is already gone counts as deleted. Any other failure from
    /// the orchestration API is returned.
    pub async fn delete(&self) -> Result<()> {
        match self.orchestrator.delete(&self.identity).await {
            Ok(()) => {
                info!("Deleted job {}", self.identity);
                Ok(())
            }
            Err(e) if e.is_not_found() => {
                debug!("Job {} already absent: {}", self.identity, e);
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}

impl std::fmt::Debug for JobHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobHandle")
            .field("identity", &self.identity)
            .finish()
    }
}
