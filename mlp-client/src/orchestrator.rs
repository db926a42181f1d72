//! Orchestration API seam
//!
//! The narrow set of operations the SDK needs from the cluster. The
//! production implementation is [`Kubectl`](crate::kubectl::Kubectl); tests
//! substitute an in-memory fake.

use async_trait::async_trait;
use mlp_core::domain::job::JobIdentity;
use mlp_core::domain::resource::{ResourceQuery, ResourceRef};
use mlp_core::dto::manifest::JobManifest;
use mlp_core::dto::object::JobObject;
use std::time::Duration;

use crate::error::Result;
use crate::logs::LogStream;

/// Condition `wait_for_condition` uses for job completion
pub const COMPLETE_CONDITION: &str = "complete";

/// Operations on the orchestration API
///
/// Implementations surface collaborator diagnostics verbatim and never retry.
#[async_trait]
pub trait Orchestrator: Send + Sync {
    /// Declaratively applies a Job manifest
    ///
    /// Fails with `Submission` when the API rejects it.
    async fn apply(&self, manifest: &JobManifest) -> Result<()>;

    /// Reads a job; `NotFound` when it does not exist
    async fn get(&self, id: &JobIdentity) -> Result<JobObject>;

    /// Lists jobs in a namespace
    async fn list(&self, namespace: &str) -> Result<Vec<JobObject>>;

    /// Deletes a job; `NotFound` when it does not exist
    async fn delete(&self, id: &JobIdentity) -> Result<()>;

    /// Blocks until the job reports `condition` or `timeout` elapses
    ///
    /// A zero timeout checks once. Fails with `WaitTimeout` on expiry.
    async fn wait_for_condition(
        &self,
        id: &JobIdentity,
        condition: &str,
        timeout: Duration,
    ) -> Result<()>;

    /// Current logs of the job's pod
    async fn logs(&self, id: &JobIdentity) -> Result<Vec<String>>;

    /// Follows the job's logs until the stream closes
    async fn stream_logs(&self, id: &JobIdentity) -> Result<LogStream>;

    /// Applies a JSON patch (RFC 6902) to a resource
    async fn patch(&self, target: &ResourceRef, patch: &serde_json::Value) -> Result<()>;

    /// Number of resources matching the query
    async fn count(&self, query: &ResourceQuery) -> Result<usize>;
}
