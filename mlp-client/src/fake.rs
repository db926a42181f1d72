//! In-memory orchestration API for tests
//!
//! Records what the SDK sends and serves scripted job objects, logs, counts
//! and failures back.

use async_trait::async_trait;
use mlp_core::domain::job::{JobIdentity, JobState};
use mlp_core::domain::resource::{ResourceQuery, ResourceRef};
use mlp_core::dto::manifest::JobManifest;
use mlp_core::dto::object::JobObject;
use serde_json::{Value, json};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

use crate::error::{ClientError, Result};
use crate::logs::LogStream;
use crate::orchestrator::Orchestrator;

#[derive(Default)]
pub struct FakeOrchestrator {
    state: Mutex<FakeState>,
}

#[derive(Default)]
struct FakeState {
    jobs: BTreeMap<JobIdentity, JobObject>,
    logs: HashMap<JobIdentity, Vec<String>>,
    applied: Vec<JobManifest>,
    deleted: Vec<JobIdentity>,
    patches: Vec<(ResourceRef, Value)>,
    counts: HashMap<ResourceQuery, usize>,
    apply_error: Option<String>,
    delete_error: Option<String>,
    undeletable: HashSet<String>,
}

fn not_found(id: &JobIdentity) -> ClientError {
    ClientError::NotFound(format!(
        "Error from server (NotFound): jobs.batch \"{}\" not found",
        id.name
    ))
}

impl FakeOrchestrator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a job with the given `status` block
    pub fn insert_job(&self, id: &JobIdentity, status: Value) {
        let object: JobObject = serde_json::from_value(json!({
            "metadata": {"name": id.name, "namespace": id.namespace},
            "status": status,
        }))
        .expect("valid job object");
        self.state.lock().unwrap().jobs.insert(id.clone(), object);
    }

    pub fn set_logs<I, S>(&self, id: &JobIdentity, lines: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.state
            .lock()
            .unwrap()
            .logs
            .insert(id.clone(), lines.into_iter().map(Into::into).collect());
    }

    pub fn set_count(&self, query: ResourceQuery, count: usize) {
        self.state.lock().unwrap().counts.insert(query, count);
    }

    /// Makes every apply fail with `message`
    pub fn fail_apply(&self, message: &str) {
        self.state.lock().unwrap().apply_error = Some(message.to_string());
    }

    /// Makes every delete fail with `message`
    pub fn fail_deletes(&self, message: &str) {
        self.state.lock().unwrap().delete_error = Some(message.to_string());
    }

    /// Makes deletes of the named job fail
    pub fn fail_delete_of(&self, name: &str) {
        self.state.lock().unwrap().undeletable.insert(name.to_string());
    }

    pub fn applied(&self) -> Vec<JobManifest> {
        self.state.lock().unwrap().applied.clone()
    }

    pub fn deleted(&self) -> Vec<JobIdentity> {
        self.state.lock().unwrap().deleted.clone()
    }

    pub fn patches(&self) -> Vec<(ResourceRef, Value)> {
        self.state.lock().unwrap().patches.clone()
    }

    fn job(&self, id: &JobIdentity) -> Result<JobObject> {
        self.state
            .lock()
            .unwrap()
            .jobs
            .get(id)
            .cloned()
            .ok_or_else(|| not_found(id))
    }

    fn job_logs(&self, id: &JobIdentity) -> Result<Vec<String>> {
        self.job(id)?;
        Ok(self
            .state
            .lock()
            .unwrap()
            .logs
            .get(id)
            .cloned()
            .unwrap_or_default())
    }
}

#[async_trait]
impl Orchestrator for FakeOrchestrator {
    async fn apply(&self, manifest: &JobManifest) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if let Some(message) = &state.apply_error {
            return Err(ClientError::Submission {
                message: message.clone(),
            });
        }

        let id = manifest.identity();
        let mut object = JobObject::default();
        object.metadata.name = id.name.clone();
        object.metadata.namespace = Some(id.namespace.clone());
        object.metadata.labels = manifest.metadata.labels.clone();

        state.applied.push(manifest.clone());
        state.jobs.insert(id, object);
        Ok(())
    }

    async fn get(&self, id: &JobIdentity) -> Result<JobObject> {
        self.job(id)
    }

    async fn list(&self, namespace: &str) -> Result<Vec<JobObject>> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .jobs
            .iter()
            .filter(|(id, _)| id.namespace == namespace)
            .map(|(_, job)| job.clone())
            .collect())
    }

    async fn delete(&self, id: &JobIdentity) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if let Some(message) = &state.delete_error {
            return Err(ClientError::command_failed("kubectl delete", message.clone()));
        }
        if state.undeletable.contains(&id.name) {
            return Err(ClientError::command_failed(
                "kubectl delete",
                "error: the server is currently unable to handle the request",
            ));
        }
        if state.jobs.remove(id).is_none() {
            return Err(not_found(id));
        }
        state.deleted.push(id.clone());
        Ok(())
    }

    async fn wait_for_condition(
        &self,
        id: &JobIdentity,
        _condition: &str,
        timeout: Duration,
    ) -> Result<()> {
        if self.job(id)?.state() == JobState::Succeeded {
            return Ok(());
        }
        Err(ClientError::WaitTimeout {
            name: id.name.clone(),
            namespace: id.namespace.clone(),
            timeout_secs: timeout.as_secs(),
        })
    }

    async fn logs(&self, id: &JobIdentity) -> Result<Vec<String>> {
        self.job_logs(id)
    }

    async fn stream_logs(&self, id: &JobIdentity) -> Result<LogStream> {
        Ok(LogStream::from_lines(self.job_logs(id)?))
    }

    async fn patch(&self, target: &ResourceRef, patch: &Value) -> Result<()> {
        self.state
            .lock()
            .unwrap()
            .patches
            .push((target.clone(), patch.clone()));
        Ok(())
    }

    async fn count(&self, query: &ResourceQuery) -> Result<usize> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .counts
            .get(query)
            .copied()
            .unwrap_or(0))
    }
}
