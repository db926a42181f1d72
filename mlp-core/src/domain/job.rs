//! Job domain types

use chrono::{DateTime, TimeZone};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Namespace jobs are submitted to unless the caller says otherwise
pub const DEFAULT_NAMESPACE: &str = "jobs";

/// Time a finished job is kept before automatic deletion (24 hours)
pub const DEFAULT_TTL_SECONDS: u32 = 86_400;

/// Pod re-creations allowed before the job is marked failed
pub const DEFAULT_BACKOFF_LIMIT: u32 = 3;

/// Timestamp suffix appended to the name prefix (second resolution)
pub const NAME_TIMESTAMP_FORMAT: &str = "%Y%m%d-%H%M%S";

/// CPU and memory quantities in orchestration-native units (e.g. "4", "16Gi")
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceQuantities {
    pub cpu: String,
    pub memory: String,
}

impl ResourceQuantities {
    pub fn new(cpu: impl Into<String>, memory: impl Into<String>) -> Self {
        Self {
            cpu: cpu.into(),
            memory: memory.into(),
        }
    }
}

/// Requested and limit resources for the job container
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceRequirements {
    pub requests: ResourceQuantities,
    pub limits: ResourceQuantities,
}

impl Default for ResourceRequirements {
    fn default() -> Self {
        Self {
            requests: ResourceQuantities::new("4", "16Gi"),
            limits: ResourceQuantities::new("8", "32Gi"),
        }
    }
}

/// Reasons a [`JobSpec`] is rejected before anything is sent to the cluster
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpecError {
    #[error("image must not be empty")]
    EmptyImage,

    #[error("namespace must not be empty")]
    EmptyNamespace,
}

/// A batch job the caller wants to run
///
/// Built with [`JobSpec::new`] and the `with_*` methods. Once handed to the
/// submission builder it is not modified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobSpec {
    /// Prefix of the generated job name; also used as the `app` label
    pub name_prefix: String,

    /// Container image reference
    pub image: String,

    /// Overrides the image entrypoint when set
    pub command: Option<Vec<String>>,

    /// Caller environment, appended after the platform defaults
    pub env: BTreeMap<String, String>,

    pub resources: ResourceRequirements,

    pub namespace: String,

    /// Seconds after completion before the job is garbage collected
    pub ttl_seconds: u32,

    /// Retries before the job is marked failed
    pub backoff_limit: u32,
}

impl JobSpec {
    /// Creates a spec with default resources, namespace, TTL and backoff limit
    pub fn new(name_prefix: impl Into<String>, image: impl Into<String>) -> Self {
        Self {
            name_prefix: name_prefix.into(),
            image: image.into(),
            command: None,
            env: BTreeMap::new(),
            resources: ResourceRequirements::default(),
            namespace: DEFAULT_NAMESPACE.to_string(),
            ttl_seconds: DEFAULT_TTL_SECONDS,
            backoff_limit: DEFAULT_BACKOFF_LIMIT,
        }
    }

    pub fn with_command<I, S>(mut self, command: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.command = Some(command.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    pub fn with_resources(mut self, resources: ResourceRequirements) -> Self {
        self.resources = resources;
        self
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    pub fn with_ttl_seconds(mut self, ttl_seconds: u32) -> Self {
        self.ttl_seconds = ttl_seconds;
        self
    }

    pub fn with_backoff_limit(mut self, backoff_limit: u32) -> Self {
        self.backoff_limit = backoff_limit;
        self
    }

    /// Checks the input constraints of a submission
    pub fn validate(&self) -> Result<(), SpecError> {
        if self.image.trim().is_empty() {
            return Err(SpecError::EmptyImage);
        }
        if self.namespace.trim().is_empty() {
            return Err(SpecError::EmptyNamespace);
        }
        Ok(())
    }

    /// Caller env keys that shadow one of the given platform-injected keys
    pub fn env_collisions<'a, I>(&self, injected: I) -> Vec<String>
    where
        I: IntoIterator<Item = &'a str>,
    {
        injected
            .into_iter()
            .filter(|key| self.env.contains_key(*key))
            .map(str::to_string)
            .collect()
    }
}

/// `(name, namespace)` of a submitted job
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct JobIdentity {
    pub name: String,
    pub namespace: String,
}

impl JobIdentity {
    pub fn new(name: impl Into<String>, namespace: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.into(),
        }
    }

    /// Derives the identity for a submission made at `at`
    ///
    /// The name is `<prefix>-<YYYYmmdd-HHMMSS>`. Two submissions with the
    /// same prefix inside the same second produce the same name.
    pub fn derive<Tz>(prefix: &str, namespace: &str, at: &DateTime<Tz>) -> Self
    where
        Tz: TimeZone,
        Tz::Offset: fmt::Display,
    {
        let name = format!("{}-{}", prefix, at.format(NAME_TIMESTAMP_FORMAT));
        Self::new(name, namespace)
    }
}

impl fmt::Display for JobIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// Job state as observed from the orchestration API
///
/// The transitions are owned by the cluster; this is only a reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobState {
    Pending,
    Running,
    Succeeded,
    Failed,
    Unknown,
}

impl JobState {
    /// Maps a Job condition type to a state
    pub fn from_condition(condition_type: &str) -> Self {
        match condition_type {
            "Complete" | "SuccessCriteriaMet" => JobState::Succeeded,
            "Failed" | "FailureTarget" => JobState::Failed,
            _ => JobState::Unknown,
        }
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobState::Pending => write!(f, "Pending"),
            JobState::Running => write!(f, "Running"),
            JobState::Succeeded => write!(f, "Succeeded"),
            JobState::Failed => write!(f, "Failed"),
            JobState::Unknown => write!(f, "Unknown"),
        }
    }
}
