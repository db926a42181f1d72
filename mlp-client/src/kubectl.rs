//! kubectl-backed orchestration API
//!
//! Every operation is a single `kubectl` invocation:
//! - `apply -f -` with the manifest JSON on stdin
//! - `get` / `delete` / `patch` against a named resource
//! - `wait --for=condition=...` for blocking completion checks
//! - `logs [-f]` for retrieval and streaming
//!
//! Non-zero exits are turned into [`ClientError`]s carrying kubectl's stderr.

use async_trait::async_trait;
use mlp_core::domain::job::JobIdentity;
use mlp_core::domain::resource::{ResourceQuery, ResourceRef};
use mlp_core::dto::manifest::JobManifest;
use mlp_core::dto::object::{JobList, JobObject};
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, info};

use crate::config::PlatformConfig;
use crate::error::{ClientError, Result};
use crate::logs::LogStream;
use crate::orchestrator::Orchestrator;

/// Runs `kubectl`, optionally pinned to a kube context
#[derive(Debug, Clone)]
pub struct Kubectl {
    binary: String,
    context: Option<String>,
}

/// Captured result of one kubectl invocation
struct ExecOutput {
    command: String,
    success: bool,
    stdout: String,
    stderr: String,
}

impl ExecOutput {
    /// Stdout on success, otherwise the classified failure
    fn into_stdout(self) -> Result<String> {
        if self.success {
            Ok(self.stdout)
        } else {
            Err(classify_failure(&self.command, &self.stderr))
        }
    }

    /// Whatever kubectl said, preferring stderr
    fn diagnostic(&self) -> String {
        let stderr = self.stderr.trim();
        if stderr.is_empty() {
            self.stdout.trim().to_string()
        } else {
            stderr.to_string()
        }
    }
}

impl Kubectl {
    /// Creates a kubectl runner using the current kube context
    ///
    /// # Arguments
    /// * `binary` - Path or name of the kubectl executable
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
            context: None,
        }
    }

    pub fn with_context(mut self, context: Option<String>) -> Self {
        self.context = context;
        self
    }

    pub fn context(&self) -> Option<&str> {
        self.context.as_deref()
    }

    /// Creates a runner pinned to `preferred` if that context exists
    ///
    /// Falls back to the current context when it does not, or when the
    /// contexts cannot be listed.
    pub async fn discover(binary: &str, preferred: &str) -> Result<Self> {
        let kubectl = Self::new(binary);
        let output = kubectl
            .exec(strings(["config", "get-contexts", "-o", "name"]), None)
            .await?;

        if !output.success {
            debug!(
                "Could not list kube contexts, using current context: {}",
                output.diagnostic()
            );
            return Ok(kubectl);
        }

        match select_context(&output.stdout, preferred) {
            Some(context) => {
                info!("Using kube context {}", context);
                Ok(kubectl.with_context(Some(context)))
            }
            None => {
                debug!("Kube context {} not found, using current context", preferred);
                Ok(kubectl)
            }
        }
    }

    /// Builds the runner described by the configuration
    ///
    /// An explicit `kube_context` wins over discovery.
    pub async fn from_config(config: &PlatformConfig) -> Result<Self> {
        match &config.kube_context {
            Some(context) => {
                Ok(Self::new(&config.kubectl_path).with_context(Some(context.clone())))
            }
            None => Self::discover(&config.kubectl_path, &config.preferred_context).await,
        }
    }

    /// Full argument list including the context flag
    fn full_args(&self, args: Vec<String>) -> Vec<String> {
        match &self.context {
            Some(context) => {
                let mut full = strings(["--context", context.as_str()]);
                full.extend(args);
                full
            }
            None => args,
        }
    }

    fn describe(&self, args: &[String]) -> String {
        format!("{} {}", self.binary, args.join(" "))
    }

    fn command(&self, args: &[String]) -> Command {
        let mut command = Command::new(&self.binary);
        command
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        command
    }

    fn spawn_error(&self, command: &str, err: std::io::Error) -> ClientError {
        ClientError::command_failed(
            command,
            format!("failed to execute {}: {}. Is kubectl installed?", self.binary, err),
        )
    }

    /// Runs kubectl to completion, optionally feeding `input` on stdin
    async fn exec(&self, args: Vec<String>, input: Option<&str>) -> Result<ExecOutput> {
        let args = self.full_args(args);
        let command = self.describe(&args);
        debug!("Running: {}", command);

        let mut cmd = self.command(&args);
        if input.is_some() {
            cmd.stdin(Stdio::piped());
        }
        let mut child = cmd.spawn().map_err(|e| self.spawn_error(&command, e))?;

        if let Some(input) = input {
            if let Some(mut stdin) = child.stdin.take() {
                stdin.write_all(input.as_bytes()).await?;
            }
        }

        let output = child.wait_with_output().await?;
        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();

        if !stdout.trim().is_empty() {
            debug!("{} stdout: {}", command, stdout.trim());
        }
        if !stderr.trim().is_empty() {
            debug!("{} stderr: {}", command, stderr.trim());
        }

        Ok(ExecOutput {
            command,
            success: output.status.success(),
            stdout,
            stderr,
        })
    }
}

#[async_trait]
impl Orchestrator for Kubectl {
    async fn apply(&self, manifest: &JobManifest) -> Result<()> {
        let json = manifest.to_json()?;
        let output = self.exec(apply_args(), Some(&json)).await?;

        if !output.success {
            return Err(ClientError::Submission {
                message: output.diagnostic(),
            });
        }

        debug!("Applied {}: {}", manifest.identity(), output.stdout.trim());
        Ok(())
    }

    async fn get(&self, id: &JobIdentity) -> Result<JobObject> {
        let stdout = self.exec(get_args(id), None).await?.into_stdout()?;
        serde_json::from_str(&stdout)
            .map_err(|e| ClientError::Parse(format!("Failed to parse job {}: {}", id, e)))
    }

    async fn list(&self, namespace: &str) -> Result<Vec<JobObject>> {
        let stdout = self.exec(list_args(namespace), None).await?.into_stdout()?;
        let list: JobList = serde_json::from_str(&stdout)
            .map_err(|e| ClientError::Parse(format!("Failed to parse job list: {}", e)))?;
        Ok(list.items)
    }

    async fn delete(&self, id: &JobIdentity) -> Result<()> {
        self.exec(delete_args(id), None).await?.into_stdout()?;
        Ok(())
    }

    async fn wait_for_condition(
        &self,
        id: &JobIdentity,
        condition: &str,
        timeout: Duration,
    ) -> Result<()> {
        let output = self.exec(wait_args(id, condition, timeout), None).await?;
        if output.success {
            return Ok(());
        }

        if is_wait_timeout(&output.stderr) {
            return Err(ClientError::WaitTimeout {
                name: id.name.clone(),
                namespace: id.namespace.clone(),
                timeout_secs: timeout.as_secs(),
            });
        }

        Err(classify_failure(&output.command, &output.stderr))
    }

    async fn logs(&self, id: &JobIdentity) -> Result<Vec<String>> {
        let stdout = self.exec(logs_args(id, false), None).await?.into_stdout()?;
        Ok(stdout.lines().map(str::to_string).collect())
    }

    async fn stream_logs(&self, id: &JobIdentity) -> Result<LogStream> {
        let args = self.full_args(logs_args(id, true));
        let command = self.describe(&args);
        debug!("Streaming: {}", command);

        let child = self
            .command(&args)
            .spawn()
            .map_err(|e| self.spawn_error(&command, e))?;
        LogStream::from_process(command, child)
    }

    async fn patch(&self, target: &ResourceRef, patch: &serde_json::Value) -> Result<()> {
        let patch = serde_json::to_string(patch)?;
        self.exec(patch_args(target, &patch), None)
            .await?
            .into_stdout()?;
        Ok(())
    }

    async fn count(&self, query: &ResourceQuery) -> Result<usize> {
        let stdout = self.exec(count_args(query), None).await?.into_stdout()?;
        Ok(stdout.lines().filter(|l| !l.trim().is_empty()).count())
    }
}

/// Server-side marker for a missing resource; `kubectl logs` lowercases it
const SERVER_NOT_FOUND: &str = "error from server (notfound)";

/// Maps a failed kubectl invocation to an error
///
/// Only the API server's `Error from server (NotFound): ...` means the
/// resource is missing. Client-side messages that merely say "not found"
/// (an unknown context, a missing kubeconfig) stay `CommandFailed`.
pub(crate) fn classify_failure(command: &str, stderr: &str) -> ClientError {
    let message = stderr.trim();
    if message.is_empty() {
        return ClientError::command_failed(command, "exited with non-zero status");
    }
    if message.to_ascii_lowercase().contains(SERVER_NOT_FOUND) {
        return ClientError::NotFound(message.to_string());
    }
    ClientError::command_failed(command, message)
}

fn is_wait_timeout(stderr: &str) -> bool {
    stderr.contains("timed out waiting")
}

/// Picks `preferred` out of `kubectl config get-contexts -o name` output
fn select_context(contexts: &str, preferred: &str) -> Option<String> {
    contexts
        .lines()
        .map(str::trim)
        .find(|name| *name == preferred)
        .map(str::to_string)
}

fn strings<const N: usize>(args: [&str; N]) -> Vec<String> {
    args.iter().map(|s| s.to_string()).collect()
}

fn apply_args() -> Vec<String> {
    strings(["apply", "-f", "-"])
}

fn get_args(id: &JobIdentity) -> Vec<String> {
    strings(["get", "job", &id.name, "-n", &id.namespace, "-o", "json"])
}

fn list_args(namespace: &str) -> Vec<String> {
    strings(["get", "jobs", "-n", namespace, "-o", "json"])
}

fn delete_args(id: &JobIdentity) -> Vec<String> {
    strings(["delete", "job", &id.name, "-n", &id.namespace])
}

/// Seconds in `timeout`, rounded up so kubectl never waits less than asked
fn whole_seconds(timeout: Duration) -> u64 {
    timeout.as_secs() + u64::from(timeout.subsec_nanos() > 0)
}

fn wait_args(id: &JobIdentity, condition: &str, timeout: Duration) -> Vec<String> {
    vec![
        "wait".to_string(),
        format!("--for=condition={}", condition),
        format!("--timeout={}s", whole_seconds(timeout)),
        format!("job/{}", id.name),
        "-n".to_string(),
        id.namespace.clone(),
    ]
}

fn logs_args(id: &JobIdentity, follow: bool) -> Vec<String> {
    let mut args = vec![
        "logs".to_string(),
        "-n".to_string(),
        id.namespace.clone(),
        format!("job/{}", id.name),
    ];
    if follow {
        args.push("-f".to_string());
    }
    args
}

fn patch_args(target: &ResourceRef, patch: &str) -> Vec<String> {
    strings([
        "patch",
        &target.kind,
        &target.name,
        "-n",
        &target.namespace,
        "--type",
        "json",
        "-p",
        patch,
    ])
}

fn count_args(query: &ResourceQuery) -> Vec<String> {
    let mut args = strings(["get", &query.kind]);
    if let Some(namespace) = &query.namespace {
        args.extend(strings(["-n", namespace]));
    }
    if let Some(labels) = &query.label_selector {
        args.extend(strings(["-l", labels]));
    }
    if let Some(fields) = &query.field_selector {
        args.push(format!("--field-selector={}", fields));
    }
    args.extend(strings(["-o", "name"]));
    args
}
