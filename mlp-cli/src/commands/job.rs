//! Job command handlers
//!
//! Handles submitting jobs, reading their logs, listing, waiting on and
//! deleting them.

use anyhow::{Context, Result};
use clap::Args;
use colored::*;
use mlp_core::domain::job::{
    DEFAULT_BACKOFF_LIMIT, DEFAULT_TTL_SECONDS, JobSpec, JobState, ResourceQuantities,
    ResourceRequirements,
};
use mlp_core::dto::object::JobObject;
use std::time::Duration;

use crate::config::Config;
use crate::types::{WorkloadRef, parse_env_pair};

/// Arguments of `submit`
#[derive(Args, Debug)]
pub struct SubmitArgs {
    /// Workload and image version, e.g. stellar_optimization:v1.0.0
    #[arg(value_parser = WorkloadRef::parse)]
    pub workload: WorkloadRef,

    /// Seconds to keep the job after it finishes
    #[arg(long, default_value_t = DEFAULT_TTL_SECONDS)]
    pub ttl: u32,

    /// Retries before the job is marked failed
    #[arg(long, default_value_t = DEFAULT_BACKOFF_LIMIT)]
    pub backoff_limit: u32,

    /// CPU request
    #[arg(long, default_value = "4")]
    pub cpu: String,

    /// Memory request
    #[arg(long, default_value = "16Gi")]
    pub memory: String,

    /// CPU limit
    #[arg(long, default_value = "8")]
    pub cpu_limit: String,

    /// Memory limit
    #[arg(long, default_value = "32Gi")]
    pub memory_limit: String,

    /// Extra environment variable for the job (repeatable)
    #[arg(short = 'e', long = "env", value_name = "KEY=VALUE", value_parser = parse_env_pair)]
    pub env: Vec<(String, String)>,

    /// Wait up to this many seconds for the job to complete
    #[arg(long, value_name = "SECONDS")]
    pub wait: Option<u64>,
}

impl SubmitArgs {
    fn resources(&self) -> ResourceRequirements {
        ResourceRequirements {
            requests: ResourceQuantities::new(&self.cpu, &self.memory),
            limits: ResourceQuantities::new(&self.cpu_limit, &self.memory_limit),
        }
    }
}

/// Submit a training job
pub async fn submit(config: &Config, args: SubmitArgs) -> Result<()> {
    let client = config.client(true).await?;
    let image = client
        .config()
        .image_for(&args.workload.workload, &args.workload.version)?;

    let mut spec = JobSpec::new(args.workload.job_prefix(), &image)
        .with_namespace(&client.config().namespace)
        .with_resources(args.resources())
        .with_ttl_seconds(args.ttl)
        .with_backoff_limit(args.backoff_limit);
    for (key, value) in &args.env {
        spec = spec.with_env(key, value);
    }

    println!("{} {}", "Submitting:".bold(), args.workload.to_string().cyan());
    println!("   Image: {}", image.dimmed());
    println!("   TTL:   {}s (auto-cleanup after completion)", args.ttl);
    println!();

    let handle = client
        .submit(spec)
        .await
        .with_context(|| format!("Failed to submit {}", args.workload))?;

    println!(
        "{}",
        format!("✓ Job submitted: {}", handle.name()).green().bold()
    );

    match args.wait {
        Some(seconds) => {
            println!("{}", format!("Waiting up to {}s...", seconds).dimmed());
            handle.wait(Duration::from_secs(seconds)).await?;
            println!();
            print_job_summary(&handle.describe().await?);
        }
        None => {
            println!();
            println!("{}", "Monitor with:".bold());
            println!("  ml-platform logs {}", handle.name());
        }
    }

    Ok(())
}

/// Print or follow a job's logs
pub async fn logs(config: &Config, job_name: &str, follow: bool) -> Result<()> {
    let client = config.client(false).await?;
    let handle = client.handle(job_name, None);

    println!("{}", format!("Logs for {}:", handle.name()).bold());
    println!("{}", "─".repeat(80).dimmed());

    if follow {
        let mut stream = handle
            .follow_logs()
            .await
            .with_context(|| format!("Failed to follow logs for {}", job_name))?;
        while let Some(line) = stream.next_line().await? {
            println!("{}", line);
        }
    } else {
        let lines = handle
            .logs()
            .await
            .with_context(|| format!("Failed to read logs for {}", job_name))?;
        if lines.is_empty() {
            println!("{}", "No logs yet.".yellow());
        }
        for line in lines {
            println!("{}", line);
        }
    }

    Ok(())
}

/// List all jobs
pub async fn list(config: &Config) -> Result<()> {
    let client = config.client(false).await?;
    let namespace = &client.config().namespace;
    let jobs = client.list_jobs(namespace).await?;

    if jobs.is_empty() {
        println!(
            "{}",
            format!("No jobs found in namespace {}.", namespace).yellow()
        );
    } else {
        println!("{}", format!("Found {} job(s):", jobs.len()).bold());
        println!();
        for job in &jobs {
            print_job_summary(job);
        }
    }

    Ok(())
}

/// Delete a job; a job that is already gone is not an error
pub async fn delete(config: &Config, job_name: &str) -> Result<()> {
    let client = config.client(false).await?;
    client
        .handle(job_name, None)
        .delete()
        .await
        .with_context(|| format!("Failed to delete {}", job_name))?;

    println!("{}", format!("✓ Deleted job {}", job_name).green());
    Ok(())
}

/// Wait for a job to complete
pub async fn wait(config: &Config, job_name: &str, timeout: u64) -> Result<()> {
    let client = config.client(false).await?;
    let handle = client.handle(job_name, None);

    println!(
        "{}",
        format!("Waiting up to {}s for {}...", timeout, job_name).dimmed()
    );
    handle.wait(Duration::from_secs(timeout)).await?;

    println!("{}", format!("✓ Job {} completed", job_name).green());
    println!();
    print_job_summary(&handle.describe().await?);
    Ok(())
}

/// Delete every finished job
pub async fn cleanup(config: &Config) -> Result<()> {
    let client = config.client(false).await?;
    let deleted = client
        .cleanup_completed_jobs(&client.config().namespace)
        .await?;

    if deleted == 0 {
        println!("{}", "No finished jobs to clean up.".yellow());
    } else {
        println!(
            "{}",
            format!("✓ Deleted {} finished job(s)", deleted).green()
        );
    }
    Ok(())
}

/// Print a job summary
fn print_job_summary(job: &JobObject) {
    let status = &job.status;

    println!("  {} {}", "▸".cyan(), job.metadata.name.bold());
    println!("    State:   {}", colorize_state(job.state()));
    if let Some(created) = job.metadata.creation_timestamp {
        println!(
            "    Created: {}",
            created
                .with_timezone(&chrono::Local)
                .format("%Y-%m-%d %H:%M:%S")
                .to_string()
                .dimmed()
        );
    }
    if let (Some(started), Some(completed)) = (status.start_time, status.completion_time) {
        let seconds = completed.signed_duration_since(started).num_seconds();
        println!("    Duration: {}s", seconds);
    }
    println!(
        "    Pods:    {} active, {} succeeded, {} failed",
        status.active.unwrap_or(0),
        status.succeeded.unwrap_or(0),
        status.failed.unwrap_or(0)
    );
    println!();
}

/// Colorize job state for display
fn colorize_state(state: JobState) -> ColoredString {
    let text = state.to_string();
    match state {
        JobState::Pending => text.yellow(),
        JobState::Running => text.cyan(),
        JobState::Succeeded => text.green(),
        JobState::Failed => text.red(),
        JobState::Unknown => text.dimmed(),
    }
}
