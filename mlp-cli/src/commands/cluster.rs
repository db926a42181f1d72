//! Cluster command handlers
//!
//! Platform status summary and Ray worker scaling.

use anyhow::{Context, Result};
use colored::*;

use crate::config::Config;

/// Show platform status
pub async fn show_status(config: &Config) -> Result<()> {
    let client = config.client(false).await?;
    let status = client
        .cluster_status()
        .await
        .context("Failed to read cluster status. Is the cluster reachable?")?;

    println!("{}", "ml-platform Status".bold());
    println!();
    println!("{}", "Cluster:".bold());
    println!("  Nodes:        {}", status.nodes);
    println!();
    println!("{}", "Ray Cluster:".bold());
    println!("  Running pods: {}", status.ray_pods_running);
    println!();
    println!("{}", "Jobs:".bold());
    println!("  Total:        {}", status.total_jobs);
    println!("  Completed:    {}", status.completed_jobs.to_string().green());
    println!("  Running:      {}", status.running_job_pods.to_string().cyan());

    Ok(())
}

/// Scale Ray workers
pub async fn scale(config: &Config, replicas: u32) -> Result<()> {
    let client = config.client(false).await?;

    println!("Scaling Ray to {} workers...", replicas.to_string().bold());
    let current = client
        .scale_ray(replicas)
        .await
        .with_context(|| format!("Failed to scale Ray to {} workers", replicas))?;

    println!("{}", format!("✓ Scaled to {} workers", replicas).green());
    println!(
        "{}",
        "  Worker pods are updated by the Ray operator (may take ~30 seconds)".dimmed()
    );
    println!("  Current workers: {}", current);

    Ok(())
}
