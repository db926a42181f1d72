//! Commands module
//!
//! Defines all CLI commands and their handlers.

mod cluster;
mod job;

pub use job::SubmitArgs;

use anyhow::Result;
use clap::Subcommand;

use crate::config::Config;

/// Top-level CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Show platform status
    Status,
    /// Submit a training job
    Submit(SubmitArgs),
    /// View job logs
    Logs {
        /// Full job name, e.g. stellar-optimization-20251201-120000
        job_name: String,

        /// Print the current logs and exit instead of following
        #[arg(long)]
        no_follow: bool,
    },
    /// List all jobs
    List,
    /// Scale Ray workers
    Scale {
        /// Desired number of worker replicas
        replicas: u32,
    },
    /// Delete a job
    Delete {
        job_name: String,
    },
    /// Wait for a job to complete
    Wait {
        job_name: String,

        /// Seconds to wait before giving up
        #[arg(long, default_value_t = 3600)]
        timeout: u64,
    },
    /// Delete all finished jobs
    Cleanup,
}

/// Handle a CLI command
///
/// Routes the command to the appropriate handler module.
///
/// # Arguments
/// * `command` - The command to execute
/// * `config` - The CLI configuration
pub async fn handle_command(command: Commands, config: &Config) -> Result<()> {
    match command {
        Commands::Status => cluster::show_status(config).await,
        Commands::Scale { replicas } => cluster::scale(config, replicas).await,
        Commands::Submit(args) => job::submit(config, args).await,
        Commands::Logs {
            job_name,
            no_follow,
        } => job::logs(config, &job_name, !no_follow).await,
        Commands::List => job::list(config).await,
        Commands::Delete { job_name } => job::delete(config, &job_name).await,
        Commands::Wait { job_name, timeout } => job::wait(config, &job_name, timeout).await,
        Commands::Cleanup => job::cleanup(config).await,
    }
}
