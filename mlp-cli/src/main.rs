//! ML Platform CLI
//!
//! Command-line interface for submitting and managing training jobs on the
//! platform's Kubernetes cluster.

mod commands;
mod config;
mod types;

use clap::Parser;
use colored::*;
use commands::{Commands, handle_command};
use config::Config;
use mlp_client::config::{DEFAULT_KUBECTL, DEFAULT_REGION};
use mlp_core::domain::job::DEFAULT_NAMESPACE;
use std::process::ExitCode;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Exit status after Ctrl-C
const INTERRUPTED: u8 = 130;

#[derive(Parser)]
#[command(name = "ml-platform", version)]
#[command(about = "ML Platform CLI", long_about = None)]
struct Cli {
    /// GCP project (defaults to the active gcloud project)
    #[arg(long, global = true, env = "MLP_PROJECT_ID")]
    project: Option<String>,

    /// GCP region of the image registry
    #[arg(long, global = true, env = "MLP_REGION", default_value = DEFAULT_REGION)]
    region: String,

    /// Namespace jobs are submitted to
    #[arg(long, global = true, env = "MLP_NAMESPACE", default_value = DEFAULT_NAMESPACE)]
    namespace: String,

    /// Kube context (defaults to the first context matching "workload")
    #[arg(long, global = true, env = "MLP_KUBE_CONTEXT")]
    context: Option<String>,

    /// kubectl binary
    #[arg(long, global = true, env = "MLP_KUBECTL", default_value = DEFAULT_KUBECTL)]
    kubectl: String,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

fn init_tracing(verbose: bool) {
    let default = if verbose {
        "mlp_cli=debug,mlp_client=debug"
    } else {
        "warn"
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return if e.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    init_tracing(cli.verbose);

    let config = Config {
        project: cli.project,
        region: cli.region,
        namespace: cli.namespace,
        context: cli.context,
        kubectl: cli.kubectl,
    };

    tokio::select! {
        result = handle_command(cli.command, &config) => match result {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                eprintln!("{} {:#}", "Error:".red().bold(), e);
                ExitCode::FAILURE
            }
        },
        _ = tokio::signal::ctrl_c() => {
            eprintln!();
            eprintln!("{}", "Interrupted".yellow());
            ExitCode::from(INTERRUPTED)
        }
    }
}
