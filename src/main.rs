//! rpc-embed
//!
//! Operator tool for the embeddable runtime: validates configuration and
//! provisions the credentials it declares through the same boundary a host
//! would use.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use serde::Serialize;

use rpc_embed::boundary::{self, BoundaryError, BoundaryHandle, CredentialsWrapper};
use rpc_embed::config::{load_config, ConfigError, CredentialConfig};
use rpc_embed::credentials::CredentialCatalog;
use rpc_embed::observability::{logging, metrics, StatsSnapshot};

#[derive(Parser)]
#[command(name = "rpc-embed")]
#[command(about = "Inspect and exercise the embeddable RPC runtime", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load and validate a configuration file
    Check { config: PathBuf },
    /// Start the runtime and build every configured credential
    Provision {
        config: PathBuf,
        /// Print Prometheus metrics before exiting
        #[arg(long)]
        metrics: bool,
    },
}

#[derive(Serialize)]
struct CredentialSummary {
    name: String,
    kind: &'static str,
    holders: usize,
    description: String,
    secures_transport: bool,
    metadata_keys: Vec<String>,
}

#[derive(Serialize)]
struct ProvisionReport {
    subsystems: Vec<&'static str>,
    credentials: Vec<CredentialSummary>,
    stats: StatsSnapshot,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Check { config } => check(config),
        Commands::Provision { config, metrics } => provision(config, metrics),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {}", err);
            ExitCode::FAILURE
        }
    }
}

fn check(path: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    match load_config(&path) {
        Ok(config) => {
            println!(
                "{}: ok ({} credentials, {} io threads)",
                path.display(),
                config.credentials.len(),
                config.io.worker_threads
            );
            Ok(())
        }
        Err(ConfigError::Validation(errors)) => {
            for error in &errors {
                eprintln!("{}: {}", path.display(), error);
            }
            Err(format!("{} validation errors", errors.len()).into())
        }
        Err(err) => Err(err.into()),
    }
}

fn provision(path: PathBuf, with_metrics: bool) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(&path)?;
    logging::init_logging(&config.observability);

    let prometheus = if with_metrics || config.observability.metrics_enabled {
        Some(metrics::install_prometheus()?)
    } else {
        None
    };

    boundary::install_global(&config);
    let runtime = boundary::global();
    runtime.init()?;
    tracing::info!(subsystems = ?runtime.lifecycle().registry().names(), "Runtime started");

    let outcome = provision_catalog(runtime, &config.credentials);

    let stats = runtime.stats();
    runtime.shutdown();
    tracing::info!("Runtime stopped");

    let credentials = outcome?;
    let report = ProvisionReport {
        subsystems: runtime.lifecycle().registry().names(),
        credentials,
        stats,
    };
    println!("{}", serde_json::to_string_pretty(&report)?);

    if let Some(handle) = prometheus {
        println!("{}", handle.render());
    }
    Ok(())
}

fn provision_catalog(
    runtime: &boundary::Runtime,
    configs: &[CredentialConfig],
) -> Result<Vec<CredentialSummary>, Box<dyn std::error::Error>> {
    let wrapper = runtime.credentials();
    let catalog = CredentialCatalog::build(wrapper.factory(), configs)?;

    let handles: Vec<(String, BoundaryHandle)> = catalog
        .iter()
        .map(|(name, credential)| (name.to_string(), wrapper.wrap(Some(credential.clone()))))
        .collect();

    let summaries = summarize(wrapper, &handles);
    release_all(wrapper, &handles);
    Ok(summaries?)
}

fn summarize(
    wrapper: &CredentialsWrapper,
    handles: &[(String, BoundaryHandle)],
) -> Result<Vec<CredentialSummary>, BoundaryError> {
    let mut summaries = Vec::with_capacity(handles.len());
    for (name, handle) in handles {
        let Some(credential) = wrapper.unwrap(handle)? else {
            continue;
        };
        summaries.push(CredentialSummary {
            name: name.clone(),
            kind: credential.kind().as_str(),
            // the handle's own reference, not the one unwrap just took
            holders: credential.holders() - 1,
            description: credential.describe(),
            secures_transport: credential.secures_transport(),
            metadata_keys: credential
                .request_metadata()
                .into_iter()
                .map(|(key, _)| key)
                .collect(),
        });
    }
    Ok(summaries)
}

/// Release every handle, even after a failure on an earlier one.
fn release_all(wrapper: &CredentialsWrapper, handles: &[(String, BoundaryHandle)]) {
    for (name, handle) in handles {
        if let Err(e) = wrapper.release(handle) {
            tracing::warn!(name = %name, error = %e, "Failed to release credential handle");
        }
    }
}
