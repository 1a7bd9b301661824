mod cli;
mod config;
mod inputs;
mod master_client;
mod monitor;
mod ui;

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use tracing::info;

use gauntlet_core::params::{parse_parameters, parse_requirements};
use gauntlet_core::protocol::{entries_from_grid, ArtifactSource, SuiteSettings};

use crate::cli::{CliArgs, Command};
use crate::config::ClientConfig;
use crate::master_client::MasterSession;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let args = CliArgs::parse();
    let config = ClientConfig::load(args.config.as_deref())?;
    let master_address = args.master.clone().unwrap_or_else(|| config.master.clone());
    let session = MasterSession::new(&master_address);

    match args.command {
        Command::Run {
            candidate,
            parameters,
            requirements,
            data,
            workers,
            heartbeat,
            dump_file,
        } => {
            let run = RunArgs {
                candidate,
                parameters,
                requirements,
                data,
                workers,
                heartbeat: heartbeat.unwrap_or(config.heartbeat_secs),
                dump_file: dump_file.unwrap_or_else(|| config.dump_file.clone()),
            };
            run_suite(&session, &config, &master_address, run).await
        }
        Command::Dump { suite_id, output } => {
            info!(">>> Saving suite dump to {}", output);
            session.download_dump(&suite_id, Path::new(&output)).await?;
            info!("<<< Dump file saved.");
            Ok(())
        }
    }
}

struct RunArgs {
    candidate: String,
    parameters: String,
    requirements: String,
    data: String,
    workers: String,
    heartbeat: u64,
    dump_file: String,
}

/// Submit a suite, monitor it to termination, download the CSV dump.
async fn run_suite(
    session: &MasterSession,
    config: &ClientConfig,
    master_address: &str,
    args: RunArgs,
) -> Result<()> {
    let parameters_text = std::fs::read_to_string(&args.parameters)
        .with_context(|| format!("failed to read parameters file {}", args.parameters))?;
    let grid = parse_parameters(&parameters_text)?;
    let grid = inputs::with_default_parameters(grid, config.seed, config.trainset_size);

    let requirements = if Path::new(&args.requirements).is_file() {
        parse_requirements(&std::fs::read_to_string(&args.requirements)?)
    } else {
        Vec::new()
    };

    let workers_text = std::fs::read_to_string(&args.workers)
        .with_context(|| format!("failed to read workers file {}", args.workers))?;
    let workers = inputs::parse_workers(&workers_text)?;
    if workers.is_empty() {
        anyhow::bail!("workers file {} defines no workers", args.workers);
    }

    let candidate_spec = inputs::load_artifact_spec(&args.candidate);
    let candidate_source = if candidate_spec.source == ArtifactSource::Local {
        info!(">>> Submitting local candidate {}", candidate_spec.url);
        Some(std::fs::read(&candidate_spec.url)?)
    } else {
        None
    };

    let data_spec = inputs::load_artifact_spec(&args.data);
    let data_source = if data_spec.source == ArtifactSource::Local {
        info!(">>> Submitting local dataset {}", data_spec.url);
        Some(std::fs::read(&data_spec.url)?)
    } else {
        None
    };

    let settings = SuiteSettings {
        candidate: candidate_spec,
        candidate_parameters: entries_from_grid(&grid),
        candidate_requirements: requirements,
        data: data_spec,
        master_address: master_address.to_string(),
        workers,
    };

    info!(
        ">>> Generating experiment suite - gauntlet master at {}",
        master_address
    );
    let suite_id = session
        .submit_suite(&settings, candidate_source, data_source)
        .await?;
    info!("<<< Experiment suite {} generated correctly.", suite_id);

    let start_time = Utc::now();
    let report = monitor::monitor_suite(
        session,
        &suite_id,
        Duration::from_secs(args.heartbeat),
    )
    .await?;
    println!();

    let suite_execution_secs = (Utc::now() - start_time).num_milliseconds() as f64 / 1000.0;
    info!("gauntlet execution completed in {} seconds.", suite_execution_secs);
    info!(
        "{} completed, {} failed out of {} experiments.",
        report.completed, report.failed, report.total
    );

    info!(">>> Saving suite dump to {}", args.dump_file);
    session
        .download_dump(&suite_id, Path::new(&args.dump_file))
        .await?;
    info!("<<< Dump file saved.");
    Ok(())
}
