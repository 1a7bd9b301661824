use clap::{Parser, Subcommand};

/// Benchmark anomaly-detection candidates across a worker pool.
///
/// Submits experiment suites to a gauntlet master, monitors their
/// progress, and downloads the consolidated CSV results.
#[derive(Parser, Debug)]
#[command(name = "gauntlet", about = "Anomaly-detection benchmark client")]
pub struct CliArgs {
    /// Path to config file (default: ./gauntlet.toml)
    #[arg(long)]
    pub config: Option<String>,

    /// Master address override (host:port)
    #[arg(long)]
    pub master: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Submit a suite, monitor it to completion, download the results
    Run {
        /// Candidate source: a local file to upload, or a path already on the master
        candidate: String,

        /// Parameter grid file
        #[arg(long, default_value = "candidate_parameters.txt")]
        parameters: String,

        /// Package requirements file
        #[arg(long, default_value = "candidate_requirements.txt")]
        requirements: String,

        /// Dataset: a local file to upload, a catalog name, or empty for the whole catalog
        #[arg(long, default_value = "")]
        data: String,

        /// Workers file, one host:port per line
        #[arg(long, default_value = "workers")]
        workers: String,

        /// Seconds between status polls (overrides config)
        #[arg(long)]
        heartbeat: Option<u64>,

        /// Output CSV path (overrides config)
        #[arg(long)]
        dump_file: Option<String>,
    },

    /// Download the result CSV for an existing suite
    Dump {
        /// Suite id as returned at submission
        suite_id: String,

        /// Output CSV path
        #[arg(long, default_value = "dump.csv")]
        output: String,
    },
}
