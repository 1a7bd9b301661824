mod api;
mod cli;
mod export;
mod router;
mod scheduler;
mod startup;
mod state;
mod worker_client;

use anyhow::Result;

fn load_config() -> gauntlet_core::Config {
    gauntlet_core::config::load_dotenv();
    gauntlet_core::Config::from_env()
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = load_config();
    let args: Vec<String> = std::env::args().collect();

    if cli::dispatch(&args)? {
        return Ok(());
    }

    startup::serve(config).await
}
