//! Client configuration: an optional TOML file under the working
//! directory, with flag overrides applied by the caller.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

const DEFAULT_CONFIG_PATH: &str = "gauntlet.toml";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Master address (host:port).
    pub master: String,
    /// Seconds between status polls while monitoring.
    pub heartbeat_secs: u64,
    /// Where the suite dump CSV lands after a run.
    pub dump_file: String,
    /// Default `seed` parameter appended to every grid.
    pub seed: i64,
    /// Default `trainset_size` parameter appended to every grid.
    pub trainset_size: f64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            master: "localhost:3290".to_string(),
            heartbeat_secs: 1,
            dump_file: "dump.csv".to_string(),
            seed: 42,
            trainset_size: 1.0,
        }
    }
}

impl ClientConfig {
    /// Load from the given path, falling back to `./gauntlet.toml`, then
    /// to built-in defaults when no file exists.
    pub fn load(path: Option<&str>) -> Result<Self> {
        let path = path.unwrap_or(DEFAULT_CONFIG_PATH);
        if !Path::new(path).exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path))?;
        toml::from_str(&content).with_context(|| format!("invalid config file {}", path))
    }
}

// ── Tests ─────────────────────────────────────────────────────────
