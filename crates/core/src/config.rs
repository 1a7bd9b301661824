use std::env;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

fn env_u16(key: &str, default: u16) -> u16 {
    env_opt(key).and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn env_u64(key: &str, default: u64) -> u64 {
    env_opt(key).and_then(|v| v.parse().ok()).unwrap_or(default)
}

// ── Top-level config ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub master: MasterConfig,
    pub storage: StorageConfig,
    pub scheduler: SchedulerConfig,
}

impl Config {
    /// Build config from environment variables (call `load_dotenv()` first).
    pub fn from_env() -> Self {
        Self {
            master: MasterConfig::from_env(),
            storage: StorageConfig::from_env(),
            scheduler: SchedulerConfig::from_env(),
        }
    }

    /// Print a summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded:");
        tracing::info!(
            "  master:    {}:{} (advertised: {})",
            self.master.host,
            self.master.port,
            self.master.advertised_address()
        );
        tracing::info!("  storage:   home={}", self.storage.home_dir.display());
        tracing::info!("  catalog:   {}", self.storage.catalog_dir.display());
        tracing::info!("  scheduler: tick={}ms", self.scheduler.tick_ms);
    }
}

// ── Master ────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MasterConfig {
    pub host: String,
    pub port: u16,
    pub cors_origin: String,
    /// Externally reachable address handed to workers for callbacks.
    /// Falls back to `host:port` when unset.
    pub advertised_host: Option<String>,
}

impl MasterConfig {
    fn from_env() -> Self {
        Self {
            host: env_or("GAUNTLET_HOST", "0.0.0.0"),
            port: env_u16("GAUNTLET_PORT", 3290),
            cors_origin: env_or("GAUNTLET_CORS_ORIGIN", "*"),
            advertised_host: env_opt("GAUNTLET_ADVERTISED_HOST"),
        }
    }

    pub fn advertised_address(&self) -> String {
        match &self.advertised_host {
            Some(host) => format!("{}:{}", host, self.port),
            None => format!("{}:{}", self.host, self.port),
        }
    }
}

// ── Storage ───────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Working directory for suite artifacts (candidate sources,
    /// uploaded datasets, per-experiment results).
    pub home_dir: PathBuf,
    /// Directory scanned for the built-in `.arff` dataset catalog.
    pub catalog_dir: PathBuf,
}

impl StorageConfig {
    fn from_env() -> Self {
        let home_dir = PathBuf::from(env_or("GAUNTLET_HOME", "gauntlet-home"));
        let catalog_dir = PathBuf::from(env_or("GAUNTLET_CATALOG_DIR", "catalog"));
        Self {
            home_dir,
            catalog_dir,
        }
    }
}

// ── Scheduler ─────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Pause between scheduling loop iterations, in milliseconds.
    pub tick_ms: u64,
}

impl SchedulerConfig {
    fn from_env() -> Self {
        Self {
            tick_ms: env_u64("GAUNTLET_SCHEDULER_TICK_MS", 100),
        }
    }
}
