//! Local input files for a suite submission: workers list, artifact
//! specs, and the default parameters appended to every grid.

use std::path::Path;

use anyhow::{bail, Context, Result};

use gauntlet_core::params::{ParamValue, ParameterGrid, ParameterSpec};
use gauntlet_core::protocol::{ArtifactSource, ArtifactSpec, WorkerSpec};

/// A path that exists locally is uploaded with the submission; anything
/// else is a reference the master resolves on its side.
pub fn load_artifact_spec(url: &str) -> ArtifactSpec {
    let source = if !url.is_empty() && Path::new(url).is_file() {
        ArtifactSource::Local
    } else {
        ArtifactSource::Remote
    };
    ArtifactSpec {
        source,
        url: url.to_string(),
    }
}

/// Parse the workers file: one `host:port` per line, `#` comments and
/// blank lines skipped.
pub fn parse_workers(text: &str) -> Result<Vec<WorkerSpec>> {
    let mut workers = Vec::new();
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some((hostname, port)) = line.split_once(':') else {
            bail!("invalid worker line: {}", line);
        };
        let port: u16 = port
            .trim()
            .parse()
            .with_context(|| format!("invalid worker port in: {}", line))?;
        workers.push(WorkerSpec {
            hostname: hostname.trim().to_string(),
            port,
        });
    }
    Ok(workers)
}

/// Append the default experiment parameters every candidate receives.
/// A grid that declares its own `seed` or `trainset_size` is overridden,
/// matching map-insert semantics.
pub fn with_default_parameters(mut grid: ParameterGrid, seed: i64, trainset_size: f64) -> ParameterGrid {
    grid.insert(
        "seed".to_string(),
        ParameterSpec::Value(ParamValue::Int(seed)),
    );
    grid.insert(
        "trainset_size".to_string(),
        ParameterSpec::Value(ParamValue::Float(trainset_size)),
    );
    grid
}

// ── Tests ─────────────────────────────────────────────────────────
