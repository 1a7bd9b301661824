//! Wire types shared by the master, the workers, and the client.
//!
//! Parameter grid entries travel as JSON arrays (`[name, value]` for fixed
//! values, `[name, start, end, step]` for ranges) so the submission payload
//! stays close to the parameter file format.

use serde::{Deserialize, Serialize};

use crate::error::GauntletError;
use crate::params::{ParamValue, ParameterGrid, ParameterSpec};

// ── Suite submission ──────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactSource {
    /// Uploaded with the submission as a multipart file.
    Local,
    /// Already present on the master (catalog entry or path reference).
    Remote,
}

/// Reference to a candidate or dataset artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactSpec {
    pub source: ArtifactSource,
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerSpec {
    pub hostname: String,
    pub port: u16,
}

/// One parameter grid entry as it appears on the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParameterEntry {
    Value(String, serde_json::Value),
    Range(
        String,
        serde_json::Value,
        serde_json::Value,
        serde_json::Value,
    ),
}

/// The `suite_settings` JSON part of a suite submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuiteSettings {
    pub candidate: ArtifactSpec,
    pub candidate_parameters: Vec<ParameterEntry>,
    #[serde(default)]
    pub candidate_requirements: Vec<String>,
    pub data: ArtifactSpec,
    /// The master's externally reachable address, as seen by workers.
    pub master_address: String,
    pub workers: Vec<WorkerSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuiteCreated {
    pub suite_id: String,
}

// ── Status reporting ──────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExperimentStatusEntry {
    pub id: String,
    pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuiteStatusResponse {
    pub suite_id: String,
    pub experiments: Vec<ExperimentStatusEntry>,
}

/// Worker → master status callback body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusUpdate {
    pub status: String,
}

// ── Master → worker RPCs ──────────────────────────────────────────

/// One-time per-suite environment setup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetupRequest {
    pub master_address: String,
    pub suite_id: String,
    pub candidate_id: String,
    pub requirements: Vec<String>,
    pub datasets: Vec<String>,
}

/// Run one experiment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunRequest {
    pub suite_id: String,
    pub data_name: String,
    pub experiment_id: String,
    pub master_address: String,
    pub parameters: String,
}

// ── Grid conversions ──────────────────────────────────────────────

fn value_from_json(name: &str, value: &serde_json::Value) -> Result<ParamValue, GauntletError> {
    match value {
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(ParamValue::Int(i))
            } else if let Some(f) = n.as_f64() {
                Ok(ParamValue::Float(f))
            } else {
                Err(GauntletError::InvalidParameter(format!(
                    "unsupported numeric value for {}: {}",
                    name, n
                )))
            }
        }
        serde_json::Value::String(s) => Ok(ParamValue::Str(s.clone())),
        other => Err(GauntletError::InvalidParameter(format!(
            "unsupported value for {}: {}",
            name, other
        ))),
    }
}

fn value_to_json(value: &ParamValue) -> serde_json::Value {
    match value {
        ParamValue::Int(i) => serde_json::json!(i),
        ParamValue::Float(f) => serde_json::json!(f),
        ParamValue::Str(s) => serde_json::json!(s),
    }
}

/// Convert wire entries into a validated grid. Range bounds must share one
/// numeric type, satisfy `end >= start`, and carry a positive step; any
/// violation rejects the submission before entities are created.
pub fn grid_from_entries(entries: &[ParameterEntry]) -> Result<ParameterGrid, GauntletError> {
    let mut grid = ParameterGrid::new();
    for entry in entries {
        match entry {
            ParameterEntry::Value(name, value) => {
                grid.insert(
                    name.clone(),
                    ParameterSpec::Value(value_from_json(name, value)?),
                );
            }
            ParameterEntry::Range(name, start, end, step) => {
                let invalid = || {
                    GauntletError::InvalidParameter(format!(
                        "invalid parameter range for {}: <{}, {}, {}>",
                        name, start, end, step
                    ))
                };
                let start = value_from_json(name, start)?;
                let end = value_from_json(name, end)?;
                let step = value_from_json(name, step)?;
                let spec = match (start, end, step) {
                    (ParamValue::Int(start), ParamValue::Int(end), ParamValue::Int(step)) => {
                        if end >= start && step > 0 {
                            ParameterSpec::IntRange { start, end, step }
                        } else {
                            return Err(invalid());
                        }
                    }
                    (ParamValue::Float(start), ParamValue::Float(end), ParamValue::Float(step)) => {
                        if end >= start && step > 0.0 {
                            ParameterSpec::FloatRange { start, end, step }
                        } else {
                            return Err(invalid());
                        }
                    }
                    _ => return Err(invalid()),
                };
                grid.insert(name.clone(), spec);
            }
        }
    }
    Ok(grid)
}

/// Convert a parsed grid into wire entries, preserving declaration order.
pub fn entries_from_grid(grid: &ParameterGrid) -> Vec<ParameterEntry> {
    grid.iter()
        .map(|(name, spec)| match spec {
            ParameterSpec::Value(v) => ParameterEntry::Value(name.clone(), value_to_json(v)),
            ParameterSpec::IntRange { start, end, step } => ParameterEntry::Range(
                name.clone(),
                serde_json::json!(start),
                serde_json::json!(end),
                serde_json::json!(step),
            ),
            ParameterSpec::FloatRange { start, end, step } => ParameterEntry::Range(
                name.clone(),
                serde_json::json!(start),
                serde_json::json!(end),
                serde_json::json!(step),
            ),
        })
        .collect()
}

// ── Tests ─────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::parse_parameters;

    #[test]
    fn entries_serialize_as_tuples() {
        let entries = vec![
            ParameterEntry::Value("seed".into(), serde_json::json!(42)),
            ParameterEntry::Range(
                "k".into(),
                serde_json::json!(1),
                serde_json::json!(3),
                serde_json::json!(1),
            ),
        ];
        let json = serde_json::to_string(&entries).unwrap();
        assert_eq!(json, r#"[["seed",42],["k",1,3,1]]"#);

        let parsed: Vec<ParameterEntry> = serde_json::from_str(&json).unwrap();
        assert_eq!(grid_from_entries(&parsed).unwrap().len(), 2);
    }

    #[test]
    fn grid_round_trips_through_entries() {
        let grid = parse_parameters("seed 42\nk 1 3 1\nrate 0.1 0.5 0.2\nkernel rbf\n").unwrap();
        let entries = entries_from_grid(&grid);
        let rebuilt = grid_from_entries(&entries).unwrap();
        assert_eq!(grid, rebuilt);
    }

    #[test]
    fn invalid_ranges_are_rejected() {
        let backwards = vec![ParameterEntry::Range(
            "k".into(),
            serde_json::json!(10),
            serde_json::json!(1),
            serde_json::json!(1),
        )];
        assert!(grid_from_entries(&backwards).is_err());

        let mixed = vec![ParameterEntry::Range(
            "k".into(),
            serde_json::json!(1),
            serde_json::json!(3.0),
            serde_json::json!(1),
        )];
        assert!(grid_from_entries(&mixed).is_err());

        let non_numeric = vec![ParameterEntry::Value("flag".into(), serde_json::json!(true))];
        assert!(grid_from_entries(&non_numeric).is_err());
    }
}
