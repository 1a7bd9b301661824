//! Suite, candidate, dataset, experiment, and worker entities.
//!
//! Experiments carry the status state machine: transitions are forward-only
//! and stamp the timestamps the dump aggregator later needs.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::GauntletError;
use crate::params::ParameterSpec;

/// Generate a short entity id: the first four characters of the tag
/// followed by eight hex characters of a v4 UUID.
pub fn short_id(tag: &str) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{}{}", &tag[..4], &suffix[..8])
}

// ── Experiment status ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExperimentStatus {
    Created,
    Scheduled,
    Running,
    Completed,
    Failed,
}

impl ExperimentStatus {
    /// Ordinal used by the forward-only transition guard.
    fn ordinal(self) -> u8 {
        match self {
            ExperimentStatus::Created => 0,
            ExperimentStatus::Scheduled => 1,
            ExperimentStatus::Running => 2,
            ExperimentStatus::Completed => 3,
            ExperimentStatus::Failed => 4,
        }
    }

    /// Completed and Failed accept no further transitions.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            ExperimentStatus::Completed | ExperimentStatus::Failed
        )
    }
}

impl std::fmt::Display for ExperimentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExperimentStatus::Created => write!(f, "created"),
            ExperimentStatus::Scheduled => write!(f, "scheduled"),
            ExperimentStatus::Running => write!(f, "running"),
            ExperimentStatus::Completed => write!(f, "completed"),
            ExperimentStatus::Failed => write!(f, "failed"),
        }
    }
}

impl std::str::FromStr for ExperimentStatus {
    type Err = GauntletError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "created" => Ok(ExperimentStatus::Created),
            "scheduled" => Ok(ExperimentStatus::Scheduled),
            "running" => Ok(ExperimentStatus::Running),
            "completed" => Ok(ExperimentStatus::Completed),
            "failed" => Ok(ExperimentStatus::Failed),
            other => Err(GauntletError::UnknownStatus(other.to_string())),
        }
    }
}

// ── Suite ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Suite {
    pub id: String,
    pub created_ts: DateTime<Utc>,
}

impl Suite {
    pub fn new() -> Self {
        Self {
            id: short_id("suite"),
            created_ts: Utc::now(),
        }
    }
}

impl Default for Suite {
    fn default() -> Self {
        Self::new()
    }
}

// ── Candidate ─────────────────────────────────────────────────────

/// An anomaly-detection algorithm under test. Opaque to the master:
/// only the source artifact, its parameter grid, and its package
/// requirements matter here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candidate {
    pub id: String,
    pub suite_id: String,
    /// Display name, derived from the source artifact reference.
    pub name: String,
    /// Path to the candidate source artifact on the master.
    pub source: PathBuf,
    /// Ordered parameter grid specification.
    pub parameters: indexmap::IndexMap<String, ParameterSpec>,
    /// Package requirement specifiers, sorted.
    pub requirements: Vec<String>,
}

impl Candidate {
    pub fn new(
        suite_id: &str,
        source: PathBuf,
        parameters: indexmap::IndexMap<String, ParameterSpec>,
        requirements: Vec<String>,
    ) -> Self {
        let name = source
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("candidate")
            .to_string();
        Self {
            id: short_id("candidate"),
            suite_id: suite_id.to_string(),
            name,
            source,
            parameters,
            requirements,
        }
    }
}

// ── Dataset ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dataset {
    pub id: String,
    /// Unique lookup key.
    pub name: String,
    pub path: PathBuf,
}

impl Dataset {
    pub fn new(name: &str, path: PathBuf) -> Self {
        Self {
            id: short_id("dataset"),
            name: name.to_string(),
            path,
        }
    }
}

// ── Experiment ────────────────────────────────────────────────────

/// One concrete (dataset, parameter-assignment) unit of work.
///
/// Created in bulk at suite-creation time, mutated exclusively through
/// [`Experiment::advance`], never deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Experiment {
    pub id: String,
    pub suite_id: String,
    pub candidate_id: String,
    pub dataset: String,
    /// Serialized `key=value;...` parameter assignment.
    pub parameters: String,
    pub status: ExperimentStatus,
    /// Stamped on the transition to Running.
    pub started_ts: Option<DateTime<Utc>>,
    /// Stamped on the transition to Completed.
    pub completed_ts: Option<DateTime<Utc>>,
    /// Path to the persisted metrics artifact, once delivered.
    pub metrics_path: Option<PathBuf>,
    /// Path to the persisted ROC plot, once delivered.
    pub roc_path: Option<PathBuf>,
}

impl Experiment {
    pub fn new(suite_id: &str, candidate_id: &str, dataset: &str, parameters: &str) -> Self {
        Self {
            id: short_id("experiment"),
            suite_id: suite_id.to_string(),
            candidate_id: candidate_id.to_string(),
            dataset: dataset.to_string(),
            parameters: parameters.to_string(),
            status: ExperimentStatus::Created,
            started_ts: None,
            completed_ts: None,
            metrics_path: None,
            roc_path: None,
        }
    }

    /// Advance the status state machine.
    ///
    /// Transitions are forward-only: moving to an earlier or equal state,
    /// or out of a terminal state, is rejected. Running stamps
    /// `started_ts`, Completed stamps `completed_ts`.
    pub fn advance(&mut self, to: ExperimentStatus) -> Result<(), GauntletError> {
        if self.status.is_terminal() || to.ordinal() <= self.status.ordinal() {
            return Err(GauntletError::InvalidTransition {
                from: self.status.to_string(),
                to: to.to_string(),
            });
        }
        if to == ExperimentStatus::Running {
            self.started_ts = Some(Utc::now());
        }
        if to == ExperimentStatus::Completed {
            self.completed_ts = Some(Utc::now());
        }
        self.status = to;
        Ok(())
    }

    /// Wall-clock execution time in whole microseconds, available once
    /// the experiment has both started and completed.
    pub fn execution_time_micros(&self) -> Option<i64> {
        let started = self.started_ts?;
        let completed = self.completed_ts?;
        (completed - started).num_microseconds()
    }
}

// ── Worker ────────────────────────────────────────────────────────

/// A remote execution agent running at most one experiment at a time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Worker {
    pub id: String,
    pub hostname: String,
    pub port: u16,
    /// The master's externally reachable address, handed to the worker
    /// so it can call back with status updates and results.
    pub master_address: String,
}

impl Worker {
    pub fn new(hostname: &str, port: u16, master_address: &str) -> Self {
        Self {
            id: short_id("worker"),
            hostname: hostname.to_string(),
            port,
            master_address: master_address.to_string(),
        }
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.hostname, self.port)
    }
}

// ── Tests ─────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    const ALL_STATUSES: [ExperimentStatus; 5] = [
        ExperimentStatus::Created,
        ExperimentStatus::Scheduled,
        ExperimentStatus::Running,
        ExperimentStatus::Completed,
        ExperimentStatus::Failed,
    ];

    #[test]
    fn status_strings_are_total_and_round_trip() {
        for status in ALL_STATUSES {
            let s = status.to_string();
            assert!(!s.is_empty());
            let parsed: ExperimentStatus = s.parse().unwrap();
            assert_eq!(parsed, status);
        }
        assert!("terminated".parse::<ExperimentStatus>().is_err());
    }

    #[test]
    fn short_ids_carry_tag_prefix() {
        let id = short_id("experiment");
        assert!(id.starts_with("expe"));
        assert_eq!(id.len(), 12);
        assert_ne!(short_id("experiment"), short_id("experiment"));
    }

    #[test]
    fn lifecycle_stamps_timestamps() {
        let mut exp = Experiment::new("suite1", "cand1", "shuttle", "k=2");
        assert_eq!(exp.status, ExperimentStatus::Created);
        assert!(exp.started_ts.is_none());

        exp.advance(ExperimentStatus::Scheduled).unwrap();
        assert!(exp.started_ts.is_none());

        exp.advance(ExperimentStatus::Running).unwrap();
        assert!(exp.started_ts.is_some());
        assert!(exp.completed_ts.is_none());

        exp.advance(ExperimentStatus::Completed).unwrap();
        assert!(exp.completed_ts.is_some());
    }

    #[test]
    fn backward_transitions_are_rejected() {
        let mut exp = Experiment::new("suite1", "cand1", "shuttle", "k=2");
        exp.advance(ExperimentStatus::Scheduled).unwrap();
        exp.advance(ExperimentStatus::Running).unwrap();

        assert!(exp.advance(ExperimentStatus::Scheduled).is_err());
        assert!(exp.advance(ExperimentStatus::Running).is_err());
    }

    #[test]
    fn terminal_states_accept_no_transitions() {
        let mut exp = Experiment::new("suite1", "cand1", "shuttle", "k=2");
        exp.advance(ExperimentStatus::Scheduled).unwrap();
        exp.advance(ExperimentStatus::Running).unwrap();
        exp.advance(ExperimentStatus::Completed).unwrap();

        assert!(exp.advance(ExperimentStatus::Failed).is_err());
    }

    #[test]
    fn failure_before_running_is_a_forward_transition() {
        let mut exp = Experiment::new("suite1", "cand1", "shuttle", "k=2");
        exp.advance(ExperimentStatus::Scheduled).unwrap();
        exp.advance(ExperimentStatus::Failed).unwrap();
        assert!(exp.started_ts.is_none());
    }

    #[test]
    fn execution_time_is_whole_microseconds() {
        let mut exp = Experiment::new("suite1", "cand1", "shuttle", "k=2");
        let started = Utc::now();
        exp.started_ts = Some(started);
        exp.completed_ts = Some(started + Duration::milliseconds(2500));
        assert_eq!(exp.execution_time_micros(), Some(2_500_000));
    }

    #[test]
    fn execution_time_requires_both_timestamps() {
        let exp = Experiment::new("suite1", "cand1", "shuttle", "k=2");
        assert_eq!(exp.execution_time_micros(), None);
    }
}
