//! CSV export of completed suite results.
//!
//! One row per Completed experiment; Failed and non-terminal experiments
//! produce no row. Hyperparameter columns are sorted by name so the column
//! set is stable regardless of declaration order.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use gauntlet_core::entity::{Experiment, ExperimentStatus};
use gauntlet_core::error::GauntletError;
use gauntlet_core::params::parse_parameter_string;

/// The fields the workers' metrics artifact must carry. Extra fields are
/// ignored.
#[derive(Debug, Deserialize)]
pub struct Metrics {
    pub roc_auc: f64,
    pub average_precision: f64,
}

pub fn load_metrics(path: &Path) -> Result<Metrics, GauntletError> {
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

fn dump_header(parameter_names: &[String]) -> String {
    let mut fields = vec![
        "experiment_id".to_string(),
        "execution_time_microseconds".to_string(),
        "data".to_string(),
        "candidate".to_string(),
        "roc_auc".to_string(),
        "average_precision".to_string(),
    ];
    fields.extend(parameter_names.iter().cloned());
    format!("{}\n", fields.join(","))
}

fn digest_line(
    experiment: &Experiment,
    candidate_name: &str,
) -> Result<String, GauntletError> {
    let metrics_path = experiment
        .metrics_path
        .as_deref()
        .ok_or_else(|| GauntletError::Other(format!("metrics file not found for {}", experiment.id)))?;
    let metrics = load_metrics(metrics_path)?;

    let execution_time_microseconds = experiment.execution_time_micros().ok_or_else(|| {
        GauntletError::Other(format!("missing timestamps for {}", experiment.id))
    })?;

    let assignment = parse_parameter_string(&experiment.parameters)?;
    let mut sorted: Vec<_> = assignment.iter().collect();
    sorted.sort_by(|a, b| a.0.cmp(b.0));

    let mut fields = vec![
        experiment.id.clone(),
        execution_time_microseconds.to_string(),
        experiment.dataset.clone(),
        candidate_name.to_string(),
        metrics.roc_auc.to_string(),
        metrics.average_precision.to_string(),
    ];
    fields.extend(sorted.into_iter().map(|(_, v)| v.to_string()));
    Ok(format!("{}\n", fields.join(",")))
}

/// Build the full CSV document for a suite's experiments.
///
/// `candidate_names` maps candidate id to display name.
pub fn build_dump(
    experiments: &[Experiment],
    candidate_names: &HashMap<String, String>,
) -> Result<String, GauntletError> {
    let first = experiments
        .first()
        .ok_or_else(|| GauntletError::Other("suite has no experiments".to_string()))?;

    let mut parameter_names: Vec<String> = parse_parameter_string(&first.parameters)?
        .keys()
        .cloned()
        .collect();
    parameter_names.sort();

    let mut dump = dump_header(&parameter_names);
    for experiment in experiments {
        if experiment.status != ExperimentStatus::Completed {
            continue;
        }
        let candidate_name = candidate_names
            .get(&experiment.candidate_id)
            .ok_or_else(|| GauntletError::CandidateNotFound(experiment.candidate_id.clone()))?;
        dump.push_str(&digest_line(experiment, candidate_name)?);
    }
    Ok(dump)
}

// ── Tests ─────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::{Duration, Utc};
    use tempfile::TempDir;

    fn completed_experiment(
        tmp: &TempDir,
        dataset: &str,
        parameters: &str,
        execution_ms: i64,
        roc_auc: f64,
    ) -> Experiment {
        let mut exp = Experiment::new("suite1", "cand1", dataset, parameters);
        let started = Utc::now();
        exp.status = ExperimentStatus::Completed;
        exp.started_ts = Some(started);
        exp.completed_ts = Some(started + Duration::milliseconds(execution_ms));

        let metrics_path = tmp.path().join(format!("{}-metrics.json", exp.id));
        fs::write(
            &metrics_path,
            format!(
                r#"{{"roc_auc": {}, "average_precision": 0.5, "extra": "ignored"}}"#,
                roc_auc
            ),
        )
        .unwrap();
        exp.metrics_path = Some(metrics_path);
        exp
    }

    fn candidate_names() -> HashMap<String, String> {
        HashMap::from([("cand1".to_string(), "Knn".to_string())])
    }

    #[test]
    fn failed_experiments_produce_no_row() {
        let tmp = TempDir::new().unwrap();
        let mut failed = Experiment::new("suite1", "cand1", "shuttle", "k=2;seed=42");
        failed.status = ExperimentStatus::Failed;

        let experiments = vec![
            completed_experiment(&tmp, "shuttle", "k=1;seed=42", 2500, 0.9),
            completed_experiment(&tmp, "mulcross", "k=2;seed=42", 1000, 0.8),
            failed,
        ];

        let dump = build_dump(&experiments, &candidate_names()).unwrap();
        let lines: Vec<&str> = dump.lines().collect();
        assert_eq!(lines.len(), 3); // header + 2 data rows
    }

    #[test]
    fn header_lists_fixed_fields_then_sorted_parameters() {
        let tmp = TempDir::new().unwrap();
        let experiments = vec![completed_experiment(&tmp, "shuttle", "seed=42;k=1", 100, 0.9)];
        let dump = build_dump(&experiments, &candidate_names()).unwrap();
        assert!(dump.starts_with(
            "experiment_id,execution_time_microseconds,data,candidate,roc_auc,average_precision,k,seed\n"
        ));
    }

    #[test]
    fn execution_time_is_completed_minus_started_in_micros() {
        let tmp = TempDir::new().unwrap();
        let exp = completed_experiment(&tmp, "shuttle", "k=1", 2500, 0.97);
        let id = exp.id.clone();
        let dump = build_dump(&[exp], &candidate_names()).unwrap();

        let row = dump.lines().nth(1).unwrap();
        assert_eq!(row, format!("{},2500000,shuttle,Knn,0.97,0.5,1", id));
    }

    #[test]
    fn parameter_values_follow_sorted_name_order() {
        let tmp = TempDir::new().unwrap();
        let exp = completed_experiment(&tmp, "shuttle", "seed=42;alpha=0.5", 100, 0.9);
        let dump = build_dump(&[exp], &candidate_names()).unwrap();

        let row = dump.lines().nth(1).unwrap();
        // alpha sorts before seed
        assert!(row.ends_with(",0.5,42"));
    }

    #[test]
    fn empty_suite_is_an_error() {
        assert!(build_dump(&[], &candidate_names()).is_err());
    }
}
