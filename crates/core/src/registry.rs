//! In-memory entity store.
//!
//! One `Registry` instance owns every suite, candidate, dataset,
//! experiment, and worker for the lifetime of the master process. Entities
//! are append-only: nothing is ever deleted, and a restart loses all suite
//! state (resubmission is the recovery path).
//!
//! Maps are insertion-ordered so snapshots come back in creation order —
//! the scheduling loop relies on that for its FIFO dispatch queue, and the
//! worker list keeps its configuration-file order for round-robin.

use indexmap::IndexMap;

use crate::entity::{Candidate, Dataset, Experiment, Suite, Worker};
use crate::error::GauntletError;

#[derive(Debug, Default)]
pub struct Registry {
    suites: IndexMap<String, Suite>,
    candidates: IndexMap<String, Candidate>,
    datasets: IndexMap<String, Dataset>,
    experiments: IndexMap<String, Experiment>,
    workers: IndexMap<String, Worker>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Suites ────────────────────────────────────────────────────

    pub fn create_suite(&mut self) -> Suite {
        let suite = Suite::new();
        self.suites.insert(suite.id.clone(), suite.clone());
        suite
    }

    pub fn suite(&self, id: &str) -> Result<&Suite, GauntletError> {
        self.suites
            .get(id)
            .ok_or_else(|| GauntletError::SuiteNotFound(id.to_string()))
    }

    pub fn suites(&self) -> Vec<Suite> {
        self.suites.values().cloned().collect()
    }

    // ── Candidates ────────────────────────────────────────────────

    pub fn insert_candidate(&mut self, candidate: Candidate) -> Candidate {
        self.candidates
            .insert(candidate.id.clone(), candidate.clone());
        candidate
    }

    pub fn candidate(&self, id: &str) -> Result<&Candidate, GauntletError> {
        self.candidates
            .get(id)
            .ok_or_else(|| GauntletError::CandidateNotFound(id.to_string()))
    }

    /// The candidate submitted with a suite (one per suite in the current
    /// model; linear scan is fine at these cardinalities).
    pub fn candidate_by_suite(&self, suite_id: &str) -> Option<&Candidate> {
        self.candidates.values().find(|c| c.suite_id == suite_id)
    }

    // ── Datasets ──────────────────────────────────────────────────

    pub fn insert_dataset(&mut self, dataset: Dataset) -> Dataset {
        self.datasets.insert(dataset.id.clone(), dataset.clone());
        dataset
    }

    pub fn dataset_by_name(&self, name: &str) -> Option<&Dataset> {
        self.datasets.values().find(|d| d.name == name)
    }

    pub fn datasets(&self) -> Vec<Dataset> {
        self.datasets.values().cloned().collect()
    }

    pub fn has_datasets(&self) -> bool {
        !self.datasets.is_empty()
    }

    // ── Experiments ───────────────────────────────────────────────

    pub fn insert_experiment(&mut self, experiment: Experiment) -> Experiment {
        self.experiments
            .insert(experiment.id.clone(), experiment.clone());
        experiment
    }

    pub fn experiment(&self, id: &str) -> Result<&Experiment, GauntletError> {
        self.experiments
            .get(id)
            .ok_or_else(|| GauntletError::ExperimentNotFound(id.to_string()))
    }

    pub fn experiment_mut(&mut self, id: &str) -> Result<&mut Experiment, GauntletError> {
        self.experiments
            .get_mut(id)
            .ok_or_else(|| GauntletError::ExperimentNotFound(id.to_string()))
    }

    /// Snapshot of a suite's experiments in creation order.
    pub fn experiments_by_suite(&self, suite_id: &str) -> Vec<Experiment> {
        self.experiments
            .values()
            .filter(|e| e.suite_id == suite_id)
            .cloned()
            .collect()
    }

    // ── Workers ───────────────────────────────────────────────────

    pub fn insert_worker(&mut self, worker: Worker) -> Worker {
        self.workers.insert(worker.id.clone(), worker.clone());
        worker
    }

    pub fn worker(&self, id: &str) -> Result<&Worker, GauntletError> {
        self.workers
            .get(id)
            .ok_or_else(|| GauntletError::WorkerNotFound(id.to_string()))
    }

    /// Snapshot of the worker pool in registration order.
    pub fn workers(&self) -> Vec<Worker> {
        self.workers.values().cloned().collect()
    }

    pub fn has_workers(&self) -> bool {
        !self.workers.is_empty()
    }
}

// ── Tests ─────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn sample_experiment(registry: &mut Registry, suite_id: &str, dataset: &str) -> Experiment {
        registry.insert_experiment(Experiment::new(suite_id, "cand1", dataset, "k=1"))
    }

    #[test]
    fn lookups_fail_with_not_found() {
        let registry = Registry::new();
        assert!(matches!(
            registry.suite("missing"),
            Err(GauntletError::SuiteNotFound(_))
        ));
        assert!(matches!(
            registry.experiment("missing"),
            Err(GauntletError::ExperimentNotFound(_))
        ));
    }

    #[test]
    fn experiments_filter_by_suite_in_creation_order() {
        let mut registry = Registry::new();
        let suite = registry.create_suite();
        let other = registry.create_suite();

        let first = sample_experiment(&mut registry, &suite.id, "a");
        sample_experiment(&mut registry, &other.id, "b");
        let second = sample_experiment(&mut registry, &suite.id, "c");

        let experiments = registry.experiments_by_suite(&suite.id);
        assert_eq!(experiments.len(), 2);
        assert_eq!(experiments[0].id, first.id);
        assert_eq!(experiments[1].id, second.id);
    }

    #[test]
    fn unknown_suite_has_no_experiments() {
        let registry = Registry::new();
        assert!(registry.experiments_by_suite("nope").is_empty());
    }

    #[test]
    fn datasets_look_up_by_name() {
        let mut registry = Registry::new();
        assert!(!registry.has_datasets());
        registry.insert_dataset(Dataset::new("shuttle", PathBuf::from("/data/shuttle.arff")));
        assert!(registry.has_datasets());
        assert!(registry.dataset_by_name("shuttle").is_some());
        assert!(registry.dataset_by_name("mulcross").is_none());
    }

    #[test]
    fn workers_keep_registration_order() {
        let mut registry = Registry::new();
        registry.insert_worker(Worker::new("worker-a", 3291, "master:3290"));
        registry.insert_worker(Worker::new("worker-b", 3291, "master:3290"));

        let workers = registry.workers();
        assert_eq!(workers[0].hostname, "worker-a");
        assert_eq!(workers[1].hostname, "worker-b");
    }

    #[test]
    fn experiment_mut_allows_status_updates() {
        let mut registry = Registry::new();
        let suite = registry.create_suite();
        let exp = sample_experiment(&mut registry, &suite.id, "a");

        registry
            .experiment_mut(&exp.id)
            .unwrap()
            .advance(crate::entity::ExperimentStatus::Scheduled)
            .unwrap();
        assert_eq!(
            registry.experiment(&exp.id).unwrap().status,
            crate::entity::ExperimentStatus::Scheduled
        );
    }
}
