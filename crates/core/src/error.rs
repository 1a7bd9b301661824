use thiserror::Error;

#[derive(Error, Debug)]
pub enum GauntletError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialize(String),

    #[error("Suite not found: {0}")]
    SuiteNotFound(String),

    #[error("Candidate not found: {0}")]
    CandidateNotFound(String),

    #[error("Dataset not found: {0}")]
    DatasetNotFound(String),

    #[error("Experiment not found: {0}")]
    ExperimentNotFound(String),

    #[error("Worker not found: {0}")]
    WorkerNotFound(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Invalid status transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },

    #[error("Unknown status string: {0}")]
    UnknownStatus(String),

    #[error("Worker setup failed: {0}")]
    WorkerSetup(String),

    #[error("{0}")]
    Other(String),
}

impl From<serde_json::Error> for GauntletError {
    fn from(e: serde_json::Error) -> Self {
        GauntletError::Serialize(e.to_string())
    }
}
