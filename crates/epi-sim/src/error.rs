use epi_agent::AgentError;
use epi_core::EpiError;
use epi_disease::ModelError;
use epi_policy::PolicyError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("simulation configuration error: {0}")]
    Config(String),

    #[error("line {line}: {reason}")]
    Record { line: u64, reason: String },

    #[error("policy {policy:?} failed: {source}")]
    Policy {
        policy: String,
        #[source]
        source: PolicyError,
    },

    #[error("trajectories disagree: {0}")]
    Mismatch(String),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Agent(#[from] AgentError),

    #[error(transparent)]
    Core(#[from] EpiError),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type SimResult<T> = Result<T, SimError>;
