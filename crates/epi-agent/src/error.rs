use epi_core::{AgentId, EpiError, PolicySlot};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("duplicate key {0:?}")]
    DuplicateKey(String),

    #[error("population file is missing the {0:?} column")]
    MissingColumn(&'static str),

    #[error("policy slot {slot} out of range ({available} slots allocated)")]
    SlotOutOfRange {
        slot:      PolicySlot,
        available: usize,
    },

    #[error("next state for {0} already set this step")]
    NextStateAlreadySet(AgentId),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Core(#[from] EpiError),
}

pub type AgentResult<T> = Result<T, AgentError>;
