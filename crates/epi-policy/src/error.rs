use epi_agent::AgentError;
use epi_core::AgentId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PolicyError {
    #[error("pooling needs napt >= 1 and ntpa >= 1, got napt={napt} ntpa={ntpa}")]
    InvalidPooling { napt: usize, ntpa: usize },

    #[error("machine {0:?} already registered with different parameters")]
    MachineConflict(String),

    #[error("machine {name:?}: {reason}")]
    InvalidMachine { name: String, reason: String },

    #[error("machine {0:?} is running and closed to new tubes")]
    MachineRunning(String),

    #[error("machine {0:?} is at capacity")]
    MachineFull(String),

    #[error("test tube is already registered to a machine")]
    TubeAlreadyRegistered,

    #[error("{0} not found in the agent store")]
    AgentNotFound(AgentId),

    #[error("{0} has no disease state and cannot be tested")]
    Untestable(AgentId),

    #[error("policy configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Agent(#[from] AgentError),
}

pub type PolicyResult<T> = Result<T, PolicyError>;
