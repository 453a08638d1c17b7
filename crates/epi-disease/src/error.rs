use epi_core::AgentId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("a disease model needs at least one state")]
    NoStates,

    #[error("{0} states exceed the StateId range")]
    TooManyStates(usize),

    #[error("unknown state {0:?}")]
    UnknownState(String),

    #[error("state {0:?} declared twice")]
    DuplicateState(String),

    #[error("starting proportions sum to {sum}, expected 1")]
    ProportionSum { sum: f64 },

    #[error("weights out of {from:?} sum to {sum}, expected 1")]
    WeightSum { from: String, sum: f64 },

    #[error("{what} must lie in [0, 1], got {value}")]
    InvalidProbability { what: String, value: f64 },

    #[error("transition {from:?} -> {to:?} declared twice")]
    DuplicateTransition { from: String, to: String },

    #[error("state {from:?} already has a transition rule")]
    DuplicateRule { from: String },

    #[error("invalid duration for {state:?}: {reason}")]
    InvalidDuration { state: String, reason: String },

    #[error("{0} has no disease state; initialize the world first")]
    Uninitialized(AgentId),
}

pub type ModelResult<T> = Result<T, ModelError>;
