//! Framework error type.
//!
//! Sub-crates define their own error enums and wrap `EpiError` as one variant
//! via `#[from]`, so `?` works across crate boundaries.

use thiserror::Error;

use crate::{AgentId, LocationId};

/// The top-level error type for `epi-core` and a common base for sub-crates.
#[derive(Debug, Error)]
pub enum EpiError {
    #[error("agent {0} not found")]
    AgentNotFound(AgentId),

    #[error("location {0} not found")]
    LocationNotFound(LocationId),

    #[error("unknown agent key {0:?}")]
    UnknownAgentKey(String),

    #[error("unknown location key {0:?}")]
    UnknownLocationKey(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Shorthand result type for all `epi-*` crates.
pub type EpiResult<T> = Result<T, EpiError>;
