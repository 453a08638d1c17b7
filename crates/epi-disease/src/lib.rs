//! `epi-disease` — disease state machines for the `episim` simulator.
//!
//! # Crate layout
//!
//! | Module          | Contents                                                     |
//! |-----------------|--------------------------------------------------------------|
//! | [`state`]       | `StateSet` — ordered labels plus the infectious subset       |
//! | [`choice`]      | `WeightedChoice`, cumulative-draw selection, exact partitions |
//! | [`probability`] | `TransitionProbability` (constant / timed / infection / custom) |
//! | [`infection`]   | `InfectionRules` — contact, event, and external-prevalence terms |
//! | [`model`]       | `DiseaseModel` trait                                         |
//! | [`stochastic`]  | `StochasticModel` + builder                                  |
//! | [`scheduled`]   | `ScheduledModel` + builder, `StateDuration`                  |
//! | [`error`]       | `ModelError`, `ModelResult<T>`                               |
//!
//! # Design notes
//!
//! Models own configuration only.  Per-agent data lives in `AgentStore`, and
//! the simulation drives every model through the same two calls:
//!
//! 1. [`DiseaseModel::find_next_state`] for every agent, against an
//!    immutable `&AgentStore` (the pre-step snapshot).
//! 2. The simulation commits the collected transitions afterwards.
//!
//! A model is built once per program run and shared read-only by every
//! world, so `DiseaseModel` is `Send + Sync`.

pub mod choice;
pub mod error;
pub mod infection;
pub mod model;
pub mod probability;
pub mod scheduled;
pub mod state;
pub mod stochastic;

#[cfg(test)]
mod tests;

pub use choice::{WeightedChoice, exact_counts, partition_states};
pub use error::{ModelError, ModelResult};
pub use infection::{
    AmbientEventInfection, ContactProbability, EventInfection, ExternalPrevalence,
    InfectionRules, InfectiousContact, NoPrevalence,
};
pub use model::DiseaseModel;
pub use probability::{AgentProbability, TimeCurve, TransitionProbability};
pub use scheduled::{DurationSampler, ScheduledModel, ScheduledModelBuilder, StateDuration};
pub use state::StateSet;
pub use stochastic::{StochasticModel, StochasticModelBuilder};
