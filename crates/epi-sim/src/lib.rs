//! `epi-sim` — the step orchestrator for the `episim` simulator.
//!
//! # Two-phase step
//!
//! ```text
//! for tick in 0..config.steps:
//!   ① Reset    — clear per-step agent/location fields, decrement countdowns
//!   ② Load     — StepSource writes the step's contacts and events
//!   ③ Enact    — Policy::enact_policy, registration order
//!   ④ Filter   — contact / event survival draws, lockdown
//!   ⑤ Post     — Policy::post_policy, registration order
//!   ⑥ Events   — DiseaseModel::update_event_infection per surviving event
//!   ⑦ Compute  — DiseaseModel::find_next_state for every agent against the
//!                frozen snapshot (parallel with the `parallel` feature)
//!   ⑧ Commit   — staged states become current, ascending AgentId
//!   ⑨ Record   — per-state population counts
//! ```
//!
//! No agent's next state can observe another agent's next state: states are
//! only written in ⑧, after every ⑦ call has returned.
//!
//! # Crate layout
//!
//! | Module         | Contents                                                     |
//! |----------------|--------------------------------------------------------------|
//! | [`simulation`] | `Simulation` — one world, stepped                            |
//! | [`builder`]    | `SimulationBuilder`                                          |
//! | [`world`]      | `World`, `RunOutcome` — many worlds from one seed            |
//! | [`source`]     | `StepSource`, `ScriptedSource`, `Interaction`, `ScriptedEvent` |
//! | [`loader`]     | CSV readers for interactions and events                      |
//! | [`filter`]     | contact and event survival filtering                         |
//! | [`trajectory`] | `Trajectory`, `TrajectorySummary`, `PointStats`              |
//! | [`observer`]   | `SimObserver`, `NoopObserver`                                |
//! | [`error`]      | `SimError`, `SimResult<T>`                                   |
//!
//! # Cargo features
//!
//! | Feature    | Effect                                                 |
//! |------------|--------------------------------------------------------|
//! | `parallel` | Runs the next-state phase on Rayon's thread pool.      |
//! | `fx-hash`  | FxHash for key lookups and the scripted feed.          |
//!
//! # Quick-start
//!
//! ```rust,ignore
//! use epi_sim::{NoopObserver, SimulationBuilder, World};
//!
//! let sim = SimulationBuilder::new(config, population, model)
//!     .policy(testing)
//!     .source(feed)
//!     .build()?;
//! let outcome = World::new(sim).run(&mut NoopObserver)?;
//! println!("{:?}", outcome.summary.get("Infected"));
//! ```

pub mod builder;
pub mod error;
pub mod filter;
pub mod loader;
pub mod observer;
pub mod simulation;
pub mod source;
pub mod trajectory;
pub mod world;


pub use builder::SimulationBuilder;
pub use error::{SimError, SimResult};
pub use filter::FilterStats;
pub use loader::{load_events_csv, load_events_reader, load_interactions_csv, load_interactions_reader};
pub use observer::{NoopObserver, SimObserver};
pub use simulation::Simulation;
pub use source::{Interaction, ScriptedEvent, ScriptedSource, StepSource};
pub use trajectory::{PointStats, Trajectory, TrajectorySummary};
pub use world::{RunOutcome, World};
