//! `epi-agent` — per-entity state containers for the `episim` simulator.
//!
//! # Crate layout
//!
//! | Module       | Contents                                                    |
//! |--------------|-------------------------------------------------------------|
//! | [`agent`]    | `Agent`, `Contact`, `Transition`                            |
//! | [`location`] | `Location`, `Event`                                         |
//! | [`history`]  | `PolicyRecord`, `PolicyEntry`, `TestResult`, `TestOutcome`  |
//! | [`store`]    | `AgentStore`, `LocationStore` (key → id lookup + `Vec`s)    |
//! | [`builder`]  | `PopulationBuilder`, `Population`                           |
//! | [`loader`]   | `load_agents_reader`, `load_locations_reader` (CSV)         |
//! | [`error`]    | `AgentError`, `AgentResult<T>`                              |
//!
//! Records carry bookkeeping only.  All behavior (disease transitions,
//! filtering, policies) lives in the crates that consume them.
//!
//! # Feature flags
//!
//! | Flag      | Effect                                                   |
//! |-----------|----------------------------------------------------------|
//! | `fx-hash` | FxHash instead of SipHash for key lookup tables.         |
//! | `serde`   | Derives `Serialize`/`Deserialize` on record types.       |

pub mod agent;
pub mod builder;
pub mod error;
pub mod history;
pub mod loader;
pub mod location;
pub mod store;

#[cfg(test)]
mod tests;

pub use agent::{Agent, Contact, Transition};
pub use builder::{Population, PopulationBuilder};
pub use error::{AgentError, AgentResult};
pub use history::{PolicyEntry, PolicyRecord, TestOutcome, TestResult};
pub use loader::{load_agents_csv, load_agents_reader, load_locations_csv, load_locations_reader};
pub use location::{Event, Location};
pub use store::{AgentStore, LocationStore};
