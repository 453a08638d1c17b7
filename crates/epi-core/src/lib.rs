//! `epi-core` — foundational types for the `episim` epidemic simulator.
//!
//! This crate is a dependency of every other `epi-*` crate.  It intentionally
//! has no `epi-*` dependencies and minimal external ones (only `rand` and
//! `thiserror`, plus optional `serde`).
//!
//! # What lives here
//!
//! | Module    | Contents                                                    |
//! |-----------|-------------------------------------------------------------|
//! | [`ids`]   | `AgentId`, `LocationId`, `StateId`, `PolicySlot`            |
//! | [`time`]  | `Tick`, `WorldStep`, `SimConfig`                            |
//! | [`rng`]   | `SimRng` (shared, whole run), `AgentRng` (per agent, per step) |
//! | [`error`] | `EpiError`, `EpiResult`                                     |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                     |
//! |---------|------------------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to all public types.        |

pub mod error;
pub mod ids;
pub mod rng;
pub mod time;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use error::{EpiError, EpiResult};
pub use ids::{AgentId, LocationId, PolicySlot, StateId};
pub use rng::{AgentRng, SimRng};
pub use time::{SimConfig, Tick, WorldStep};
