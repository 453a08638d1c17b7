//! `epi-policy` — intervention policies for the `episim` simulator.
//!
//! # Crate layout
//!
//! | Module        | Contents                                                        |
//! |---------------|-----------------------------------------------------------------|
//! | [`context`]   | `PolicyContext<'a>` — the live world handed to every policy hook |
//! | [`policy`]    | `Policy` trait, `NoopPolicy`                                    |
//! | [`tube`]      | `TestTube`, `Enrollment`                                        |
//! | [`machine`]   | `MachineSpec`, `Machine` (idle → running → idle)                |
//! | [`pooling`]   | `Pooling` — agents-per-tube / tubes-per-agent packing           |
//! | [`selection`] | `SelectionStrategy`, `RandomSelection`, `ContactsOfPositives`   |
//! | [`stats`]     | `TestingStats`                                                  |
//! | [`testing`]   | `TestPolicy` — the per-step testing pipeline                    |
//! | [`error`]     | `PolicyError`, `PolicyResult<T>`                                |
//!
//! # Design notes
//!
//! Policies run sequentially in registration order, so unlike disease models
//! they may hold mutable state of their own (machine queues, statistics).
//! Per-agent state belongs in the agent's `PolicyRecord` at the slot the
//! simulation assigned to the policy.
//!
//! Waiting is modelled as state carried between steps: a machine remembers
//! the step it started on and releases once `turnaround_time` steps have
//! elapsed.  Nothing blocks.

pub mod context;
pub mod error;
pub mod machine;
pub mod policy;
pub mod pooling;
pub mod selection;
pub mod stats;
pub mod testing;
pub mod tube;

#[cfg(test)]
mod tests;

pub use context::PolicyContext;
pub use error::{PolicyError, PolicyResult};
pub use machine::{Machine, MachineSpec};
pub use policy::{NoopPolicy, Policy};
pub use pooling::Pooling;
pub use selection::{ContactsOfPositives, RandomSelection, SelectionStrategy};
pub use stats::TestingStats;
pub use testing::{PENDING, TestPolicy};
pub use tube::{Enrollment, TestTube};
