//! Simulation observer trait for progress reporting and data collection.

use epi_agent::AgentStore;
use epi_core::WorldStep;

use crate::{Trajectory, TrajectorySummary};

/// Callbacks invoked by [`Simulation::run_world`][crate::Simulation::run_world]
/// and [`World::run`][crate::World::run].
///
/// All methods have default no-op implementations so implementors only need
/// to override what they care about.
///
/// # Example — progress printer
///
/// ```rust,ignore
/// struct Progress;
///
/// impl SimObserver for Progress {
///     fn on_world_end(&mut self, world: usize, trajectory: &Trajectory) {
///         println!("world {world}: {:?}", trajectory.last());
///     }
/// }
/// ```
pub trait SimObserver {
    /// Called after the world's states are initialized, before step 0.
    fn on_world_start(&mut self, _world: usize) {}

    /// Called after a step commits.  `counts` is indexed by `StateId`.
    fn on_step_end(&mut self, _step: WorldStep, _agents: &AgentStore, _counts: &[usize]) {}

    /// Called once a world's last step has been recorded.
    fn on_world_end(&mut self, _world: usize, _trajectory: &Trajectory) {}

    /// Called once after every world has finished.
    fn on_run_end(&mut self, _summary: &TrajectorySummary) {}
}

/// A [`SimObserver`] that does nothing.
pub struct NoopObserver;

impl SimObserver for NoopObserver {}
