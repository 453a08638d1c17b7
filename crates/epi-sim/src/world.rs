//! `World`: many independent worlds from one seed.

use log::info;

use epi_core::SimRng;
use epi_disease::DiseaseModel;

use crate::{SimObserver, SimResult, Simulation, Trajectory, TrajectorySummary};

/// Everything a multi-world run produces.
#[derive(Clone, Debug)]
pub struct RunOutcome {
    /// One per world, in world order.
    pub trajectories: Vec<Trajectory>,
    pub summary:      TrajectorySummary,
}

/// Runs `config.worlds` worlds of a [`Simulation`] back to back.
///
/// One [`SimRng`] seeded from `config.seed` is shared by every world and
/// never re-seeded, so world `k` depends on every draw worlds `0..k` made.
/// A later world cannot be reproduced on its own, only by re-running every
/// world before it.
pub struct World<M: DiseaseModel> {
    simulation: Simulation<M>,
}

impl<M: DiseaseModel> World<M> {
    pub fn new(simulation: Simulation<M>) -> Self {
        Self { simulation }
    }

    pub fn simulation(&self) -> &Simulation<M> {
        &self.simulation
    }

    pub fn into_inner(self) -> Simulation<M> {
        self.simulation
    }

    pub fn run<O: SimObserver>(&mut self, observer: &mut O) -> SimResult<RunOutcome> {
        let config = self.simulation.config().clone();
        let mut rng = SimRng::new(config.seed);
        info!("running {} worlds of {} steps, seed {}", config.worlds, config.steps, config.seed);

        let mut trajectories = Vec::with_capacity(config.worlds);
        for world in 0..config.worlds {
            trajectories.push(self.simulation.run_world(world, &mut rng, observer)?);
        }

        let summary = TrajectorySummary::from_trajectories(&trajectories)?;
        observer.on_run_end(&summary);
        Ok(RunOutcome { trajectories, summary })
    }
}
