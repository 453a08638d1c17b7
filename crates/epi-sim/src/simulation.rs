//! The `Simulation` struct: one world, stepped.

use log::{debug, info};

use epi_agent::{AgentStore, LocationStore, Population, Transition};
use epi_core::{AgentId, AgentRng, PolicySlot, SimConfig, SimRng, Tick, WorldStep};
use epi_disease::{DiseaseModel, ModelResult};
use epi_policy::{Policy, PolicyContext};

use crate::{SimError, SimObserver, SimResult, StepSource, Trajectory, filter};

/// Which per-step policy hook to call.
#[derive(Copy, Clone)]
enum Hook {
    Reset,
    Enact,
    Post,
}

// ── Simulation ────────────────────────────────────────────────────────────────

/// The simulation runner for one world at a time.
///
/// `Simulation<M>` owns the template population, the disease model, the
/// policy list and the step feed.  Each world starts from a fresh clone of
/// the template and runs the nine-phase step:
///
/// 1. **Reset**: clear contacts, event probabilities and lockdowns; reset
///    modifiers; decrement countdowns.
/// 2. **Load**: the [`StepSource`] writes raw contacts and events.
/// 3. **Enact**: every policy's `enact_policy`, in registration order.
/// 4. **Filter**: contact and event survival draws (see [`filter`]).
/// 5. **Post**: every policy's `post_policy`.
/// 6. **Events**: the model broadcasts each event's receive probability.
/// 7. **Compute** (optionally parallel with the `parallel` feature): every
///    agent's next state from the frozen pre-step snapshot.
/// 8. **Commit** (sequential, ascending `AgentId`): staged states become
///    current.
/// 9. **Record**: population count per state.
///
/// Create via [`SimulationBuilder`][crate::SimulationBuilder].
pub struct Simulation<M: DiseaseModel> {
    pub(crate) config:     SimConfig,
    pub(crate) model:      M,
    pub(crate) population: Population,
    pub(crate) policies:   Vec<Box<dyn Policy>>,
    pub(crate) source:     Box<dyn StepSource>,

    /// Live state of the current world.
    pub(crate) agents:    AgentStore,
    pub(crate) locations: LocationStore,

    #[cfg(feature = "parallel")]
    pub(crate) pool: Option<rayon::ThreadPool>,
}

impl<M: DiseaseModel> Simulation<M> {
    // ── Accessors ─────────────────────────────────────────────────────────

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    /// The template every world is cloned from.
    pub fn population(&self) -> &Population {
        &self.population
    }

    pub fn policies(&self) -> &[Box<dyn Policy>] {
        &self.policies
    }

    /// Agents of the current (or last finished) world.
    pub fn agents(&self) -> &AgentStore {
        &self.agents
    }

    /// Mutable agents of the current world, for setting up scenarios
    /// between [`start_world`](Self::start_world) and the first
    /// [`step`](Self::step).
    pub fn agents_mut(&mut self) -> &mut AgentStore {
        &mut self.agents
    }

    pub fn locations(&self) -> &LocationStore {
        &self.locations
    }

    /// Population count per state, indexed by `StateId`.
    pub fn counts(&self) -> Vec<usize> {
        self.agents.state_counts(self.model.states().len())
    }

    // ── Running ───────────────────────────────────────────────────────────

    /// Run world `world` from initialization to its last step.
    pub fn run_world<O: SimObserver>(
        &mut self,
        world:    usize,
        rng:      &mut SimRng,
        observer: &mut O,
    ) -> SimResult<Trajectory> {
        self.start_world(world, rng)?;
        observer.on_world_start(world);

        let mut trajectory = Trajectory::new(self.model.states().labels().to_vec());
        trajectory.push(&self.counts());

        for t in 0..self.config.steps {
            let step = WorldStep::new(world, Tick(t));
            self.step(step, rng)?;
            let counts = self.counts();
            debug!("{step}: {counts:?}");
            observer.on_step_end(step, &self.agents, &counts);
            trajectory.push(&counts);
        }

        info!("world {world} finished: {:?}", trajectory.last().unwrap_or_default());
        for policy in &self.policies {
            let report = policy.report();
            if !report.is_empty() {
                info!("world {world} {}: {report:?}", policy.name());
            }
        }
        observer.on_world_end(world, &trajectory);
        Ok(trajectory)
    }

    /// Clone the template population, assign initial states, and reset the
    /// feed and every policy.
    pub fn start_world(&mut self, world: usize, rng: &mut SimRng) -> SimResult<()> {
        self.agents = self.population.agents.clone();
        self.locations = self.population.locations.clone();
        self.agents.ensure_policy_slots(self.policies.len());

        self.model.initialize_states(&mut self.agents, rng)?;
        self.source.reset();
        self.run_policies(Hook::Reset, WorldStep::new(world, Tick::ZERO), rng)?;

        info!(
            "world {world} started: {} agents, {} locations, {} policies, initial {:?}",
            self.agents.len(),
            self.locations.len(),
            self.policies.len(),
            self.counts()
        );
        Ok(())
    }

    /// Run one full step of the current world.
    pub fn step(&mut self, step: WorldStep, rng: &mut SimRng) -> SimResult<()> {
        // ── ① Reset ephemeral fields ──────────────────────────────────────
        for (_, agent) in self.agents.iter_mut() {
            agent.begin_step();
        }
        for (_, location) in self.locations.iter_mut() {
            location.begin_step();
        }

        // ── ② External feed ───────────────────────────────────────────────
        self.source.load(step, &mut self.agents, &mut self.locations, rng)?;

        // ── ③ Policies on the raw sets ────────────────────────────────────
        self.run_policies(Hook::Enact, step, rng)?;

        // ── ④ Survival filtering ──────────────────────────────────────────
        filter::filter_step(step, &mut self.agents, &mut self.locations, rng);

        // ── ⑤ Policies on the filtered sets ───────────────────────────────
        self.run_policies(Hook::Post, step, rng)?;

        // ── ⑥ Event infection broadcast ───────────────────────────────────
        for (_, location) in self.locations.iter() {
            for event in &location.events {
                self.model.update_event_infection(event, location, &mut self.agents, step.tick);
            }
        }

        // ── ⑦ Next states from the frozen snapshot ────────────────────────
        let transitions = self.compute_transitions(step.tick, rng)?;

        // ── ⑧ Commit ──────────────────────────────────────────────────────
        for (id, transition) in transitions {
            self.agents[id].stage(id, transition)?;
        }
        let mut changed = 0;
        for (_, agent) in self.agents.iter_mut() {
            changed += usize::from(agent.commit());
        }
        debug!("{step}: {changed} agents changed state");
        Ok(())
    }

    /// Compute every agent's transition against `&self.agents`.
    ///
    /// Per-agent RNGs are derived from the shared generator in ascending
    /// `AgentId` order before any model call, so the sequential and
    /// parallel paths see identical draws.
    fn compute_transitions(&self, tick: Tick, rng: &mut SimRng) -> SimResult<Vec<(AgentId, Transition)>> {
        let rngs: Vec<AgentRng> = self.agents.ids().map(|id| rng.agent_child(id)).collect();

        // Explicit field borrows: the closure only ever reads.
        let agents = &self.agents;
        let model = &self.model;
        let next = |(i, mut agent_rng): (usize, AgentRng)| -> ModelResult<(AgentId, Transition)> {
            let id = AgentId(i as u32);
            model.find_next_state(id, agents, tick, &mut agent_rng).map(|t| (id, t))
        };

        #[cfg(not(feature = "parallel"))]
        {
            Ok(rngs.into_iter().enumerate().map(next).collect::<ModelResult<Vec<_>>>()?)
        }

        #[cfg(feature = "parallel")]
        {
            use rayon::prelude::*;

            let run = || rngs.into_par_iter().enumerate().map(next).collect::<ModelResult<Vec<_>>>();
            let out = match &self.pool {
                Some(pool) => pool.install(run),
                None => run(),
            };
            Ok(out?)
        }
    }

    fn run_policies(&mut self, hook: Hook, step: WorldStep, rng: &mut SimRng) -> SimResult<()> {
        for (i, policy) in self.policies.iter_mut().enumerate() {
            let slot = PolicySlot::try_from(i)
                .map_err(|_| SimError::Config(format!("policy {i} exceeds the slot range")))?;
            let mut ctx = PolicyContext::new(
                step,
                &mut self.agents,
                &mut self.locations,
                &self.model,
                slot,
                rng,
            );
            let result = match hook {
                Hook::Reset => policy.reset(&mut ctx),
                Hook::Enact => policy.enact_policy(&mut ctx),
                Hook::Post => policy.post_policy(&mut ctx),
            };
            result.map_err(|source| SimError::Policy { policy: policy.name().to_owned(), source })?;
        }
        Ok(())
    }
}
