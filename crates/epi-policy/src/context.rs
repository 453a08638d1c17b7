//! The mutable world view passed to policy hooks.

use epi_agent::{AgentStore, LocationStore};
use epi_core::{PolicySlot, SimRng, Tick, WorldStep};
use epi_disease::DiseaseModel;

/// Everything a policy may read or change during one hook call.
///
/// Built by the simulation for each call and dropped straight after, so the
/// borrows never outlive the hook.  Unlike the read-only next-state phase,
/// policies run one at a time and get `&mut` access to both stores.
pub struct PolicyContext<'a> {
    /// Current world and step, threaded explicitly rather than read from
    /// ambient state.
    pub step: WorldStep,

    pub agents: &'a mut AgentStore,

    pub locations: &'a mut LocationStore,

    /// The world's disease model; policies use it for the state set and the
    /// infectious subset.
    pub model: &'a dyn DiseaseModel,

    /// This policy's record slot on every agent.
    pub slot: PolicySlot,

    /// The run-wide generator.
    pub rng: &'a mut SimRng,
}

impl<'a> PolicyContext<'a> {
    pub fn new(
        step:      WorldStep,
        agents:    &'a mut AgentStore,
        locations: &'a mut LocationStore,
        model:     &'a dyn DiseaseModel,
        slot:      PolicySlot,
        rng:       &'a mut SimRng,
    ) -> Self {
        Self { step, agents, locations, model, slot, rng }
    }

    #[inline]
    pub fn tick(&self) -> Tick {
        self.step.tick
    }
}
