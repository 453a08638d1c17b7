//! The `DiseaseModel` trait — the seam between the simulation and a
//! concrete state machine.

use epi_agent::{AgentStore, Event, Location, Transition};
use epi_core::{AgentId, AgentRng, SimRng, StateId, Tick};

use crate::{InfectionRules, ModelResult, StateSet};

/// A disease state machine.
///
/// # Required methods
///
/// [`states`](Self::states), [`infection`](Self::infection),
/// [`initialize_states`](Self::initialize_states) and
/// [`find_next_state`](Self::find_next_state).  Event handling has a default
/// built on [`InfectionRules`].
///
/// # Thread safety
///
/// `find_next_state` may be called for many agents in parallel (the
/// `parallel` feature of `epi-sim`), so implementations must be
/// `Send + Sync` and must treat `agents` as a frozen snapshot.
pub trait DiseaseModel: Send + Sync {
    /// Ordered state labels and the infectious subset.
    fn states(&self) -> &StateSet;

    /// Terms used to aggregate infection probability.
    fn infection(&self) -> &InfectionRules;

    /// Assign every agent its starting state (and countdown) at world start.
    fn initialize_states(&self, agents: &mut AgentStore, rng: &mut SimRng) -> ModelResult<()>;

    /// Decide `agent`'s state for the end of this step.
    ///
    /// Reads the pre-step snapshot only; the caller commits afterwards.
    fn find_next_state(
        &self,
        agent:  AgentId,
        agents: &AgentStore,
        tick:   Tick,
        rng:    &mut AgentRng,
    ) -> ModelResult<Transition>;

    /// Infectious states in declared order.
    fn infectious_states(&self) -> Vec<StateId> {
        self.states().infectious_ids().collect()
    }

    /// Compute `event`'s receive probability from its contributing
    /// participants and broadcast it to every receiving participant.
    /// Returns the broadcast value.
    fn update_event_infection(
        &self,
        event:    &Event,
        location: &Location,
        agents:   &mut AgentStore,
        tick:     Tick,
    ) -> f64 {
        let p = self
            .infection()
            .event_receive_probability(event, location, agents, self.states(), tick);
        for &receiver in &event.receiving {
            if let Some(agent) = agents.get_mut(receiver) {
                agent.event_probabilities.push(p);
            }
        }
        p
    }
}
