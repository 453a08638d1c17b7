//! The per-step external feed of interactions and events.
//!
//! Interactions are directed: a record `(agent, other)` puts one
//! [`Contact`] on `agent`'s list.  Use [`ScriptedSource::add_pair`] for the
//! usual symmetric case.

use epi_agent::{AgentStore, Contact, Event, LocationStore};
use epi_core::{AgentId, EpiError, LocationId, SimRng, Tick, WorldStep};

use crate::{SimError, SimResult};

#[cfg(feature = "fx-hash")]
type TickMap<V> = rustc_hash::FxHashMap<Tick, V>;
#[cfg(not(feature = "fx-hash"))]
type TickMap<V> = std::collections::HashMap<Tick, V>;

/// Writes one step's raw interactions onto agents and events onto
/// locations.
///
/// Called after ephemeral fields are cleared and before any policy runs.
pub trait StepSource: Send {
    fn load(
        &mut self,
        step:      WorldStep,
        agents:    &mut AgentStore,
        locations: &mut LocationStore,
        rng:       &mut SimRng,
    ) -> SimResult<()>;

    /// Called at the start of every world.
    ///
    /// Default: does nothing.
    fn reset(&mut self) {}
}

// ── Scripted records ──────────────────────────────────────────────────────────

/// One directed interaction.
#[derive(Clone, Debug, PartialEq)]
pub struct Interaction {
    pub agent:       AgentId,
    pub other:       AgentId,
    pub intensity:   f64,
    /// Chance the interaction happens in a given step.  `1.0` skips the
    /// draw.
    pub probability: f64,
}

impl Interaction {
    pub fn new(agent: AgentId, other: AgentId) -> Self {
        Self { agent, other, intensity: 1.0, probability: 1.0 }
    }

    pub fn with_intensity(mut self, intensity: f64) -> Self {
        self.intensity = intensity;
        self
    }

    pub fn with_probability(mut self, probability: f64) -> Self {
        self.probability = probability;
        self
    }
}

/// One event held at a location.
#[derive(Clone, Debug, PartialEq)]
pub struct ScriptedEvent {
    pub location:                 LocationId,
    pub participants:             Vec<AgentId>,
    pub probability_of_occurring: f64,
}

impl ScriptedEvent {
    pub fn new(location: LocationId, participants: Vec<AgentId>) -> Self {
        Self { location, participants, probability_of_occurring: 1.0 }
    }

    pub fn with_probability(mut self, probability_of_occurring: f64) -> Self {
        self.probability_of_occurring = probability_of_occurring;
        self
    }
}

// ── ScriptedSource ────────────────────────────────────────────────────────────

/// An in-memory feed: recurring records repeat every step, one-time records
/// fire only at their tick.
///
/// Probabilistic interactions consume one draw each per step, recurring
/// ones first, in insertion order.
#[derive(Clone, Debug, Default)]
pub struct ScriptedSource {
    interactions:          Vec<Interaction>,
    events:                Vec<ScriptedEvent>,
    one_time_interactions: TickMap<Vec<Interaction>>,
    one_time_events:       TickMap<Vec<ScriptedEvent>>,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every step.
    pub fn add_interaction(&mut self, interaction: Interaction) -> &mut Self {
        self.interactions.push(interaction);
        self
    }

    /// Every step, in both directions.
    pub fn add_pair(&mut self, a: AgentId, b: AgentId) -> &mut Self {
        self.add_interaction(Interaction::new(a, b));
        self.add_interaction(Interaction::new(b, a))
    }

    /// Only at `tick`.
    pub fn add_interaction_at(&mut self, tick: Tick, interaction: Interaction) -> &mut Self {
        self.one_time_interactions.entry(tick).or_default().push(interaction);
        self
    }

    /// Every step.
    pub fn add_event(&mut self, event: ScriptedEvent) -> &mut Self {
        self.events.push(event);
        self
    }

    /// Only at `tick`.
    pub fn add_event_at(&mut self, tick: Tick, event: ScriptedEvent) -> &mut Self {
        self.one_time_events.entry(tick).or_default().push(event);
        self
    }

    pub fn interaction_count(&self) -> usize {
        self.interactions.len() + self.one_time_interactions.values().map(Vec::len).sum::<usize>()
    }

    pub fn event_count(&self) -> usize {
        self.events.len() + self.one_time_events.values().map(Vec::len).sum::<usize>()
    }

    fn push_interaction(i: &Interaction, agents: &mut AgentStore, rng: &mut SimRng) -> SimResult<()> {
        if i.probability < 1.0 && !rng.bernoulli(i.probability) {
            return Ok(());
        }
        if agents.get(i.other).is_none() {
            return Err(EpiError::AgentNotFound(i.other).into());
        }
        let agent = agents
            .get_mut(i.agent)
            .ok_or(SimError::Core(EpiError::AgentNotFound(i.agent)))?;
        agent.contacts.push(Contact::with_intensity(i.other, i.intensity));
        Ok(())
    }

    fn push_event(e: &ScriptedEvent, locations: &mut LocationStore) -> SimResult<()> {
        let location = locations
            .get_mut(e.location)
            .ok_or(SimError::Core(EpiError::LocationNotFound(e.location)))?;
        location
            .events
            .push(Event::with_probability(e.participants.clone(), e.probability_of_occurring));
        Ok(())
    }
}

impl StepSource for ScriptedSource {
    fn load(
        &mut self,
        step:      WorldStep,
        agents:    &mut AgentStore,
        locations: &mut LocationStore,
        rng:       &mut SimRng,
    ) -> SimResult<()> {
        let once = self.one_time_interactions.get(&step.tick).map(Vec::as_slice).unwrap_or_default();
        for i in self.interactions.iter().chain(once) {
            Self::push_interaction(i, agents, rng)?;
        }
        let once = self.one_time_events.get(&step.tick).map(Vec::as_slice).unwrap_or_default();
        for e in self.events.iter().chain(once) {
            Self::push_event(e, locations)?;
        }
        Ok(())
    }
}
