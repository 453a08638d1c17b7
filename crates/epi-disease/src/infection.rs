//! The infection-probability aggregator shared by every model variant.
//!
//! For one agent in one step:
//!
//! ```text
//! p = 1 − Π(1 − p_contact) × Π(1 − p_event) + external_prevalence
//! ```
//!
//! `p_contact` ranges over the agent's surviving contacts, `p_event` over the
//! receive probabilities broadcast by surviving events.  The external term
//! is added after the product and the sum is not clamped: a value above 1
//! makes every uniform comparison succeed.

use std::fmt;
use std::sync::Arc;

use log::debug;

use epi_agent::{Agent, AgentStore, Contact, Event, Location};
use epi_core::{AgentId, StateId, Tick};

use crate::StateSet;

// ── Pluggable terms ───────────────────────────────────────────────────────────

/// Infection probability carried by one contact, given the contact's state
/// at the start of the step.
pub trait ContactProbability: Send + Sync {
    fn probability(&self, contact: &Contact, contact_state: StateId, states: &StateSet) -> f64;
}

impl<F> ContactProbability for F
where
    F: Fn(&Contact, StateId, &StateSet) -> f64 + Send + Sync,
{
    fn probability(&self, contact: &Contact, contact_state: StateId, states: &StateSet) -> f64 {
        self(contact, contact_state, states)
    }
}

/// Per-event infection terms.
pub trait EventInfection: Send + Sync {
    /// What one contributing participant adds to the event's ambient
    /// infection.
    fn contribution(&self, agent: &Agent, states: &StateSet, location: &Location, tick: Tick) -> f64;

    /// Receive probability broadcast to every receiving participant, given
    /// the event's ambient infection.
    fn receive_probability(&self, ambient: f64, location: &Location, tick: Tick) -> f64;
}

/// Additive risk from outside the modelled population.
pub trait ExternalPrevalence: Send + Sync {
    fn prevalence(&self, agent: &Agent, tick: Tick) -> f64;
}

impl<F> ExternalPrevalence for F
where
    F: Fn(&Agent, Tick) -> f64 + Send + Sync,
{
    fn prevalence(&self, agent: &Agent, tick: Tick) -> f64 {
        self(agent, tick)
    }
}

// ── Stock implementations ─────────────────────────────────────────────────────

/// `per_contact × intensity` for infectious contacts, 0 otherwise.
#[derive(Clone, Copy, Debug)]
pub struct InfectiousContact {
    pub per_contact: f64,
}

impl ContactProbability for InfectiousContact {
    fn probability(&self, contact: &Contact, contact_state: StateId, states: &StateSet) -> f64 {
        if states.is_infectious(contact_state) {
            self.per_contact * contact.intensity
        } else {
            0.0
        }
    }
}

/// Each infectious participant contributes 1; receivers face
/// `1 − (1 − per_infectious)^ambient`.
#[derive(Clone, Copy, Debug)]
pub struct AmbientEventInfection {
    pub per_infectious: f64,
}

impl EventInfection for AmbientEventInfection {
    fn contribution(&self, agent: &Agent, states: &StateSet, _location: &Location, _tick: Tick) -> f64 {
        match agent.state {
            Some(s) if states.is_infectious(s) => 1.0,
            _ => 0.0,
        }
    }

    fn receive_probability(&self, ambient: f64, _location: &Location, _tick: Tick) -> f64 {
        1.0 - (1.0 - self.per_infectious).powf(ambient)
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct NoPrevalence;

impl ExternalPrevalence for NoPrevalence {
    fn prevalence(&self, _agent: &Agent, _tick: Tick) -> f64 {
        0.0
    }
}

// ── InfectionRules ────────────────────────────────────────────────────────────

/// The three terms of the aggregator bundled for a model.
///
/// Defaults: certain infection from any infectious contact, a per-infectious
/// event risk of 1, and no external prevalence.
#[derive(Clone)]
pub struct InfectionRules {
    contact:  Arc<dyn ContactProbability>,
    event:    Arc<dyn EventInfection>,
    external: Arc<dyn ExternalPrevalence>,
}

impl Default for InfectionRules {
    fn default() -> Self {
        Self {
            contact:  Arc::new(InfectiousContact { per_contact: 1.0 }),
            event:    Arc::new(AmbientEventInfection { per_infectious: 1.0 }),
            external: Arc::new(NoPrevalence),
        }
    }
}

impl fmt::Debug for InfectionRules {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InfectionRules").finish_non_exhaustive()
    }
}

impl InfectionRules {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_contact(mut self, contact: impl ContactProbability + 'static) -> Self {
        self.contact = Arc::new(contact);
        self
    }

    pub fn with_event(mut self, event: impl EventInfection + 'static) -> Self {
        self.event = Arc::new(event);
        self
    }

    pub fn with_external(mut self, external: impl ExternalPrevalence + 'static) -> Self {
        self.external = Arc::new(external);
        self
    }

    /// Aggregate infection probability of `agent` this step.
    ///
    /// Reads contacts' current (pre-commit) states only.  Contacts whose
    /// other end has no state yet carry no risk.
    pub fn infection_probability(
        &self,
        agent:  AgentId,
        agents: &AgentStore,
        states: &StateSet,
        tick:   Tick,
    ) -> f64 {
        let Some(me) = agents.get(agent) else {
            return 0.0;
        };

        let contact_escape: f64 = me
            .contacts
            .iter()
            .filter_map(|c| {
                agents
                    .state_of(c.other)
                    .map(|s| 1.0 - self.contact.probability(c, s, states))
            })
            .product();

        let event_escape: f64 = me.event_probabilities.iter().map(|p| 1.0 - p).product();

        let p = 1.0 - contact_escape * event_escape + self.external.prevalence(me, tick);
        if p > 1.0 {
            debug!("{agent} infection probability {p} exceeds 1 at {tick}");
        }
        p
    }

    /// Ambient infection of `event` from its contributing participants,
    /// turned into the single receive probability all receivers share.
    pub fn event_receive_probability(
        &self,
        event:    &Event,
        location: &Location,
        agents:   &AgentStore,
        states:   &StateSet,
        tick:     Tick,
    ) -> f64 {
        let ambient: f64 = event
            .contributing
            .iter()
            .filter_map(|&a| agents.get(a))
            .map(|a| self.event.contribution(a, states, location, tick))
            .sum();
        self.event.receive_probability(ambient, location, tick)
    }
}
