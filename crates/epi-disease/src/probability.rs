//! Transition-probability rules.
//!
//! A rule is plain data dispatched by one `match` in
//! [`TransitionProbability::evaluate`].  The two open-ended variants hold a
//! trait object so applications can still plug in their own curves.

use std::fmt;
use std::sync::Arc;

use epi_agent::AgentStore;
use epi_core::{AgentId, Tick};

use crate::{InfectionRules, StateSet};

/// A probability that depends only on the time step.
pub trait TimeCurve: Send + Sync {
    fn at(&self, tick: Tick) -> f64;
}

impl<F> TimeCurve for F
where
    F: Fn(Tick) -> f64 + Send + Sync,
{
    fn at(&self, tick: Tick) -> f64 {
        self(tick)
    }
}

/// A probability computed from the agent, the whole population, and the
/// step.  Must only read `agents`.
pub trait AgentProbability: Send + Sync {
    fn probability(&self, agent: AgentId, agents: &AgentStore, tick: Tick) -> f64;
}

impl<F> AgentProbability for F
where
    F: Fn(AgentId, &AgentStore, Tick) -> f64 + Send + Sync,
{
    fn probability(&self, agent: AgentId, agents: &AgentStore, tick: Tick) -> f64 {
        self(agent, agents, tick)
    }
}

/// Probability of moving to one destination state this step.
#[derive(Clone)]
pub enum TransitionProbability {
    Constant(f64),
    Timed(Arc<dyn TimeCurve>),
    /// The model's aggregated infection probability.
    Infection,
    Custom(Arc<dyn AgentProbability>),
}

impl TransitionProbability {
    pub fn timed(curve: impl TimeCurve + 'static) -> Self {
        TransitionProbability::Timed(Arc::new(curve))
    }

    pub fn custom(f: impl AgentProbability + 'static) -> Self {
        TransitionProbability::Custom(Arc::new(f))
    }

    pub fn evaluate(
        &self,
        agent:     AgentId,
        agents:    &AgentStore,
        tick:      Tick,
        infection: &InfectionRules,
        states:    &StateSet,
    ) -> f64 {
        match self {
            TransitionProbability::Constant(p) => *p,
            TransitionProbability::Timed(curve) => curve.at(tick),
            TransitionProbability::Infection => {
                infection.infection_probability(agent, agents, states, tick)
            }
            TransitionProbability::Custom(f) => f.probability(agent, agents, tick),
        }
    }
}

impl fmt::Debug for TransitionProbability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransitionProbability::Constant(p) => f.debug_tuple("Constant").field(p).finish(),
            TransitionProbability::Timed(_) => f.write_str("Timed(..)"),
            TransitionProbability::Infection => f.write_str("Infection"),
            TransitionProbability::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}
