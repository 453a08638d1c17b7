//! Locations and the group events that take place at them.

use epi_core::AgentId;

/// A gathering of agents at a location during one step.
///
/// `participants` comes from the external feed.  `contributing` and
/// `receiving` are filled by the simulation's survival filter; until then
/// they are empty.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Event {
    pub participants: Vec<AgentId>,

    /// Per-step gate: the whole event is dropped unless a uniform draw falls
    /// below this value.
    pub probability_of_occurring: f64,

    /// Participants able to pass infection on after filtering.
    pub contributing: Vec<AgentId>,

    /// Participants able to receive infection after filtering.
    pub receiving: Vec<AgentId>,
}

impl Event {
    pub fn new(participants: Vec<AgentId>) -> Self {
        Self::with_probability(participants, 1.0)
    }

    pub fn with_probability(participants: Vec<AgentId>, probability_of_occurring: f64) -> Self {
        Self {
            participants,
            probability_of_occurring,
            contributing: Vec::new(),
            receiving: Vec::new(),
        }
    }
}

/// Mutable per-location state.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Location {
    pub key: String,

    /// Events taking place here this step.  Cleared every step.
    pub events: Vec<Event>,

    /// Set by lockdown-style policies; reset every step.  Events at a
    /// locked-down location are dropped by the survival filter.
    pub lockdown: bool,
}

impl Location {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into(), events: Vec::new(), lockdown: false }
    }

    pub fn begin_step(&mut self) {
        self.events.clear();
        self.lockdown = false;
    }
}
