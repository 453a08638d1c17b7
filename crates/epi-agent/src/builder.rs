//! Fluent builder for a world's population.
//!
//! # Usage
//!
//! ```rust
//! use epi_agent::PopulationBuilder;
//!
//! let population = PopulationBuilder::new()
//!     .agent("alice")
//!     .agent_with("bob", [("age", "41")])
//!     .location("office")
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(population.agents.len(), 2);
//! assert_eq!(population.agents.id_of("bob").map(|id| id.0), Some(1));
//! ```

use crate::{Agent, AgentResult, AgentStore, Location, LocationStore};

/// The template population every world starts from.
///
/// Worlds mutate a clone, so the template itself is never touched by a run.
#[derive(Clone, Debug, Default)]
pub struct Population {
    pub agents:    AgentStore,
    pub locations: LocationStore,
}

/// Fluent builder for [`Population`].
///
/// Duplicate keys are reported by [`build`](Self::build), not at insertion,
/// so chained calls stay infallible.
#[derive(Default)]
pub struct PopulationBuilder {
    agents:    Vec<Agent>,
    locations: Vec<Location>,
}

impl PopulationBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an agent with no attributes.
    pub fn agent(mut self, key: impl Into<String>) -> Self {
        self.agents.push(Agent::new(key));
        self
    }

    /// Add an agent carrying the given attributes.
    pub fn agent_with<K, V>(
        mut self,
        key:        impl Into<String>,
        attributes: impl IntoIterator<Item = (K, V)>,
    ) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let mut agent = Agent::new(key);
        agent.attributes = attributes
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        self.agents.push(agent);
        self
    }

    /// Add `n` agents keyed `"0"`, `"1"`, … continuing from the current count.
    pub fn agents(mut self, n: usize) -> Self {
        let start = self.agents.len();
        self.agents.extend((start..start + n).map(|i| Agent::new(i.to_string())));
        self
    }

    pub fn location(mut self, key: impl Into<String>) -> Self {
        self.locations.push(Location::new(key));
        self
    }

    /// Append an already-constructed agent record (used by the CSV loader).
    pub fn push_agent(&mut self, agent: Agent) {
        self.agents.push(agent);
    }

    pub fn push_location(&mut self, location: Location) {
        self.locations.push(location);
    }

    pub fn build(self) -> AgentResult<Population> {
        let mut agents = AgentStore::new();
        for agent in self.agents {
            agents.push(agent)?;
        }
        let mut locations = LocationStore::new();
        for location in self.locations {
            locations.push(location)?;
        }
        Ok(Population { agents, locations })
    }
}
