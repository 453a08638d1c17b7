//! Indexed storage for agents and locations.
//!
//! Records live in a `Vec` addressed by their typed id; a key → id table
//! resolves the opaque keys used by input records.  Ids are assigned in
//! insertion order and never change during a world.

use std::ops::{Index, IndexMut};

use epi_core::{AgentId, EpiError, LocationId, StateId};

use crate::{Agent, AgentError, AgentResult, Location};

#[cfg(feature = "fx-hash")]
type KeyMap<V> = rustc_hash::FxHashMap<String, V>;
#[cfg(not(feature = "fx-hash"))]
type KeyMap<V> = std::collections::HashMap<String, V>;

// ── AgentStore ────────────────────────────────────────────────────────────────

/// Every agent of one world, indexed by [`AgentId`].
#[derive(Clone, Debug, Default)]
pub struct AgentStore {
    agents: Vec<Agent>,
    keys:   KeyMap<AgentId>,
}

impl AgentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an agent.  Fails if its key is already present.
    pub fn push(&mut self, agent: Agent) -> AgentResult<AgentId> {
        if self.keys.contains_key(&agent.key) {
            return Err(AgentError::DuplicateKey(agent.key));
        }
        let id = AgentId::try_from(self.agents.len())
            .map_err(|_| EpiError::Config("too many agents".into()))?;
        self.keys.insert(agent.key.clone(), id);
        self.agents.push(agent);
        Ok(id)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.agents.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    /// Iterator over all `AgentId`s in ascending index order.
    pub fn ids(&self) -> impl Iterator<Item = AgentId> + '_ {
        (0..self.agents.len() as u32).map(AgentId)
    }

    pub fn get(&self, id: AgentId) -> Option<&Agent> {
        self.agents.get(id.index())
    }

    pub fn get_mut(&mut self, id: AgentId) -> Option<&mut Agent> {
        self.agents.get_mut(id.index())
    }

    /// Resolve an external key.
    pub fn id_of(&self, key: &str) -> Option<AgentId> {
        self.keys.get(key).copied()
    }

    /// Resolve an external key, rejecting unknown ones.
    pub fn require(&self, key: &str) -> AgentResult<AgentId> {
        self.id_of(key)
            .ok_or_else(|| EpiError::UnknownAgentKey(key.to_owned()).into())
    }

    pub fn iter(&self) -> impl Iterator<Item = (AgentId, &Agent)> + '_ {
        self.agents.iter().enumerate().map(|(i, a)| (AgentId(i as u32), a))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (AgentId, &mut Agent)> + '_ {
        self.agents.iter_mut().enumerate().map(|(i, a)| (AgentId(i as u32), a))
    }

    pub fn as_slice(&self) -> &[Agent] {
        &self.agents
    }

    /// Current state of `id`, `None` if unknown or uninitialized.
    #[inline]
    pub fn state_of(&self, id: AgentId) -> Option<StateId> {
        self.agents.get(id.index()).and_then(|a| a.state)
    }

    /// Population count per state, indexed by `StateId`.  Uninitialized
    /// agents and out-of-range states are not counted.
    pub fn state_counts(&self, state_count: usize) -> Vec<usize> {
        let mut counts = vec![0usize; state_count];
        for state in self.agents.iter().filter_map(|a| a.state) {
            if let Some(c) = counts.get_mut(state.index()) {
                *c += 1;
            }
        }
        counts
    }

    pub fn ensure_policy_slots(&mut self, n: usize) {
        for agent in &mut self.agents {
            agent.ensure_policy_slots(n);
        }
    }
}

impl Index<AgentId> for AgentStore {
    type Output = Agent;
    #[inline]
    fn index(&self, id: AgentId) -> &Agent {
        &self.agents[id.index()]
    }
}

impl IndexMut<AgentId> for AgentStore {
    #[inline]
    fn index_mut(&mut self, id: AgentId) -> &mut Agent {
        &mut self.agents[id.index()]
    }
}

// ── LocationStore ─────────────────────────────────────────────────────────────

/// Every location of one world, indexed by [`LocationId`].
#[derive(Clone, Debug, Default)]
pub struct LocationStore {
    locations: Vec<Location>,
    keys:      KeyMap<LocationId>,
}

impl LocationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, location: Location) -> AgentResult<LocationId> {
        if self.keys.contains_key(&location.key) {
            return Err(AgentError::DuplicateKey(location.key));
        }
        let id = LocationId::try_from(self.locations.len())
            .map_err(|_| EpiError::Config("too many locations".into()))?;
        self.keys.insert(location.key.clone(), id);
        self.locations.push(location);
        Ok(id)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.locations.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = LocationId> + '_ {
        (0..self.locations.len() as u32).map(LocationId)
    }

    pub fn get(&self, id: LocationId) -> Option<&Location> {
        self.locations.get(id.index())
    }

    pub fn get_mut(&mut self, id: LocationId) -> Option<&mut Location> {
        self.locations.get_mut(id.index())
    }

    pub fn id_of(&self, key: &str) -> Option<LocationId> {
        self.keys.get(key).copied()
    }

    pub fn require(&self, key: &str) -> AgentResult<LocationId> {
        self.id_of(key)
            .ok_or_else(|| EpiError::UnknownLocationKey(key.to_owned()).into())
    }

    pub fn iter(&self) -> impl Iterator<Item = (LocationId, &Location)> + '_ {
        self.locations.iter().enumerate().map(|(i, l)| (LocationId(i as u32), l))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (LocationId, &mut Location)> + '_ {
        self.locations.iter_mut().enumerate().map(|(i, l)| (LocationId(i as u32), l))
    }
}

impl Index<LocationId> for LocationStore {
    type Output = Location;
    #[inline]
    fn index(&self, id: LocationId) -> &Location {
        &self.locations[id.index()]
    }
}

impl IndexMut<LocationId> for LocationStore {
    #[inline]
    fn index_mut(&mut self, id: LocationId) -> &mut Location {
        &mut self.locations[id.index()]
    }
}
