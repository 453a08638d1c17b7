//! Who gets tested this step.

use std::collections::BTreeSet;

use epi_agent::{AgentStore, TestOutcome};
use epi_core::{AgentId, PolicySlot, SimRng, Tick};

/// Chooses up to `quota` agents from the step's eligible set.
///
/// `eligible` is in ascending `AgentId` order.  Implementations draw only
/// from `rng` so runs stay reproducible.
pub trait SelectionStrategy: Send + Sync {
    fn select(
        &self,
        agents:   &AgentStore,
        slot:     PolicySlot,
        tick:     Tick,
        eligible: &[AgentId],
        quota:    usize,
        rng:      &mut SimRng,
    ) -> Vec<AgentId>;
}

/// Uniformly random eligible agents.
#[derive(Copy, Clone, Debug, Default)]
pub struct RandomSelection;

impl SelectionStrategy for RandomSelection {
    fn select(
        &self,
        _agents:  &AgentStore,
        _slot:    PolicySlot,
        _tick:    Tick,
        eligible: &[AgentId],
        quota:    usize,
        rng:      &mut SimRng,
    ) -> Vec<AgentId> {
        rng.sample_indices(eligible.len(), quota)
            .into_iter()
            .map(|i| eligible[i])
            .collect()
    }
}

/// Eligible agents with a contact this step to someone whose consensus
/// result is positive and was released within the last `lookback` steps.
///
/// Contacts are read in both directions.  If more candidates than `quota`
/// qualify, a uniform subset is taken.
#[derive(Copy, Clone, Debug)]
pub struct ContactsOfPositives {
    pub lookback: u64,
}

impl ContactsOfPositives {
    fn recently_positive(&self, agents: &AgentStore, slot: PolicySlot, tick: Tick, id: AgentId) -> bool {
        agents
            .get(id)
            .and_then(|a| a.record(slot))
            .and_then(|r| r.latest_consensus())
            .is_some_and(|(outcome, latest)| {
                outcome == TestOutcome::Positive && tick.since(latest.released_at) <= self.lookback
            })
    }
}

impl SelectionStrategy for ContactsOfPositives {
    fn select(
        &self,
        agents:   &AgentStore,
        slot:     PolicySlot,
        tick:     Tick,
        eligible: &[AgentId],
        quota:    usize,
        rng:      &mut SimRng,
    ) -> Vec<AgentId> {
        let eligible_set: BTreeSet<AgentId> = eligible.iter().copied().collect();
        let mut candidates: BTreeSet<AgentId> = BTreeSet::new();

        for (id, agent) in agents.iter() {
            let positive = self.recently_positive(agents, slot, tick, id);
            for contact in &agent.contacts {
                if positive && eligible_set.contains(&contact.other) {
                    candidates.insert(contact.other);
                }
                if eligible_set.contains(&id) && self.recently_positive(agents, slot, tick, contact.other) {
                    candidates.insert(id);
                }
            }
        }

        let candidates: Vec<AgentId> = candidates.into_iter().collect();
        if candidates.len() <= quota {
            return candidates;
        }
        let mut picked: Vec<AgentId> = rng
            .sample_indices(candidates.len(), quota)
            .into_iter()
            .map(|i| candidates[i])
            .collect();
        picked.sort_unstable();
        picked
    }
}
