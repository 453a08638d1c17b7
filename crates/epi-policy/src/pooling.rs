//! Pool packing.
//!
//! With `napt` agents per tube and `ntpa` tubes per agent, `N` selected
//! agents are spread over `⌈ntpa·N / napt⌉` tubes:
//!
//! 1. Each agent, in selection order, is placed in `min(ntpa, open)` distinct
//!    tubes chosen uniformly among the tubes that are still open.
//! 2. A tube that reaches `napt` samples closes and joins the queue
//!    immediately.
//! 3. After the last agent, every partially filled tube joins the queue in
//!    allocation order, so no agent is dropped.

use log::debug;

use epi_core::{AgentId, SimRng, StateId, Tick};

use crate::{PolicyError, PolicyResult, TestTube};

/// Agents-per-tube / tubes-per-agent configuration.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Pooling {
    napt: usize,
    ntpa: usize,
}

impl Default for Pooling {
    /// One agent per tube, one tube per agent (individual testing).
    fn default() -> Self {
        Self { napt: 1, ntpa: 1 }
    }
}

impl Pooling {
    pub fn new(napt: usize, ntpa: usize) -> PolicyResult<Self> {
        if napt == 0 || ntpa == 0 {
            return Err(PolicyError::InvalidPooling { napt, ntpa });
        }
        Ok(Self { napt, ntpa })
    }

    /// Agents per tube.
    pub fn napt(&self) -> usize {
        self.napt
    }

    /// Tubes per agent.
    pub fn ntpa(&self) -> usize {
        self.ntpa
    }

    /// Tubes allocated for `agents` selected agents.
    pub fn tube_count(&self, agents: usize) -> usize {
        (self.ntpa * agents).div_ceil(self.napt)
    }

    /// Pack `selected` `(agent, true state)` pairs into tubes, returned in
    /// queue order.
    pub fn pack(&self, selected: &[(AgentId, StateId)], tick: Tick, rng: &mut SimRng) -> Vec<TestTube> {
        let mut tubes = vec![TestTube::new(); self.tube_count(selected.len())];
        let mut open: Vec<usize> = (0..tubes.len()).collect();
        let mut queue_order: Vec<usize> = Vec::with_capacity(tubes.len());

        for &(agent, state) in selected {
            let picks = rng.sample_indices(open.len(), self.ntpa.min(open.len()));
            let chosen: Vec<usize> = picks.iter().map(|&i| open[i]).collect();
            for &t in &chosen {
                tubes[t].enroll(agent, state, tick);
                if tubes[t].len() >= self.napt {
                    queue_order.push(t);
                }
            }
            open.retain(|t| tubes[*t].len() < self.napt);
        }

        // Partial tubes, in allocation order.
        queue_order.extend(open.into_iter().filter(|&t| !tubes[t].is_empty()));

        debug!(
            "{tick}: packed {} agents into {} tubes (napt={}, ntpa={})",
            selected.len(),
            queue_order.len(),
            self.napt,
            self.ntpa
        );

        let mut slots: Vec<Option<TestTube>> = tubes.into_iter().map(Some).collect();
        queue_order.into_iter().filter_map(|t| slots[t].take()).collect()
    }
}
