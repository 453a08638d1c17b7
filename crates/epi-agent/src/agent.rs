//! The `Agent` record and its per-step lifecycle.
//!
//! # Two-phase protocol
//!
//! Within one step an agent passes through:
//!
//! ```text
//! begin_step()          ephemeral fields cleared, countdown decremented
//! contacts / events     written by the external feed and by filtering
//! stage(transition)     next state computed from a frozen snapshot (write-once)
//! commit()              next state becomes current; pending cell cleared
//! ```
//!
//! `state` is only ever written by `commit`, so anything reading `state`
//! between `stage` and `commit` sees the pre-step value.

use std::collections::BTreeMap;

use epi_core::{AgentId, PolicySlot, StateId};

use crate::{AgentError, AgentResult, PolicyRecord};

// ── Contact ───────────────────────────────────────────────────────────────────

/// One pairwise interaction seen by the owning agent this step.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Contact {
    /// The agent on the other end of the interaction.
    pub other:     AgentId,
    /// Scales the per-contact infection probability.  `1.0` for a plain
    /// interaction record.
    pub intensity: f64,
}

impl Contact {
    pub fn new(other: AgentId) -> Self {
        Self { other, intensity: 1.0 }
    }

    pub fn with_intensity(other: AgentId, intensity: f64) -> Self {
        Self { other, intensity }
    }
}

// ── Transition ────────────────────────────────────────────────────────────────

/// A disease model's decision for one agent in one step.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Transition {
    pub state:     StateId,
    /// Steps remaining before the model re-evaluates the agent.  `None`
    /// means "re-evaluate next step".
    pub countdown: Option<u32>,
}

impl Transition {
    #[inline]
    pub fn new(state: StateId, countdown: Option<u32>) -> Self {
        Self { state, countdown: countdown.filter(|&c| c > 0) }
    }

    #[inline]
    pub fn unscheduled(state: StateId) -> Self {
        Self { state, countdown: None }
    }
}

// ── Agent ─────────────────────────────────────────────────────────────────────

/// Mutable per-agent state.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Agent {
    /// Opaque key from the population records.  Stable for the agent's
    /// lifetime.
    pub key: String,

    /// Free-form attributes from the population records (age, household, …).
    pub attributes: BTreeMap<String, String>,

    /// Current disease state.  `None` until the model initializes the world.
    pub state: Option<StateId>,

    /// Countdown to the next scheduled transition.  Never zero: reaching zero
    /// clears it to `None`.
    pub countdown: Option<u32>,

    /// Contacts that survive filtering this step.  Cleared every step.
    pub contacts: Vec<Contact>,

    /// Receive probabilities broadcast by events this step.  Cleared every
    /// step.
    pub event_probabilities: Vec<f64>,

    /// Likelihood of passing infection on, in `[0, 1]`.  Reset to `1.0`
    /// every step; only policies lower it.
    pub contribution: f64,

    /// Likelihood of receiving infection, in `[0, 1]`.  Reset to `1.0` every
    /// step; only policies lower it.
    pub reception: f64,

    /// Vaccine-style protection.  Policy-set and never auto-cleared.
    pub protected: bool,

    /// One record per registered policy, indexed by `PolicySlot`.
    pub policy_records: Vec<PolicyRecord>,

    pending: Option<Transition>,
}

impl Agent {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key:                 key.into(),
            attributes:          BTreeMap::new(),
            state:               None,
            countdown:           None,
            contacts:            Vec::new(),
            event_probabilities: Vec::new(),
            contribution:        1.0,
            reception:           1.0,
            protected:           false,
            policy_records:      Vec::new(),
            pending:             None,
        }
    }

    /// Attribute lookup by column name.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    // ── Step lifecycle ────────────────────────────────────────────────────

    /// Clear ephemeral fields, reset modifiers, and decrement the countdown.
    pub fn begin_step(&mut self) {
        self.contacts.clear();
        self.event_probabilities.clear();
        self.contribution = 1.0;
        self.reception = 1.0;
        self.countdown = self
            .countdown
            .and_then(|c| c.checked_sub(1))
            .filter(|&c| c > 0);
    }

    /// Set the initial state and countdown at world start.
    pub fn initialize(&mut self, transition: Transition) {
        self.state = Some(transition.state);
        self.countdown = transition.countdown;
        self.pending = None;
    }

    /// Stage this step's transition.  Write-once until [`commit`](Self::commit).
    pub fn stage(&mut self, id: AgentId, transition: Transition) -> AgentResult<()> {
        if self.pending.is_some() {
            return Err(AgentError::NextStateAlreadySet(id));
        }
        self.pending = Some(transition);
        Ok(())
    }

    /// The staged transition, if any.
    pub fn pending(&self) -> Option<Transition> {
        self.pending
    }

    /// Apply the staged transition.  Returns `true` if the state changed.
    pub fn commit(&mut self) -> bool {
        let Some(t) = self.pending.take() else {
            return false;
        };
        let changed = self.state != Some(t.state);
        self.state = Some(t.state);
        self.countdown = t.countdown;
        changed
    }

    // ── Policy records ────────────────────────────────────────────────────

    /// Grow (never shrink) the record table to `n` slots.
    pub fn ensure_policy_slots(&mut self, n: usize) {
        if self.policy_records.len() < n {
            self.policy_records.resize_with(n, PolicyRecord::default);
        }
    }

    pub fn record(&self, slot: PolicySlot) -> Option<&PolicyRecord> {
        self.policy_records.get(slot.index())
    }

    pub fn record_mut(&mut self, slot: PolicySlot) -> AgentResult<&mut PolicyRecord> {
        let available = self.policy_records.len();
        self.policy_records
            .get_mut(slot.index())
            .ok_or(AgentError::SlotOutOfRange { slot, available })
    }
}
