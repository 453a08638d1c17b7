//! Test tubes: one pooled sample, many enrolled agents.

use epi_agent::TestOutcome;
use epi_core::{AgentId, StateId, Tick};
use epi_disease::StateSet;

/// One agent's sample in a tube.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Enrollment {
    pub agent:       AgentId,
    /// True disease state when the sample was taken.
    pub state:       StateId,
    pub enrolled_at: Tick,
}

/// A pooled sample.
///
/// Enrollments keep insertion order.  A tube is registered to at most one
/// machine at a time and is emptied completely when its results are
/// released.
#[derive(Clone, Debug, Default)]
pub struct TestTube {
    entries:    Vec<Enrollment>,
    result:     Option<TestOutcome>,
    in_machine: bool,
}

impl TestTube {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `agent`'s sample.  Returns `false` (and changes nothing) if the
    /// agent is already in this tube.
    pub fn enroll(&mut self, agent: AgentId, state: StateId, enrolled_at: Tick) -> bool {
        if self.contains(agent) {
            return false;
        }
        self.entries.push(Enrollment { agent, state, enrolled_at });
        true
    }

    pub fn contains(&self, agent: AgentId) -> bool {
        self.entries.iter().any(|e| e.agent == agent)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[Enrollment] {
        &self.entries
    }

    /// The computed (possibly perturbed) result; `None` until the holding
    /// machine runs.
    pub fn result(&self) -> Option<TestOutcome> {
        self.result
    }

    pub fn is_in_machine(&self) -> bool {
        self.in_machine
    }

    /// Unperturbed outcome: positive if any enrolled agent was infectious
    /// when sampled.
    pub fn true_outcome(&self, states: &StateSet) -> TestOutcome {
        if self.entries.iter().any(|e| states.is_infectious(e.state)) {
            TestOutcome::Positive
        } else {
            TestOutcome::Negative
        }
    }

    pub(crate) fn set_result(&mut self, outcome: TestOutcome) {
        self.result = Some(outcome);
    }

    pub(crate) fn set_in_machine(&mut self, in_machine: bool) {
        self.in_machine = in_machine;
    }

    /// Empty the tube, returning its enrollments and result.
    pub(crate) fn release(&mut self) -> (Vec<Enrollment>, Option<TestOutcome>) {
        self.in_machine = false;
        (std::mem::take(&mut self.entries), self.result.take())
    }
}
