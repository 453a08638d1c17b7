//! Per-policy agent records.
//!
//! Every registered policy owns one [`PolicyRecord`] slot on every agent: a
//! current-state cell plus an append-only history.  Slots are assigned when
//! the policy is registered, so lookups are a `Vec` index rather than a
//! string-keyed map.

use std::fmt;

use epi_core::{AgentId, Tick};

// ── TestOutcome ───────────────────────────────────────────────────────────────

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TestOutcome {
    Positive,
    Negative,
}

impl TestOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            TestOutcome::Positive => "Positive",
            TestOutcome::Negative => "Negative",
        }
    }

    #[inline]
    pub fn is_positive(self) -> bool {
        self == TestOutcome::Positive
    }

    /// The opposite outcome.
    #[inline]
    pub fn flipped(self) -> TestOutcome {
        match self {
            TestOutcome::Positive => TestOutcome::Negative,
            TestOutcome::Negative => TestOutcome::Positive,
        }
    }
}

impl fmt::Display for TestOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── TestResult ────────────────────────────────────────────────────────────────

/// One released test result for one agent.  Immutable once recorded.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TestResult {
    pub outcome:      TestOutcome,
    pub agent:        AgentId,
    pub machine:      String,
    /// Step the agent was placed in the tube.
    pub enrolled_at:  Tick,
    /// Step the machine started the run containing the tube.
    pub started_at:   Tick,
    /// Step the result was released to the agent.
    pub released_at:  Tick,
    /// Steps after release during which the result counts as current.
    pub valid_period: u64,
}

impl TestResult {
    /// `true` while `tick` falls inside the validity window.
    #[inline]
    pub fn is_valid_at(&self, tick: Tick) -> bool {
        tick.since(self.released_at) < self.valid_period
    }
}

// ── PolicyEntry ───────────────────────────────────────────────────────────────

/// One entry in a policy's per-agent history.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PolicyEntry {
    Test(TestResult),
    /// Free-form mark left by a policy (dose given, traced, quarantined …).
    Marker {
        tick:  Tick,
        label: String,
    },
}

impl PolicyEntry {
    pub fn as_test(&self) -> Option<&TestResult> {
        match self {
            PolicyEntry::Test(r) => Some(r),
            PolicyEntry::Marker { .. } => None,
        }
    }
}

// ── PolicyRecord ──────────────────────────────────────────────────────────────

/// A policy's view of one agent.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PolicyRecord {
    /// Current policy-specific state label (`None` when the policy has not
    /// touched the agent).
    pub state: Option<String>,
    history:   Vec<PolicyEntry>,
}

impl PolicyRecord {
    pub fn push(&mut self, entry: PolicyEntry) {
        self.history.push(entry);
    }

    pub fn history(&self) -> &[PolicyEntry] {
        &self.history
    }

    pub fn latest(&self) -> Option<&PolicyEntry> {
        self.history.last()
    }

    /// The most recent test result, skipping markers.
    pub fn latest_test(&self) -> Option<&TestResult> {
        self.history.iter().rev().find_map(PolicyEntry::as_test)
    }

    /// `true` if the state cell currently reads `label`.
    pub fn state_is(&self, label: &str) -> bool {
        self.state.as_deref() == Some(label)
    }

    /// Consensus over the most recent enrollment batch.
    ///
    /// Scans test results backward while they share the latest result's
    /// enrollment step.  Any `Negative` in that run makes the batch
    /// `Negative`; otherwise it is `Positive`.  Returns the consensus and the
    /// latest result of the batch, or `None` without any test history.
    pub fn latest_consensus(&self) -> Option<(TestOutcome, &TestResult)> {
        let mut tests = self.history.iter().rev().filter_map(PolicyEntry::as_test);
        let latest = tests.next()?;
        let mut outcome = latest.outcome;
        for r in tests.take_while(|r| r.enrolled_at == latest.enrolled_at) {
            if r.outcome == TestOutcome::Negative {
                outcome = TestOutcome::Negative;
            }
        }
        Some((outcome, latest))
    }

    pub fn clear(&mut self) {
        self.state = None;
        self.history.clear();
    }
}
