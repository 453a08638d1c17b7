//! Per-world aggregate counters for a testing policy.

use epi_agent::{TestOutcome, TestResult};
use epi_core::Tick;

/// Running totals, reset at every world start.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TestingStats {
    pub tubes_run:        u64,
    pub machine_runs:     u64,
    pub results_released: u64,
    pub positives:        u64,
    pub negatives:        u64,
    /// Sum of `MachineSpec::cost` over every run.
    pub cost:             f64,
    /// Agents newly enrolled, per step that enrolled any.
    pub enrolled:         Vec<(Tick, usize)>,
}

impl TestingStats {
    pub fn record_run(&mut self, tubes: usize, cost: f64) {
        self.tubes_run += tubes as u64;
        self.machine_runs += 1;
        self.cost += cost;
    }

    pub fn record_result(&mut self, result: &TestResult) {
        self.results_released += 1;
        match result.outcome {
            TestOutcome::Positive => self.positives += 1,
            TestOutcome::Negative => self.negatives += 1,
        }
    }

    pub fn record_enrolled(&mut self, tick: Tick, agents: usize) {
        if agents > 0 {
            self.enrolled.push((tick, agents));
        }
    }

    pub fn total_enrolled(&self) -> usize {
        self.enrolled.iter().map(|&(_, n)| n).sum()
    }
}
