//! Test machines: finite capacity, delayed results.
//!
//! ```text
//!            register_testtube          run_tests
//!   Idle ────────────────────▶ Idle ──────────────▶ Running
//!    ▲        (fillable)                               │
//!    │                                                 │ tick − started_at ≥ turnaround
//!    └─────── reset_machine ◀── populate_machine_results
//! ```

use log::trace;

use epi_agent::{TestOutcome, TestResult};
use epi_core::{SimRng, Tick};
use epi_disease::StateSet;

use crate::{PolicyError, PolicyResult, TestTube};

/// Static machine parameters.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MachineSpec {
    pub name:                String,
    /// Charged once per run.
    pub cost:                f64,
    pub false_positive_rate: f64,
    pub false_negative_rate: f64,
    /// Steps between starting a run and releasing its results.
    pub turnaround_time:     u64,
    /// Maximum tubes per run.
    pub capacity:            usize,
    /// Steps a released result stays current.
    pub valid_period:        u64,
}

impl MachineSpec {
    /// A perfect machine with no cost.
    pub fn new(name: impl Into<String>, capacity: usize, turnaround_time: u64) -> Self {
        Self {
            name: name.into(),
            cost: 0.0,
            false_positive_rate: 0.0,
            false_negative_rate: 0.0,
            turnaround_time,
            capacity,
            valid_period: 1,
        }
    }

    pub fn validate(&self) -> PolicyResult<()> {
        let invalid = |reason: String| PolicyError::InvalidMachine { name: self.name.clone(), reason };
        if self.capacity == 0 {
            return Err(invalid("capacity must be at least 1".into()));
        }
        for (what, rate) in [
            ("false_positive_rate", self.false_positive_rate),
            ("false_negative_rate", self.false_negative_rate),
        ] {
            if !(0.0..=1.0).contains(&rate) {
                return Err(invalid(format!("{what} must lie in [0, 1], got {rate}")));
            }
        }
        if !self.cost.is_finite() || self.cost < 0.0 {
            return Err(invalid(format!("cost must be finite and non-negative, got {}", self.cost)));
        }
        Ok(())
    }
}

/// One test machine and its run state.
#[derive(Clone, Debug)]
pub struct Machine {
    spec:       MachineSpec,
    tubes:      Vec<TestTube>,
    running:    bool,
    started_at: Option<Tick>,
}

impl Machine {
    pub fn new(spec: MachineSpec) -> PolicyResult<Self> {
        spec.validate()?;
        let tubes = Vec::with_capacity(spec.capacity);
        Ok(Self { spec, tubes, running: false, started_at: None })
    }

    pub fn spec(&self) -> &MachineSpec {
        &self.spec
    }

    pub fn name(&self) -> &str {
        &self.spec.name
    }

    pub fn tubes(&self) -> &[TestTube] {
        &self.tubes
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.tubes.len() >= self.spec.capacity
    }

    #[inline]
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Idle and under capacity.
    #[inline]
    pub fn accepts(&self) -> bool {
        !self.running && !self.is_full()
    }

    pub fn started_at(&self) -> Option<Tick> {
        self.started_at
    }

    /// Load `tube`.  Only allowed while idle and under capacity.
    pub fn register_testtube(&mut self, mut tube: TestTube) -> PolicyResult<()> {
        if self.running {
            return Err(PolicyError::MachineRunning(self.spec.name.clone()));
        }
        if self.is_full() {
            return Err(PolicyError::MachineFull(self.spec.name.clone()));
        }
        if tube.is_in_machine() {
            return Err(PolicyError::TubeAlreadyRegistered);
        }
        tube.set_in_machine(true);
        self.tubes.push(tube);
        Ok(())
    }

    /// Start a run: compute every held tube's result and close the machine.
    ///
    /// A truly negative tube reads positive with probability
    /// `false_positive_rate`; a truly positive tube reads negative with
    /// probability `false_negative_rate`.  One draw per tube.  Returns the
    /// number of tubes run.
    pub fn run_tests(&mut self, tick: Tick, states: &StateSet, rng: &mut SimRng) -> PolicyResult<usize> {
        if self.running {
            return Err(PolicyError::MachineRunning(self.spec.name.clone()));
        }
        for tube in &mut self.tubes {
            let truth = tube.true_outcome(states);
            let flip = match truth {
                TestOutcome::Negative => self.spec.false_positive_rate,
                TestOutcome::Positive => self.spec.false_negative_rate,
            };
            let outcome = if rng.bernoulli(flip) { truth.flipped() } else { truth };
            tube.set_result(outcome);
        }
        self.running = true;
        self.started_at = Some(tick);
        trace!("machine {:?} started {} tubes at {tick}", self.spec.name, self.tubes.len());
        Ok(self.tubes.len())
    }

    /// `true` once a run's turnaround has elapsed at `tick`.
    pub fn is_ready(&self, tick: Tick) -> bool {
        match self.started_at {
            Some(start) if self.running => tick.since(start) >= self.spec.turnaround_time,
            _ => false,
        }
    }

    /// Convert every held tube into one [`TestResult`] per enrolled agent and
    /// empty the tubes.  Returns nothing unless [`is_ready`](Self::is_ready).
    pub fn populate_machine_results(&mut self, tick: Tick) -> Vec<TestResult> {
        if !self.is_ready(tick) {
            return Vec::new();
        }
        let started_at = self.started_at.unwrap_or(tick);
        let mut results = Vec::new();
        for tube in &mut self.tubes {
            let (entries, outcome) = tube.release();
            let Some(outcome) = outcome else {
                continue;
            };
            results.extend(entries.into_iter().map(|e| TestResult {
                outcome,
                agent:        e.agent,
                machine:      self.spec.name.clone(),
                enrolled_at:  e.enrolled_at,
                started_at,
                released_at:  tick,
                valid_period: self.spec.valid_period,
            }));
        }
        trace!("machine {:?} released {} results at {tick}", self.spec.name, results.len());
        results
    }

    /// Drop held tubes and return to idle.
    pub fn reset_machine(&mut self) {
        self.tubes.clear();
        self.running = false;
        self.started_at = None;
    }
}
