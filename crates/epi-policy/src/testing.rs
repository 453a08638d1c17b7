//! `TestPolicy` — the per-step testing pipeline.
//!
//! Each step, in order:
//!
//! | # | Stage     | Effect                                                          |
//! |---|-----------|-----------------------------------------------------------------|
//! | 1 | release   | machines past their turnaround hand results to agents; reset     |
//! | 2 | select    | strategy picks up to `agents_per_step(tick)` eligible agents     |
//! | 3 | pack      | selected agents are pooled into tubes (full tubes queue first)   |
//! | 4 | sweep     | partially filled tubes join the queue                            |
//! | 5 | admit     | FIFO queue drains into machines in registration order           |
//! | 6 | run       | every idle machine holding a tube starts                         |
//! | 7 | release   | repeated when a machine with zero turnaround is running          |
//!
//! An agent is eligible when it has no sample awaiting a result and its
//! latest test result, if any, is no longer valid.  While samples are out,
//! the agent's record state reads [`PENDING`]; once every sample is back it
//! reads the consensus outcome (`"Positive"` / `"Negative"`).

use std::collections::VecDeque;

use log::{debug, info};

use epi_agent::PolicyEntry;
use epi_core::{AgentId, StateId, Tick};

use crate::{
    Machine, MachineSpec, Policy, PolicyContext, PolicyError, PolicyResult, Pooling,
    SelectionStrategy, TestTube, TestingStats,
};

/// Record state of an agent with samples still out.
pub const PENDING: &str = "pending";

type Quota = Box<dyn Fn(Tick) -> usize + Send + Sync>;

/// Diagnostic testing as a [`Policy`].
///
/// ```rust,ignore
/// let mut testing = TestPolicy::new("testing", RandomSelection)
///     .with_pooling(Pooling::new(4, 2)?)
///     .agents_per_step(|_| 20);
/// testing.add_machines(MachineSpec::new("pcr", 10, 2), 3)?;
/// ```
pub struct TestPolicy {
    name:        String,
    machines:    Vec<Machine>,
    pooling:     Pooling,
    selection:   Box<dyn SelectionStrategy>,
    quota:       Quota,
    queue:       VecDeque<TestTube>,
    /// Samples awaiting results, per agent.
    outstanding: Vec<u32>,
    stats:       TestingStats,
}

impl TestPolicy {
    /// A policy with no machines, individual testing, and no per-step cap.
    pub fn new(name: impl Into<String>, selection: impl SelectionStrategy + 'static) -> Self {
        Self {
            name:        name.into(),
            machines:    Vec::new(),
            pooling:     Pooling::default(),
            selection:   Box::new(selection),
            quota:       Box::new(|_| usize::MAX),
            queue:       VecDeque::new(),
            outstanding: Vec::new(),
            stats:       TestingStats::default(),
        }
    }

    pub fn with_pooling(mut self, pooling: Pooling) -> Self {
        self.pooling = pooling;
        self
    }

    /// Cap on agents selected at each step.
    pub fn agents_per_step(mut self, quota: impl Fn(Tick) -> usize + Send + Sync + 'static) -> Self {
        self.quota = Box::new(quota);
        self
    }

    /// Register `count` machines built from `spec`, after any already
    /// registered.  Reusing a name with different parameters is an error.
    pub fn add_machines(&mut self, spec: MachineSpec, count: usize) -> PolicyResult<()> {
        if let Some(existing) = self.machines.iter().find(|m| m.name() == spec.name) {
            if existing.spec() != &spec {
                return Err(PolicyError::MachineConflict(spec.name));
            }
        }
        for _ in 0..count {
            self.machines.push(Machine::new(spec.clone())?);
        }
        Ok(())
    }

    pub fn machines(&self) -> &[Machine] {
        &self.machines
    }

    pub fn pooling(&self) -> Pooling {
        self.pooling
    }

    /// Tubes waiting for a free machine.
    pub fn queue(&self) -> &VecDeque<TestTube> {
        &self.queue
    }

    pub fn stats(&self) -> &TestingStats {
        &self.stats
    }

    /// Samples of `agent` still awaiting a result.
    pub fn outstanding(&self, agent: AgentId) -> u32 {
        self.outstanding.get(agent.index()).copied().unwrap_or(0)
    }

    // ── Pipeline stages ───────────────────────────────────────────────────

    fn release(&mut self, ctx: &mut PolicyContext<'_>) -> PolicyResult<usize> {
        let tick = ctx.tick();
        let mut released = 0;
        for machine in &mut self.machines {
            if !machine.is_ready(tick) {
                continue;
            }
            let results = machine.populate_machine_results(tick);
            machine.reset_machine();
            released += results.len();

            for result in results {
                self.stats.record_result(&result);
                let id = result.agent;
                let agent = ctx.agents.get_mut(id).ok_or(PolicyError::AgentNotFound(id))?;
                let record = agent.record_mut(ctx.slot)?;
                record.push(PolicyEntry::Test(result));

                let left = match self.outstanding.get_mut(id.index()) {
                    Some(n) => {
                        *n = n.saturating_sub(1);
                        *n
                    }
                    None => 0,
                };
                if left == 0 {
                    let consensus = record.latest_consensus().map(|(o, _)| o.as_str().to_owned());
                    record.state = consensus;
                }
            }
        }
        Ok(released)
    }

    fn eligible(&self, ctx: &PolicyContext<'_>) -> Vec<AgentId> {
        let tick = ctx.tick();
        ctx.agents
            .iter()
            .filter(|&(id, agent)| {
                agent.state.is_some()
                    && self.outstanding(id) == 0
                    && !agent
                        .record(ctx.slot)
                        .and_then(|r| r.latest_test())
                        .is_some_and(|t| t.is_valid_at(tick))
            })
            .map(|(id, _)| id)
            .collect()
    }

    fn enroll(&mut self, ctx: &mut PolicyContext<'_>) -> PolicyResult<usize> {
        let tick = ctx.tick();
        let quota = (self.quota)(tick);
        let eligible = self.eligible(ctx);
        if quota == 0 || eligible.is_empty() {
            return Ok(0);
        }

        let mut chosen = self.selection.select(ctx.agents, ctx.slot, tick, &eligible, quota, ctx.rng);
        chosen.truncate(quota);
        let selected = chosen
            .iter()
            .map(|&id| ctx.agents.state_of(id).map(|s| (id, s)).ok_or(PolicyError::Untestable(id)))
            .collect::<PolicyResult<Vec<(AgentId, StateId)>>>()?;

        let tubes = self.pooling.pack(&selected, tick, ctx.rng);
        for tube in &tubes {
            for e in tube.entries() {
                if let Some(n) = self.outstanding.get_mut(e.agent.index()) {
                    *n += 1;
                }
            }
        }
        for &(id, _) in &selected {
            let agent = ctx.agents.get_mut(id).ok_or(PolicyError::AgentNotFound(id))?;
            agent.record_mut(ctx.slot)?.state = Some(PENDING.to_owned());
        }

        self.stats.record_enrolled(tick, selected.len());
        self.queue.extend(tubes);
        Ok(selected.len())
    }

    fn admit(&mut self) -> PolicyResult<()> {
        for machine in &mut self.machines {
            while machine.accepts() {
                let Some(tube) = self.queue.pop_front() else {
                    return Ok(());
                };
                machine.register_testtube(tube)?;
            }
        }
        Ok(())
    }

    fn run(&mut self, ctx: &mut PolicyContext<'_>) -> PolicyResult<()> {
        let tick = ctx.tick();
        let model = ctx.model;
        let states = model.states();
        for machine in &mut self.machines {
            if machine.is_running() || machine.tubes().is_empty() {
                continue;
            }
            let tubes = machine.run_tests(tick, states, ctx.rng)?;
            self.stats.record_run(tubes, machine.spec().cost);
        }
        Ok(())
    }
}

impl Policy for TestPolicy {
    fn name(&self) -> &str {
        &self.name
    }

    fn reset(&mut self, ctx: &mut PolicyContext<'_>) -> PolicyResult<()> {
        for machine in &mut self.machines {
            machine.reset_machine();
        }
        self.queue.clear();
        self.stats = TestingStats::default();
        self.outstanding = vec![0; ctx.agents.len()];
        for (_, agent) in ctx.agents.iter_mut() {
            agent.record_mut(ctx.slot)?.clear();
        }
        info!("{}: {} machines, pooling {:?}", self.name, self.machines.len(), self.pooling);
        Ok(())
    }

    fn enact_policy(&mut self, ctx: &mut PolicyContext<'_>) -> PolicyResult<()> {
        let released = self.release(ctx)?;
        let enrolled = self.enroll(ctx)?;
        self.admit()?;
        self.run(ctx)?;
        let instant = self
            .machines
            .iter()
            .any(|m| m.is_running() && m.spec().turnaround_time == 0);
        let released = if instant { released + self.release(ctx)? } else { released };

        debug!(
            "{} {}: enrolled {enrolled}, released {released}, queued {}",
            self.name,
            ctx.step,
            self.queue.len()
        );
        Ok(())
    }

    fn report(&self) -> Vec<(&'static str, f64)> {
        let s = &self.stats;
        vec![
            ("tubes_run", s.tubes_run as f64),
            ("machine_runs", s.machine_runs as f64),
            ("results_released", s.results_released as f64),
            ("positives", s.positives as f64),
            ("negatives", s.negatives as f64),
            ("cost", s.cost),
            ("agents_enrolled", s.total_enrolled() as f64),
        ]
    }
}
