//! Unit tests for epi-policy.

use epi_agent::{AgentStore, LocationStore, PopulationBuilder, TestOutcome, Transition};
use epi_core::{AgentId, PolicySlot, SimRng, StateId, Tick, WorldStep};
use epi_disease::{StateSet, StochasticModel, StochasticModelBuilder};

use crate::{MachineSpec, Policy, PolicyContext, TestTube};

// ── Helpers ───────────────────────────────────────────────────────────────────

const S: StateId = StateId(0);
const I: StateId = StateId(1);

fn sir() -> StateSet {
    StateSet::new(["Susceptible", "Infected", "Recovered"], ["Infected"]).unwrap()
}

fn model() -> StochasticModel {
    StochasticModelBuilder::new(sir()).proportion("Susceptible", 1.0).build().unwrap()
}

fn tube_of(agents: &[(u32, StateId)], tick: u64) -> TestTube {
    let mut t = TestTube::new();
    for &(a, s) in agents {
        t.enroll(AgentId(a), s, Tick(tick));
    }
    t
}

/// A tiny world a policy can act on directly.
struct Fixture {
    agents:    AgentStore,
    locations: LocationStore,
    model:     StochasticModel,
    rng:       SimRng,
}

impl Fixture {
    fn new(states: &[StateId]) -> Self {
        let pop = PopulationBuilder::new().agents(states.len()).build().unwrap();
        let mut agents = pop.agents;
        for (i, &s) in states.iter().enumerate() {
            agents[AgentId(i as u32)].initialize(Transition::unscheduled(s));
        }
        agents.ensure_policy_slots(1);
        Self { agents, locations: pop.locations, model: model(), rng: SimRng::new(11) }
    }

    fn ctx(&mut self, tick: u64) -> PolicyContext<'_> {
        PolicyContext::new(
            WorldStep::new(0, Tick(tick)),
            &mut self.agents,
            &mut self.locations,
            &self.model,
            PolicySlot(0),
            &mut self.rng,
        )
    }

    fn record_state(&self, agent: u32) -> Option<&str> {
        self.agents[AgentId(agent)].record(PolicySlot(0)).and_then(|r| r.state.as_deref())
    }
}

#[cfg(test)]
mod machine_tests {
    use super::*;
    use crate::{Machine, PolicyError};

    #[test]
    fn capacity_is_never_exceeded() {
        let mut m = Machine::new(MachineSpec::new("pcr", 2, 1)).unwrap();
        m.register_testtube(tube_of(&[(0, S)], 0)).unwrap();
        m.register_testtube(tube_of(&[(1, S)], 0)).unwrap();
        assert!(m.is_full());
        assert!(matches!(m.register_testtube(tube_of(&[(2, S)], 0)), Err(PolicyError::MachineFull(_))));
        assert_eq!(m.tubes().len(), 2);
    }

    #[test]
    fn running_machine_is_closed() {
        let mut m = Machine::new(MachineSpec::new("pcr", 4, 1)).unwrap();
        m.register_testtube(tube_of(&[(0, S)], 0)).unwrap();
        m.run_tests(Tick(0), &sir(), &mut SimRng::new(0)).unwrap();
        assert!(matches!(m.register_testtube(tube_of(&[(1, S)], 0)), Err(PolicyError::MachineRunning(_))));
        assert!(matches!(m.run_tests(Tick(0), &sir(), &mut SimRng::new(0)), Err(PolicyError::MachineRunning(_))));
    }

    #[test]
    fn tube_cannot_sit_in_two_machines() {
        let mut tube = tube_of(&[(0, S)], 0);
        tube.set_in_machine(true);
        let mut m = Machine::new(MachineSpec::new("pcr", 4, 1)).unwrap();
        assert!(matches!(m.register_testtube(tube), Err(PolicyError::TubeAlreadyRegistered)));
    }

    #[test]
    fn turnaround_three_from_step_ten() {
        let mut m = Machine::new(MachineSpec::new("pcr", 1, 3)).unwrap();
        m.register_testtube(tube_of(&[(0, I)], 9)).unwrap();
        m.run_tests(Tick(10), &sir(), &mut SimRng::new(0)).unwrap();

        for t in 10..=12 {
            assert!(m.is_running(), "running at step {t}");
            assert!(m.populate_machine_results(Tick(t)).is_empty(), "nothing released at step {t}");
        }
        let results = m.populate_machine_results(Tick(13));
        assert_eq!(results.len(), 1);
        let r = &results[0];
        assert_eq!(r.outcome, TestOutcome::Positive);
        assert_eq!(r.enrolled_at, Tick(9));
        assert_eq!(r.started_at, Tick(10));
        assert_eq!(r.released_at, Tick(13));
        assert!(m.tubes().iter().all(TestTube::is_empty), "tubes emptied on release");

        m.reset_machine();
        assert!(!m.is_running());
        assert!(m.tubes().is_empty());
    }

    #[test]
    fn zero_turnaround_is_ready_same_step() {
        let mut m = Machine::new(MachineSpec::new("rapid", 1, 0)).unwrap();
        m.register_testtube(tube_of(&[(0, S)], 4)).unwrap();
        m.run_tests(Tick(4), &sir(), &mut SimRng::new(0)).unwrap();
        assert!(m.is_ready(Tick(4)));
        assert_eq!(m.populate_machine_results(Tick(4)).len(), 1);
    }

    #[test]
    fn pooled_tube_yields_one_result_per_agent() {
        let mut m = Machine::new(MachineSpec::new("pcr", 1, 0)).unwrap();
        m.register_testtube(tube_of(&[(0, S), (1, I), (2, S)], 0)).unwrap();
        m.run_tests(Tick(0), &sir(), &mut SimRng::new(0)).unwrap();
        let results = m.populate_machine_results(Tick(0));
        assert_eq!(results.iter().map(|r| r.agent.0).collect::<Vec<_>>(), vec![0, 1, 2]);
        assert!(results.iter().all(|r| r.outcome == TestOutcome::Positive));
    }

    #[test]
    fn certain_error_rates_flip_outcomes() {
        let mut spec = MachineSpec::new("noisy", 2, 0);
        spec.false_positive_rate = 1.0;
        spec.false_negative_rate = 1.0;
        let mut m = Machine::new(spec).unwrap();
        m.register_testtube(tube_of(&[(0, S)], 0)).unwrap();
        m.register_testtube(tube_of(&[(1, I)], 0)).unwrap();
        m.run_tests(Tick(0), &sir(), &mut SimRng::new(0)).unwrap();
        let outcomes: Vec<_> = m.tubes().iter().map(|t| t.result()).collect();
        assert_eq!(outcomes, vec![Some(TestOutcome::Positive), Some(TestOutcome::Negative)]);
    }

    #[test]
    fn invalid_specs_rejected() {
        assert!(matches!(Machine::new(MachineSpec::new("x", 0, 1)), Err(PolicyError::InvalidMachine { .. })));
        let mut spec = MachineSpec::new("x", 1, 1);
        spec.false_negative_rate = 1.5;
        assert!(matches!(Machine::new(spec), Err(PolicyError::InvalidMachine { .. })));
    }
}

#[cfg(test)]
mod pooling_tests {
    use super::*;
    use crate::{PolicyError, Pooling};

    fn selected(n: u32) -> Vec<(AgentId, StateId)> {
        (0..n).map(|i| (AgentId(i), S)).collect()
    }

    #[test]
    fn five_agents_two_per_tube() {
        let pooling = Pooling::new(2, 1).unwrap();
        assert_eq!(pooling.tube_count(5), 3);
        for seed in 0..10 {
            let tubes = pooling.pack(&selected(5), Tick(0), &mut SimRng::new(seed));
            assert_eq!(tubes.len(), 3);
            let mut sizes: Vec<usize> = tubes.iter().map(TestTube::len).collect();
            sizes.sort_unstable();
            assert_eq!(sizes, vec![1, 2, 2]);
            // The partial tube is swept in last.
            assert_eq!(tubes[2].len(), 1);
        }
    }

    #[test]
    fn redundant_pooling_respects_limits() {
        let pooling = Pooling::new(3, 2).unwrap();
        let tubes = pooling.pack(&selected(7), Tick(2), &mut SimRng::new(5));
        assert!(tubes.len() <= pooling.tube_count(7));
        assert!(tubes.iter().all(|t| t.len() <= 3 && !t.is_empty()));
        for a in 0..7 {
            let n = tubes.iter().filter(|t| t.contains(AgentId(a))).count();
            assert!((1..=2).contains(&n), "agent {a} in {n} tubes");
        }
        assert!(tubes.iter().flat_map(TestTube::entries).all(|e| e.enrolled_at == Tick(2)));
    }

    #[test]
    fn individual_testing_is_one_tube_each() {
        let tubes = Pooling::default().pack(&selected(4), Tick(0), &mut SimRng::new(1));
        assert_eq!(tubes.len(), 4);
        assert!(tubes.iter().all(|t| t.len() == 1));
    }

    #[test]
    fn zero_parameters_rejected() {
        assert!(matches!(Pooling::new(0, 1), Err(PolicyError::InvalidPooling { .. })));
        assert!(matches!(Pooling::new(2, 0), Err(PolicyError::InvalidPooling { .. })));
    }
}

#[cfg(test)]
mod selection_tests {
    use super::*;
    use crate::{ContactsOfPositives, RandomSelection, SelectionStrategy};
    use epi_agent::{Contact, PolicyEntry, TestResult};

    #[test]
    fn random_selection_respects_quota_and_eligibility() {
        let f = Fixture::new(&[S; 6]);
        let eligible = [AgentId(1), AgentId(3), AgentId(5)];
        let mut rng = SimRng::new(2);
        let picked = RandomSelection.select(&f.agents, PolicySlot(0), Tick(0), &eligible, 2, &mut rng);
        assert_eq!(picked.len(), 2);
        assert!(picked.iter().all(|a| eligible.contains(a)));
        let all = RandomSelection.select(&f.agents, PolicySlot(0), Tick(0), &eligible, 10, &mut rng);
        assert_eq!(all.len(), 3);
    }

    #[test]
    fn contacts_of_recent_positives() {
        let mut f = Fixture::new(&[I, S, S, S]);
        f.agents[AgentId(0)].record_mut(PolicySlot(0)).unwrap().push(PolicyEntry::Test(TestResult {
            outcome:      TestOutcome::Positive,
            agent:        AgentId(0),
            machine:      "pcr".into(),
            enrolled_at:  Tick(0),
            started_at:   Tick(0),
            released_at:  Tick(1),
            valid_period: 1,
        }));
        f.agents[AgentId(0)].contacts.push(Contact::new(AgentId(2)));
        f.agents[AgentId(1)].contacts.push(Contact::new(AgentId(0)));

        let eligible = [AgentId(1), AgentId(2), AgentId(3)];
        let strategy = ContactsOfPositives { lookback: 2 };
        let picked = strategy.select(&f.agents, PolicySlot(0), Tick(3), &eligible, 10, &mut f.rng);
        assert_eq!(picked, vec![AgentId(1), AgentId(2)]);

        let stale = strategy.select(&f.agents, PolicySlot(0), Tick(4), &eligible, 10, &mut f.rng);
        assert!(stale.is_empty(), "positive released 3 steps ago is outside lookback");
    }
}

#[cfg(test)]
mod test_policy_tests {
    use super::*;
    use crate::{PENDING, PolicyError, Pooling, RandomSelection, TestPolicy};

    fn spec(name: &str, capacity: usize, turnaround: u64, valid: u64) -> MachineSpec {
        let mut s = MachineSpec::new(name, capacity, turnaround);
        s.valid_period = valid;
        s.cost = 2.5;
        s
    }

    #[test]
    fn release_after_turnaround_and_validity() {
        let mut f = Fixture::new(&[I, S, I, S, S]);
        let mut policy = TestPolicy::new("testing", RandomSelection).agents_per_step(|_| 5);
        policy.add_machines(spec("pcr", 10, 2, 5), 1).unwrap();
        policy.reset(&mut f.ctx(0)).unwrap();

        policy.enact_policy(&mut f.ctx(0)).unwrap();
        assert!((0..5).all(|a| f.record_state(a) == Some(PENDING)));
        assert!(policy.machines()[0].is_running());
        assert_eq!(policy.stats().tubes_run, 5);

        policy.enact_policy(&mut f.ctx(1)).unwrap();
        assert_eq!(policy.stats().total_enrolled(), 5, "pending agents are not re-enrolled");
        assert!((0..5).all(|a| f.record_state(a) == Some(PENDING)));

        policy.enact_policy(&mut f.ctx(2)).unwrap();
        assert_eq!(f.record_state(0), Some("Positive"));
        assert_eq!(f.record_state(1), Some("Negative"));
        assert_eq!(f.record_state(2), Some("Positive"));
        assert_eq!(policy.stats().positives, 2);
        assert_eq!(policy.stats().negatives, 3);
        assert_eq!(policy.stats().total_enrolled(), 5, "results still valid at step 2");

        for t in 3..7 {
            policy.enact_policy(&mut f.ctx(t)).unwrap();
        }
        assert_eq!(policy.stats().total_enrolled(), 5, "valid through step 6");
        policy.enact_policy(&mut f.ctx(7)).unwrap();
        assert_eq!(policy.stats().total_enrolled(), 10, "expired at step 7");
        assert_eq!(policy.stats().cost, 5.0);
    }

    #[test]
    fn unexpiring_results_are_released_and_kept() {
        let mut f = Fixture::new(&[I, S]);
        let mut policy = TestPolicy::new("testing", RandomSelection);
        policy.add_machines(spec("pcr", 5, 1, u64::MAX), 1).unwrap();
        policy.reset(&mut f.ctx(0)).unwrap();
        for t in 0..4 {
            policy.enact_policy(&mut f.ctx(t)).unwrap();
        }
        assert_eq!(f.record_state(0), Some("Positive"));
        assert_eq!(f.record_state(1), Some("Negative"));
        assert_eq!(policy.stats().total_enrolled(), 2, "never re-enrolled");
    }

    #[test]
    fn zero_turnaround_releases_within_the_step() {
        let mut f = Fixture::new(&[I, S]);
        let mut policy = TestPolicy::new("rapid", RandomSelection);
        policy.add_machines(spec("antigen", 5, 0, 3), 1).unwrap();
        policy.reset(&mut f.ctx(0)).unwrap();
        policy.enact_policy(&mut f.ctx(0)).unwrap();
        assert_eq!(f.record_state(0), Some("Positive"));
        assert_eq!(f.record_state(1), Some("Negative"));
        assert!(!policy.machines()[0].is_running());
    }

    #[test]
    fn admission_follows_registration_order() {
        let mut f = Fixture::new(&[S, S, S]);
        let mut policy = TestPolicy::new("testing", RandomSelection);
        policy.add_machines(spec("first", 1, 1, 10), 1).unwrap();
        policy.add_machines(spec("second", 1, 1, 10), 1).unwrap();
        policy.reset(&mut f.ctx(0)).unwrap();

        policy.enact_policy(&mut f.ctx(0)).unwrap();
        let machines = policy.machines();
        assert_eq!(machines[0].tubes().len(), 1);
        assert_eq!(machines[1].tubes().len(), 1);
        assert_eq!(policy.queue().len(), 1, "third tube waits");

        // Step 1: both release; the waiting tube goes to the first machine.
        policy.enact_policy(&mut f.ctx(1)).unwrap();
        let machines = policy.machines();
        assert_eq!(machines[0].tubes().len(), 1);
        assert!(machines[0].is_running());
        assert!(machines[1].tubes().is_empty());
        assert!(policy.queue().is_empty());
        assert_eq!(policy.stats().results_released, 2);
    }

    #[test]
    fn pooled_batch_reads_negative_if_any_tube_does() {
        // Individual tubes, two per agent: the perfect machine reads the
        // first tube positive, the always-wrong machine reads the second
        // negative.  Both release together.
        let mut f = Fixture::new(&[I]);
        let mut wrong = spec("wrong", 1, 1, 10);
        wrong.false_negative_rate = 1.0;
        let mut policy = TestPolicy::new("testing", RandomSelection).with_pooling(Pooling::new(1, 2).unwrap());
        policy.add_machines(spec("right", 1, 1, 10), 1).unwrap();
        policy.add_machines(wrong, 1).unwrap();
        policy.reset(&mut f.ctx(0)).unwrap();

        policy.enact_policy(&mut f.ctx(0)).unwrap();
        assert_eq!(policy.outstanding(AgentId(0)), 2);
        policy.enact_policy(&mut f.ctx(1)).unwrap();
        assert_eq!(policy.outstanding(AgentId(0)), 0);
        assert_eq!(f.record_state(0), Some("Negative"));
        let history = f.agents[AgentId(0)].record(PolicySlot(0)).unwrap().history();
        assert_eq!(history.len(), 2);
    }

    #[test]
    fn pooled_batch_reads_positive_when_all_agree() {
        let mut f = Fixture::new(&[I]);
        let mut policy = TestPolicy::new("testing", RandomSelection).with_pooling(Pooling::new(1, 2).unwrap());
        policy.add_machines(spec("right", 2, 1, 10), 1).unwrap();
        policy.reset(&mut f.ctx(0)).unwrap();
        policy.enact_policy(&mut f.ctx(0)).unwrap();
        policy.enact_policy(&mut f.ctx(1)).unwrap();
        assert_eq!(f.record_state(0), Some("Positive"));
    }

    #[test]
    fn quota_caps_selection() {
        let mut f = Fixture::new(&[S; 10]);
        let mut policy = TestPolicy::new("testing", RandomSelection).agents_per_step(|t| t.0 as usize + 1);
        policy.add_machines(spec("pcr", 100, 5, 10), 1).unwrap();
        policy.reset(&mut f.ctx(0)).unwrap();
        policy.enact_policy(&mut f.ctx(0)).unwrap();
        policy.enact_policy(&mut f.ctx(1)).unwrap();
        assert_eq!(policy.stats().enrolled, vec![(Tick(0), 1), (Tick(1), 2)]);
        assert_eq!(policy.queue().len(), 2, "machine closed while running");
    }

    #[test]
    fn machine_name_reuse_with_new_parameters_fails() {
        let mut policy = TestPolicy::new("testing", RandomSelection);
        policy.add_machines(spec("pcr", 2, 1, 1), 1).unwrap();
        policy.add_machines(spec("pcr", 2, 1, 1), 2).unwrap();
        assert_eq!(policy.machines().len(), 3);
        assert!(matches!(
            policy.add_machines(spec("pcr", 3, 1, 1), 1),
            Err(PolicyError::MachineConflict(_))
        ));
    }

    #[test]
    fn reset_starts_the_world_clean() {
        let mut f = Fixture::new(&[I, S]);
        let mut policy = TestPolicy::new("testing", RandomSelection);
        policy.add_machines(spec("pcr", 1, 3, 1), 1).unwrap();
        policy.reset(&mut f.ctx(0)).unwrap();
        policy.enact_policy(&mut f.ctx(0)).unwrap();
        assert!(!policy.queue().is_empty());

        policy.reset(&mut f.ctx(0)).unwrap();
        assert!(policy.queue().is_empty());
        assert!(!policy.machines()[0].is_running());
        assert_eq!(policy.stats(), &crate::TestingStats::default());
        assert_eq!(f.record_state(0), None);
        assert_eq!(policy.outstanding(AgentId(0)), 0);
    }

    #[test]
    fn report_names_totals() {
        let policy = TestPolicy::new("testing", RandomSelection);
        let report = policy.report();
        assert!(report.iter().any(|&(k, v)| k == "tubes_run" && v == 0.0));
    }
}
