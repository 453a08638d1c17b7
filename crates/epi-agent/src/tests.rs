//! Unit tests for epi-agent.

use epi_core::{AgentId, PolicySlot, StateId, Tick};

use crate::{PolicyEntry, PolicyRecord, TestOutcome, TestResult};

// ── Helpers ───────────────────────────────────────────────────────────────────

fn result(outcome: TestOutcome, enrolled: u64, released: u64) -> TestResult {
    TestResult {
        outcome,
        agent:        AgentId(0),
        machine:      "pcr".into(),
        enrolled_at:  Tick(enrolled),
        started_at:   Tick(enrolled),
        released_at:  Tick(released),
        valid_period: 3,
    }
}

#[cfg(test)]
mod agent_tests {
    use super::*;
    use crate::{Agent, AgentError, Contact, Transition};

    #[test]
    fn begin_step_resets_ephemeral_fields() {
        let mut a = Agent::new("a");
        a.contacts.push(Contact::new(AgentId(1)));
        a.event_probabilities.push(0.3);
        a.contribution = 0.2;
        a.reception = 0.0;
        a.protected = true;
        a.begin_step();
        assert!(a.contacts.is_empty());
        assert!(a.event_probabilities.is_empty());
        assert_eq!(a.contribution, 1.0);
        assert_eq!(a.reception, 1.0);
        assert!(a.protected, "protection is never auto-cleared");
    }

    #[test]
    fn countdown_clamps_to_none() {
        let mut a = Agent::new("a");
        a.initialize(Transition::new(StateId(1), Some(2)));
        a.begin_step();
        assert_eq!(a.countdown, Some(1));
        a.begin_step();
        assert_eq!(a.countdown, None);
        a.begin_step();
        assert_eq!(a.countdown, None);
    }

    #[test]
    fn zero_countdown_is_none() {
        assert_eq!(Transition::new(StateId(0), Some(0)).countdown, None);
    }

    #[test]
    fn stage_is_write_once_until_commit() {
        let mut a = Agent::new("a");
        a.initialize(Transition::unscheduled(StateId(0)));
        a.stage(AgentId(0), Transition::new(StateId(1), Some(4))).unwrap();
        assert!(matches!(
            a.stage(AgentId(0), Transition::unscheduled(StateId(2))),
            Err(AgentError::NextStateAlreadySet(_))
        ));
        assert_eq!(a.state, Some(StateId(0)), "state unchanged before commit");
        assert!(a.commit());
        assert_eq!(a.state, Some(StateId(1)));
        assert_eq!(a.countdown, Some(4));
        assert!(a.pending().is_none());
        assert!(!a.commit(), "nothing staged");
    }

    #[test]
    fn record_slot_out_of_range() {
        let mut a = Agent::new("a");
        a.ensure_policy_slots(1);
        assert!(a.record_mut(PolicySlot(0)).is_ok());
        assert!(matches!(
            a.record_mut(PolicySlot(1)),
            Err(AgentError::SlotOutOfRange { available: 1, .. })
        ));
    }
}

#[cfg(test)]
mod history_tests {
    use super::*;

    #[test]
    fn validity_window() {
        let r = result(TestOutcome::Negative, 1, 4);
        assert!(r.is_valid_at(Tick(4)));
        assert!(r.is_valid_at(Tick(6)));
        assert!(!r.is_valid_at(Tick(7)));
    }

    #[test]
    fn result_that_never_expires() {
        let mut r = result(TestOutcome::Positive, 5, 9);
        r.valid_period = u64::MAX;
        assert!(r.is_valid_at(Tick(9)));
        assert!(r.is_valid_at(Tick(u64::MAX)));
    }

    #[test]
    fn consensus_positive_and_negative_reads_negative() {
        let mut rec = PolicyRecord::default();
        rec.push(PolicyEntry::Test(result(TestOutcome::Positive, 2, 3)));
        rec.push(PolicyEntry::Test(result(TestOutcome::Negative, 2, 3)));
        assert_eq!(rec.latest_consensus().unwrap().0, TestOutcome::Negative);

        let mut rev = PolicyRecord::default();
        rev.push(PolicyEntry::Test(result(TestOutcome::Negative, 2, 3)));
        rev.push(PolicyEntry::Test(result(TestOutcome::Positive, 2, 3)));
        assert_eq!(rev.latest_consensus().unwrap().0, TestOutcome::Negative);
    }

    #[test]
    fn consensus_all_positive_reads_positive() {
        let mut rec = PolicyRecord::default();
        rec.push(PolicyEntry::Test(result(TestOutcome::Positive, 2, 3)));
        rec.push(PolicyEntry::Test(result(TestOutcome::Positive, 2, 3)));
        assert_eq!(rec.latest_consensus().unwrap().0, TestOutcome::Positive);
    }

    #[test]
    fn consensus_ignores_older_batches() {
        let mut rec = PolicyRecord::default();
        rec.push(PolicyEntry::Test(result(TestOutcome::Negative, 1, 2)));
        rec.push(PolicyEntry::Test(result(TestOutcome::Positive, 5, 6)));
        assert_eq!(rec.latest_consensus().unwrap().0, TestOutcome::Positive);
    }

    #[test]
    fn markers_are_skipped() {
        let mut rec = PolicyRecord::default();
        assert!(rec.latest_consensus().is_none());
        rec.push(PolicyEntry::Test(result(TestOutcome::Positive, 1, 2)));
        rec.push(PolicyEntry::Marker { tick: Tick(3), label: "isolated".into() });
        assert_eq!(rec.latest_test().unwrap().outcome, TestOutcome::Positive);
        assert_eq!(rec.history().len(), 2);
    }
}

#[cfg(test)]
mod store_tests {
    use super::*;
    use crate::{AgentError, PopulationBuilder};

    #[test]
    fn ids_follow_insertion_order() {
        let pop = PopulationBuilder::new().agent("x").agent("y").agents(2).build().unwrap();
        assert_eq!(pop.agents.id_of("x"), Some(AgentId(0)));
        assert_eq!(pop.agents.id_of("y"), Some(AgentId(1)));
        assert_eq!(pop.agents.id_of("3"), Some(AgentId(3)));
        assert_eq!(pop.agents.ids().count(), 4);
    }

    #[test]
    fn duplicate_keys_rejected() {
        let err = PopulationBuilder::new().agent("x").agent("x").build().unwrap_err();
        assert!(matches!(err, AgentError::DuplicateKey(k) if k == "x"));
        assert!(PopulationBuilder::new().location("l").location("l").build().is_err());
    }

    #[test]
    fn unknown_key_is_rejected() {
        let pop = PopulationBuilder::new().agent("x").location("home").build().unwrap();
        assert!(pop.agents.require("nobody").is_err());
        assert!(pop.locations.require("mars").is_err());
        assert!(pop.locations.require("home").is_ok());
    }

    #[test]
    fn state_counts_skip_uninitialized() {
        let mut pop = PopulationBuilder::new().agents(4).build().unwrap();
        pop.agents[AgentId(0)].state = Some(StateId(1));
        pop.agents[AgentId(1)].state = Some(StateId(1));
        pop.agents[AgentId(2)].state = Some(StateId(0));
        assert_eq!(pop.agents.state_counts(2), vec![1, 2]);
    }
}

#[cfg(test)]
mod loader_tests {
    use std::io::Cursor;

    use crate::{load_agents_reader, load_locations_reader, AgentError, PopulationBuilder};

    #[test]
    fn agents_with_attributes() {
        let csv = "key,age,household\na1,34,h1\na2,7,h1\n";
        let mut b = PopulationBuilder::new();
        assert_eq!(load_agents_reader(Cursor::new(csv), &mut b).unwrap(), 2);
        let pop = b.build().unwrap();
        let a2 = &pop.agents[pop.agents.require("a2").unwrap()];
        assert_eq!(a2.attribute("age"), Some("7"));
        assert_eq!(a2.attribute("household"), Some("h1"));
        assert_eq!(a2.attribute("key"), None);
    }

    #[test]
    fn missing_key_column() {
        let mut b = PopulationBuilder::new();
        let err = load_agents_reader(Cursor::new("name\nx\n"), &mut b).unwrap_err();
        assert!(matches!(err, AgentError::MissingColumn("key")));
    }

    #[test]
    fn locations() {
        let mut b = PopulationBuilder::new();
        load_locations_reader(Cursor::new("key,kind\nschool,edu\npark,open\n"), &mut b).unwrap();
        let pop = b.build().unwrap();
        assert_eq!(pop.locations.len(), 2);
        assert!(pop.locations.id_of("park").is_some());
    }
}
