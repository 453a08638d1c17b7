//! Unit tests for epi-disease.

use epi_agent::{AgentStore, Contact, PopulationBuilder, Transition};
use epi_core::{AgentId, AgentRng, SimRng, StateId, Tick};

use crate::{StateSet, StochasticModel, StochasticModelBuilder, TransitionProbability};

// ── Helpers ───────────────────────────────────────────────────────────────────

fn sir() -> StateSet {
    StateSet::new(["Susceptible", "Infected", "Recovered"], ["Infected"]).unwrap()
}

const S: StateId = StateId(0);
const I: StateId = StateId(1);
const R: StateId = StateId(2);

fn store_with_states(states: &[StateId]) -> AgentStore {
    let mut pop = PopulationBuilder::new().agents(states.len()).build().unwrap();
    for (i, &s) in states.iter().enumerate() {
        pop.agents[AgentId(i as u32)].initialize(Transition::unscheduled(s));
    }
    pop.agents
}

fn rng() -> AgentRng {
    AgentRng::new(7, AgentId(0))
}

fn sir_stochastic(s_to_i: TransitionProbability, i_to_r: f64) -> StochasticModel {
    StochasticModelBuilder::new(sir())
        .proportion("Susceptible", 1.0)
        .transition("Susceptible", "Infected", s_to_i)
        .transition("Infected", "Recovered", TransitionProbability::Constant(i_to_r))
        .build()
        .unwrap()
}

#[cfg(test)]
mod state_tests {
    use super::*;
    use crate::ModelError;

    #[test]
    fn declared_order_assigns_ids() {
        let s = sir();
        assert_eq!(s.id("Recovered"), Some(R));
        assert_eq!(s.label(I), "Infected");
        assert!(s.is_infectious(I));
        assert!(!s.is_infectious(S));
        assert_eq!(s.infectious_ids().collect::<Vec<_>>(), vec![I]);
    }

    #[test]
    fn rejects_bad_declarations() {
        assert!(matches!(StateSet::new(["A", "A"], [""; 0]), Err(ModelError::DuplicateState(_))));
        assert!(matches!(StateSet::new(["A"], ["B"]), Err(ModelError::UnknownState(_))));
        assert!(matches!(StateSet::new(Vec::<String>::new(), [""; 0]), Err(ModelError::NoStates)));
    }
}

#[cfg(test)]
mod choice_tests {
    use super::*;
    use crate::{ModelError, WeightedChoice, exact_counts, partition_states};

    #[test]
    fn exact_counts_follow_cumulative_floors() {
        let props = [0.25, 0.35, 0.4];
        let n = 7;
        // ⌊0.25·7⌋ = 1, ⌊0.60·7⌋ = 4, last block ends at 7.
        assert_eq!(exact_counts(&props, n), vec![1, 3, 3]);
        assert_eq!(exact_counts(&[0.5, 0.5], 0), vec![0, 0]);
        assert_eq!(exact_counts(&[0.0, 1.0], 10), vec![0, 10]);
    }

    #[test]
    fn exact_counts_survive_float_sums() {
        // 0.1 + 0.7 is stored as 0.7999…; the block still ends at agent 8.
        assert_eq!(exact_counts(&[0.1, 0.7, 0.2], 10), vec![1, 7, 2]);
        assert_eq!(exact_counts(&[0.1, 0.2, 0.7], 10), vec![1, 2, 7]);
        assert_eq!(exact_counts(&[0.3, 0.3, 0.3, 0.1], 100), vec![30, 30, 30, 10]);
    }

    #[test]
    fn partition_is_exact_not_expected() {
        let store = store_with_states(&[S; 101]);
        let props = [0.1, 0.3, 0.6];
        for seed in 0..5 {
            let mut rng = SimRng::new(seed);
            let assigned = partition_states(&store, &props, &mut rng);
            assert_eq!(assigned.len(), 101);
            let mut counts = [0usize; 3];
            for (_, s) in &assigned {
                counts[s.index()] += 1;
            }
            assert_eq!(counts, [10, 30, 61]);
        }
    }

    #[test]
    fn weights_must_sum_to_one() {
        let s = sir();
        let err = WeightedChoice::new(&s, "Infected", [("Recovered", 0.5), ("Susceptible", 0.4)]);
        assert!(matches!(err, Err(ModelError::WeightSum { .. })));
    }

    #[test]
    fn pick_walks_declared_order() {
        let s = sir();
        // Supplied out of order; declared order is Susceptible, Recovered.
        let c = WeightedChoice::new(&s, "Infected", [("Recovered", 0.7), ("Susceptible", 0.3)]).unwrap();
        assert_eq!(c.pick(0.0), S);
        assert_eq!(c.pick(0.29), S);
        assert_eq!(c.pick(0.31), R);
        assert_eq!(c.pick(0.999_999_999_9), R);
    }
}

#[cfg(test)]
mod infection_tests {
    use super::*;
    use crate::{AmbientEventInfection, InfectionRules, InfectiousContact};
    use epi_agent::{Event, Location};

    #[test]
    fn contacts_and_events_combine_multiplicatively() {
        let mut store = store_with_states(&[S, I, I, S]);
        let me = AgentId(0);
        store[me].contacts.push(Contact::new(AgentId(1)));
        store[me].contacts.push(Contact::with_intensity(AgentId(2), 0.5));
        store[me].contacts.push(Contact::new(AgentId(3))); // susceptible: no risk
        store[me].event_probabilities.push(0.2);

        let rules = InfectionRules::new().with_contact(InfectiousContact { per_contact: 0.4 });
        let p = rules.infection_probability(me, &store, &sir(), Tick(0));
        let expected = 1.0 - (1.0 - 0.4) * (1.0 - 0.2) * (1.0 - 0.2);
        assert!((p - expected).abs() < 1e-12, "got {p}");
    }

    #[test]
    fn external_prevalence_is_added_unclamped() {
        let mut store = store_with_states(&[S, I]);
        store[AgentId(0)].contacts.push(Contact::new(AgentId(1)));
        let rules = InfectionRules::new()
            .with_contact(InfectiousContact { per_contact: 0.9 })
            .with_external(|_: &epi_agent::Agent, _: Tick| 0.3);
        let p = rules.infection_probability(AgentId(0), &store, &sir(), Tick(0));
        assert!((p - 1.2).abs() < 1e-12, "sum must not be clamped, got {p}");
    }

    #[test]
    fn no_contacts_means_only_external_term() {
        let store = store_with_states(&[S]);
        let rules = InfectionRules::new().with_external(|_: &epi_agent::Agent, t: Tick| t.0 as f64 * 0.01);
        let p = rules.infection_probability(AgentId(0), &store, &sir(), Tick(3));
        assert!((p - 0.03).abs() < 1e-12);
    }

    #[test]
    fn event_ambient_infection_from_contributors() {
        let store = store_with_states(&[I, I, S]);
        let mut event = Event::new(vec![AgentId(0), AgentId(1), AgentId(2)]);
        event.contributing = vec![AgentId(0), AgentId(1), AgentId(2)];
        let rules = InfectionRules::new().with_event(AmbientEventInfection { per_infectious: 0.5 });
        let p = rules.event_receive_probability(&event, &Location::new("l"), &store, &sir(), Tick(0));
        assert!((p - 0.75).abs() < 1e-12, "two infectious contributors: 1 - 0.5², got {p}");
    }
}

#[cfg(test)]
mod stochastic_tests {
    use super::*;
    use crate::{DiseaseModel, InfectionRules, ModelError};

    #[test]
    fn proportions_must_sum_to_one() {
        let err = StochasticModelBuilder::new(sir())
            .proportion("Susceptible", 0.5)
            .proportion("Infected", 0.4)
            .build();
        assert!(matches!(err, Err(ModelError::ProportionSum { .. })));
    }

    #[test]
    fn unknown_transition_state_rejected() {
        let err = StochasticModelBuilder::new(sir())
            .proportion("Susceptible", 1.0)
            .transition("Susceptible", "Zombie", TransitionProbability::Constant(0.1))
            .build();
        assert!(matches!(err, Err(ModelError::UnknownState(_))));
    }

    #[test]
    fn initialization_is_exact() {
        let model = StochasticModelBuilder::new(sir())
            .proportion("Susceptible", 0.9)
            .proportion("Infected", 0.1)
            .build()
            .unwrap();
        let mut store = PopulationBuilder::new().agents(50).build().unwrap().agents;
        model.initialize_states(&mut store, &mut SimRng::new(3)).unwrap();
        assert_eq!(store.state_counts(3), vec![45, 5, 0]);
        assert!(store.iter().all(|(_, a)| a.countdown.is_none()));
    }

    #[test]
    fn certain_and_impossible_transitions() {
        let model = sir_stochastic(TransitionProbability::Constant(0.0), 1.0);
        let store = store_with_states(&[S, I]);
        let mut r = rng();
        for _ in 0..20 {
            assert_eq!(model.find_next_state(AgentId(0), &store, Tick(0), &mut r).unwrap().state, S);
            assert_eq!(model.find_next_state(AgentId(1), &store, Tick(0), &mut r).unwrap().state, R);
        }
    }

    #[test]
    fn terminal_state_stays() {
        let model = sir_stochastic(TransitionProbability::Infection, 0.5);
        let store = store_with_states(&[R]);
        let t = model.find_next_state(AgentId(0), &store, Tick(0), &mut rng()).unwrap();
        assert_eq!(t, Transition::unscheduled(R));
    }

    #[test]
    fn timed_probability_uses_tick() {
        let model = sir_stochastic(
            TransitionProbability::timed(|t: Tick| if t.0 >= 5 { 1.0 } else { 0.0 }),
            0.0,
        );
        let store = store_with_states(&[S]);
        let mut r = rng();
        assert_eq!(model.find_next_state(AgentId(0), &store, Tick(4), &mut r).unwrap().state, S);
        assert_eq!(model.find_next_state(AgentId(0), &store, Tick(5), &mut r).unwrap().state, I);
    }

    #[test]
    fn infection_above_one_always_succeeds() {
        let model = StochasticModelBuilder::new(sir())
            .proportion("Susceptible", 1.0)
            .transition("Susceptible", "Infected", TransitionProbability::Infection)
            .infection(InfectionRules::new().with_external(|_: &epi_agent::Agent, _: Tick| 1.5))
            .build()
            .unwrap();
        let store = store_with_states(&[S]);
        let mut r = rng();
        for _ in 0..50 {
            assert_eq!(model.find_next_state(AgentId(0), &store, Tick(0), &mut r).unwrap().state, I);
        }
    }

    #[test]
    fn reads_current_state_not_staged_state() {
        let model = sir_stochastic(TransitionProbability::Infection, 0.0);
        let mut store = store_with_states(&[S, S]);
        store[AgentId(0)].contacts.push(Contact::new(AgentId(1)));
        // Agent 1 is staged to become infectious but has not committed yet.
        store[AgentId(1)].stage(AgentId(1), Transition::unscheduled(I)).unwrap();
        let mut r = rng();
        for _ in 0..20 {
            assert_eq!(model.find_next_state(AgentId(0), &store, Tick(0), &mut r).unwrap().state, S);
        }
    }

    #[test]
    fn uninitialized_agent_is_an_error() {
        let model = sir_stochastic(TransitionProbability::Constant(0.0), 0.0);
        let store = PopulationBuilder::new().agents(1).build().unwrap().agents;
        assert!(matches!(
            model.find_next_state(AgentId(0), &store, Tick(0), &mut rng()),
            Err(ModelError::Uninitialized(_))
        ));
    }
}

#[cfg(test)]
mod scheduled_tests {
    use super::*;
    use crate::{DiseaseModel, ModelError, ScheduledModel, ScheduledModelBuilder, StateDuration};

    fn sir_scheduled(infected_for: StateDuration) -> ScheduledModel {
        ScheduledModelBuilder::new(sir())
            .proportion("Susceptible", 1.0)
            .duration("Infected", infected_for)
            .infection_transition("Susceptible", [("Infected", 1.0)])
            .fixed_transition("Infected", [("Recovered", 1.0)])
            .build()
            .unwrap()
    }

    #[test]
    fn infected_contact_starts_countdown() {
        let model = sir_scheduled(StateDuration::fixed(6));
        let mut store = store_with_states(&[S, I]);
        store[AgentId(0)].contacts.push(Contact::new(AgentId(1)));
        let t = model.find_next_state(AgentId(0), &store, Tick(0), &mut rng()).unwrap();
        assert_eq!(t, Transition::new(I, Some(6)));
    }

    #[test]
    fn running_countdown_stays_in_place() {
        let model = sir_scheduled(StateDuration::fixed(6));
        let mut store = store_with_states(&[I]);
        store[AgentId(0)].countdown = Some(3);
        let t = model.find_next_state(AgentId(0), &store, Tick(2), &mut rng()).unwrap();
        assert_eq!(t, Transition::new(I, Some(3)));
    }

    #[test]
    fn cleared_countdown_takes_fixed_transition() {
        let model = sir_scheduled(StateDuration::fixed(6));
        let store = store_with_states(&[I]);
        let t = model.find_next_state(AgentId(0), &store, Tick(6), &mut rng()).unwrap();
        assert_eq!(t, Transition::unscheduled(R));
    }

    #[test]
    fn rejected_infection_resamples_stay() {
        let states = sir();
        let model = ScheduledModelBuilder::new(states)
            .proportion("Susceptible", 1.0)
            .duration("Susceptible", StateDuration::custom(|t: Tick, _: &mut rand::rngs::SmallRng| t.0 as u32 + 1))
            .infection_transition("Susceptible", [("Infected", 1.0)])
            .build()
            .unwrap();
        let store = store_with_states(&[S]);
        let mut r = rng();
        // No contacts: infection is always rejected, and the stay duration
        // is sampled afresh each evaluation.
        let a = model.find_next_state(AgentId(0), &store, Tick(1), &mut r).unwrap();
        let b = model.find_next_state(AgentId(0), &store, Tick(4), &mut r).unwrap();
        assert_eq!(a, Transition::new(S, Some(2)));
        assert_eq!(b, Transition::new(S, Some(5)));
    }

    #[test]
    fn normal_duration_is_floored_at_zero() {
        let model = sir_scheduled(StateDuration::normal(-50.0, 1.0));
        let mut store = store_with_states(&[S, I]);
        store[AgentId(0)].contacts.push(Contact::new(AgentId(1)));
        let t = model.find_next_state(AgentId(0), &store, Tick(0), &mut rng()).unwrap();
        assert_eq!(t, Transition::unscheduled(I), "zero duration clears the countdown");
    }

    #[test]
    fn initialization_samples_countdowns() {
        let model = ScheduledModelBuilder::new(sir())
            .proportion("Infected", 1.0)
            .duration("Infected", StateDuration::fixed(4))
            .build()
            .unwrap();
        let mut store = PopulationBuilder::new().agents(3).build().unwrap().agents;
        model.initialize_states(&mut store, &mut SimRng::new(0)).unwrap();
        assert!(store.iter().all(|(_, a)| a.state == Some(I) && a.countdown == Some(4)));
    }

    #[test]
    fn build_errors() {
        let bad_variance = ScheduledModelBuilder::new(sir())
            .proportion("Susceptible", 1.0)
            .duration("Infected", StateDuration::normal(3.0, -1.0))
            .build();
        assert!(matches!(bad_variance, Err(ModelError::InvalidDuration { .. })));

        let bad_weights = ScheduledModelBuilder::new(sir())
            .proportion("Susceptible", 1.0)
            .fixed_transition("Infected", [("Recovered", 0.6)])
            .build();
        assert!(matches!(bad_weights, Err(ModelError::WeightSum { .. })));

        let twice = ScheduledModelBuilder::new(sir())
            .proportion("Susceptible", 1.0)
            .fixed_transition("Infected", [("Recovered", 1.0)])
            .fixed_transition("Infected", [("Susceptible", 1.0)])
            .build();
        assert!(matches!(twice, Err(ModelError::DuplicateRule { .. })));
    }
}
