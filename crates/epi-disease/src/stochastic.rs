//! The stochastic variant: per-step probabilistic transitions, no
//! countdowns.
//!
//! Each step an agent draws one uniform `r` and walks its current state's
//! destinations in declared order, accumulating their probabilities.  The
//! first destination whose running sum exceeds `r` is taken; otherwise the
//! agent stays.

use log::debug;

use epi_agent::{AgentStore, Transition};
use epi_core::{AgentId, AgentRng, SimRng, StateId, Tick};

use crate::choice::{check_proportions, cumulative_pick, partition_states};
use crate::{
    DiseaseModel, InfectionRules, ModelError, ModelResult, StateSet, TransitionProbability,
};

/// Stochastic disease model.  Build with [`StochasticModelBuilder`].
#[derive(Debug)]
pub struct StochasticModel {
    states:      StateSet,
    proportions: Vec<f64>,
    /// Outgoing rules per source state, sorted by destination.
    transitions: Vec<Vec<(StateId, TransitionProbability)>>,
    infection:   InfectionRules,
}

impl StochasticModel {
    pub fn proportions(&self) -> &[f64] {
        &self.proportions
    }

    /// Outgoing rules of `from`, in declared destination order.
    pub fn transitions_from(&self, from: StateId) -> &[(StateId, TransitionProbability)] {
        self.transitions.get(from.index()).map_or(&[], Vec::as_slice)
    }
}

impl DiseaseModel for StochasticModel {
    fn states(&self) -> &StateSet {
        &self.states
    }

    fn infection(&self) -> &InfectionRules {
        &self.infection
    }

    fn initialize_states(&self, agents: &mut AgentStore, rng: &mut SimRng) -> ModelResult<()> {
        for (agent, state) in partition_states(agents, &self.proportions, rng) {
            agents[agent].initialize(Transition::unscheduled(state));
        }
        debug!(
            "stochastic model initialized {} agents: {:?}",
            agents.len(),
            agents.state_counts(self.states.len())
        );
        Ok(())
    }

    fn find_next_state(
        &self,
        agent:  AgentId,
        agents: &AgentStore,
        tick:   Tick,
        rng:    &mut AgentRng,
    ) -> ModelResult<Transition> {
        let current = agents.state_of(agent).ok_or(ModelError::Uninitialized(agent))?;
        let r = rng.uniform();
        let next = cumulative_pick(
            self.transitions_from(current).iter().map(|(to, p)| {
                (*to, p.evaluate(agent, agents, tick, &self.infection, &self.states))
            }),
            r,
        );
        Ok(Transition::unscheduled(next.unwrap_or(current)))
    }
}

// ── Builder ───────────────────────────────────────────────────────────────────

/// Fluent builder for [`StochasticModel`].
///
/// ```rust
/// use epi_disease::{StateSet, StochasticModelBuilder, TransitionProbability};
///
/// let states = StateSet::new(["Susceptible", "Infected", "Recovered"], ["Infected"]).unwrap();
/// let model = StochasticModelBuilder::new(states)
///     .proportion("Susceptible", 0.99)
///     .proportion("Infected", 0.01)
///     .transition("Susceptible", "Infected", TransitionProbability::Infection)
///     .transition("Infected", "Recovered", TransitionProbability::Constant(0.2))
///     .build()
///     .unwrap();
/// # let _ = model;
/// ```
pub struct StochasticModelBuilder {
    states:      StateSet,
    proportions: Vec<(String, f64)>,
    transitions: Vec<(String, String, TransitionProbability)>,
    infection:   InfectionRules,
}

impl StochasticModelBuilder {
    pub fn new(states: StateSet) -> Self {
        Self {
            states,
            proportions: Vec::new(),
            transitions: Vec::new(),
            infection:   InfectionRules::default(),
        }
    }

    /// Starting share of `state`.  Unlisted states start empty.
    pub fn proportion(mut self, state: impl Into<String>, p: f64) -> Self {
        self.proportions.push((state.into(), p));
        self
    }

    pub fn transition(
        mut self,
        from: impl Into<String>,
        to:   impl Into<String>,
        p:    TransitionProbability,
    ) -> Self {
        self.transitions.push((from.into(), to.into(), p));
        self
    }

    pub fn infection(mut self, rules: InfectionRules) -> Self {
        self.infection = rules;
        self
    }

    pub fn build(self) -> ModelResult<StochasticModel> {
        let proportions = resolve_proportions(&self.states, &self.proportions)?;

        let mut transitions: Vec<Vec<(StateId, TransitionProbability)>> =
            vec![Vec::new(); self.states.len()];
        for (from, to, p) in self.transitions {
            let f = self.states.require(&from)?;
            let t = self.states.require(&to)?;
            if let TransitionProbability::Constant(c) = p {
                crate::choice::check_probability(|| format!("{from:?} -> {to:?}"), c)?;
            }
            let rules = &mut transitions[f.index()];
            if rules.iter().any(|(s, _)| *s == t) {
                return Err(ModelError::DuplicateTransition { from, to });
            }
            rules.push((t, p));
        }
        for rules in &mut transitions {
            rules.sort_by_key(|(s, _)| *s);
        }

        Ok(StochasticModel { states: self.states, proportions, transitions, infection: self.infection })
    }
}

/// Turn labelled proportions into a per-state vector and validate the sum.
pub(crate) fn resolve_proportions(
    states: &StateSet,
    labelled: &[(String, f64)],
) -> ModelResult<Vec<f64>> {
    let mut proportions = vec![0.0; states.len()];
    for (label, p) in labelled {
        proportions[states.require(label)?.index()] += p;
    }
    check_proportions(states, &proportions)?;
    Ok(proportions)
}
