//! The scheduled variant: states with sampled durations.
//!
//! An agent whose countdown is still running stays put.  Once the countdown
//! clears, the current state's rule picks a destination from a static
//! weighted choice and a duration is sampled for it:
//!
//! | Rule        | Destination                                                  |
//! |-------------|--------------------------------------------------------------|
//! | terminal    | stay; resample the current state's duration                  |
//! | `fixed`     | weighted pick                                                |
//! | `infection` | weighted pick, accepted only if a second uniform draw falls under the aggregated infection probability; otherwise stay and resample |
//!
//! Resampling on a rejected infection means the time an agent keeps
//! re-evaluating can differ from step to step.

use std::fmt;
use std::sync::Arc;

use log::debug;
use rand::Rng;
use rand::rngs::SmallRng;
use rand_distr::Normal;

use epi_agent::{AgentStore, Transition};
use epi_core::{AgentId, AgentRng, SimRng, StateId, Tick};

use crate::stochastic::resolve_proportions;
use crate::choice::partition_states;
use crate::{DiseaseModel, InfectionRules, ModelError, ModelResult, StateSet, WeightedChoice};

// ── Durations ─────────────────────────────────────────────────────────────────

/// Custom duration sampler; returns whole steps.
pub trait DurationSampler: Send + Sync {
    fn sample(&self, tick: Tick, rng: &mut SmallRng) -> u32;
}

impl<F> DurationSampler for F
where
    F: Fn(Tick, &mut SmallRng) -> u32 + Send + Sync,
{
    fn sample(&self, tick: Tick, rng: &mut SmallRng) -> u32 {
        self(tick, rng)
    }
}

/// How long an agent stays in a state once it enters it.
#[derive(Clone)]
pub enum StateDuration {
    /// No countdown; the state's rule runs every step.
    Indefinite,
    /// Normal(mean, variance), floored at 0 and rounded to whole steps.
    Normal { mean: f64, variance: f64 },
    Custom(Arc<dyn DurationSampler>),
}

impl StateDuration {
    pub fn normal(mean: f64, variance: f64) -> Self {
        StateDuration::Normal { mean, variance }
    }

    /// Exactly `steps` steps.
    pub fn fixed(steps: u32) -> Self {
        StateDuration::Normal { mean: steps as f64, variance: 0.0 }
    }

    pub fn custom(sampler: impl DurationSampler + 'static) -> Self {
        StateDuration::Custom(Arc::new(sampler))
    }
}

impl fmt::Debug for StateDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StateDuration::Indefinite => f.write_str("Indefinite"),
            StateDuration::Normal { mean, variance } => f
                .debug_struct("Normal")
                .field("mean", mean)
                .field("variance", variance)
                .finish(),
            StateDuration::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// Validated, sampling-ready form of [`StateDuration`].
#[derive(Clone)]
enum DurationRule {
    Indefinite,
    Normal(Normal<f64>),
    Custom(Arc<dyn DurationSampler>),
}

impl DurationRule {
    fn from_spec(state: &str, spec: StateDuration) -> ModelResult<Self> {
        match spec {
            StateDuration::Indefinite => Ok(DurationRule::Indefinite),
            StateDuration::Custom(s) => Ok(DurationRule::Custom(s)),
            StateDuration::Normal { mean, variance } => {
                let invalid = |reason: String| ModelError::InvalidDuration {
                    state: state.to_owned(),
                    reason,
                };
                if !mean.is_finite() || !variance.is_finite() || variance < 0.0 {
                    return Err(invalid(format!("mean {mean}, variance {variance}")));
                }
                Normal::new(mean, variance.sqrt())
                    .map(DurationRule::Normal)
                    .map_err(|e| invalid(e.to_string()))
            }
        }
    }

    fn sample(&self, tick: Tick, rng: &mut SmallRng) -> Option<u32> {
        let steps = match self {
            DurationRule::Indefinite => return None,
            DurationRule::Normal(d) => rng.sample(d).max(0.0).round() as u32,
            DurationRule::Custom(s) => s.sample(tick, rng),
        };
        Some(steps)
    }
}

// ── Rules ─────────────────────────────────────────────────────────────────────

#[derive(Clone, Debug)]
enum Rule {
    Terminal,
    Fixed(WeightedChoice),
    Infection(WeightedChoice),
}

// ── ScheduledModel ────────────────────────────────────────────────────────────

/// Scheduled disease model.  Build with [`ScheduledModelBuilder`].
pub struct ScheduledModel {
    states:      StateSet,
    proportions: Vec<f64>,
    durations:   Vec<DurationRule>,
    rules:       Vec<Rule>,
    infection:   InfectionRules,
}

impl fmt::Debug for ScheduledModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScheduledModel")
            .field("states", &self.states)
            .field("proportions", &self.proportions)
            .field("rules", &self.rules)
            .finish_non_exhaustive()
    }
}

impl ScheduledModel {
    pub fn proportions(&self) -> &[f64] {
        &self.proportions
    }

    fn duration(&self, state: StateId, tick: Tick, rng: &mut SmallRng) -> Option<u32> {
        self.durations.get(state.index()).and_then(|d| d.sample(tick, rng))
    }

    fn enter(&self, state: StateId, tick: Tick, rng: &mut SmallRng) -> Transition {
        Transition::new(state, self.duration(state, tick, rng))
    }
}

impl DiseaseModel for ScheduledModel {
    fn states(&self) -> &StateSet {
        &self.states
    }

    fn infection(&self) -> &InfectionRules {
        &self.infection
    }

    fn initialize_states(&self, agents: &mut AgentStore, rng: &mut SimRng) -> ModelResult<()> {
        for (agent, state) in partition_states(agents, &self.proportions, rng) {
            let t = self.enter(state, Tick::ZERO, rng.inner());
            agents[agent].initialize(t);
        }
        debug!(
            "scheduled model initialized {} agents: {:?}",
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
        let me = agents.get(agent).ok_or(ModelError::Uninitialized(agent))?;
        let current = me.state.ok_or(ModelError::Uninitialized(agent))?;

        if me.countdown.is_some() {
            return Ok(Transition::new(current, me.countdown));
        }

        let transition = match &self.rules[current.index()] {
            Rule::Terminal => self.enter(current, tick, rng.inner()),
            Rule::Fixed(choice) => {
                let to = choice.pick(rng.uniform());
                self.enter(to, tick, rng.inner())
            }
            Rule::Infection(choice) => {
                let candidate = choice.pick(rng.uniform());
                let p = self
                    .infection
                    .infection_probability(agent, agents, &self.states, tick);
                if rng.uniform() < p {
                    self.enter(candidate, tick, rng.inner())
                } else {
                    self.enter(current, tick, rng.inner())
                }
            }
        };
        Ok(transition)
    }
}

// ── Builder ───────────────────────────────────────────────────────────────────

enum RuleSpec {
    Fixed(Vec<(String, f64)>),
    Infection(Vec<(String, f64)>),
}

/// Fluent builder for [`ScheduledModel`].
///
/// ```rust
/// use epi_disease::{ScheduledModelBuilder, StateDuration, StateSet};
///
/// let states = StateSet::new(["Susceptible", "Infected", "Recovered"], ["Infected"]).unwrap();
/// let model = ScheduledModelBuilder::new(states)
///     .proportion("Susceptible", 1.0)
///     .duration("Infected", StateDuration::fixed(6))
///     .infection_transition("Susceptible", [("Infected", 1.0)])
///     .fixed_transition("Infected", [("Recovered", 1.0)])
///     .build()
///     .unwrap();
/// # let _ = model;
/// ```
pub struct ScheduledModelBuilder {
    states:      StateSet,
    proportions: Vec<(String, f64)>,
    durations:   Vec<(String, StateDuration)>,
    rules:       Vec<(String, RuleSpec)>,
    infection:   InfectionRules,
}

impl ScheduledModelBuilder {
    pub fn new(states: StateSet) -> Self {
        Self {
            states,
            proportions: Vec::new(),
            durations:   Vec::new(),
            rules:       Vec::new(),
            infection:   InfectionRules::default(),
        }
    }

    pub fn proportion(mut self, state: impl Into<String>, p: f64) -> Self {
        self.proportions.push((state.into(), p));
        self
    }

    /// Duration of `state`.  States without one are [`StateDuration::Indefinite`].
    pub fn duration(mut self, state: impl Into<String>, d: StateDuration) -> Self {
        self.durations.push((state.into(), d));
        self
    }

    /// Leave `from` by a weighted pick once its countdown clears.
    pub fn fixed_transition<I, S>(mut self, from: impl Into<String>, weights: I) -> Self
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        let w = weights.into_iter().map(|(s, p)| (s.into(), p)).collect();
        self.rules.push((from.into(), RuleSpec::Fixed(w)));
        self
    }

    /// Leave `from` by a weighted pick gated on the infection probability.
    pub fn infection_transition<I, S>(mut self, from: impl Into<String>, weights: I) -> Self
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        let w = weights.into_iter().map(|(s, p)| (s.into(), p)).collect();
        self.rules.push((from.into(), RuleSpec::Infection(w)));
        self
    }

    pub fn infection(mut self, rules: InfectionRules) -> Self {
        self.infection = rules;
        self
    }

    pub fn build(self) -> ModelResult<ScheduledModel> {
        let states = self.states;
        let proportions = resolve_proportions(&states, &self.proportions)?;

        let mut durations = vec![DurationRule::Indefinite; states.len()];
        for (label, spec) in self.durations {
            let id = states.require(&label)?;
            durations[id.index()] = DurationRule::from_spec(&label, spec)?;
        }

        let mut rules = vec![Rule::Terminal; states.len()];
        for (from, spec) in self.rules {
            let id = states.require(&from)?;
            if !matches!(rules[id.index()], Rule::Terminal) {
                return Err(ModelError::DuplicateRule { from });
            }
            let weights = |w: &[(String, f64)]| {
                WeightedChoice::new(&states, &from, w.iter().map(|(s, p)| (s.as_str(), *p)))
            };
            rules[id.index()] = match spec {
                RuleSpec::Fixed(w) => Rule::Fixed(weights(&w)?),
                RuleSpec::Infection(w) => Rule::Infection(weights(&w)?),
            };
        }

        Ok(ScheduledModel { states, proportions, durations, rules, infection: self.infection })
    }
}
