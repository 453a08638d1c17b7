//! The office: desks, meeting rooms, the disease, and the interventions.

use anyhow::Result;
use log::debug;

use epi_agent::{Population, PopulationBuilder, TestOutcome};
use epi_core::{AgentId, PolicySlot};
use epi_disease::{
    AmbientEventInfection, InfectionRules, InfectiousContact, ScheduledModel,
    ScheduledModelBuilder, StateDuration, StateSet,
};
use epi_policy::{
    ContactsOfPositives, Policy, PolicyContext, PolicyResult, Pooling, RandomSelection, TestPolicy,
};
use epi_sim::{Interaction, ScriptedEvent, ScriptedSource};

use crate::config::{OfficeConfig, Selection, TestingConfig};

// ── Population ────────────────────────────────────────────────────────────────

/// Agent `i` sits in office `i % offices`.
pub fn population(config: &OfficeConfig) -> Result<Population> {
    let offices = config.offices.max(1);
    let mut builder = PopulationBuilder::new();
    for o in 0..offices {
        builder = builder.location(format!("office-{o}"));
    }
    for i in 0..config.agents {
        builder = builder.agent_with(i.to_string(), [("office", format!("office-{}", i % offices))]);
    }
    Ok(builder.build()?)
}

/// Desk neighbours talk every step; each office may hold one meeting.
pub fn schedule(config: &OfficeConfig, population: &Population) -> Result<ScriptedSource> {
    let offices = config.offices.max(1);
    let mut source = ScriptedSource::new();

    for (id, _) in population.locations.iter() {
        let members: Vec<AgentId> = population
            .agents
            .ids()
            .filter(|a| a.index() % offices == id.index())
            .collect();
        for pair in members.windows(2) {
            source.add_pair(pair[0], pair[1]);
        }
        if members.len() > 1 {
            source.add_event(
                ScriptedEvent::new(id, members).with_probability(config.meeting_probability),
            );
        }
    }
    // Neighbouring ids sit in different offices; every fourth pair shares the
    // kitchen on a quarter of the steps.
    if offices > 1 {
        for a in population.agents.ids().filter(|a| a.index() % 4 == 0) {
            let b = AgentId(a.0 + 1);
            if population.agents.get(b).is_some() {
                source.add_interaction(Interaction::new(a, b).with_intensity(0.5).with_probability(0.25));
                source.add_interaction(Interaction::new(b, a).with_intensity(0.5).with_probability(0.25));
            }
        }
    }
    debug!(
        "office schedule: {} interactions, {} events over {} rooms",
        source.interaction_count(),
        source.event_count(),
        population.locations.len()
    );
    Ok(source)
}

// ── Disease ───────────────────────────────────────────────────────────────────

/// Susceptible → Exposed → Infected → Recovered, with durations.
pub fn model(config: &OfficeConfig) -> Result<ScheduledModel> {
    let states = StateSet::new(["Susceptible", "Exposed", "Infected", "Recovered"], ["Infected"])?;
    let model = ScheduledModelBuilder::new(states)
        .proportion("Susceptible", 1.0 - config.initial_infected)
        .proportion("Infected", config.initial_infected)
        .duration(
            "Exposed",
            StateDuration::normal(config.incubation_mean, config.incubation_variance),
        )
        .duration("Infected", StateDuration::fixed(config.infectious_steps))
        .infection_transition("Susceptible", [("Exposed", 1.0)])
        .fixed_transition("Exposed", [("Infected", 1.0)])
        .fixed_transition("Infected", [("Recovered", 1.0)])
        .infection(
            InfectionRules::new()
                .with_contact(InfectiousContact { per_contact: config.per_contact })
                .with_event(AmbientEventInfection { per_infectious: config.per_infectious }),
        )
        .build()?;
    Ok(model)
}

// ── Interventions ─────────────────────────────────────────────────────────────

pub fn testing(config: &TestingConfig) -> Result<TestPolicy> {
    let mut policy = match config.selection {
        Selection::Random => TestPolicy::new("testing", RandomSelection),
        Selection::ContactsOfPositives { lookback } => {
            TestPolicy::new("testing", ContactsOfPositives { lookback })
        }
    };
    let quota = config.agents_per_step;
    policy = policy
        .with_pooling(Pooling::new(config.agents_per_tube, config.tubes_per_agent)?)
        .agents_per_step(move |_| quota);
    policy.add_machines(config.machine.clone(), config.machines)?;
    Ok(policy)
}

/// Isolates every agent whose latest consensus result from the testing slot
/// is positive and still valid: both per-step modifiers drop to 0, so the
/// agent neither passes on nor picks up infection through any contact or
/// event.  Modifiers reset every step; `protected` is left untouched.
pub struct IsolatePositives {
    testing:  PolicySlot,
    isolated: usize,
    peak:     usize,
}

impl IsolatePositives {
    pub fn new(testing: PolicySlot) -> Self {
        Self { testing, isolated: 0, peak: 0 }
    }
}

impl Policy for IsolatePositives {
    fn name(&self) -> &str {
        "isolation"
    }

    fn reset(&mut self, _ctx: &mut PolicyContext<'_>) -> PolicyResult<()> {
        self.isolated = 0;
        self.peak = 0;
        Ok(())
    }

    fn enact_policy(&mut self, ctx: &mut PolicyContext<'_>) -> PolicyResult<()> {
        let tick = ctx.tick();
        let mut isolated = 0;
        for (_, agent) in ctx.agents.iter_mut() {
            let positive = agent
                .record(self.testing)
                .and_then(|r| r.latest_consensus())
                .is_some_and(|(outcome, result)| {
                    outcome == TestOutcome::Positive && result.is_valid_at(tick)
                });
            if positive {
                agent.contribution = 0.0;
                agent.reception = 0.0;
                isolated += 1;
            }
        }
        self.isolated = isolated;
        self.peak = self.peak.max(isolated);
        Ok(())
    }

    fn report(&self) -> Vec<(&'static str, f64)> {
        vec![("isolated", self.isolated as f64), ("peak_isolated", self.peak as f64)]
    }
}
