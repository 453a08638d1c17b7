//! Survival filtering of the step's raw contacts and events.
//!
//! Runs after every policy's `enact_policy` and before `post_policy`, in a
//! fixed draw order so a seed always reproduces the same filtered sets:
//!
//! 1. Contacts, by owning agent in ascending id, in list order.  A contact
//!    survives when neither end is protected and
//!    `uniform < owner.reception × other.contribution`.
//! 2. Events, by location in ascending id, in list order.  Events at a
//!    locked-down location are dropped without drawing.  Otherwise one draw
//!    against `probability_of_occurring` gates the whole event, then every
//!    unprotected participant draws against its `contribution` (may
//!    contribute) and its `reception` (may receive).

use log::trace;

use epi_agent::{AgentStore, LocationStore};
use epi_core::{SimRng, WorldStep};

/// What filtering kept and dropped this step.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct FilterStats {
    pub contacts_kept:    usize,
    pub contacts_dropped: usize,
    pub events_kept:      usize,
    pub events_dropped:   usize,
}

/// Filter every agent's contact list in place.
pub fn filter_contacts(agents: &mut AgentStore, rng: &mut SimRng, stats: &mut FilterStats) {
    // Modifiers as of the end of enact_policy; filtering never changes them.
    let modifiers: Vec<(f64, bool)> =
        agents.iter().map(|(_, a)| (a.contribution, a.protected)).collect();

    for (_, agent) in agents.iter_mut() {
        let before = agent.contacts.len();
        if agent.protected {
            agent.contacts.clear();
        } else {
            let reception = agent.reception;
            agent.contacts.retain(|c| match modifiers.get(c.other.index()) {
                Some(&(contribution, protected)) => {
                    !protected && rng.bernoulli(reception * contribution)
                }
                None => false,
            });
        }
        stats.contacts_kept += agent.contacts.len();
        stats.contacts_dropped += before - agent.contacts.len();
    }
}

/// Drop or split every location's events in place.
pub fn filter_events(
    locations: &mut LocationStore,
    agents:    &AgentStore,
    rng:       &mut SimRng,
    stats:     &mut FilterStats,
) {
    for (_, location) in locations.iter_mut() {
        let before = location.events.len();
        if location.lockdown {
            location.events.clear();
        } else {
            location.events.retain_mut(|event| {
                if !rng.bernoulli(event.probability_of_occurring) {
                    return false;
                }
                event.contributing.clear();
                event.receiving.clear();
                for &id in &event.participants {
                    let Some(agent) = agents.get(id) else {
                        continue;
                    };
                    if agent.protected {
                        continue;
                    }
                    if rng.bernoulli(agent.contribution) {
                        event.contributing.push(id);
                    }
                    if rng.bernoulli(agent.reception) {
                        event.receiving.push(id);
                    }
                }
                true
            });
        }
        stats.events_kept += location.events.len();
        stats.events_dropped += before - location.events.len();
    }
}

/// Run both filters for `step`.
pub fn filter_step(
    step:      WorldStep,
    agents:    &mut AgentStore,
    locations: &mut LocationStore,
    rng:       &mut SimRng,
) -> FilterStats {
    let mut stats = FilterStats::default();
    filter_contacts(agents, rng, &mut stats);
    filter_events(locations, agents, rng, &mut stats);
    trace!("{step}: filtering {stats:?}");
    stats
}
