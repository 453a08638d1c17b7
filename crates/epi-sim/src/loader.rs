//! CSV readers for the scripted step feed.
//!
//! # Interactions
//!
//! ```csv
//! agent,other,intensity,probability,tick
//! a01,a02,1.0,,
//! a02,a01,0.5,0.3,
//! a03,a01,,,12
//! ```
//!
//! Only `agent` and `other` are required.  A row with a `tick` fires once at
//! that step; otherwise it repeats every step.  `probability` gates the row
//! with one draw per step.
//!
//! # Events
//!
//! ```csv
//! location,agents,probability_of_occurring,tick
//! office,a01;a02;a03,0.8,
//! canteen,a01;a04,,3
//! ```
//!
//! `agents` is a `;`-separated key list.
//!
//! Keys are resolved against the population; an unknown key is a
//! data-integrity fault and fails the whole load.

use std::io::Read;
use std::path::Path;

use serde::Deserialize;

use epi_agent::{AgentStore, LocationStore};
use epi_core::{AgentId, Tick};

use crate::{Interaction, ScriptedEvent, ScriptedSource, SimError, SimResult};

#[derive(Debug, Deserialize)]
struct InteractionRow {
    agent:       String,
    other:       String,
    #[serde(default)]
    intensity:   Option<f64>,
    #[serde(default)]
    probability: Option<f64>,
    #[serde(default)]
    tick:        Option<u64>,
}

#[derive(Debug, Deserialize)]
struct EventRow {
    location:                 String,
    agents:                   String,
    #[serde(default)]
    probability_of_occurring: Option<f64>,
    #[serde(default)]
    tick:                     Option<u64>,
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Load interactions from a CSV file into `source`.  Returns the number of
/// rows read.
pub fn load_interactions_csv(
    path:   &Path,
    agents: &AgentStore,
    source: &mut ScriptedSource,
) -> SimResult<usize> {
    load_interactions_reader(std::fs::File::open(path)?, agents, source)
}

/// Like [`load_interactions_csv`] but accepts any `Read` source.
pub fn load_interactions_reader<R: Read>(
    reader: R,
    agents: &AgentStore,
    source: &mut ScriptedSource,
) -> SimResult<usize> {
    let mut csv_reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let headers = csv_reader.headers()?.clone();

    let mut rows = 0;
    for result in csv_reader.records() {
        let record = result?;
        let line = record.position().map_or(0, |p| p.line());
        let row: InteractionRow = record.deserialize(Some(&headers))?;

        let probability = row.probability.unwrap_or(1.0);
        check_probability(line, "probability", probability)?;
        let interaction = Interaction::new(agents.require(&row.agent)?, agents.require(&row.other)?)
            .with_intensity(row.intensity.unwrap_or(1.0))
            .with_probability(probability);

        match row.tick {
            Some(t) => source.add_interaction_at(Tick(t), interaction),
            None => source.add_interaction(interaction),
        };
        rows += 1;
    }
    Ok(rows)
}

/// Load events from a CSV file into `source`.  Returns the number of rows
/// read.
pub fn load_events_csv(
    path:      &Path,
    agents:    &AgentStore,
    locations: &LocationStore,
    source:    &mut ScriptedSource,
) -> SimResult<usize> {
    load_events_reader(std::fs::File::open(path)?, agents, locations, source)
}

/// Like [`load_events_csv`] but accepts any `Read` source.
pub fn load_events_reader<R: Read>(
    reader:    R,
    agents:    &AgentStore,
    locations: &LocationStore,
    source:    &mut ScriptedSource,
) -> SimResult<usize> {
    let mut csv_reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let headers = csv_reader.headers()?.clone();

    let mut rows = 0;
    for result in csv_reader.records() {
        let record = result?;
        let line = record.position().map_or(0, |p| p.line());
        let row: EventRow = record.deserialize(Some(&headers))?;

        let participants = row
            .agents
            .split(';')
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(|k| agents.require(k))
            .collect::<Result<Vec<AgentId>, _>>()?;
        if participants.is_empty() {
            return Err(SimError::Record { line, reason: "event has no participants".into() });
        }
        let probability = row.probability_of_occurring.unwrap_or(1.0);
        check_probability(line, "probability_of_occurring", probability)?;

        let event = ScriptedEvent::new(locations.require(&row.location)?, participants)
            .with_probability(probability);
        match row.tick {
            Some(t) => source.add_event_at(Tick(t), event),
            None => source.add_event(event),
        };
        rows += 1;
    }
    Ok(rows)
}

fn check_probability(line: u64, column: &str, value: f64) -> SimResult<()> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(SimError::Record { line, reason: format!("{column} must lie in [0, 1], got {value}") })
    }
}
