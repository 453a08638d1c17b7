//! CSV population loader.
//!
//! # CSV format
//!
//! One row per agent.  The `key` column is required; every other column is
//! kept verbatim as a string attribute on the agent.
//!
//! ```csv
//! key,age,household
//! a01,34,h1
//! a02,7,h1
//! ```
//!
//! Locations use the same shape (`key` plus ignored extra columns).

use std::io::Read;
use std::path::Path;

use csv::StringRecord;

use crate::{Agent, AgentError, AgentResult, Location, PopulationBuilder};

const KEY_COLUMN: &str = "key";

// ── Public API ────────────────────────────────────────────────────────────────

/// Load agents from a CSV file into `builder`.  Returns the number of rows read.
pub fn load_agents_csv(path: &Path, builder: &mut PopulationBuilder) -> AgentResult<usize> {
    let file = std::fs::File::open(path).map_err(epi_core::EpiError::Io)?;
    load_agents_reader(file, builder)
}

/// Like [`load_agents_csv`] but accepts any `Read` source.
pub fn load_agents_reader<R: Read>(reader: R, builder: &mut PopulationBuilder) -> AgentResult<usize> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let headers = csv_reader.headers()?.clone();
    let key_idx = key_index(&headers)?;

    let mut rows = 0;
    for result in csv_reader.records() {
        let record = result?;
        let mut agent = Agent::new(record.get(key_idx).unwrap_or_default().trim());
        for (i, (name, value)) in headers.iter().zip(record.iter()).enumerate() {
            if i != key_idx {
                agent.attributes.insert(name.to_owned(), value.trim().to_owned());
            }
        }
        builder.push_agent(agent);
        rows += 1;
    }
    Ok(rows)
}

/// Load locations from a CSV file into `builder`.
pub fn load_locations_csv(path: &Path, builder: &mut PopulationBuilder) -> AgentResult<usize> {
    let file = std::fs::File::open(path).map_err(epi_core::EpiError::Io)?;
    load_locations_reader(file, builder)
}

pub fn load_locations_reader<R: Read>(
    reader:  R,
    builder: &mut PopulationBuilder,
) -> AgentResult<usize> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let key_idx = key_index(csv_reader.headers()?)?;

    let mut rows = 0;
    for result in csv_reader.records() {
        let record = result?;
        builder.push_location(Location::new(record.get(key_idx).unwrap_or_default().trim()));
        rows += 1;
    }
    Ok(rows)
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn key_index(headers: &StringRecord) -> AgentResult<usize> {
    headers
        .iter()
        .position(|h| h.trim() == KEY_COLUMN)
        .ok_or(AgentError::MissingColumn(KEY_COLUMN))
}
