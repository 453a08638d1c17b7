//! JSON run configuration.  Every field is optional; anything missing falls
//! back to [`OfficeConfig::default`].

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use epi_core::SimConfig;
use epi_policy::MachineSpec;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OfficeConfig {
    pub sim:                 SimConfig,
    pub agents:              usize,
    pub offices:             usize,
    /// Share of agents infected at step 0.
    pub initial_infected:    f64,
    /// Risk from one desk-neighbour contact with an infected agent.
    pub per_contact:         f64,
    /// Risk per infected attendee of a meeting.
    pub per_infectious:      f64,
    /// Chance each office holds its daily meeting.
    pub meeting_probability: f64,
    pub incubation_mean:     f64,
    pub incubation_variance: f64,
    pub infectious_steps:    u32,
    pub testing:             TestingConfig,
    /// Keep agents with a current positive result out of every contact.
    pub isolate_positives:   bool,
    pub log_level:           String,
    pub output_dir:          PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TestingConfig {
    pub enabled:         bool,
    /// All fields required when given.
    pub machine:         MachineSpec,
    pub machines:        usize,
    pub agents_per_tube: usize,
    pub tubes_per_agent: usize,
    pub agents_per_step: usize,
    pub selection:       Selection,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Selection {
    Random,
    ContactsOfPositives { lookback: u64 },
}

impl Default for OfficeConfig {
    fn default() -> Self {
        Self {
            sim:                 SimConfig { worlds: 3, steps: 60, seed: 42, num_threads: None },
            agents:              60,
            offices:             4,
            initial_infected:    0.05,
            per_contact:         0.1,
            per_infectious:      0.05,
            meeting_probability: 0.5,
            incubation_mean:     3.0,
            incubation_variance: 1.0,
            infectious_steps:    7,
            testing:             TestingConfig::default(),
            isolate_positives:   true,
            log_level:           "info".into(),
            output_dir:          PathBuf::from("./output"),
        }
    }
}

impl Default for TestingConfig {
    fn default() -> Self {
        let mut machine = MachineSpec::new("pcr", 20, 1);
        machine.valid_period = 7;
        Self {
            enabled:         true,
            machine,
            machines:        1,
            agents_per_tube: 1,
            tubes_per_agent: 1,
            agents_per_step: 10,
            selection:       Selection::Random,
        }
    }
}

impl OfficeConfig {
    /// Read `path`, or return the defaults when no path is given.  The flag
    /// reports whether defaults were used.
    pub fn load(path: Option<&Path>) -> Result<(Self, bool)> {
        let Some(path) = path else {
            return Ok((Self::default(), true));
        };
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config = serde_json::from_str(&text)
            .with_context(|| format!("parsing config {}", path.display()))?;
        Ok((config, false))
    }
}
