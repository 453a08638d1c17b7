//! office — a small workplace outbreak with pooled surveillance testing.
//!
//! Agents sit in a handful of offices, talk to their desk neighbours every
//! step, and attend their office's meeting when it happens.  A testing policy
//! samples a quota of agents each step into pooled tubes; agents with a
//! current positive result are isolated from all contacts and meetings.
//!
//! ```text
//! cargo run -p office --release -- demos/office/office.json
//! ```
//!
//! With no argument the built-in defaults are used.  Per-world trajectories
//! and the cross-world summary are written as CSV to `output_dir`.

mod config;
mod logging;
mod office;


use std::path::PathBuf;
use std::time::Instant;

use anyhow::Result;
use log::info;

use epi_core::PolicySlot;
use epi_output::{CsvWriter, SimOutputObserver};
use epi_sim::{SimulationBuilder, World};

use config::OfficeConfig;
use office::IsolatePositives;

fn main() -> Result<()> {
    let path = std::env::args().nth(1).map(PathBuf::from);
    let (config, defaults) = OfficeConfig::load(path.as_deref())?;
    logging::init(&config.log_level)?;

    if defaults {
        info!("no config given, using built-in defaults");
    }
    info!(
        "office: {} agents in {} offices, {} worlds × {} steps, seed {}",
        config.agents, config.offices, config.sim.worlds, config.sim.steps, config.sim.seed
    );

    // 1. Population, schedule and disease.
    let population = office::population(&config)?;
    let source = office::schedule(&config, &population)?;
    let model = office::model(&config)?;

    // 2. Interventions.  Testing takes slot 0 so isolation can read it.
    let mut builder = SimulationBuilder::new(config.sim.clone(), population, model).source(source);
    if config.testing.enabled {
        builder = builder.policy(office::testing(&config.testing)?);
        if config.isolate_positives {
            builder = builder.policy(IsolatePositives::new(PolicySlot(0)));
        }
    }
    let sim = builder.build()?;

    // 3. Run every world, streaming output to CSV.
    let mut observer = SimOutputObserver::new(CsvWriter::new(&config.output_dir)?);
    let started = Instant::now();
    let outcome = World::new(sim).run(&mut observer)?;
    if let Some(e) = observer.take_error() {
        return Err(e.into());
    }
    let elapsed = started.elapsed();

    // 4. Final-step means across worlds.
    println!();
    println!("=== {} worlds in {:.2?} ===", outcome.summary.worlds(), elapsed);
    let last = outcome.summary.len().saturating_sub(1);
    for (state, stats) in outcome.summary.iter() {
        let p = stats[last];
        println!(
            "{state:<12} mean {:>7.2}  sd {:>6.2}  min {:>4}  max {:>4}",
            p.mean, p.stddev, p.min, p.max
        );
    }
    println!("Output written to {}", config.output_dir.display());
    Ok(())
}
