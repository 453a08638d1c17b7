//! Fluent builder for constructing a [`Simulation`].

use epi_agent::{AgentStore, LocationStore, Population};
use epi_core::{PolicySlot, SimConfig};
use epi_disease::DiseaseModel;
use epi_policy::Policy;

use crate::{ScriptedSource, SimError, SimResult, Simulation, StepSource};

/// Fluent builder for [`Simulation<M>`].
///
/// # Required inputs
///
/// - [`SimConfig`] — worlds, steps, seed, thread count
/// - [`Population`] — the template agents and locations
/// - `M: DiseaseModel` — the state machine
///
/// # Optional inputs (have defaults)
///
/// | Method          | Default                                      |
/// |-----------------|----------------------------------------------|
/// | `.policy(p)`    | no policies; may be called repeatedly        |
/// | `.source(s)`    | an empty [`ScriptedSource`]                  |
///
/// Policies receive record slots in the order they are added.
///
/// # Example
///
/// ```rust,ignore
/// let mut sim = SimulationBuilder::new(config, population, model)
///     .policy(testing)
///     .source(feed)
///     .build()?;
/// let trajectory = sim.run_world(0, &mut SimRng::new(config.seed), &mut NoopObserver)?;
/// ```
pub struct SimulationBuilder<M: DiseaseModel> {
    config:     SimConfig,
    population: Population,
    model:      M,
    policies:   Vec<Box<dyn Policy>>,
    source:     Option<Box<dyn StepSource>>,
}

impl<M: DiseaseModel> SimulationBuilder<M> {
    pub fn new(config: SimConfig, population: Population, model: M) -> Self {
        Self { config, population, model, policies: Vec::new(), source: None }
    }

    /// Register a policy after those already added.
    pub fn policy(mut self, policy: impl Policy + 'static) -> Self {
        self.policies.push(Box::new(policy));
        self
    }

    /// Register an already boxed policy.
    pub fn boxed_policy(mut self, policy: Box<dyn Policy>) -> Self {
        self.policies.push(policy);
        self
    }

    pub fn source(mut self, source: impl StepSource + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Validate inputs and return a ready-to-run [`Simulation`].
    pub fn build(self) -> SimResult<Simulation<M>> {
        if self.config.worlds == 0 {
            return Err(SimError::Config("at least one world is required".into()));
        }
        if self.population.agents.is_empty() {
            return Err(SimError::Config("population has no agents".into()));
        }
        if PolicySlot::try_from(self.policies.len()).is_err() {
            return Err(SimError::Config(format!("{} policies exceed the slot range", self.policies.len())));
        }

        #[cfg(feature = "parallel")]
        let pool = match self.config.num_threads {
            Some(n) => Some(
                rayon::ThreadPoolBuilder::new()
                    .num_threads(n)
                    .build()
                    .map_err(|e| SimError::Config(format!("thread pool: {e}")))?,
            ),
            None => None,
        };

        Ok(Simulation {
            config:     self.config,
            model:      self.model,
            population: self.population,
            policies:   self.policies,
            source:     self.source.unwrap_or_else(|| Box::new(ScriptedSource::new())),
            agents:     AgentStore::new(),
            locations:  LocationStore::new(),
            #[cfg(feature = "parallel")]
            pool,
        })
    }
}
