//! Scenario builder API.
//!
//! Provides a declarative API for constructing scenario tests that enforce
//! the Oracle Pattern.

use moonwatch_client::ClientConfig;

use crate::scenario::{OracleFn, Step, World};

/// Scenario builder.
///
/// Construct a scenario by adding steps. Must call `.oracle()` to get a
/// [`RunnableScenario`] that can be executed.
pub struct Scenario {
    name: String,
    config: ClientConfig,
    steps: Vec<Step>,
}

impl Scenario {
    /// Create a new scenario with the given name and default configuration.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), config: ClientConfig::default(), steps: Vec::new() }
    }

    /// Use a custom client configuration.
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    /// Append a step.
    pub fn step(mut self, step: Step) -> Self {
        self.steps.push(step);
        self
    }

    /// Append several steps.
    pub fn steps(mut self, steps: impl IntoIterator<Item = Step>) -> Self {
        self.steps.extend(steps);
        self
    }

    /// Set the oracle function and return a runnable scenario.
    ///
    /// The oracle is mandatory - you cannot run a scenario without
    /// verification.
    pub fn oracle(self, oracle: OracleFn) -> RunnableScenario {
        RunnableScenario { scenario: self, oracle }
    }
}

/// A scenario with an oracle function that can be executed.
pub struct RunnableScenario {
    scenario: Scenario,
    oracle: OracleFn,
}

impl RunnableScenario {
    /// Execute every step in order, then run the oracle.
    ///
    /// # Errors
    ///
    /// Returns the first step that could not be applied, or the oracle's
    /// complaint.
    pub fn run(self) -> Result<(), String> {
        let Scenario { name, config, steps } = self.scenario;
        let mut world = World::new(config).map_err(|err| format!("Scenario '{name}': {err}"))?;

        for (index, step) in steps.iter().enumerate() {
            world
                .apply(step)
                .map_err(|err| format!("Scenario '{name}': step {index} ({step:?}) failed: {err}"))?;
        }

        (self.oracle)(&world).map_err(|err| format!("Scenario '{name}': {err}"))
    }
}
