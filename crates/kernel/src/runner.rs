use std::sync::Arc;

use thiserror::Error;

use crate::admin::AdminError;
use crate::step::{Session, Step};

/// Outcome of a run in which every step succeeded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub completed: Vec<&'static str>,
}

/// A step failed; the steps after it were not attempted.
#[derive(Error, Debug)]
#[error("initialization step '{step}' failed")]
pub struct StepFailure {
    pub step: &'static str,
    pub completed: Vec<&'static str>,
    #[source]
    pub source: AdminError,
}

/// Runs registered steps strictly in registration order.
pub struct StepRunner {
    steps: Vec<Arc<dyn Step>>,
}

impl StepRunner {
    pub fn new() -> Self {
        Self { steps: Vec::new() }
    }

    pub fn register(&mut self, step: Arc<dyn Step>) {
        self.steps.push(step);
    }

    pub fn step_names(&self) -> Vec<&'static str> {
        self.steps.iter().map(|step| step.name()).collect()
    }

    /// Run every step once. The first failure aborts the run.
    pub async fn run(&self, session: &mut Session<'_>) -> Result<RunReport, StepFailure> {
        tracing::info!(steps = ?self.step_names(), "running initialization steps");

        let mut completed = Vec::with_capacity(self.steps.len());

        for step in &self.steps {
            tracing::info!(step = step.name(), "starting step");

            if let Err(source) = step.run(session).await {
                tracing::error!(step = step.name(), error = %source, "step failed");
                return Err(StepFailure {
                    step: step.name(),
                    completed,
                    source,
                });
            }

            tracing::debug!(step = step.name(), "step complete");
            completed.push(step.name());
        }

        Ok(RunReport { completed })
    }
}

impl Default for StepRunner {
    fn default() -> Self {
        Self::new()
    }
}
