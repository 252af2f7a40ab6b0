pub mod config;
mod coordinator;
pub mod error;
pub mod event;
mod local;
pub mod provider;
pub mod resource;
pub mod task;

use std::fmt;

use controller::{Controller, Report};
use machine_learning::LinearSgd;

pub use config::{DatasetConfig, ResourceConfig, RunConfig};
pub use coordinator::Coordinator;
pub use error::{OrchestratorError, Result};
pub use event::ProviderEvent;
pub use local::LocalProvider;
pub use provider::{ResourceProvider, ResourceRequest};
pub use resource::{ResourceHandle, ResourceId, ResourceState, Role};
pub use task::{Task, TaskId, TaskSet};

/// The outcome of a successful run, the controller's result payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutcome {
    payload: Vec<u8>,
}

impl RunOutcome {
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Reads the final parameters back from the payload.
    ///
    /// # Errors
    /// `OrchestratorError::Report` if the payload isn't a well formed report.
    pub fn report(&self) -> Result<Report> {
        let text = std::str::from_utf8(&self.payload).map_err(|e| {
            OrchestratorError::Report(controller::ControllerErr::MalformedReport {
                line: 0,
                detail: e.to_string(),
            })
        })?;

        Ok(text.parse::<Report>()?)
    }
}

impl fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&String::from_utf8_lossy(&self.payload))
    }
}

/// Runs the whole computation described by `config` on in-process resources.
///
/// # Errors
/// Returns an `OrchestratorError` if the config is invalid, the dataset can't be loaded,
/// resources can't be allocated or any task fails.
pub async fn run(config: RunConfig) -> Result<RunOutcome> {
    config.validate()?;

    let dataset = config.dataset.load()?;
    log::info!(
        rows = dataset.len(),
        features = dataset.features(),
        workers = config.workers;
        "dataset loaded"
    );

    let controller = Controller::new(dataset, config.aggregator, config.iterations()?);
    let sgd = LinearSgd::new(config.learning_rate);
    let tasks = TaskSet::local(config.workers, sgd, controller, config.link_capacity);

    let (provider, events) = LocalProvider::new(config.workers + 1);
    let coordinator = Coordinator::new(
        provider,
        tasks,
        config.resources.memory_mb,
        config.resources.cores,
    );

    let payload = coordinator.run(events).await?;
    Ok(RunOutcome { payload })
}
