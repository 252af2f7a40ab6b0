use std::{fmt, io};

use controller::ControllerErr;
use machine_learning::MlErr;

use crate::{ResourceId, resource::ResourceState, task::TaskId};

/// The orchestrator module's result type.
pub type Result<T> = std::result::Result<T, OrchestratorError>;

/// All errors that can occur in the orchestrator.
#[derive(Debug)]
pub enum OrchestratorError {
    /// Invalid configuration, caught before requesting any resource.
    InvalidConfig(String),
    /// The dataset couldn't be loaded.
    Dataset(MlErr),
    /// The provider couldn't satisfy the request or handed out more than asked for.
    Allocation(String),
    /// A running report broke the readiness barrier.
    BarrierViolation(String),
    /// A task ended with an error.
    TaskFailure { task_id: TaskId, reason: String },
    /// A provider event doesn't fit the resource's lifecycle.
    InvalidTransition {
        resource: ResourceId,
        from: ResourceState,
        to: ResourceState,
    },
    /// The provider rejected an operation on a resource.
    Provider(String),
    /// Every resource was released but the controller never reported a result.
    MissingResult,
    /// The controller's result couldn't be read.
    Report(ControllerErr),
    Json(serde_json::Error),
    /// An underlying I/O error not covered by the above variants.
    Io(io::Error),
}

impl fmt::Display for OrchestratorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidConfig(msg) => write!(f, "invalid config: {msg}"),
            Self::Dataset(e) => write!(f, "dataset error: {e}"),
            Self::Allocation(msg) => write!(f, "allocation failed: {msg}"),
            Self::BarrierViolation(msg) => write!(f, "barrier violation: {msg}"),
            Self::TaskFailure { task_id, reason } => write!(f, "task {task_id} failed: {reason}"),
            Self::InvalidTransition { resource, from, to } => {
                write!(f, "{resource} can't go from {from:?} to {to:?}")
            }
            Self::Provider(msg) => write!(f, "provider error: {msg}"),
            Self::MissingResult => write!(f, "the controller finished without a result"),
            Self::Report(e) => write!(f, "unreadable result: {e}"),
            Self::Json(e) => write!(f, "json error: {e}"),
            Self::Io(e) => write!(f, "io error: {e}"),
        }
    }
}

impl std::error::Error for OrchestratorError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Dataset(e) => Some(e),
            Self::Report(e) => Some(e),
            Self::Json(e) => Some(e),
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for OrchestratorError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<serde_json::Error> for OrchestratorError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json(e)
    }
}

impl From<MlErr> for OrchestratorError {
    fn from(e: MlErr) -> Self {
        Self::Dataset(e)
    }
}

impl From<ControllerErr> for OrchestratorError {
    fn from(e: ControllerErr) -> Self {
        Self::Report(e)
    }
}
