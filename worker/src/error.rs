use std::{error::Error, fmt, io};

use comms::group::GroupErr;
use machine_learning::MlErr;

/// The worker module's result type.
pub type Result<T> = std::result::Result<T, WorkerErr>;

/// Worker runtime failures.
#[derive(Debug)]
pub enum WorkerErr {
    Group(GroupErr),
    Ml(MlErr),
    /// The root disconnected before broadcasting any parameters.
    NoRounds { worker_id: usize },
}

impl fmt::Display for WorkerErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkerErr::Group(e) => write!(f, "group error: {e}"),
            WorkerErr::Ml(e) => write!(f, "local step failed: {e}"),
            WorkerErr::NoRounds { worker_id } => {
                write!(f, "worker {worker_id} was disconnected before any round")
            }
        }
    }
}

impl Error for WorkerErr {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            WorkerErr::Group(e) => Some(e),
            WorkerErr::Ml(e) => Some(e),
            WorkerErr::NoRounds { .. } => None,
        }
    }
}

impl From<GroupErr> for WorkerErr {
    fn from(value: GroupErr) -> Self {
        Self::Group(value)
    }
}

impl From<MlErr> for WorkerErr {
    fn from(value: MlErr) -> Self {
        Self::Ml(value)
    }
}

impl From<io::Error> for WorkerErr {
    fn from(value: io::Error) -> Self {
        Self::Group(GroupErr::Io(value))
    }
}

/// Boundary conversion for binaries / I/O APIs.
impl From<WorkerErr> for io::Error {
    fn from(value: WorkerErr) -> Self {
        match value {
            WorkerErr::Group(e) => e.into(),
            other => io::Error::new(io::ErrorKind::InvalidData, other),
        }
    }
}
