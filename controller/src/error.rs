use std::{error::Error, fmt, io};

use comms::group::{AggregationErr, GroupErr};

/// The controller module's result type.
pub type Result<T> = std::result::Result<T, ControllerErr>;

/// Controller runtime failures.
#[derive(Debug)]
pub enum ControllerErr {
    /// The group has no leaves to train with.
    EmptyGroup,
    Group(GroupErr),
    /// The contributions of a round couldn't be merged.
    Aggregation {
        iteration: usize,
        source: AggregationErr,
    },
    /// The merged parameters hold a `NaN` or an infinity.
    NumericallyInvalid { iteration: usize, index: usize },
    /// A textual report couldn't be read back.
    MalformedReport { line: usize, detail: String },
}

impl fmt::Display for ControllerErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControllerErr::EmptyGroup => write!(f, "the group has no workers"),
            ControllerErr::Group(e) => write!(f, "group error: {e}"),
            ControllerErr::Aggregation { iteration, source } => {
                write!(f, "aggregation failed at iteration {iteration}: {source}")
            }
            ControllerErr::NumericallyInvalid { iteration, index } => write!(
                f,
                "aggregate is not finite at iteration {iteration}, element {index}"
            ),
            ControllerErr::MalformedReport { line, detail } => {
                write!(f, "malformed report at line {line}: {detail}")
            }
        }
    }
}

impl Error for ControllerErr {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ControllerErr::Group(e) => Some(e),
            ControllerErr::Aggregation { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<GroupErr> for ControllerErr {
    fn from(value: GroupErr) -> Self {
        Self::Group(value)
    }
}

impl From<io::Error> for ControllerErr {
    fn from(value: io::Error) -> Self {
        Self::Group(GroupErr::Io(value))
    }
}

/// Boundary conversion for binaries / I/O APIs.
impl From<ControllerErr> for io::Error {
    fn from(value: ControllerErr) -> Self {
        match value {
            ControllerErr::Group(e) => e.into(),
            other => io::Error::new(io::ErrorKind::InvalidData, other),
        }
    }
}
