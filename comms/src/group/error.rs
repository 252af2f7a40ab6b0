use std::{error::Error, fmt, io};

use super::{AggregationErr, BarrierErr};

/// The group communication module's result type.
pub type Result<T> = std::result::Result<T, GroupErr>;

/// Collective operation failures.
#[derive(Debug)]
pub enum GroupErr {
    Io(io::Error),
    /// A peer sent a message the protocol doesn't allow at this point.
    UnexpectedMessage { leaf: usize, got: &'static str },
    /// A leaf reported a local failure instead of its contribution.
    Remote { leaf: usize, detail: String },
    /// Scatter was given a partition count that differs from the group size.
    PartitionCount { expected: usize, got: usize },
    Aggregation(AggregationErr),
    Barrier(BarrierErr),
}

impl fmt::Display for GroupErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupErr::Io(e) => write!(f, "io error: {e}"),
            GroupErr::UnexpectedMessage { leaf, got } => {
                write!(f, "unexpected message on link {leaf}: got {got}")
            }
            GroupErr::Remote { leaf, detail } => write!(f, "leaf {leaf} failed: {detail}"),
            GroupErr::PartitionCount { expected, got } => {
                write!(f, "expected {expected} partitions, got {got}")
            }
            GroupErr::Aggregation(e) => write!(f, "aggregation failed: {e}"),
            GroupErr::Barrier(e) => write!(f, "barrier violated: {e}"),
        }
    }
}

impl Error for GroupErr {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            GroupErr::Io(e) => Some(e),
            GroupErr::Aggregation(e) => Some(e),
            GroupErr::Barrier(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for GroupErr {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<AggregationErr> for GroupErr {
    fn from(value: AggregationErr) -> Self {
        Self::Aggregation(value)
    }
}

impl From<BarrierErr> for GroupErr {
    fn from(value: BarrierErr) -> Self {
        Self::Barrier(value)
    }
}

/// Boundary conversion for binaries / I/O APIs.
impl From<GroupErr> for io::Error {
    fn from(value: GroupErr) -> Self {
        match value {
            GroupErr::Io(e) => e,
            other => io::Error::new(io::ErrorKind::InvalidData, other),
        }
    }
}
