use std::{error::Error, fmt, io};

/// Decoding failures of the vector wire format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// The buffer ended before the announced amount of bytes.
    Truncated { needed: usize, available: usize },
    /// The buffer does not measure exactly `4 + 8n` bytes.
    LengthMismatch { expected: usize, got: usize },
    /// The vector has more elements than the 4-byte count can describe.
    TooLong { len: usize },
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Truncated { needed, available } => {
                write!(f, "truncated vector: needed {needed} bytes, {available} available")
            }
            Self::LengthMismatch { expected, got } => {
                write!(f, "malformed vector: expected {expected} bytes, got {got}")
            }
            Self::TooLong { len } => write!(f, "vector of {len} elements can't be encoded"),
        }
    }
}

impl Error for CodecError {}

impl From<CodecError> for io::Error {
    fn from(value: CodecError) -> Self {
        io::Error::new(io::ErrorKind::InvalidData, value)
    }
}
