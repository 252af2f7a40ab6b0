use std::{borrow::Cow, io};

use crate::{CodecError, Deserialize, Serialize, Vector, VectorCodec};

type Header = u32;
const HEADER_SIZE: usize = size_of::<Header>();

type RowCount = u32;
const ROW_COUNT_SIZE: usize = size_of::<RowCount>();

/// The payload data for the `Data` variant of the `Msg` enum.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// The rows a leaf is responsible for, sent once by scatter.
    Partition(Vec<Vector>),
    /// The parameter state of the current round, sent by broadcast.
    Parameters(Vector),
    /// A leaf's reduce contribution.
    Contribution(Vector),
}

/// The command for the `Control` variant of the `Msg` enum.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Command {
    Disconnect,
}

/// The application layer message for the entire system.
#[derive(Debug, PartialEq)]
pub enum Msg<'a> {
    Control(Command),
    Data(Payload),
    Err(Cow<'a, str>),
}

impl Msg<'_> {
    /// A short name of this message's kind, for logs and errors.
    pub fn kind(&self) -> &'static str {
        match self {
            Msg::Control(Command::Disconnect) => "control/disconnect",
            Msg::Data(Payload::Partition(_)) => "data/partition",
            Msg::Data(Payload::Parameters(_)) => "data/parameters",
            Msg::Data(Payload::Contribution(_)) => "data/contribution",
            Msg::Err(_) => "err",
        }
    }

    fn buf_is_too_small<T>(size: usize) -> io::Result<T> {
        Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("The given buffer is too small {size}, must at least be {HEADER_SIZE} bytes"),
        ))
    }

    fn invalid_kind_byte<T>(kind: Header) -> io::Result<T> {
        Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("Received an invalid kind {kind}"),
        ))
    }
}

impl<'a> Serialize<'a> for Msg<'a> {
    fn serialize(&'a self, buf: &mut Vec<u8>) -> io::Result<Option<&'a [u8]>> {
        let codec = VectorCodec;

        match self {
            Msg::Err(e) => {
                buf.extend_from_slice(&(0 as Header).to_be_bytes());
                Ok(Some(e.as_bytes()))
            }
            Msg::Control(cmd) => {
                buf.extend_from_slice(&(1 as Header).to_be_bytes());
                serde_json::to_writer(buf, cmd)?;
                Ok(None)
            }
            Msg::Data(Payload::Partition(rows)) => {
                buf.extend_from_slice(&(2 as Header).to_be_bytes());

                let count = RowCount::try_from(rows.len())
                    .map_err(|_| CodecError::TooLong { len: rows.len() })?;
                buf.extend_from_slice(&count.to_be_bytes());

                for row in rows {
                    codec.encode(row, buf)?;
                }
                Ok(None)
            }
            Msg::Data(Payload::Parameters(vector)) => {
                buf.extend_from_slice(&(3 as Header).to_be_bytes());
                codec.encode(vector, buf)?;
                Ok(None)
            }
            Msg::Data(Payload::Contribution(vector)) => {
                buf.extend_from_slice(&(4 as Header).to_be_bytes());
                codec.encode(vector, buf)?;
                Ok(None)
            }
        }
    }
}

impl<'a> Deserialize<'a> for Msg<'a> {
    fn deserialize(buf: &'a [u8]) -> io::Result<Self> {
        let Some((kind_buf, rest)) = buf.split_first_chunk::<HEADER_SIZE>() else {
            return Self::buf_is_too_small(buf.len());
        };

        let codec = VectorCodec;

        match Header::from_be_bytes(*kind_buf) {
            0 => {
                let string = std::str::from_utf8(rest)
                    .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))?;

                Ok(Self::Err(Cow::Borrowed(string)))
            }
            1 => {
                let cmd = serde_json::from_slice(rest)?;
                Ok(Self::Control(cmd))
            }
            2 => {
                let Some((count, mut rows_buf)) = rest.split_first_chunk::<ROW_COUNT_SIZE>()
                else {
                    return Err(CodecError::Truncated {
                        needed: ROW_COUNT_SIZE,
                        available: rest.len(),
                    }
                    .into());
                };

                let count = RowCount::from_be_bytes(*count) as usize;
                let mut rows = Vec::with_capacity(count.min(rows_buf.len()));
                for _ in 0..count {
                    rows.push(codec.decode_from(&mut rows_buf)?);
                }

                if !rows_buf.is_empty() {
                    return Err(CodecError::LengthMismatch {
                        expected: rest.len() - rows_buf.len(),
                        got: rest.len(),
                    }
                    .into());
                }

                Ok(Self::Data(Payload::Partition(rows)))
            }
            3 => Ok(Self::Data(Payload::Parameters(codec.decode(rest)?))),
            4 => Ok(Self::Data(Payload::Contribution(codec.decode(rest)?))),
            kind => Self::invalid_kind_byte(kind),
        }
    }
}
