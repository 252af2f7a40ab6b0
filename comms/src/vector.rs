use std::ops::{Deref, DerefMut};

use crate::CodecError;

type Count = u32;
const COUNT_SIZE: usize = size_of::<Count>();
const ELEM_SIZE: usize = size_of::<f64>();

/// A dense, fixed-length vector of `f64` values.
///
/// Used for data rows, the parameter state and reduce contributions alike.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Vector(Vec<f64>);

impl Vector {
    /// Creates the all-zero vector of `dim` elements.
    pub fn zeros(dim: usize) -> Self {
        Self(vec![0.0; dim])
    }

    /// Whether this vector is the all-zero "no data" sentinel.
    ///
    /// `-0.0` counts as zero, `NaN` never does.
    pub fn is_sentinel(&self) -> bool {
        self.0.iter().all(|&x| x == 0.0)
    }

    /// Returns the index of the first non-finite element, if any.
    pub fn first_non_finite(&self) -> Option<usize> {
        self.0.iter().position(|x| !x.is_finite())
    }
}

impl From<Vec<f64>> for Vector {
    fn from(value: Vec<f64>) -> Self {
        Self(value)
    }
}

impl Deref for Vector {
    type Target = [f64];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl DerefMut for Vector {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

/// Encoder and decoder for the vector wire format.
///
/// A vector of `n` elements is laid out as a 4-byte big-endian count followed by
/// `n` 8-byte big-endian IEEE-754 doubles, `4 + 8n` bytes in total.
#[derive(Debug, Clone, Copy, Default)]
pub struct VectorCodec;

impl VectorCodec {
    /// The exact encoded size of a vector of `dim` elements.
    pub const fn encoded_len(dim: usize) -> usize {
        COUNT_SIZE + dim * ELEM_SIZE
    }

    /// Appends the encoding of `vector` to `buf`.
    ///
    /// # Returns
    /// A `CodecError::TooLong` if the element count doesn't fit the header.
    pub fn encode(&self, vector: &[f64], buf: &mut Vec<u8>) -> Result<(), CodecError> {
        let count = Count::try_from(vector.len())
            .map_err(|_| CodecError::TooLong { len: vector.len() })?;

        buf.reserve(Self::encoded_len(vector.len()));
        buf.extend_from_slice(&count.to_be_bytes());
        for x in vector {
            buf.extend_from_slice(&x.to_be_bytes());
        }

        Ok(())
    }

    /// Decodes a buffer holding exactly one encoded vector.
    ///
    /// # Returns
    /// The vector or a `CodecError` if the buffer is truncated or has trailing bytes.
    pub fn decode(&self, buf: &[u8]) -> Result<Vector, CodecError> {
        let mut rest = buf;
        let vector = self.decode_from(&mut rest)?;

        if !rest.is_empty() {
            return Err(CodecError::LengthMismatch {
                expected: Self::encoded_len(vector.len()),
                got: buf.len(),
            });
        }

        Ok(vector)
    }

    /// Decodes one vector from the front of `buf`, advancing it past the consumed bytes.
    pub fn decode_from(&self, buf: &mut &[u8]) -> Result<Vector, CodecError> {
        let count = take::<COUNT_SIZE>(buf)?;
        let dim = Count::from_be_bytes(count) as usize;

        let needed = dim * ELEM_SIZE;
        if buf.len() < needed {
            return Err(CodecError::Truncated {
                needed,
                available: buf.len(),
            });
        }

        let mut values = Vec::with_capacity(dim);
        for _ in 0..dim {
            values.push(f64::from_be_bytes(take::<ELEM_SIZE>(buf)?));
        }

        Ok(Vector(values))
    }
}

/// Splits off the first `N` bytes of `buf`.
fn take<'a, const N: usize>(buf: &mut &'a [u8]) -> Result<[u8; N], CodecError> {
    let slice: &'a [u8] = *buf;
    let Some((head, rest)) = slice.split_first_chunk::<N>() else {
        return Err(CodecError::Truncated {
            needed: N,
            available: buf.len(),
        });
    };

    *buf = rest;
    Ok(*head)
}
