use std::{cmp::Ordering, error::Error, fmt};

use serde::{Deserialize, Serialize};

use crate::Vector;

/// Reduce failures raised while merging contributions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AggregationErr {
    /// There was nothing to merge.
    Empty,
    /// Every contribution was the "no data" sentinel.
    AllSentinel { count: usize },
    /// A contribution's dimension differs from the first one, or from the round's broadcast.
    DimensionMismatch {
        index: usize,
        expected: usize,
        got: usize,
    },
}

impl fmt::Display for AggregationErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "no contributions to merge"),
            Self::AllSentinel { count } => {
                write!(f, "all {count} contributions are sentinels, nothing to average")
            }
            Self::DimensionMismatch {
                index,
                expected,
                got,
            } => write!(
                f,
                "contribution {index} has dimension {got}, expected {expected}"
            ),
        }
    }
}

impl Error for AggregationErr {}

/// The merge function applied by reduce.
///
/// Both variants are pure and independent of the order in which contributions
/// arrive: contributions are summed in a canonical order, so any permutation of
/// the same multiset merges to a bit-identical result.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Aggregator {
    /// Skips sentinel contributions and divides by the amount of real ones.
    #[default]
    Average,
    /// Divides by the total amount of contributions, sentinels included.
    Concat,
}

impl Aggregator {
    /// Merges `contributions` into a single vector.
    ///
    /// # Returns
    /// The merged vector or an `AggregationErr` if there's nothing to merge,
    /// dimensions disagree or, for `Average`, every contribution is a sentinel.
    pub fn merge(&self, contributions: &[Vector]) -> Result<Vector, AggregationErr> {
        let dim = check_dimensions(contributions)?;

        let mut merged: Vec<&Vector> = match self {
            Aggregator::Average => contributions.iter().filter(|v| !v.is_sentinel()).collect(),
            Aggregator::Concat => contributions.iter().collect(),
        };

        if merged.is_empty() {
            return Err(AggregationErr::AllSentinel {
                count: contributions.len(),
            });
        }

        merged.sort_by(|a, b| canonical_order(a, b));

        let mut sum = Vector::zeros(dim);
        let (first, rest) = (merged[0], &merged[1..]);
        sum.copy_from_slice(first);
        for v in rest {
            for (s, x) in sum.iter_mut().zip(v.iter()) {
                *s += x;
            }
        }

        let denominator = merged.len() as f64;
        for s in sum.iter_mut() {
            *s /= denominator;
        }

        Ok(sum)
    }
}

fn check_dimensions(contributions: &[Vector]) -> Result<usize, AggregationErr> {
    let expected = contributions.first().ok_or(AggregationErr::Empty)?.len();

    for (index, v) in contributions.iter().enumerate() {
        if v.len() != expected {
            return Err(AggregationErr::DimensionMismatch {
                index,
                expected,
                got: v.len(),
            });
        }
    }

    Ok(expected)
}

fn canonical_order(a: &Vector, b: &Vector) -> Ordering {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| x.total_cmp(y))
        .find(|ord| ord.is_ne())
        .unwrap_or(Ordering::Equal)
}
