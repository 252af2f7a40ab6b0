use std::{fs, path::Path};

use comms::Vector;
use log::debug;

use crate::{
    error::{MlErr, Result},
    shard::shard_range,
};

/// A read-only table of labeled rows.
///
/// Every row holds the features followed by a single label, all rows share the same width.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    rows: Vec<Vector>,
    width: usize,
}

impl Dataset {
    /// Creates a new `Dataset`.
    ///
    /// # Arguments
    /// * `rows` - The labeled rows, each one `features ++ [label]`.
    ///
    /// # Returns
    /// An error if there are no rows, if a row is narrower than two values or if widths differ.
    pub fn new(rows: Vec<Vector>) -> Result<Self> {
        let width = rows.first().ok_or(MlErr::EmptyDataset)?.len();
        if width < 2 {
            return Err(MlErr::RowTooShort { row: 0, width });
        }

        if let Some((row, bad)) = rows.iter().enumerate().find(|(_, r)| r.len() != width) {
            debug!(row = row; "row width differs from the first row");
            return Err(MlErr::SizeMismatch {
                a: "row",
                b: "first row",
                got: bad.len(),
                expected: width,
            });
        }

        Ok(Self { rows, width })
    }

    /// Reads a dataset from a text file.
    ///
    /// Values are separated by commas or whitespace, blank lines and lines starting with `#`
    /// are skipped.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        text.parse()
    }

    /// The amount of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The amount of values in every row, label included.
    pub fn width(&self) -> usize {
        self.width
    }

    /// The amount of features in every row, the parameter dimension.
    pub fn features(&self) -> usize {
        self.width - 1
    }

    pub fn rows(&self) -> &[Vector] {
        &self.rows
    }

    /// Splits the rows into `workers` contiguous blocks, one per worker index.
    ///
    /// The split only depends on the row count and `workers`, the earlier workers take one
    /// extra row when it doesn't divide evenly. Trailing blocks are empty if there are fewer
    /// rows than workers.
    pub fn partition(&self, workers: usize) -> Vec<Vec<Vector>> {
        (0..workers)
            .map(|id| self.rows[shard_range(self.len(), id, workers)].to_vec())
            .collect()
    }
}

impl std::str::FromStr for Dataset {
    type Err = MlErr;

    fn from_str(s: &str) -> Result<Self> {
        let mut rows = Vec::new();

        for (i, line) in s.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let row = line
                .split(|c: char| c == ',' || c.is_whitespace())
                .filter(|tok| !tok.is_empty())
                .map(|tok| {
                    tok.parse::<f64>().map_err(|e| MlErr::Parse {
                        line: i + 1,
                        detail: format!("{tok:?}: {e}"),
                    })
                })
                .collect::<Result<Vec<_>>>()?;

            rows.push(Vector::from(row));
        }

        Self::new(rows)
    }
}
