use std::{fmt, str::FromStr};

use comms::Vector;

use crate::error::ControllerErr;

/// The externally reported outcome of a run, the final parameters.
///
/// Renders as one `Theta <i>: <value>` line per element. Values use the shortest
/// representation that reads back to the same `f64`.
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    theta: Vector,
}

impl Report {
    pub fn new(theta: Vector) -> Self {
        Self { theta }
    }

    pub fn theta(&self) -> &Vector {
        &self.theta
    }

    pub fn into_theta(self) -> Vector {
        self.theta
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, value) in self.theta.iter().enumerate() {
            writeln!(f, "Theta {i}: {value}")?;
        }

        Ok(())
    }
}

impl FromStr for Report {
    type Err = ControllerErr;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = |line: usize, detail: String| ControllerErr::MalformedReport {
            line: line + 1,
            detail,
        };

        let theta = s
            .lines()
            .filter(|line| !line.trim().is_empty())
            .enumerate()
            .map(|(i, line)| {
                let (label, value) = line
                    .split_once(':')
                    .ok_or_else(|| malformed(i, format!("missing ':' in {line:?}")))?;

                let index: usize = label
                    .trim()
                    .strip_prefix("Theta ")
                    .ok_or_else(|| malformed(i, format!("expected 'Theta <i>', got {label:?}")))?
                    .parse()
                    .map_err(|e| malformed(i, format!("bad index: {e}")))?;

                if index != i {
                    return Err(malformed(i, format!("expected index {i}, got {index}")));
                }

                value
                    .trim()
                    .parse::<f64>()
                    .map_err(|e| malformed(i, format!("bad value: {e}")))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self::new(Vector::from(theta)))
    }
}
