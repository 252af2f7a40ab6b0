use comms::Vector;
use log::trace;

use crate::error::{MlErr, Result};

/// Plain linear regression trained with per-row stochastic gradient descent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearSgd {
    learning_rate: f64,
}

impl LinearSgd {
    pub fn new(learning_rate: f64) -> Self {
        Self { learning_rate }
    }

    pub fn learning_rate(&self) -> f64 {
        self.learning_rate
    }

    /// Runs one pass over `partition` starting from `theta` and returns the evolved parameters.
    ///
    /// For each row `features ++ [label]` the prediction `dot(theta, features)` is computed
    /// once, then every coordinate moves by `-lr * (prediction - label) * features[i]`.
    ///
    /// # Arguments
    /// * `partition` - The rows to train on, each one element wider than `theta`.
    /// * `theta` - The incoming parameters.
    ///
    /// # Returns
    /// The all-zero vector of `theta`'s dimension if `partition` is empty, or an error if a
    /// row's width doesn't match.
    pub fn step(&self, partition: &[Vector], mut theta: Vector) -> Result<Vector> {
        if partition.is_empty() {
            trace!("empty partition, contributing the zero vector");
            return Ok(Vector::zeros(theta.len()));
        }

        let dim = theta.len();
        for row in partition {
            if row.len() != dim + 1 {
                return Err(MlErr::SizeMismatch {
                    a: "row",
                    b: "parameters",
                    got: row.len(),
                    expected: dim + 1,
                });
            }

            let (x, y) = row.split_at(dim);
            let prediction: f64 = theta.iter().zip(x).map(|(t, xi)| t * xi).sum();
            let delta = self.learning_rate * (prediction - y[0]);

            for (t, xi) in theta.iter_mut().zip(x) {
                *t -= delta * xi;
            }
        }

        Ok(theta)
    }
}

impl Default for LinearSgd {
    fn default() -> Self {
        Self::new(0.001)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v(xs: &[f64]) -> Vector {
        Vector::from(xs.to_vec())
    }

    #[test]
    fn empty_partition_yields_zero_vector() {
        let sgd = LinearSgd::default();
        let out = sgd.step(&[], v(&[1.0, 2.0, 3.0])).unwrap();
        assert_eq!(out, Vector::zeros(3));
    }

    #[test]
    fn single_row_update() {
        // theta = 0, x = [1, 2], y = 3 => prediction 0, delta = 0.1 * -3
        let sgd = LinearSgd::new(0.1);
        let out = sgd.step(&[v(&[1.0, 2.0, 3.0])], Vector::zeros(2)).unwrap();
        assert!((out[0] - 0.3).abs() < 1e-12);
        assert!((out[1] - 0.6).abs() < 1e-12);
    }

    #[test]
    fn prediction_is_computed_once_per_row() {
        // If theta[0] were updated before computing the prediction for theta[1] the second
        // coordinate would differ.
        let sgd = LinearSgd::new(0.5);
        let out = sgd.step(&[v(&[1.0, 1.0, 1.0])], v(&[0.0, 0.0])).unwrap();
        assert_eq!(*out, [0.5, 0.5]);
    }

    #[test]
    fn rows_are_applied_in_order() {
        let sgd = LinearSgd::new(0.1);
        let rows = [v(&[1.0, 1.0]), v(&[2.0, 0.0])];

        // row 1: pred 0, delta -0.1 => theta 0.1
        // row 2: pred 0.2, delta 0.02 => theta 0.1 - 0.04 = 0.06
        let out = sgd.step(&rows, Vector::zeros(1)).unwrap();
        assert!((out[0] - 0.06).abs() < 1e-12);
    }

    #[test]
    fn step_starts_from_the_given_parameters() {
        let sgd = LinearSgd::new(0.1);
        let rows = [v(&[1.0, 1.0])];

        let a = sgd.step(&rows, Vector::zeros(1)).unwrap();
        let b = sgd.step(&rows, Vector::zeros(1)).unwrap();
        assert_eq!(a, b);

        let c = sgd.step(&rows, v(&[1.0])).unwrap();
        assert_eq!(*c, [1.0]);
    }

    #[test]
    fn rejects_rows_of_the_wrong_width() {
        let sgd = LinearSgd::default();
        let err = sgd.step(&[v(&[1.0, 2.0])], Vector::zeros(2)).unwrap_err();
        assert!(matches!(
            err,
            MlErr::SizeMismatch {
                got: 2,
                expected: 3,
                ..
            }
        ));
    }
}
