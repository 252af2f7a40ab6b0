use std::num::NonZeroUsize;

use comms::{
    Vector,
    group::{Aggregator, GroupErr, GroupRoot},
};
use log::{debug, info, warn};
use machine_learning::Dataset;
use tokio::io::{AsyncRead, AsyncWrite};

use crate::{
    error::{ControllerErr, Result},
    report::Report,
};

/// The root of the computation, it owns the dataset and drives every collective round.
#[derive(Debug, Clone)]
pub struct Controller {
    dataset: Dataset,
    aggregator: Aggregator,
    iterations: NonZeroUsize,
}

impl Controller {
    /// Creates a new `Controller`.
    ///
    /// # Arguments
    /// * `dataset` - The rows to partition among the workers.
    /// * `aggregator` - The merge policy of every reduce.
    /// * `iterations` - The amount of broadcast and reduce rounds.
    pub fn new(dataset: Dataset, aggregator: Aggregator, iterations: NonZeroUsize) -> Self {
        Self {
            dataset,
            aggregator,
            iterations,
        }
    }

    /// Runs the whole computation over `root`.
    ///
    /// Scatters one contiguous block of rows per leaf, then for each iteration broadcasts the
    /// current parameters and reduces the contributions into the next ones. The parameters
    /// start at zero. Every leaf is told to disconnect once done, on failure as well.
    ///
    /// # Returns
    /// The report holding the last aggregate.
    ///
    /// # Errors
    /// Collective failures, a round that can't be merged or a non-finite aggregate.
    pub async fn run<R, W>(&self, root: &mut GroupRoot<R, W>) -> Result<Report>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let res = self.rounds(root).await;

        if let Err(e) = root.disconnect().await {
            warn!("couldn't disconnect every worker: {e}");
            if res.is_ok() {
                return Err(e.into());
            }
        }

        res
    }

    async fn rounds<R, W>(&self, root: &mut GroupRoot<R, W>) -> Result<Report>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let workers = root.size();
        if workers == 0 {
            return Err(ControllerErr::EmptyGroup);
        }

        root.scatter(self.dataset.partition(workers)).await?;

        let mut theta = Vector::zeros(self.dataset.features());
        for iteration in 0..self.iterations.get() {
            debug!(iteration = iteration; "broadcasting parameters");
            root.broadcast(&theta).await?;

            theta = match root.reduce(self.aggregator).await {
                Ok(aggregate) => aggregate,
                Err(GroupErr::Aggregation(source)) => {
                    return Err(ControllerErr::Aggregation { iteration, source });
                }
                Err(e) => return Err(e.into()),
            };

            if let Some(index) = theta.first_non_finite() {
                return Err(ControllerErr::NumericallyInvalid { iteration, index });
            }
        }

        info!(workers = workers, iterations = self.iterations.get(); "computation finished");
        Ok(Report::new(theta))
    }
}
