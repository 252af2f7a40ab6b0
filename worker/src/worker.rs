use comms::{
    Vector,
    group::{GroupErr, GroupLeaf},
};
use log::{debug, info, warn};
use machine_learning::LinearSgd;
use tokio::io::{AsyncRead, AsyncWrite};

use crate::error::{Result, WorkerErr};

/// A single data-parallel worker.
///
/// Holds no parameter state between rounds, every round starts from the broadcast value.
#[derive(Debug, Clone, Copy)]
pub struct Worker {
    worker_id: usize,
    sgd: LinearSgd,
}

impl Worker {
    /// Creates a new `Worker`.
    ///
    /// # Args
    /// * `worker_id` - The worker's position in the group, used for observability.
    /// * `sgd` - The local update step.
    pub fn new(worker_id: usize, sgd: LinearSgd) -> Self {
        Self { worker_id, sgd }
    }

    /// Runs the worker side of the group protocol until the root disconnects.
    ///
    /// Receives the partition once, then answers every broadcast with exactly one
    /// contribution. A local failure is reported upstream before returning.
    ///
    /// # Args
    /// * `leaf` - This worker's end of the group.
    ///
    /// # Returns
    /// The contribution sent in the last round.
    ///
    /// # Errors
    /// Returns `WorkerErr` on I/O failures, protocol violations or if the root disconnects
    /// before the first round.
    pub async fn run<R, W>(&self, leaf: &mut GroupLeaf<R, W>) -> Result<Vector>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let res = self.rounds(leaf).await;

        if let Err(e) = &res {
            // A broken link can't carry the report.
            if !matches!(e, WorkerErr::Group(GroupErr::Io(_))) {
                warn!(worker_id = self.worker_id; "reporting failure upstream: {e}");
                if let Err(report_err) = leaf.report_error(&e.to_string()).await {
                    warn!(worker_id = self.worker_id; "couldn't report failure: {report_err}");
                }
            }
        }

        res
    }

    async fn rounds<R, W>(&self, leaf: &mut GroupLeaf<R, W>) -> Result<Vector>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let worker_id = self.worker_id;

        let partition = leaf.receive_partition().await?;
        debug!(
            worker_id = worker_id,
            rows = partition.len(),
            lr = self.sgd.learning_rate();
            "received partition"
        );

        let mut round = 0;
        let mut last = None;

        while let Some(theta) = leaf.receive_broadcast().await? {
            debug!(worker_id = worker_id, round = round; "received parameters");

            let contribution = self.sgd.step(&partition, theta)?;
            if let Some(index) = contribution.first_non_finite() {
                warn!(worker_id = worker_id, round = round, index = index; "contribution is not finite");
            }

            leaf.send_contribution(&contribution).await?;
            last = Some(contribution);
            round += 1;
        }

        info!(worker_id = worker_id, rounds = round; "worker finished");
        last.ok_or(WorkerErr::NoRounds { worker_id })
    }
}
