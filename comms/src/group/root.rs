use futures::stream::{FuturesUnordered, StreamExt};
use log::{debug, info};
use tokio::io::{AsyncRead, AsyncWrite};

use super::{AggregationErr, Aggregator, ArrivalBarrier, GroupErr, Result};
use crate::{
    OnoReceiver, OnoSender, Vector,
    msg::{Command, Msg, Payload},
};

/// The root end of the group, one link per leaf in worker assignment order.
pub struct GroupRoot<R, W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    links: Vec<(OnoReceiver<R>, OnoSender<W>)>,
    round_dim: Option<usize>,
}

impl<R, W> GroupRoot<R, W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    /// Creates a new `GroupRoot`.
    ///
    /// # Arguments
    /// * `links` - The channel to every leaf, the i-th link reaches leaf i.
    pub fn new(links: Vec<(OnoReceiver<R>, OnoSender<W>)>) -> Self {
        Self {
            links,
            round_dim: None,
        }
    }

    /// The amount of leaves in the group.
    pub fn size(&self) -> usize {
        self.links.len()
    }

    /// Sends partition i to leaf i, exactly once each.
    ///
    /// Returns once every partition has been flushed onto its link, any later
    /// message on the same link is observed after it.
    ///
    /// # Errors
    /// `GroupErr::PartitionCount` if there isn't exactly one partition per leaf.
    pub async fn scatter(&mut self, partitions: Vec<Vec<Vector>>) -> Result<()> {
        if partitions.len() != self.links.len() {
            return Err(GroupErr::PartitionCount {
                expected: self.links.len(),
                got: partitions.len(),
            });
        }

        for (leaf, ((_, tx), rows)) in self.links.iter_mut().zip(partitions).enumerate() {
            debug!(leaf = leaf, rows = rows.len(); "scattering partition");
            let msg = Msg::Data(Payload::Partition(rows));
            tx.send(&msg).await?;
        }

        info!(leaves = self.links.len(); "scatter complete");
        Ok(())
    }

    /// Sends an identical copy of `value` to every leaf.
    ///
    /// Its dimension becomes the one every contribution of the next reduce must have.
    pub async fn broadcast(&mut self, value: &Vector) -> Result<()> {
        self.round_dim = Some(value.len());
        let msg = Msg::Data(Payload::Parameters(value.clone()));
        for (_, tx) in self.links.iter_mut() {
            tx.send(&msg).await?;
        }

        debug!(leaves = self.links.len(), dim = value.len(); "broadcast complete");
        Ok(())
    }

    /// Collects exactly one contribution per leaf and merges them with `aggregator`.
    ///
    /// Contributions are taken in whatever order they arrive, the merge doesn't
    /// depend on it. A failed receive leaves the group unusable.
    ///
    /// # Errors
    /// Transport errors, a leaf reporting a failure or sending something else than
    /// a contribution, and merge failures (`GroupErr::Aggregation`), after which
    /// every link is still in sync. A contribution whose dimension differs from the
    /// last broadcast is a `AggregationErr::DimensionMismatch` indexed by leaf.
    pub async fn reduce(&mut self, aggregator: Aggregator) -> Result<Vector> {
        let mut barrier = ArrivalBarrier::new(self.links.len());
        let mut contributions = Vec::with_capacity(self.links.len());
        let round_dim = self.round_dim;
        let mut mismatch = None;

        let mut pending: FuturesUnordered<_> = self
            .links
            .iter_mut()
            .enumerate()
            .map(|(leaf, (rx, _))| recv_contribution(leaf, rx))
            .collect();

        while let Some(arrival) = pending.next().await {
            let (leaf, contribution) = arrival?;
            debug!(leaf = leaf, sentinel = contribution.is_sentinel(); "contribution received");

            if let Some(expected) = round_dim {
                if contribution.len() != expected && mismatch.is_none() {
                    mismatch = Some(AggregationErr::DimensionMismatch {
                        index: leaf,
                        expected,
                        got: contribution.len(),
                    });
                }
            }

            contributions.push(contribution);
            if barrier.record_arrival(leaf)? {
                break;
            }
        }

        drop(pending);
        if let Some(e) = mismatch {
            return Err(e.into());
        }

        Ok(aggregator.merge(&contributions)?)
    }

    /// Tells every leaf there are no more rounds.
    ///
    /// A broken link doesn't keep the rest from being notified, the first failure is returned
    /// after trying them all.
    pub async fn disconnect(&mut self) -> Result<()> {
        let msg = Msg::Control(Command::Disconnect);
        let mut first_err = None;

        for (leaf, (_, tx)) in self.links.iter_mut().enumerate() {
            if let Err(e) = tx.send(&msg).await {
                debug!(leaf = leaf; "couldn't send disconnect: {e}");
                first_err.get_or_insert(e);
            }
        }

        match first_err {
            Some(e) => Err(e.into()),
            None => Ok(()),
        }
    }
}

async fn recv_contribution<R>(leaf: usize, rx: &mut OnoReceiver<R>) -> Result<(usize, Vector)>
where
    R: AsyncRead + Unpin,
{
    let mut buf = Vec::new();
    match rx.recv_into(&mut buf).await? {
        Msg::Data(Payload::Contribution(contribution)) => Ok((leaf, contribution)),
        Msg::Err(detail) => Err(GroupErr::Remote {
            leaf,
            detail: detail.into_owned(),
        }),
        other => Err(GroupErr::UnexpectedMessage {
            leaf,
            got: other.kind(),
        }),
    }
}
