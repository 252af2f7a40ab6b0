use tokio::io::{AsyncRead, AsyncWrite};

use super::{GroupErr, Result};
use crate::{
    OnoReceiver, OnoSender, Vector,
    msg::{Command, Msg, Payload},
};

/// A leaf's end of its link to the group root.
pub struct GroupLeaf<R, W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    id: usize,
    rx: OnoReceiver<R>,
    tx: OnoSender<W>,
    buf: Vec<u8>,
}

impl<R, W> GroupLeaf<R, W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    /// Creates a new `GroupLeaf`.
    ///
    /// # Arguments
    /// * `id` - This leaf's position in the group.
    /// * `rx` - Receiving end of the link to the root.
    /// * `tx` - Sending end of the link to the root.
    pub fn new(id: usize, rx: OnoReceiver<R>, tx: OnoSender<W>) -> Self {
        Self {
            id,
            rx,
            tx,
            buf: Vec::new(),
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    /// Waits for this leaf's scattered partition.
    pub async fn receive_partition(&mut self) -> Result<Vec<Vector>> {
        let leaf = self.id;
        match self.rx.recv_into(&mut self.buf).await? {
            Msg::Data(Payload::Partition(rows)) => Ok(rows),
            other => Err(unexpected(leaf, other)),
        }
    }

    /// Waits for the next broadcast value.
    ///
    /// # Returns
    /// The parameters of the next round, or `None` once the root disconnects.
    pub async fn receive_broadcast(&mut self) -> Result<Option<Vector>> {
        let leaf = self.id;
        match self.rx.recv_into(&mut self.buf).await? {
            Msg::Data(Payload::Parameters(params)) => Ok(Some(params)),
            Msg::Control(Command::Disconnect) => Ok(None),
            other => Err(unexpected(leaf, other)),
        }
    }

    /// Sends this leaf's single contribution for the current round.
    pub async fn send_contribution(&mut self, contribution: &Vector) -> Result<()> {
        let msg = Msg::Data(Payload::Contribution(contribution.clone()));
        self.tx.send(&msg).await?;
        Ok(())
    }

    /// Reports a local failure to the root in place of a contribution.
    pub async fn report_error(&mut self, detail: &str) -> Result<()> {
        let msg = Msg::Err(detail.into());
        self.tx.send(&msg).await?;
        Ok(())
    }
}

fn unexpected(leaf: usize, msg: Msg<'_>) -> GroupErr {
    match msg {
        Msg::Err(detail) => GroupErr::Remote {
            leaf,
            detail: detail.into_owned(),
        },
        other => GroupErr::UnexpectedMessage {
            leaf,
            got: other.kind(),
        },
    }
}
