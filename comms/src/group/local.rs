use tokio::io::{self, DuplexStream, ReadHalf, WriteHalf};

use super::{GroupLeaf, GroupRoot};

pub type LocalRoot = GroupRoot<ReadHalf<DuplexStream>, WriteHalf<DuplexStream>>;
pub type LocalLeaf = GroupLeaf<ReadHalf<DuplexStream>, WriteHalf<DuplexStream>>;

/// Wires an in-memory group of `size` leaves.
///
/// # Arguments
/// * `size` - The amount of leaves.
/// * `capacity` - The buffer size in bytes of every link direction.
///
/// # Returns
/// The root end and the leaf ends, the i-th leaf being reachable through the root's i-th link.
pub fn local_group(size: usize, capacity: usize) -> (LocalRoot, Vec<LocalLeaf>) {
    let (links, leaves) = (0..size)
        .map(|id| {
            let (root_end, leaf_end) = io::duplex(capacity);

            let (rx, tx) = io::split(root_end);
            let link = crate::channel(rx, tx);

            let (rx, tx) = io::split(leaf_end);
            let (rx, tx) = crate::channel(rx, tx);
            (link, GroupLeaf::new(id, rx, tx))
        })
        .unzip();

    (GroupRoot::new(links), leaves)
}
