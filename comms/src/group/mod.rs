//! Collective communication over a depth-1 tree.
//!
//! The root (controller) holds one link per leaf (worker), ordered by the worker
//! assignment order. Links are in-order byte streams and every send is flushed,
//! so a message can never overtake an earlier one on the same link.

mod aggregate;
mod barrier;
mod error;
mod leaf;
mod local;
mod root;

pub use aggregate::{AggregationErr, Aggregator};
pub use barrier::{ArrivalBarrier, BarrierErr};
pub use error::{GroupErr, Result};
pub use leaf::GroupLeaf;
pub use local::{LocalLeaf, LocalRoot, local_group};
pub use root::GroupRoot;
