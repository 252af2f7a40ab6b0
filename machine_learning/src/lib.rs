pub mod dataset;
pub mod error;
mod shard;
pub mod sgd;

pub use dataset::Dataset;
pub use error::{MlErr, Result};
pub use sgd::LinearSgd;
pub use shard::shard_range;
