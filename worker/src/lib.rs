pub mod error;
mod worker;

pub use error::{Result, WorkerErr};
pub use worker::Worker;
