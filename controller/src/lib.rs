mod controller;
pub mod error;
mod report;

pub use controller::Controller;
pub use error::{ControllerErr, Result};
pub use report::Report;
