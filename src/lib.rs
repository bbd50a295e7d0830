pub mod artifact;
pub mod config;
pub mod domain;
pub mod error;
pub mod git;
pub mod telemetry;
pub mod ui;
pub mod workflow;

pub use error::{GitPromoteError, Result};
