//! Temporarily put yourself on call for a PagerDuty schedule, and take
//! yourself off again.

pub mod cli;
pub mod config;
pub mod coordinator;
pub mod directory;
pub mod domain;
pub mod duration;
mod error;
pub mod git;
pub mod prompt;
pub mod settings;

pub use error::{DutymeError, ErrorKind};
