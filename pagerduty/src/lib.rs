mod client;
pub mod domain;
mod pagerduty_url;

pub(crate) use pagerduty_url::*;
pub use pagerduty_url::DEFAULT_API_URL;

pub use client::*;
pub use domain::*;
