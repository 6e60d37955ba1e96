//! Relays alarm events into Slack summaries of the error log entries logged
//! around the alarm time.

pub mod config;
pub mod error;
pub mod logs;
pub mod params;
pub mod pipeline;
pub mod slack;
pub mod window;

pub use error::RelayError;
pub use pipeline::{AlarmEvent, Outcome, Pipeline, RelayResponse};

#[cfg(test)]
mod logs_tests;
