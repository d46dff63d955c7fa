pub mod config;
pub mod errors;
pub mod fs_op;
pub mod logging;
pub mod probe;
pub mod scenario;

// Image building for the probe (used by the `hostdir-e2e` binary)
#[path = "building/mod.rs"]
pub mod building;

pub use crate::config::{PollPolicy, ProbeConfig};
pub use crate::errors::{ProbeError, ScenarioError};
pub use crate::probe::{Operation, Outcome, Probe, ProbeReport};
