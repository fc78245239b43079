//! Process execution helpers.
//!
//! External commands are "world-touching" and must go through the HAL so we can
//! test workflows without spawning real processes.

use crate::HalResult;
use std::time::Duration;

/// Process execution trait (external command runner).
pub trait ProcessOps {
    /// Run a command attached to the terminal; a non-zero exit is an error.
    fn command_status(&self, program: &str, args: &[&str], timeout: Duration) -> HalResult<()>;
}
