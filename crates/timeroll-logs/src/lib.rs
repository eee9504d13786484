//! timeroll Logs - Time-based rotation of log files
//!
//! [`TimeBasedRollingPolicy`] decides when to roll over and which
//! [`RolloverAction`]s complete the rotation; [`RollingFileWriter`] is the
//! append destination that drives it and applies the actions.

pub mod action;
mod pattern;
mod policy;
mod writer;

pub use action::{ActionRunner, RolloverAction};
pub use pattern::{CompressionSuffix, RotationTemplate};
pub use policy::{ActiveFile, Rollover, RolloverState, TimeBasedRollingPolicy};
pub use writer::{LogCapture, RollingFileWriter};

use timeroll_core::{Result, RollingConfig};

/// Activate a policy from config and open a writer on its active file
pub fn open(config: &RollingConfig) -> Result<RollingFileWriter> {
    let policy = TimeBasedRollingPolicy::activate(config)?;
    RollingFileWriter::new(policy)
}
