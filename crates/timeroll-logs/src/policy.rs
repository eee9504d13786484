//! Time-based rolling policy
//!
//! The policy never classifies the rotation period. It renders the file name
//! template for "now" and compares it to the name rendered at the last
//! rollover; any difference is a period boundary. The check itself is
//! throttled to once per wall-clock second so the per-record cost is a single
//! integer comparison.
//!
//! The policy is single-writer: the owning destination calls
//! [`TimeBasedRollingPolicy::is_triggering_event`] and
//! [`TimeBasedRollingPolicy::rollover`] from its own critical section.

use chrono::Utc;
use std::path::{Path, PathBuf};
use timeroll_core::{Result, RollingConfig, ROLLOVER_CHECK_INTERVAL_MS};
use tracing::{debug, info};

use crate::action::RolloverAction;
use crate::pattern::{CompressionSuffix, RotationTemplate};

/// Where the active log file lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActiveFile {
    /// The current render of the template, minus any compression suffix
    Derived,
    /// A fixed path, renamed to the archive name at each rollover
    Decoupled(PathBuf),
}

/// Mutable state of the policy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RolloverState {
    last_rendered_name: String,
    next_check_millis: i64,
}

impl RolloverState {
    /// Template render at the previous rollover (or at activation)
    pub fn last_rendered_name(&self) -> &str {
        &self.last_rendered_name
    }

    /// Earliest instant at which another rollover check is meaningful
    pub fn next_check_millis(&self) -> i64 {
        self.next_check_millis
    }
}

/// Outcome of a [`TimeBasedRollingPolicy::rollover`] call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rollover {
    /// Whether a period boundary was crossed
    pub did_rollover: bool,
    /// Path the destination must write to from now on
    pub active_file: PathBuf,
    /// Actions to finish before the next write
    pub sync_actions: Vec<RolloverAction>,
    /// Actions that may run in the background
    pub async_actions: Vec<RolloverAction>,
}

/// Rolls log files over when the rendered file name changes
#[derive(Debug, Clone)]
pub struct TimeBasedRollingPolicy {
    template: RotationTemplate,
    active_file: ActiveFile,
    compression: CompressionSuffix,
    state: RolloverState,
}

impl TimeBasedRollingPolicy {
    /// Activate the policy using the current time
    pub fn activate(config: &RollingConfig) -> Result<Self> {
        Self::activate_at(config, Utc::now().timestamp_millis())
    }

    /// Activate the policy as if the current time were `now_millis`
    pub fn activate_at(config: &RollingConfig, now_millis: i64) -> Result<Self> {
        let pattern = config.pattern()?;
        config.validate()?;

        let template = RotationTemplate::parse(pattern)?.with_time_zone(config.time_zone);
        let last_rendered_name = template.render_millis(now_millis);
        let compression = CompressionSuffix::detect(&last_rendered_name);

        let active_file = match &config.active_file_name {
            Some(path) => ActiveFile::Decoupled(path.clone()),
            None => ActiveFile::Derived,
        };

        info!(
            "Activated time-based rolling for '{}' (date format '{}', compression {:?})",
            template.raw(),
            template.date_format(),
            compression
        );

        Ok(Self {
            template,
            active_file,
            compression,
            state: RolloverState {
                last_rendered_name,
                next_check_millis: 0,
            },
        })
    }

    /// Whether a rollover check is due. Never renders or touches the disk.
    pub fn is_triggering_event(&self, now_millis: i64) -> bool {
        now_millis >= self.state.next_check_millis
    }

    /// Decide whether a period boundary was crossed and what it takes to
    /// complete the rotation
    pub fn rollover(&mut self, now_millis: i64) -> Rollover {
        self.state.next_check_millis =
            (now_millis.div_euclid(ROLLOVER_CHECK_INTERVAL_MS) + 1) * ROLLOVER_CHECK_INTERVAL_MS;

        let new_name = self.template.render_millis(now_millis);

        if new_name == self.state.last_rendered_name {
            return Rollover {
                did_rollover: false,
                active_file: self.active_path_for(&new_name),
                sync_actions: Vec::new(),
                async_actions: Vec::new(),
            };
        }

        let archive_base = PathBuf::from(self.compression.strip(&self.state.last_rendered_name));
        let mut sync_actions = Vec::new();
        let mut async_actions = Vec::new();

        let previous_exists = match &self.active_file {
            ActiveFile::Derived => archive_base.exists(),
            ActiveFile::Decoupled(active) => {
                let exists = active.exists();
                sync_actions.push(RolloverAction::Rename {
                    from: active.clone(),
                    to: archive_base.clone(),
                    must_succeed: true,
                });
                exists
            }
        };

        if previous_exists {
            let compressed = PathBuf::from(&self.state.last_rendered_name);
            match self.compression {
                CompressionSuffix::None => {}
                CompressionSuffix::Gzip => async_actions.push(RolloverAction::CompressGzip {
                    from: archive_base.clone(),
                    to: compressed,
                    delete_source: true,
                }),
                CompressionSuffix::Zip => async_actions.push(RolloverAction::CompressZip {
                    from: archive_base.clone(),
                    to: compressed,
                    delete_source: true,
                }),
            }
        }

        debug!(
            "Rolling over from '{}' to '{}' ({} sync, {} async actions)",
            self.state.last_rendered_name,
            new_name,
            sync_actions.len(),
            async_actions.len()
        );

        let active_file = self.active_path_for(&new_name);
        self.state.last_rendered_name = new_name;

        Rollover {
            did_rollover: true,
            active_file,
            sync_actions,
            async_actions,
        }
    }

    /// Path the destination should open right after activation
    pub fn active_file_path(&self) -> PathBuf {
        self.active_path_for(&self.state.last_rendered_name)
    }

    fn active_path_for(&self, rendered: &str) -> PathBuf {
        match &self.active_file {
            ActiveFile::Decoupled(path) => path.clone(),
            ActiveFile::Derived => PathBuf::from(self.compression.strip(rendered)),
        }
    }

    pub fn template(&self) -> &RotationTemplate {
        &self.template
    }

    pub fn compression(&self) -> CompressionSuffix {
        self.compression
    }

    pub fn active_file(&self) -> &ActiveFile {
        &self.active_file
    }

    pub fn state(&self) -> &RolloverState {
        &self.state
    }

    /// Fixed active path, if one was configured
    pub fn decoupled_path(&self) -> Option<&Path> {
        match &self.active_file {
            ActiveFile::Decoupled(path) => Some(path),
            ActiveFile::Derived => None,
        }
    }
}
