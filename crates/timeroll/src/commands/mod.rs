//! Command implementations

pub mod check;
pub mod render;
pub mod run;

use anyhow::Result;
use std::path::PathBuf;
use timeroll_core::{default_config_path, RollingConfig, TimeZoneMode};
use tracing::debug;

use crate::cli::PolicyArgs;

/// Build the rolling config from a config file and command line overrides.
///
/// Without `--config` or `--pattern`, the current directory and then the
/// timeroll home directory are searched for a config file.
pub fn resolve_config(args: &PolicyArgs) -> Result<RollingConfig> {
    let mut config = match &args.config {
        Some(path) => RollingConfig::load_from(path)?,
        None if args.pattern.is_some() => RollingConfig::default(),
        None => match discover_config() {
            Some(path) => {
                debug!("Using config file {}", path.display());
                RollingConfig::load_from(&path)?
            }
            None => RollingConfig::default(),
        },
    };

    if let Some(pattern) = &args.pattern {
        config.file_name_pattern = Some(pattern.clone());
    }
    if let Some(active) = &args.active {
        config.active_file_name = Some(active.clone());
    }
    if args.utc {
        config.time_zone = TimeZoneMode::Utc;
    }

    Ok(config)
}

fn discover_config() -> Option<PathBuf> {
    std::env::current_dir()
        .ok()
        .and_then(|dir| RollingConfig::find_in(&dir))
        .or_else(|| {
            let path = default_config_path();
            path.exists().then_some(path)
        })
}
