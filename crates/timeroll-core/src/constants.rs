//! Constants and default values for timeroll

use std::path::PathBuf;

/// Default timeroll home directory name
pub const TIMEROLL_DIR: &str = ".timeroll";

/// Default config file names to search for (in priority order)
pub const CONFIG_FILES: &[&str] = &[
    "timeroll.toml",
    "timeroll.yaml",
    "timeroll.yml",
    "timeroll.json",
];

/// Date sub-format used when a `%d` placeholder carries no explicit format.
/// Day granularity, so a bare placeholder rolls over at midnight.
pub const DEFAULT_DATE_FORMAT: &str = "yyyy-MM-dd";

/// Suffix that enables gzip compression of archived files
pub const GZIP_SUFFIX: &str = ".gz";

/// Suffix that enables zip compression of archived files
pub const ZIP_SUFFIX: &str = ".zip";

/// Minimum spacing between two rollover checks, in milliseconds
pub const ROLLOVER_CHECK_INTERVAL_MS: i64 = 1000;

/// Get the timeroll home directory
pub fn timeroll_home() -> PathBuf {
    dirs::home_dir()
        .map(|h| h.join(TIMEROLL_DIR))
        .unwrap_or_else(|| PathBuf::from(TIMEROLL_DIR))
}

/// Get the default config file path
pub fn default_config_path() -> PathBuf {
    timeroll_home().join(CONFIG_FILES[0])
}
