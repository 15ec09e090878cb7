//! CLI subcommands.

pub mod correct;
pub mod patterns;
pub mod scan;
pub mod stats;

use std::path::{Path, PathBuf};

/// Pattern configuration file: explicit flag, or the user config dir.
pub fn patterns_path(override_path: Option<&Path>) -> PathBuf {
    if let Some(path) = override_path {
        return path.to_path_buf();
    }
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("tickscan")
        .join("patterns.json")
}

/// Scan history directory: explicit flag, or the user data dir.
pub fn history_dir(override_path: Option<&Path>) -> PathBuf {
    if let Some(path) = override_path {
        return path.to_path_buf();
    }
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("tickscan")
}
