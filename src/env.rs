//! Environment constants and path utilities.
//!
//! This module centralizes the hardcoded paths, file names and environment
//! variable names used by the client and the command line tool.

use std::path::{Path, PathBuf};

/// Application directory name (hidden directory like .git)
pub const VIRTPLUS_DIR_NAME: &str = ".virtplus";

/// Configuration file name inside the application directory
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Stand-alone configuration file name in the current directory
pub const LOCAL_CONFIG_FILE_NAME: &str = "virtplus.toml";

/// System-wide configuration file (Unix-like systems)
pub const SYSTEM_CONFIG_FILE: &str = "/etc/virtplus/config.toml";

/// Environment variable overriding the daemon address
pub const HOST_ENV_VAR: &str = "VIRTPLUS_HOST";

/// Default tracing filter for the binary
pub const DEFAULT_LOG_FILTER: &str = "virtplus=info";

/// Build the application directory path from a root
pub fn virtplus_dir_path(root: &Path) -> PathBuf {
    root.join(VIRTPLUS_DIR_NAME)
}

/// Build config directory path in user's home directory
pub fn user_config_dir_path(home_dir: &Path) -> PathBuf {
    virtplus_dir_path(home_dir)
}

/// Build config file path in user's home directory
pub fn user_config_file_path(home_dir: &Path) -> PathBuf {
    user_config_dir_path(home_dir).join(CONFIG_FILE_NAME)
}

/// Build local config file path in current directory
pub fn local_config_file_path(current_dir: &Path) -> PathBuf {
    virtplus_dir_path(current_dir).join(CONFIG_FILE_NAME)
}
