//! Configuration discovery and loading
//!
//! This module handles the configuration discovery hierarchy:
//! 1. Current directory: ./virtplus.toml or ./.virtplus/config.toml
//! 2. User config: ~/.virtplus/config.toml
//! 3. System config: /etc/virtplus/config.toml
//! 4. Built-in defaults
//!
//! The `VIRTPLUS_HOST` environment variable overrides the discovered host.

use crate::container::{ClientConfig, Result};
use crate::env;
use std::env as std_env;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Configuration discovery system
pub struct ConfigDiscovery;

impl ConfigDiscovery {
    /// Load configuration, from `explicit` when given, otherwise via the hierarchy.
    ///
    /// The host environment override is applied in both cases.
    pub fn load(explicit: Option<&Path>) -> Result<ClientConfig> {
        let mut config = match explicit {
            Some(path) => {
                info!("Loading configuration from: {:?}", path);
                ClientConfig::from_toml_file(path)?
            }
            None => Self::discover_config()?,
        };

        if let Some(host) = Self::host_override() {
            debug!("Host overridden by {}: {}", env::HOST_ENV_VAR, host);
            config.host = host;
        }

        Ok(config)
    }

    /// Discover and load configuration using the hierarchy
    pub fn discover_config() -> Result<ClientConfig> {
        if let Some(config_path) = Self::find_config_file() {
            info!("Loading configuration from: {:?}", config_path);
            return ClientConfig::from_toml_file(config_path);
        }

        info!("No configuration file found, using defaults");
        Ok(ClientConfig::default())
    }

    /// Find configuration file using discovery hierarchy
    pub fn find_config_file() -> Option<PathBuf> {
        for candidate in Self::get_config_candidates() {
            debug!("Checking for config file: {:?}", candidate);
            if candidate.is_file() {
                debug!("Found config file: {:?}", candidate);
                return Some(candidate);
            }
        }

        debug!("No config file found in discovery hierarchy");
        None
    }

    /// Get list of configuration file candidates in priority order
    fn get_config_candidates() -> Vec<PathBuf> {
        let mut candidates = Vec::new();

        if let Ok(current_dir) = std_env::current_dir() {
            candidates.push(current_dir.join(env::LOCAL_CONFIG_FILE_NAME));
            candidates.push(env::local_config_file_path(&current_dir));
        }

        if let Some(home_dir) = Self::get_home_dir() {
            candidates.push(env::user_config_file_path(&home_dir));
        }

        #[cfg(unix)]
        candidates.push(PathBuf::from(env::SYSTEM_CONFIG_FILE));

        candidates
    }

    fn host_override() -> Option<String> {
        std_env::var(env::HOST_ENV_VAR)
            .ok()
            .filter(|host| !host.trim().is_empty())
    }

    fn get_home_dir() -> Option<PathBuf> {
        std_env::var("HOME")
            .ok()
            .or_else(|| std_env::var("USERPROFILE").ok())
            .map(PathBuf::from)
    }

    /// Show configuration discovery information for debugging
    pub fn show_discovery_info() {
        println!("Configuration Discovery Hierarchy:");
        println!();

        for (i, candidate) in Self::get_config_candidates().iter().enumerate() {
            let status = if candidate.exists() {
                if candidate.is_file() {
                    "✓ EXISTS"
                } else {
                    "✗ NOT A FILE"
                }
            } else {
                "✗ NOT FOUND"
            };

            println!("  {}. {:?} - {}", i + 1, candidate, status);
        }

        println!();
        match Self::find_config_file() {
            Some(found) => println!("Active configuration: {:?}", found),
            None => println!("Active configuration: Built-in defaults"),
        }
        if let Some(host) = Self::host_override() {
            println!("Host override ({}): {}", env::HOST_ENV_VAR, host);
        }
    }
}
