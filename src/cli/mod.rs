//! CLI-specific functionality for the virtplus client
//!
//! This module contains argument parsing and configuration discovery.

pub mod args;
pub mod config;

pub use args::{Args, Commands, CreateArgs};
pub use config::ConfigDiscovery;
