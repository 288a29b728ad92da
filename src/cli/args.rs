//! Command line argument parsing
//!
//! Subcommands:
//! - `ps`: List containers
//! - `inspect`: Show container details
//! - `create`: Create a VM-backed container
//! - `rm`: Remove a container
//! - `stats`: Show a resource snapshot
//! - `show-config`: Show configuration discovery information

use crate::container::{BOOT_HD, ContainerConfig, Result};
use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "virtplus")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Remote-control client for a libvirt-backed container daemon")]
#[command(long_about = None)]
#[command(arg_required_else_help = true)]
pub struct Args {
    /// Configuration file path
    #[arg(short = 'c', long = "config", global = true)]
    pub config: Option<PathBuf>,
    /// Daemon address (overrides configuration and VIRTPLUS_HOST)
    #[arg(short = 'H', long = "host", global = true)]
    pub host: Option<String>,
    /// Enable verbose output
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// List containers
    Ps,
    /// Show container details as JSON
    Inspect {
        /// Container id
        id: String,
    },
    /// Create a VM-backed container
    Create(CreateArgs),
    /// Remove a container
    Rm {
        /// Container id
        id: String,
    },
    /// Show a resource snapshot for a container
    Stats {
        /// Container id
        id: String,
    },
    /// Show configuration discovery information
    ShowConfig,
}

#[derive(Debug, Clone, ClapArgs)]
pub struct CreateArgs {
    /// Disk or ISO image path
    #[arg(short = 'i', long = "image")]
    pub image: String,
    /// Boot device ("hd" or "cdrom")
    #[arg(short = 'b', long = "boot", default_value = BOOT_HD)]
    pub boot: String,
    /// Memory in bytes
    #[arg(short = 'm', long = "memory")]
    pub memory: Option<i64>,
    /// Virtual CPU count
    #[arg(long = "vcpu")]
    pub vcpu: Option<i64>,
    /// Bridge or network name
    #[arg(long = "bridge")]
    pub bridge: Option<String>,
    /// Container name
    #[arg(short = 'n', long = "name", default_value = "")]
    pub name: String,
}

impl CreateArgs {
    /// Build the generic container configuration for these arguments.
    pub fn to_container_config(&self) -> Result<ContainerConfig> {
        let mut builder = ContainerConfig::builder()
            .image(self.image.clone())
            .cmd(vec![self.boot.clone()]);

        if let Some(memory) = self.memory {
            builder = builder.memory_limit(memory);
        }
        if let Some(vcpu) = self.vcpu {
            builder = builder.cpu_quota(vcpu);
        }
        if let Some(bridge) = &self.bridge {
            builder = builder.network_mode(bridge.clone());
        }

        builder.build()
    }
}

impl Args {
    pub fn parse() -> Self {
        Parser::parse()
    }
}
