//! # virtplus
//!
//! A remote-control client for a libvirt-backed container daemon. The daemon
//! exposes virtual machines as containers over HTTP(S); this crate sends the
//! requests, classifies the responses, and translates the daemon's
//! virtualization schema into a generic container model.
//!
//! ## Architecture Overview
//!
//! - **[`container`]**: Daemon client, wire format, generic model and resource monitor
//! - **[`cli`]**: Argument parsing and configuration discovery for the `virtplus` binary
//! - **[`env`]**: Path and environment constants
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use virtplus::VirtplusClient;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = VirtplusClient::new("192.168.11.51:2376", None)?;
//!
//!     for container in client.list_containers().await? {
//!         println!("{} {:?} {}", container.id, container.names, container.status);
//!     }
//!     Ok(())
//! }
//! ```

/// Daemon client and schema translation.
///
/// Provides the request pipeline (dispatch and status-code classification),
/// the daemon's virtualization wire format, and the generic container model
/// it is translated into.
pub mod container;

/// Environment constants and path utilities.
pub mod env;

// CLI module for command-line interface
pub mod cli;

pub use container::{
    ClientConfig, ClientError, Container, ContainerConfig, ContainerInfo, ContainerState,
    HttpError, TlsSettings, VirtplusClient,
};
