//! Virtualization daemon client and schema translation layer.
//!
//! This module talks to a libvirt-backed container daemon over HTTP(S) and
//! presents the virtual machines it manages through a generic container model
//! (id, name, image, running state).
//!
//! ## Architecture
//!
//! The container module is organized into several components:
//!
//! - [`client`]: HTTP transport, status-code classification and the
//!   list/inspect/create/remove operations
//! - [`config`]: Generic container configuration and its builder
//! - [`model`]: Generic container list entries, info and state
//! - [`virt`]: Daemon wire format (VM config, domain and CPU snapshots)
//!   and its translation to the generic model
//! - [`monitor`]: Resource snapshots derived from the daemon's domain info
//!
//! ## Usage
//!
//! ```rust,no_run
//! use virtplus::container::{ContainerConfig, VirtplusClient};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = VirtplusClient::new("192.168.11.51:2376", None)?;
//!
//!     let config = ContainerConfig::builder()
//!         .image("/var/lib/libvirt/images/centos_65.qcow2")
//!         .cmd(vec!["hd"])
//!         .memory_limit(1_048_576)
//!         .cpu_quota(4)
//!         .network_mode("virbr0")
//!         .build()?;
//!
//!     let id = client.create_container(&config, "centos_65_3").await?;
//!     for container in client.list_containers().await? {
//!         println!("{} {}", container.id, container.status);
//!     }
//!     client.remove_container(&id).await?;
//!     Ok(())
//! }
//! ```

mod client;
mod config;
mod model;
mod monitor;
mod virt;

pub use client::{ClientConfig, TlsSettings, VirtplusClient, DEFAULT_TIMEOUT};
pub use config::{ContainerConfig, ContainerConfigBuilder};
pub use model::{Container, ContainerInfo, ContainerState, STATUS_NOT_RUNNING, STATUS_RUNNING};
pub use monitor::{ContainerMonitor, ContainerStats, ResourceMonitor};
pub use virt::{
    BOOT_CDROM, BOOT_HD, DOMAIN_RUNNING, VirtContainerConfig, VirtContainerInfo, VirtCpuInfo,
    VirtDomInfo,
};

/// Marker the daemon puts in a 404 body when the referenced image is missing.
pub const NO_SUCH_IMAGE_MARKER: &str = "No such image";

/// Error returned by the daemon for a status code of 400 or above (other than 404).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{status}: {body}")]
pub struct HttpError {
    /// Numeric HTTP status code
    pub status_code: u16,
    /// HTTP status line, e.g. "500 Internal Server Error"
    pub status: String,
    /// Raw response body text
    pub body: String,
}

/// Daemon client errors.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The daemon address could not be turned into an endpoint
    #[error("Invalid daemon address {address:?}: {reason}")]
    InvalidAddress { address: String, reason: String },

    /// TLS material could not be loaded or the transport could not be built
    #[error("TLS error: {0}")]
    Tls(String),

    /// Network or connection failure
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Transport failure against a plaintext endpoint that may require TLS
    #[error("{0}. Are you trying to connect to a TLS-enabled daemon without TLS?")]
    TlsHint(#[source] reqwest::Error),

    /// Resource not found
    #[error("Not found")]
    NotFound,

    /// Referenced image not found
    #[error("Image not found")]
    ImageNotFound,

    /// 404 carrying a daemon message that is not an image error
    #[error("{0}")]
    Daemon(String),

    /// Structured HTTP error
    #[error(transparent)]
    Http(#[from] HttpError),

    /// Malformed JSON on either side of the wire
    #[error("Decode error: {0}")]
    Decode(#[from] serde_json::Error),

    /// Client configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ClientError {
    /// Whether this error is one of the two not-found sentinels.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ClientError::NotFound | ClientError::ImageNotFound)
    }

    /// HTTP status code carried by the error, if any.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            ClientError::NotFound | ClientError::ImageNotFound | ClientError::Daemon(_) => {
                Some(404)
            }
            ClientError::Http(e) => Some(e.status_code),
            _ => None,
        }
    }
}

/// Result type for daemon client operations.
pub type Result<T> = std::result::Result<T, ClientError>;
