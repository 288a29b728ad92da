//! Generic container configuration builders.
//!
//! Provides a fluent API for building the caller-facing container
//! configuration. The configuration serializes in the Docker Engine API
//! casing so the daemon can store it verbatim next to the VM definition.

use crate::container::virt::null_as_default;
use crate::container::{ClientError, Result};
use bollard::models::HostConfig;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Container configuration builder.
///
/// For VM-backed containers the first `cmd` token selects the boot device
/// (`"hd"` or `"cdrom"`) and `image` is the path of the disk or ISO image.
#[derive(Debug, Default)]
pub struct ContainerConfigBuilder {
    image: Option<String>,
    cmd: Option<Vec<String>>,
    entrypoint: Option<Vec<String>>,
    working_dir: Option<String>,
    env: Vec<String>,
    labels: HashMap<String, String>,
    memory_limit: Option<i64>,
    cpu_quota: Option<i64>,
    network_mode: Option<String>,
    user: Option<String>,
}

impl ContainerConfigBuilder {
    /// Create a new container configuration builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the image reference (disk or ISO path for VM-backed containers).
    pub fn image<S: Into<String>>(mut self, image: S) -> Self {
        self.image = Some(image.into());
        self
    }

    /// Set the command. The first token doubles as the boot-mode tag.
    pub fn cmd<I, S>(mut self, cmd: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.cmd = Some(cmd.into_iter().map(|s| s.into()).collect());
        self
    }

    /// Set the entrypoint.
    pub fn entrypoint<I, S>(mut self, entrypoint: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.entrypoint = Some(entrypoint.into_iter().map(|s| s.into()).collect());
        self
    }

    /// Set the working directory.
    pub fn working_dir<S: Into<String>>(mut self, dir: S) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Add an environment variable.
    pub fn env<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.env.push(format!("{}={}", key.into(), value.into()));
        self
    }

    /// Add a label.
    pub fn label<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }

    /// Set memory limit in bytes.
    pub fn memory_limit(mut self, bytes: i64) -> Self {
        self.memory_limit = Some(bytes);
        self
    }

    /// Set CPU quota. The daemon reads it as the virtual CPU count.
    pub fn cpu_quota(mut self, quota: i64) -> Self {
        self.cpu_quota = Some(quota);
        self
    }

    /// Set network mode. The daemon reads it as the bridge name (e.g. "virbr0").
    pub fn network_mode<S: Into<String>>(mut self, mode: S) -> Self {
        self.network_mode = Some(mode.into());
        self
    }

    /// Set user.
    pub fn user<S: Into<String>>(mut self, user: S) -> Self {
        self.user = Some(user.into());
        self
    }

    /// Build the container configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the image is missing.
    pub fn build(self) -> Result<ContainerConfig> {
        let image = self
            .image
            .ok_or_else(|| ClientError::Config("Image is required".to_string()))?;

        let host_config = HostConfig {
            memory: self.memory_limit,
            cpu_quota: self.cpu_quota,
            network_mode: self.network_mode,
            ..Default::default()
        };

        Ok(ContainerConfig {
            image,
            cmd: self.cmd,
            entrypoint: self.entrypoint,
            working_dir: self.working_dir,
            env: if self.env.is_empty() {
                None
            } else {
                Some(self.env)
            },
            labels: if self.labels.is_empty() {
                None
            } else {
                Some(self.labels)
            },
            user: self.user,
            host_config,
        })
    }
}

/// Generic container configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ContainerConfig {
    /// Image reference
    #[serde(deserialize_with = "null_as_default")]
    pub image: String,
    /// Command to run
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cmd: Option<Vec<String>>,
    /// Entrypoint
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entrypoint: Option<Vec<String>>,
    /// Working directory
    #[serde(skip_serializing_if = "Option::is_none")]
    pub working_dir: Option<String>,
    /// Environment variables
    #[serde(skip_serializing_if = "Option::is_none")]
    pub env: Option<Vec<String>>,
    /// Labels
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<HashMap<String, String>>,
    /// User
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    /// Host resource limits
    pub host_config: HostConfig,
}

impl ContainerConfig {
    /// Create a new configuration builder.
    pub fn builder() -> ContainerConfigBuilder {
        ContainerConfigBuilder::new()
    }

    /// Get the image reference.
    pub fn image(&self) -> &str {
        &self.image
    }

    /// First command token, used by the daemon as the boot-mode tag.
    pub fn boot_tag(&self) -> &str {
        self.cmd
            .as_ref()
            .and_then(|cmd| cmd.first())
            .map(String::as_str)
            .unwrap_or("")
    }
}
