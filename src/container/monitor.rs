//! Container resource monitoring.
//!
//! The daemon embeds CPU and domain snapshots in its inspection payload.
//! [`ContainerMonitor`] is the capability seam for stat collection;
//! [`ResourceMonitor`] implements it on top of [`VirtplusClient`].

use crate::container::{Result, VirtContainerInfo, VirtplusClient};
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Container resource statistics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContainerStats {
    /// Container id
    pub id: String,
    /// Whether the domain is running
    pub running: bool,
    /// Virtual CPU count
    pub vcpus: i64,
    /// Total CPU time in nanoseconds
    pub cpu_time: i64,
    /// System CPU time in nanoseconds
    pub system_time: i64,
    /// User CPU time in nanoseconds
    pub user_time: i64,
    /// Memory in use, as reported by the daemon (KiB)
    pub memory_usage: i64,
    /// Maximum memory, as reported by the daemon (KiB)
    pub memory_limit: i64,
    /// Memory usage percentage (0-100)
    pub memory_percent: f64,
}

impl From<&VirtContainerInfo> for ContainerStats {
    fn from(virt: &VirtContainerInfo) -> Self {
        let cpu = virt.cpu_info.unwrap_or_default();
        let dom = virt.dom_info.unwrap_or_default();

        let memory_percent = if dom.max_memory > 0 {
            (dom.used_memory as f64 / dom.max_memory as f64) * 100.0
        } else {
            0.0
        };

        // Prefer the dedicated CPU snapshot, fall back to the domain's counter.
        let cpu_time = if cpu.cpu_time > 0 {
            cpu.cpu_time
        } else {
            dom.cpu_time
        };

        ContainerStats {
            id: virt.id.clone(),
            running: virt.is_running(),
            vcpus: dom.virt_cpu,
            cpu_time,
            system_time: cpu.system_time,
            user_time: cpu.user_time,
            memory_usage: dom.used_memory,
            memory_limit: dom.max_memory,
            memory_percent,
        }
    }
}

/// Source of per-container resource snapshots.
pub trait ContainerMonitor: Send + Sync {
    /// Get current statistics for a container.
    fn container_stats<'a>(&'a self, id: &'a str) -> BoxFuture<'a, Result<ContainerStats>>;
}

/// Resource monitor backed by the daemon's inspection endpoint.
#[derive(Debug, Clone)]
pub struct ResourceMonitor {
    client: VirtplusClient,
}

impl ResourceMonitor {
    /// Create a new resource monitor.
    pub fn new(client: VirtplusClient) -> Self {
        Self { client }
    }

    /// Get current statistics for a container.
    ///
    /// # Errors
    ///
    /// Returns error if the container is not found or the payload is malformed.
    pub async fn stats(&self, id: &str) -> Result<ContainerStats> {
        debug!("Fetching stats for container: {}", id);
        let virt = self.client.inspect_virt(id).await?;
        Ok(ContainerStats::from(&virt))
    }
}

impl ContainerMonitor for ResourceMonitor {
    fn container_stats<'a>(&'a self, id: &'a str) -> BoxFuture<'a, Result<ContainerStats>> {
        Box::pin(self.stats(id))
    }
}
