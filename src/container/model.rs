//! Generic container model returned to callers.

use crate::container::ContainerConfig;
use serde::{Deserialize, Serialize};

/// Status string for a running container in list results.
pub const STATUS_RUNNING: &str = "Running";

/// Status string for a stopped container in list results.
pub const STATUS_NOT_RUNNING: &str = "Not Running";

/// Container list entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Container {
    pub id: String,
    pub names: Vec<String>,
    pub image: String,
    pub status: String,
}

/// Container running state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ContainerState {
    pub running: bool,
}

/// Detailed container information.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct ContainerInfo {
    pub id: String,
    pub name: String,
    pub image: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config: Option<ContainerConfig>,
    pub state: ContainerState,
}

impl From<ContainerInfo> for Container {
    fn from(info: ContainerInfo) -> Self {
        let status = if info.state.running {
            STATUS_RUNNING
        } else {
            STATUS_NOT_RUNNING
        };

        Container {
            id: info.id,
            names: vec![info.name],
            image: info.image,
            status: status.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_running_info_to_container() {
        let info = ContainerInfo {
            id: "192.168.11.51_13".to_string(),
            name: "centos_65_3".to_string(),
            image: "/var/lib/libvirt/images/centos_65.qcow2".to_string(),
            config: None,
            state: ContainerState { running: true },
        };

        let container = Container::from(info);
        assert_eq!(container.id, "192.168.11.51_13");
        assert_eq!(container.names, vec!["centos_65_3".to_string()]);
        assert_eq!(container.image, "/var/lib/libvirt/images/centos_65.qcow2");
        assert_eq!(container.status, STATUS_RUNNING);
    }

    #[test]
    fn test_stopped_info_to_container() {
        let container = Container::from(ContainerInfo {
            id: "vm-1".to_string(),
            ..Default::default()
        });
        assert_eq!(container.status, STATUS_NOT_RUNNING);
        assert_eq!(container.names, vec![String::new()]);
    }
}
