//! Daemon wire format and translation to the generic container model.
//!
//! The daemon describes each libvirt domain as a container: creation takes a
//! [`VirtContainerConfig`] and inspection returns a [`VirtContainerInfo`].
//! Both carry an embedded [`ContainerConfig`] so fields the daemon does not
//! model natively survive a round trip.

use crate::container::{ContainerConfig, ContainerInfo, ContainerState};
use serde::{Deserialize, Deserializer, Serialize};

/// Boot-mode tag selecting the disk image as boot device.
pub const BOOT_HD: &str = "hd";

/// Boot-mode tag selecting the CD-ROM image as boot device.
pub const BOOT_CDROM: &str = "cdrom";

/// Domain status code reported for a running domain.
pub const DOMAIN_RUNNING: i64 = 1;

/// Decode an explicit JSON `null` as the type's zero value.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Creation payload sent to `POST /containers`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VirtContainerConfig {
    pub name: String,
    /// Memory in bytes
    pub memory: i64,
    pub vcpu: i64,
    pub disk_source: String,
    pub cdrom_source: String,
    /// Bridge or network name
    pub bridge: String,
    /// Boot-mode tag, [`BOOT_HD`] or [`BOOT_CDROM`]
    pub boot: String,
    #[serde(rename = "ContainerConfig")]
    pub container_config: Option<ContainerConfig>,
}

impl VirtContainerConfig {
    /// Derive the creation payload from a generic configuration.
    ///
    /// The boot tag is the first command token. `"hd"` routes the image to the
    /// disk source, `"cdrom"` to the CD-ROM source; any other tag leaves both
    /// empty and is passed through unchecked.
    pub fn from_config(config: &ContainerConfig, name: &str) -> Self {
        let host = &config.host_config;
        let boot = config.boot_tag().to_string();

        let (disk_source, cdrom_source) = match boot.as_str() {
            BOOT_HD => (config.image.clone(), String::new()),
            BOOT_CDROM => (String::new(), config.image.clone()),
            _ => (String::new(), String::new()),
        };

        Self {
            name: name.to_string(),
            memory: host.memory.unwrap_or(0),
            vcpu: host.cpu_quota.unwrap_or(0),
            disk_source,
            cdrom_source,
            bridge: host.network_mode.clone().unwrap_or_default(),
            boot,
            container_config: Some(config.clone()),
        }
    }
}

/// CPU usage snapshot, in nanoseconds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VirtCpuInfo {
    #[serde(deserialize_with = "null_as_default")]
    pub cpu_time: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub system_time: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub user_time: i64,
}

/// Domain status snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VirtDomInfo {
    #[serde(deserialize_with = "null_as_default")]
    pub status: i64,
    /// Memory in use, in KiB as reported by libvirt
    #[serde(deserialize_with = "null_as_default")]
    pub used_memory: i64,
    /// Maximum memory, in KiB as reported by libvirt
    #[serde(deserialize_with = "null_as_default")]
    pub max_memory: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub cpu_time: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub virt_cpu: i64,
}

/// Inspection payload returned by `GET /containers/{id}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct VirtContainerInfo {
    #[serde(alias = "id", deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(alias = "name", deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(alias = "cpuInfo")]
    pub cpu_info: Option<VirtCpuInfo>,
    #[serde(alias = "domInfo")]
    pub dom_info: Option<VirtDomInfo>,
    #[serde(alias = "containerConfig")]
    pub container_config: Option<ContainerConfig>,
}

impl VirtContainerInfo {
    /// Only [`DOMAIN_RUNNING`] counts as running; a missing snapshot does not.
    pub fn is_running(&self) -> bool {
        self.dom_info
            .map(|dom| dom.status == DOMAIN_RUNNING)
            .unwrap_or(false)
    }
}

impl From<VirtContainerInfo> for ContainerInfo {
    fn from(virt: VirtContainerInfo) -> Self {
        let running = virt.is_running();
        let image = virt
            .container_config
            .as_ref()
            .map(|config| config.image.clone())
            .unwrap_or_default();

        ContainerInfo {
            id: virt.id,
            name: virt.name,
            image,
            config: virt.container_config,
            state: ContainerState { running },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with_cmd(cmd: &str) -> ContainerConfig {
        ContainerConfig::builder()
            .image("/path/x.qcow2")
            .cmd(vec![cmd])
            .memory_limit(1_048_576)
            .cpu_quota(4)
            .network_mode("virbr0")
            .build()
            .unwrap()
    }

    #[test]
    fn test_null_wire_fields_decode_as_zero() {
        let virt: VirtContainerInfo = serde_json::from_str(
            r#"{
                "Id": "vm-1",
                "Name": null,
                "CpuInfo": {"cpu_time": null, "system_time": 5, "user_time": null},
                "DomInfo": {"status": 1, "usedMemory": null, "maxMemory": 2048},
                "ContainerConfig": {"Image": null}
            }"#,
        )
        .unwrap();

        assert_eq!(virt.id, "vm-1");
        assert_eq!(virt.name, "");
        let cpu = virt.cpu_info.unwrap();
        assert_eq!((cpu.cpu_time, cpu.system_time, cpu.user_time), (0, 5, 0));
        let dom = virt.dom_info.unwrap();
        assert_eq!(dom.used_memory, 0);
        assert_eq!(dom.max_memory, 2048);
        assert!(virt.is_running());
        assert_eq!(ContainerInfo::from(virt).image, "");
    }

    #[test]
    fn test_hd_boot_sets_disk_source() {
        let virt = VirtContainerConfig::from_config(&config_with_cmd("hd"), "centos");

        assert_eq!(virt.name, "centos");
        assert_eq!(virt.boot, BOOT_HD);
        assert_eq!(virt.disk_source, "/path/x.qcow2");
        assert_eq!(virt.cdrom_source, "");
        assert_eq!(virt.memory, 1_048_576);
        assert_eq!(virt.vcpu, 4);
        assert_eq!(virt.bridge, "virbr0");
    }

    #[test]
    fn test_cdrom_boot_sets_cdrom_source() {
        let virt = VirtContainerConfig::from_config(&config_with_cmd("cdrom"), "");

        assert_eq!(virt.boot, BOOT_CDROM);
        assert_eq!(virt.disk_source, "");
        assert_eq!(virt.cdrom_source, "/path/x.qcow2");
    }

    #[test]
    fn test_unknown_boot_leaves_sources_empty() {
        let virt = VirtContainerConfig::from_config(&config_with_cmd("network"), "pxe");

        assert_eq!(virt.boot, "network");
        assert!(virt.disk_source.is_empty());
        assert!(virt.cdrom_source.is_empty());
    }

    #[test]
    fn test_missing_limits_default_to_zero() {
        let config = ContainerConfig::builder()
            .image("x.iso")
            .cmd(vec!["cdrom"])
            .build()
            .unwrap();
        let virt = VirtContainerConfig::from_config(&config, "bare");

        assert_eq!(virt.memory, 0);
        assert_eq!(virt.vcpu, 0);
        assert_eq!(virt.bridge, "");
    }

    #[test]
    fn test_wire_field_names() {
        let virt = VirtContainerConfig::from_config(&config_with_cmd("hd"), "centos");
        let json = serde_json::to_value(&virt).unwrap();

        assert_eq!(json["name"], "centos");
        assert_eq!(json["disk_source"], "/path/x.qcow2");
        assert_eq!(json["cdrom_source"], "");
        assert_eq!(json["boot"], "hd");
        assert_eq!(json["ContainerConfig"]["Image"], "/path/x.qcow2");
    }

    #[test]
    fn test_domain_status_running() {
        let mut virt = VirtContainerInfo::default();
        assert!(!virt.is_running());

        for (status, expected) in [(1, true), (0, false), (5, false), (-1, false)] {
            virt.dom_info = Some(VirtDomInfo {
                status,
                ..Default::default()
            });
            assert_eq!(virt.is_running(), expected, "status {}", status);
        }
    }

    #[test]
    fn test_decode_inspect_payload() {
        let body = r#"{
            "Id": "192.168.11.51_13",
            "Name": "centos_65_3",
            "CpuInfo": {"cpu_time": 100, "system_time": 20, "user_time": 70},
            "DomInfo": {"status": 1, "usedMemory": 1024, "maxMemory": 2048, "cpuTime": 100, "virtCpu": 4},
            "ContainerConfig": {"Image": "/var/lib/libvirt/images/centos_65.qcow2", "Cmd": ["hd"], "HostConfig": {"Memory": 1048576}}
        }"#;

        let virt: VirtContainerInfo = serde_json::from_str(body).unwrap();
        assert_eq!(virt.dom_info.unwrap().virt_cpu, 4);
        assert_eq!(virt.cpu_info.unwrap().user_time, 70);

        let info = ContainerInfo::from(virt);
        assert_eq!(info.id, "192.168.11.51_13");
        assert_eq!(info.name, "centos_65_3");
        assert_eq!(info.image, "/var/lib/libvirt/images/centos_65.qcow2");
        assert!(info.state.running);
        assert_eq!(
            info.config.unwrap().host_config.memory,
            Some(1_048_576)
        );
    }

    #[test]
    fn test_decode_without_snapshots() {
        let virt: VirtContainerInfo =
            serde_json::from_str(r#"{"Id": "vm-2", "Name": "idle", "ContainerConfig": null}"#)
                .unwrap();
        let info = ContainerInfo::from(virt);

        assert!(!info.state.running);
        assert!(info.config.is_none());
        assert_eq!(info.image, "");
    }

    #[test]
    fn test_config_json_decodes_as_info_with_image() {
        let virt = VirtContainerConfig::from_config(&config_with_cmd("hd"), "centos");
        let json = serde_json::to_string(&virt).unwrap();

        let decoded: VirtContainerInfo = serde_json::from_str(&json).unwrap();
        let info = ContainerInfo::from(decoded);

        assert_eq!(info.name, "centos");
        assert_eq!(info.image, "/path/x.qcow2");
        assert_eq!(info.config.unwrap().boot_tag(), "hd");
    }
}
