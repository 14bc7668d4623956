//! Container configuration model and creation options.
//!
//! A container's configuration is assembled by the runtime from an ordered
//! list of [`CtrCreateOption`] closures and becomes immutable once the
//! container is finalized. Containers reference pods and other containers
//! only by string ID.

mod dependency;
mod options;

use std::collections::HashMap;
use std::net::IpAddr;

use chrono::{DateTime, Utc};
use getset::Getters;
use serde::{Deserialize, Serialize};

use crate::oci::{IdMappingOptions, SpecGenerator};
use crate::secret::{ContainerSecret, Secret};
use crate::validate::HardwareAddr;
use crate::PodboxResult;

//--------------------------------------------------------------------------------------------------
// Exports
//--------------------------------------------------------------------------------------------------

pub use dependency::*;
pub use options::*;

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// A configuration mutation applied to a container under construction.
pub type CtrCreateOption = Box<dyn FnOnce(&mut Container) -> PodboxResult<()> + Send>;

/// A named volume mounted into a container.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerNamedVolume {
    /// Name of the volume
    pub name: String,

    /// Mount destination inside the container
    pub dest: String,

    /// Mount options
    pub options: Vec<String>,
}

/// A host directory mounted into a container through an overlay.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerOverlayVolume {
    /// Mount destination inside the container
    pub dest: String,

    /// Host source directory
    pub source: String,

    /// Mount options
    pub options: Vec<String>,
}

/// An image mounted into a container as a volume.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerImageVolume {
    /// Mount destination inside the container
    pub dest: String,

    /// Source image
    pub source: String,

    /// Whether the mount is writable
    pub read_write: bool,
}

/// A single published port.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortMapping {
    /// Host IP to bind, empty for all interfaces
    pub host_ip: String,

    /// Host port
    pub host_port: u16,

    /// Container port
    pub container_port: u16,

    /// Protocol, tcp or udp
    pub protocol: String,

    /// Number of consecutive ports mapped starting at the above
    pub range: u16,
}

/// The immutable-once-finalized configuration of a container.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Getters)]
#[getset(get = "pub")]
pub struct ContainerConfig {
    /// Unique 64-hex-character ID
    pub(crate) id: String,

    /// Human-readable name
    pub(crate) name: String,

    /// Namespace scope the container lives in; empty for no scoping
    pub(crate) namespace: String,

    /// ID of the pod the container belongs to; empty when not in a pod
    pub(crate) pod: String,

    /// ID of the container whose IPC namespace is joined
    pub(crate) ipc_ns_ctr: String,

    /// ID of the container whose mount namespace is joined
    pub(crate) mount_ns_ctr: String,

    /// ID of the container whose network namespace is joined
    pub(crate) net_ns_ctr: String,

    /// ID of the container whose PID namespace is joined
    pub(crate) pid_ns_ctr: String,

    /// ID of the container whose user namespace is joined
    pub(crate) user_ns_ctr: String,

    /// ID of the container whose UTS namespace is joined
    pub(crate) uts_ns_ctr: String,

    /// ID of the container whose cgroup namespace is joined
    pub(crate) cgroup_ns_ctr: String,

    /// IDs of containers that must be running before this one starts
    pub(crate) dependencies: Vec<String>,

    /// UID/GID mapping configuration
    pub(crate) id_mappings: IdMappingOptions,

    /// Whether a fresh network namespace is requested
    pub(crate) create_net_ns: bool,

    /// Network mode string handed to the network backend
    pub(crate) net_mode: String,

    /// Published ports
    pub(crate) port_mappings: Vec<PortMapping>,

    /// Networks to join
    pub(crate) networks: Vec<String>,

    /// Static IP requested from the network backend
    pub(crate) static_ip: Option<IpAddr>,

    /// Static MAC requested from the network backend
    pub(crate) static_mac: Option<HardwareAddr>,

    /// Additional name servers
    pub(crate) dns_server: Vec<IpAddr>,

    /// Additional DNS search domains
    pub(crate) dns_search: Vec<String>,

    /// Additional resolv.conf options
    pub(crate) dns_option: Vec<String>,

    /// Additional hosts-file entries
    pub(crate) host_add: Vec<String>,

    /// Use the image's resolv.conf instead of bind-mounting one
    pub(crate) use_image_resolv_conf: bool,

    /// Use the image's /etc/hosts instead of bind-mounting one
    pub(crate) use_image_hosts: bool,

    /// Log driver
    pub(crate) log_driver: String,

    /// Log file path
    pub(crate) log_path: String,

    /// Log tag
    pub(crate) log_tag: String,

    /// Maximum log size in bytes, -1 for unlimited
    pub(crate) log_size: i64,

    /// Restart policy
    pub(crate) restart_policy: String,

    /// Retry budget for the on-failure restart policy, 0 for unlimited
    pub(crate) restart_retries: u32,

    /// Signal sent to stop the container
    pub(crate) stop_signal: u32,

    /// Seconds between stop signal and kill
    pub(crate) stop_timeout: u32,

    /// Maximum runtime in seconds, 0 for unlimited
    pub(crate) timeout: u32,

    /// Command run when the container exits, with the container ID appended
    pub(crate) exit_command: Vec<String>,

    /// CGroup parent
    pub(crate) cgroup_parent: String,

    /// CGroup creation mode
    pub(crate) cgroups_mode: String,

    /// Whether cgroup creation is disabled entirely
    pub(crate) no_cgroups: bool,

    /// Size of the /dev/shm tmpfs mount in bytes
    pub(crate) shm_size: i64,

    /// Root filesystem directory, when created from a directory and not an image
    pub(crate) rootfs: String,

    /// Mount the rootfs through an overlay so the source stays pristine
    pub(crate) rootfs_overlay: bool,

    /// ID of the image backing the root filesystem
    pub(crate) rootfs_image_id: String,

    /// Normalized name of the image backing the root filesystem
    pub(crate) rootfs_image_name: String,

    /// Image name exactly as the user supplied it
    pub(crate) raw_image_name: String,

    /// Named volumes mounted into the container
    pub(crate) named_volumes: Vec<ContainerNamedVolume>,

    /// Overlay volumes mounted into the container
    pub(crate) overlay_volumes: Vec<ContainerOverlayVolume>,

    /// Image volumes mounted into the container
    pub(crate) image_volumes: Vec<ContainerImageVolume>,

    /// Command, recorded for commit
    pub(crate) command: Vec<String>,

    /// Entrypoint, recorded for commit
    pub(crate) entrypoint: Vec<String>,

    /// User identity the payload runs as
    pub(crate) user: String,

    /// Keep stdin open
    pub(crate) stdin: bool,

    /// Run without isolation restrictions
    pub(crate) privileged: bool,

    /// Timezone, a zoneinfo path or "local"
    pub(crate) timezone: String,

    /// Umask applied to the payload
    pub(crate) umask: String,

    /// Free-form labels
    pub(crate) labels: HashMap<String, String>,

    /// File secrets mounted into the container
    pub(crate) secrets: Vec<ContainerSecret>,

    /// Secrets exposed as environment variables, keyed by target variable
    pub(crate) env_secrets: HashMap<String, Secret>,

    /// Path the supervisor writes its PID to
    pub(crate) conmon_pid_file: String,

    /// Whether this is a pod's infra container
    pub(crate) is_infra: bool,

    /// When construction of the container began
    pub(crate) created: Option<DateTime<Utc>>,
}

/// A container under construction or finalized.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Container {
    pub(crate) config: ContainerConfig,
    pub(crate) spec: SpecGenerator,
    pub(crate) valid: bool,
}

//--------------------------------------------------------------------------------------------------
// Implementations
//--------------------------------------------------------------------------------------------------

impl Container {
    /// Allocates a container with a fresh ID and default configuration.
    pub(crate) fn new() -> Self {
        let config = ContainerConfig {
            id: podbox_utils::new_id(),
            created: Some(Utc::now()),
            ..ContainerConfig::default()
        };
        Self {
            config,
            spec: SpecGenerator::default(),
            valid: false,
        }
    }

    /// The container's unique ID.
    pub fn id(&self) -> &str {
        &self.config.id
    }

    /// The container's name.
    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// The ID of the pod the container belongs to, empty when not in a pod.
    pub fn pod(&self) -> &str {
        &self.config.pod
    }

    /// The container's namespace scope.
    pub fn namespace(&self) -> &str {
        &self.config.namespace
    }

    /// The container's configuration.
    pub fn config(&self) -> &ContainerConfig {
        &self.config
    }

    /// The container's in-progress runtime spec.
    pub fn spec(&self) -> &SpecGenerator {
        &self.spec
    }

    /// Whether the container has been finalized.
    pub fn valid(&self) -> bool {
        self.valid
    }

    /// The UID/GID mapping configuration.
    pub fn id_mappings(&self) -> &IdMappingOptions {
        &self.config.id_mappings
    }

    /// All container IDs this container depends on: joined namespaces plus
    /// explicit dependencies, in recorded order, without duplicates.
    pub fn dependencies(&self) -> Vec<String> {
        let cfg = &self.config;
        let mut deps = Vec::new();
        for id in [
            &cfg.ipc_ns_ctr,
            &cfg.mount_ns_ctr,
            &cfg.net_ns_ctr,
            &cfg.pid_ns_ctr,
            &cfg.user_ns_ctr,
            &cfg.uts_ns_ctr,
            &cfg.cgroup_ns_ctr,
        ] {
            if !id.is_empty() && !deps.contains(id) {
                deps.push(id.clone());
            }
        }
        for id in &cfg.dependencies {
            if !deps.contains(id) {
                deps.push(id.clone());
            }
        }
        deps
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_serializes_for_persistence() {
        let mut ctr = Container::new();
        ctr.config.name = "web".to_string();
        ctr.config.stop_signal = 15;

        let json = serde_json::to_value(&ctr.config).unwrap();
        assert_eq!(json["name"], "web");
        assert_eq!(json["stop_signal"], 15);
        assert_eq!(json["id"].as_str().unwrap().len(), 64);

        let back: ContainerConfig = serde_json::from_value(json).unwrap();
        assert_eq!(back.name, "web");
        assert_eq!(back.stop_signal, 15);
    }

    #[test]
    fn test_dependencies_union_is_ordered_and_deduped() {
        let mut ctr = Container::new();
        ctr.config.ipc_ns_ctr = "a".to_string();
        ctr.config.net_ns_ctr = "b".to_string();
        ctr.config.user_ns_ctr = "a".to_string();
        ctr.config.dependencies = vec!["c".to_string(), "b".to_string()];

        assert_eq!(
            ctr.dependencies(),
            vec!["a".to_string(), "b".to_string(), "c".to_string()]
        );
    }
}
