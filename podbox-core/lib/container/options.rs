//! Container creation options.
//!
//! Each option is an independently validated configuration mutation. Options
//! are applied in caller order by the runtime's container builder; the first
//! failure aborts the whole construction. Every option checks the finalize
//! flag before doing anything else, so an already-finalized container can
//! never be mutated.

use std::collections::HashMap;
use std::net::IpAddr;
use std::path::Path;

use crate::pod::Pod;
use crate::secret::ContainerSecret;
use crate::validate::{
    check_name, HardwareAddr, CGROUPS_DISABLED, CGROUPS_ENABLED, CGROUPS_NO_CONMON, CGROUPS_SPLIT,
    LOG_DRIVERS, RESTART_POLICIES, UMASK_REGEX,
};
use crate::{PodboxError, PodboxResult};

use super::dependency::{check_dependency_container, valid_pod_ns_option};
use super::{
    Container, ContainerImageVolume, ContainerNamedVolume, ContainerOverlayVolume, CtrCreateOption,
    PortMapping,
};

//--------------------------------------------------------------------------------------------------
// Functions: Identity
//--------------------------------------------------------------------------------------------------

/// Sets the container's name.
pub fn with_name(name: &str) -> CtrCreateOption {
    let name = name.to_string();
    Box::new(move |ctr| {
        if ctr.valid {
            return Err(PodboxError::ContainerFinalized);
        }

        check_name(&name)?;
        ctr.config.name = name;

        Ok(())
    })
}

/// Adds the container to a pod.
///
/// Containers which join a pod can only join the Linux namespaces of other
/// containers in the same pod, and must share the pod's namespace scope.
pub fn with_pod(pod: &Pod) -> CtrCreateOption {
    let pod_id = pod.id().to_string();
    Box::new(move |ctr| {
        if ctr.valid {
            return Err(PodboxError::ContainerFinalized);
        }

        ctr.config.pod = pod_id;

        Ok(())
    })
}

/// Sets the namespace scope the container will be created in. The empty
/// string corresponds to a lack of scoping.
pub fn with_ctr_namespace(ns: &str) -> CtrCreateOption {
    let ns = ns.to_string();
    Box::new(move |ctr| {
        if ctr.valid {
            return Err(PodboxError::ContainerFinalized);
        }

        ctr.config.namespace = ns;

        Ok(())
    })
}

/// Adds labels to the container.
pub fn with_labels(labels: HashMap<String, String>) -> CtrCreateOption {
    Box::new(move |ctr| {
        if ctr.valid {
            return Err(PodboxError::ContainerFinalized);
        }

        ctr.config.labels = labels.clone();

        Ok(())
    })
}

//--------------------------------------------------------------------------------------------------
// Functions: Lifecycle
//--------------------------------------------------------------------------------------------------

/// Sets the signal that will be sent to stop the container.
pub fn with_stop_signal(signal: u32) -> CtrCreateOption {
    Box::new(move |ctr| {
        if ctr.valid {
            return Err(PodboxError::ContainerFinalized);
        }

        if signal == 0 {
            return Err(PodboxError::InvalidArgument(
                "stop signal cannot be 0".to_string(),
            ));
        }
        if signal > 64 {
            return Err(PodboxError::InvalidArgument(
                "stop signal cannot be greater than 64 (SIGRTMAX)".to_string(),
            ));
        }

        ctr.config.stop_signal = signal;

        Ok(())
    })
}

/// Sets the time between the stop signal and the kill signal.
pub fn with_stop_timeout(timeout: u32) -> CtrCreateOption {
    Box::new(move |ctr| {
        if ctr.valid {
            return Err(PodboxError::ContainerFinalized);
        }

        ctr.config.stop_timeout = timeout;

        Ok(())
    })
}

/// Sets the maximum time the container is allowed to run.
pub fn with_timeout(timeout: u32) -> CtrCreateOption {
    Box::new(move |ctr| {
        if ctr.valid {
            return Err(PodboxError::ContainerFinalized);
        }

        ctr.config.timeout = timeout;

        Ok(())
    })
}

/// Sets the container's restart policy.
pub fn with_restart_policy(policy: &str) -> CtrCreateOption {
    let policy = policy.to_string();
    Box::new(move |ctr| {
        if ctr.valid {
            return Err(PodboxError::ContainerFinalized);
        }

        if !RESTART_POLICIES.contains(&policy.as_str()) {
            return Err(PodboxError::InvalidArgument(format!(
                "{:?} is not a valid restart policy",
                policy
            )));
        }
        ctr.config.restart_policy = policy;

        Ok(())
    })
}

/// Sets the number of retries for the on-failure restart policy.
/// 0 is allowed and indicates infinite retries.
pub fn with_restart_retries(tries: u32) -> CtrCreateOption {
    Box::new(move |ctr| {
        if ctr.valid {
            return Err(PodboxError::ContainerFinalized);
        }

        ctr.config.restart_retries = tries;

        Ok(())
    })
}

/// Sets the command run when the container exits, with the container's ID
/// appended as the final argument.
pub fn with_exit_command(exit_command: Vec<String>) -> CtrCreateOption {
    Box::new(move |ctr| {
        if ctr.valid {
            return Err(PodboxError::ContainerFinalized);
        }

        ctr.config.exit_command = exit_command.clone();
        ctr.config.exit_command.push(ctr.config.id.clone());

        Ok(())
    })
}

/// Sets the path the supervisor process writes its PID to.
pub fn with_conmon_pid_file(path: &str) -> CtrCreateOption {
    let path = path.to_string();
    Box::new(move |ctr| {
        if ctr.valid {
            return Err(PodboxError::ContainerFinalized);
        }

        ctr.config.conmon_pid_file = path;

        Ok(())
    })
}

//--------------------------------------------------------------------------------------------------
// Functions: Namespace sharing
//--------------------------------------------------------------------------------------------------

/// Indicates the container should join the IPC namespace of the given
/// container. Containers in a pod can only join namespaces of containers in
/// the same pod.
pub fn with_ipc_ns_from(ns_ctr: &Container) -> CtrCreateOption {
    let ns_ctr = ns_ctr.clone();
    Box::new(move |ctr| {
        if ctr.valid {
            return Err(PodboxError::ContainerFinalized);
        }

        check_dependency_container(&ns_ctr, ctr)?;
        ctr.config.ipc_ns_ctr = ns_ctr.id().to_string();

        Ok(())
    })
}

/// Indicates the container should join the mount namespace of the given
/// container.
pub fn with_mount_ns_from(ns_ctr: &Container) -> CtrCreateOption {
    let ns_ctr = ns_ctr.clone();
    Box::new(move |ctr| {
        if ctr.valid {
            return Err(PodboxError::ContainerFinalized);
        }

        check_dependency_container(&ns_ctr, ctr)?;
        ctr.config.mount_ns_ctr = ns_ctr.id().to_string();

        Ok(())
    })
}

/// Indicates the container should join the network namespace of the given
/// container.
///
/// Joining conflicts with requesting a fresh network namespace and with
/// static IP/MAC assignment, which only make sense for a namespace this
/// container owns.
pub fn with_net_ns_from(ns_ctr: &Container) -> CtrCreateOption {
    let ns_ctr = ns_ctr.clone();
    Box::new(move |ctr| {
        if ctr.valid {
            return Err(PodboxError::ContainerFinalized);
        }

        check_dependency_container(&ns_ctr, ctr)?;

        if ctr.config.create_net_ns {
            return Err(PodboxError::InvalidArgument(
                "cannot join another container's network namespace when a private network namespace was requested".to_string(),
            ));
        }
        if ctr.config.static_ip.is_some() || ctr.config.static_mac.is_some() {
            return Err(PodboxError::InvalidArgument(
                "cannot join another container's network namespace when a static IP or MAC was requested".to_string(),
            ));
        }

        ctr.config.net_ns_ctr = ns_ctr.id().to_string();

        Ok(())
    })
}

/// Indicates the container should join the PID namespace of the given
/// container.
pub fn with_pid_ns_from(ns_ctr: &Container) -> CtrCreateOption {
    let ns_ctr = ns_ctr.clone();
    Box::new(move |ctr| {
        if ctr.valid {
            return Err(PodboxError::ContainerFinalized);
        }

        check_dependency_container(&ns_ctr, ctr)?;
        ctr.config.pid_ns_ctr = ns_ctr.id().to_string();

        Ok(())
    })
}

/// Indicates the container should join the user namespace of the given
/// container.
///
/// A shared user namespace implies a shared UID/GID mapping, so the
/// referenced container's mapping table is copied into this container's
/// configuration and the in-progress runtime spec is rebuilt from it,
/// preserving every (host, container, size) triple in original order.
pub fn with_user_ns_from(ns_ctr: &Container) -> CtrCreateOption {
    let ns_ctr = ns_ctr.clone();
    Box::new(move |ctr| {
        if ctr.valid {
            return Err(PodboxError::ContainerFinalized);
        }

        check_dependency_container(&ns_ctr, ctr)?;

        ctr.config.user_ns_ctr = ns_ctr.id().to_string();
        ctr.config.id_mappings = ns_ctr.config.id_mappings.clone();

        ctr.spec.clear_linux_uid_mappings();
        for uidmap in &ns_ctr.config.id_mappings.uid_map {
            ctr.spec
                .add_linux_uid_mapping(uidmap.host_id, uidmap.container_id, uidmap.size);
        }
        ctr.spec.clear_linux_gid_mappings();
        for gidmap in &ns_ctr.config.id_mappings.gid_map {
            ctr.spec
                .add_linux_gid_mapping(gidmap.host_id, gidmap.container_id, gidmap.size);
        }

        Ok(())
    })
}

/// Indicates the container should join the UTS namespace of the given
/// container.
pub fn with_uts_ns_from(ns_ctr: &Container) -> CtrCreateOption {
    let ns_ctr = ns_ctr.clone();
    Box::new(move |ctr| {
        if ctr.valid {
            return Err(PodboxError::ContainerFinalized);
        }

        check_dependency_container(&ns_ctr, ctr)?;
        ctr.config.uts_ns_ctr = ns_ctr.id().to_string();

        Ok(())
    })
}

/// Indicates the container should join the cgroup namespace of the given
/// container.
pub fn with_cgroup_ns_from(ns_ctr: &Container) -> CtrCreateOption {
    let ns_ctr = ns_ctr.clone();
    Box::new(move |ctr| {
        if ctr.valid {
            return Err(PodboxError::ContainerFinalized);
        }

        check_dependency_container(&ns_ctr, ctr)?;
        ctr.config.cgroup_ns_ctr = ns_ctr.id().to_string();

        Ok(())
    })
}

/// Indicates the container should join the UTS namespace of its pod's infra
/// container. Fails when the pod has no infra container.
pub fn with_uts_ns_from_pod(pod: &Pod) -> CtrCreateOption {
    let pod = pod.clone();
    Box::new(move |ctr| {
        if ctr.valid {
            return Err(PodboxError::ContainerFinalized);
        }

        valid_pod_ns_option(&pod, &ctr.config.pod)?;

        let infra_id = pod.infra_container_id()?;
        ctr.config.uts_ns_ctr = infra_id.to_string();

        Ok(())
    })
}

/// Sets the containers that must be running before this container starts.
///
/// The list is stored in the given order; start ordering is computed later by
/// the start orchestration, which only requires membership legality here.
pub fn with_dependency_ctrs(ctrs: &[Container]) -> CtrCreateOption {
    let ctrs = ctrs.to_vec();
    Box::new(move |ctr| {
        if ctr.valid {
            return Err(PodboxError::ContainerFinalized);
        }

        let mut deps = Vec::with_capacity(ctrs.len());
        for dep in &ctrs {
            check_dependency_container(dep, ctr)?;
            deps.push(dep.id().to_string());
        }

        ctr.config.dependencies = deps;

        Ok(())
    })
}

/// Sets the UID/GID mappings for the container.
pub fn with_id_mappings(id_mappings: crate::oci::IdMappingOptions) -> CtrCreateOption {
    Box::new(move |ctr| {
        if ctr.valid {
            return Err(PodboxError::ContainerFinalized);
        }

        ctr.config.id_mappings = id_mappings.clone();

        Ok(())
    })
}

//--------------------------------------------------------------------------------------------------
// Functions: Networking
//--------------------------------------------------------------------------------------------------

/// Indicates the container should be given a fresh network namespace with a
/// minimal configuration. Conflicts with joining another container's network
/// namespace.
pub fn with_net_ns(
    port_mappings: Vec<PortMapping>,
    net_mode: &str,
    networks: Vec<String>,
) -> CtrCreateOption {
    let net_mode = net_mode.to_string();
    Box::new(move |ctr| {
        if ctr.valid {
            return Err(PodboxError::ContainerFinalized);
        }

        if !ctr.config.net_ns_ctr.is_empty() {
            return Err(PodboxError::InvalidArgument(
                "cannot request a private network namespace when joining another container's network namespace".to_string(),
            ));
        }

        ctr.config.create_net_ns = true;
        ctr.config.net_mode = net_mode;
        ctr.config.port_mappings = port_mappings.clone();
        ctr.config.networks = networks.clone();

        Ok(())
    })
}

/// Requests a static IP from the network backend. Requires a fresh network
/// namespace.
pub fn with_static_ip(ip: IpAddr) -> CtrCreateOption {
    Box::new(move |ctr| {
        if ctr.valid {
            return Err(PodboxError::ContainerFinalized);
        }

        if !ctr.config.net_ns_ctr.is_empty() || !ctr.config.create_net_ns {
            return Err(PodboxError::InvalidArgument(
                "a static IP requires a private network namespace".to_string(),
            ));
        }

        ctr.config.static_ip = Some(ip);

        Ok(())
    })
}

/// Requests a static MAC from the network backend. Requires a fresh network
/// namespace.
pub fn with_static_mac(mac: HardwareAddr) -> CtrCreateOption {
    Box::new(move |ctr| {
        if ctr.valid {
            return Err(PodboxError::ContainerFinalized);
        }

        if !ctr.config.net_ns_ctr.is_empty() || !ctr.config.create_net_ns {
            return Err(PodboxError::InvalidArgument(
                "a static MAC requires a private network namespace".to_string(),
            ));
        }

        ctr.config.static_mac = Some(mac);

        Ok(())
    })
}

/// Adds name servers for the container. Every entry must be a valid IP
/// literal; on the first invalid entry nothing from the batch is appended.
pub fn with_dns(dns_servers: Vec<String>) -> CtrCreateOption {
    Box::new(move |ctr| {
        if ctr.valid {
            return Err(PodboxError::ContainerFinalized);
        }

        let mut dns = Vec::with_capacity(dns_servers.len());
        for server in &dns_servers {
            let addr: IpAddr = server.parse().map_err(|_| {
                PodboxError::InvalidArgument(format!("invalid IP address {}", server))
            })?;
            dns.push(addr);
        }
        ctr.config.dns_server.extend(dns);

        Ok(())
    })
}

/// Adds DNS search domains for the container.
pub fn with_dns_search(search_domains: Vec<String>) -> CtrCreateOption {
    Box::new(move |ctr| {
        if ctr.valid {
            return Err(PodboxError::ContainerFinalized);
        }

        ctr.config.dns_search = search_domains.clone();

        Ok(())
    })
}

/// Adds resolv.conf options for the container.
///
/// Fails when the container was already told to use the image's resolv.conf,
/// since no resolv.conf will be bind-mounted for the options to land in.
pub fn with_dns_option(dns_options: Vec<String>) -> CtrCreateOption {
    Box::new(move |ctr| {
        if ctr.valid {
            return Err(PodboxError::ContainerFinalized);
        }

        if ctr.config.use_image_resolv_conf {
            return Err(PodboxError::InvalidArgument(
                "cannot add DNS options if the container will not create /etc/resolv.conf"
                    .to_string(),
            ));
        }
        ctr.config.dns_option.extend(dns_options.iter().cloned());

        Ok(())
    })
}

/// Adds host:IP entries for the container's hosts file.
pub fn with_hosts(hosts: Vec<String>) -> CtrCreateOption {
    Box::new(move |ctr| {
        if ctr.valid {
            return Err(PodboxError::ContainerFinalized);
        }

        ctr.config.host_add = hosts.clone();

        Ok(())
    })
}

/// Tells the container not to bind-mount resolv.conf in.
///
/// Note: this does not check for already-recorded DNS options; only the
/// reverse order is rejected. See the ordering test below.
pub fn with_use_image_resolv_conf() -> CtrCreateOption {
    Box::new(move |ctr| {
        if ctr.valid {
            return Err(PodboxError::ContainerFinalized);
        }

        ctr.config.use_image_resolv_conf = true;

        Ok(())
    })
}

/// Tells the container not to bind-mount /etc/hosts in.
pub fn with_use_image_hosts() -> CtrCreateOption {
    Box::new(move |ctr| {
        if ctr.valid {
            return Err(PodboxError::ContainerFinalized);
        }

        ctr.config.use_image_hosts = true;

        Ok(())
    })
}

//--------------------------------------------------------------------------------------------------
// Functions: Logging and cgroups
//--------------------------------------------------------------------------------------------------

/// Sets the log driver for the container.
pub fn with_log_driver(driver: &str) -> CtrCreateOption {
    let driver = driver.to_string();
    Box::new(move |ctr| {
        if ctr.valid {
            return Err(PodboxError::ContainerFinalized);
        }

        if driver.is_empty() {
            return Err(PodboxError::InvalidArgument(
                "log driver must be set".to_string(),
            ));
        }
        if !LOG_DRIVERS.contains(&driver.as_str()) {
            return Err(PodboxError::InvalidArgument(format!(
                "invalid log driver {}",
                driver
            )));
        }

        ctr.config.log_driver = driver;

        Ok(())
    })
}

/// Sets the path to the log file.
pub fn with_log_path(path: &str) -> CtrCreateOption {
    let path = path.to_string();
    Box::new(move |ctr| {
        if ctr.valid {
            return Err(PodboxError::ContainerFinalized);
        }

        if path.is_empty() {
            return Err(PodboxError::InvalidArgument(
                "log path must be set".to_string(),
            ));
        }

        ctr.config.log_path = path;

        Ok(())
    })
}

/// Sets the tag prepended to log lines.
pub fn with_log_tag(tag: &str) -> CtrCreateOption {
    let tag = tag.to_string();
    Box::new(move |ctr| {
        if ctr.valid {
            return Err(PodboxError::ContainerFinalized);
        }

        if tag.is_empty() {
            return Err(PodboxError::InvalidArgument(
                "log tag must be set".to_string(),
            ));
        }

        ctr.config.log_tag = tag;

        Ok(())
    })
}

/// Sets the maximum size of the container's logs in bytes, -1 for unlimited.
pub fn with_max_log_size(limit: i64) -> CtrCreateOption {
    Box::new(move |ctr| {
        if ctr.valid {
            return Err(PodboxError::ContainerFinalized);
        }

        ctr.config.log_size = limit;

        Ok(())
    })
}

/// Sets the cgroup creation mode. The "disabled" mode additionally records
/// that no cgroups are to be created at all.
pub fn with_cgroups_mode(mode: &str) -> CtrCreateOption {
    let mode = mode.to_string();
    Box::new(move |ctr| {
        if ctr.valid {
            return Err(PodboxError::ContainerFinalized);
        }

        match mode.as_str() {
            CGROUPS_DISABLED => {
                ctr.config.no_cgroups = true;
                ctr.config.cgroups_mode = mode;
            }
            CGROUPS_ENABLED | CGROUPS_NO_CONMON | CGROUPS_SPLIT => {
                ctr.config.cgroups_mode = mode;
            }
            _ => {
                return Err(PodboxError::InvalidArgument(format!(
                    "invalid cgroup mode {:?}",
                    mode
                )));
            }
        }

        Ok(())
    })
}

/// Sets the cgroup parent of the container.
pub fn with_cgroup_parent(parent: &str) -> CtrCreateOption {
    let parent = parent.to_string();
    Box::new(move |ctr| {
        if ctr.valid {
            return Err(PodboxError::ContainerFinalized);
        }

        if parent.is_empty() {
            return Err(PodboxError::InvalidArgument(
                "cgroup parent cannot be empty".to_string(),
            ));
        }

        ctr.config.cgroup_parent = parent;

        Ok(())
    })
}

/// Sets the size of the /dev/shm tmpfs mount.
pub fn with_shm_size(size: i64) -> CtrCreateOption {
    Box::new(move |ctr| {
        if ctr.valid {
            return Err(PodboxError::ContainerFinalized);
        }

        ctr.config.shm_size = size;

        Ok(())
    })
}

//--------------------------------------------------------------------------------------------------
// Functions: Storage
//--------------------------------------------------------------------------------------------------

/// Sets the rootfs for the container from a directory on disk instead of an
/// image. The directory must exist; stat failures are propagated unchanged.
pub fn with_rootfs(rootfs: &str, overlay: bool) -> CtrCreateOption {
    let rootfs = rootfs.to_string();
    Box::new(move |ctr| {
        if ctr.valid {
            return Err(PodboxError::ContainerFinalized);
        }

        std::fs::metadata(&rootfs)?;
        ctr.config.rootfs = rootfs;
        ctr.config.rootfs_overlay = overlay;

        Ok(())
    })
}

/// Sets up the root filesystem from the given image.
pub fn with_rootfs_from_image(
    image_id: &str,
    image_name: &str,
    raw_image_name: &str,
) -> CtrCreateOption {
    let image_id = image_id.to_string();
    let image_name = image_name.to_string();
    let raw_image_name = raw_image_name.to_string();
    Box::new(move |ctr| {
        if ctr.valid {
            return Err(PodboxError::ContainerFinalized);
        }

        ctr.config.rootfs_image_id = image_id;
        ctr.config.rootfs_image_name = image_name;
        ctr.config.raw_image_name = raw_image_name;

        Ok(())
    })
}

/// Adds the given named volumes to the container, validating their mount
/// options.
pub fn with_named_volumes(volumes: Vec<ContainerNamedVolume>) -> CtrCreateOption {
    Box::new(move |ctr| {
        if ctr.valid {
            return Err(PodboxError::ContainerFinalized);
        }

        for vol in &volumes {
            let options = process_mount_options(&vol.options).map_err(|e| {
                PodboxError::InvalidArgument(format!(
                    "processing options for named volume {:?} mounted at {:?}: {}",
                    vol.name, vol.dest, e
                ))
            })?;

            ctr.config.named_volumes.push(ContainerNamedVolume {
                name: vol.name.clone(),
                dest: vol.dest.clone(),
                options,
            });
        }

        Ok(())
    })
}

/// Adds the given overlay volumes to the container.
pub fn with_overlay_volumes(volumes: Vec<ContainerOverlayVolume>) -> CtrCreateOption {
    Box::new(move |ctr| {
        if ctr.valid {
            return Err(PodboxError::ContainerFinalized);
        }

        ctr.config.overlay_volumes.extend(volumes.iter().cloned());

        Ok(())
    })
}

/// Adds the given image volumes to the container.
pub fn with_image_volumes(volumes: Vec<ContainerImageVolume>) -> CtrCreateOption {
    Box::new(move |ctr| {
        if ctr.valid {
            return Err(PodboxError::ContainerFinalized);
        }

        ctr.config.image_volumes.extend(volumes.iter().cloned());

        Ok(())
    })
}

//--------------------------------------------------------------------------------------------------
// Functions: Process environment
//--------------------------------------------------------------------------------------------------

/// Sets the command of the container, recorded for commit.
pub fn with_command(command: Vec<String>) -> CtrCreateOption {
    Box::new(move |ctr| {
        if ctr.valid {
            return Err(PodboxError::ContainerFinalized);
        }

        ctr.config.command = command.clone();

        Ok(())
    })
}

/// Sets the entrypoint of the container, recorded for commit.
pub fn with_entrypoint(entrypoint: Vec<String>) -> CtrCreateOption {
    Box::new(move |ctr| {
        if ctr.valid {
            return Err(PodboxError::ContainerFinalized);
        }

        ctr.config.entrypoint = entrypoint.clone();

        Ok(())
    })
}

/// Sets the user the payload runs as: user, uid, user:group, uid:gid.
pub fn with_user(user: &str) -> CtrCreateOption {
    let user = user.to_string();
    Box::new(move |ctr| {
        if ctr.valid {
            return Err(PodboxError::ContainerFinalized);
        }

        ctr.config.user = user;

        Ok(())
    })
}

/// Keeps stdin on the container open to allow interaction.
pub fn with_stdin() -> CtrCreateOption {
    Box::new(move |ctr| {
        if ctr.valid {
            return Err(PodboxError::ContainerFinalized);
        }

        ctr.config.stdin = true;

        Ok(())
    })
}

/// Sets the privileged flag on the container.
pub fn with_privileged(privileged: bool) -> CtrCreateOption {
    Box::new(move |ctr| {
        if ctr.valid {
            return Err(PodboxError::ContainerFinalized);
        }

        ctr.config.privileged = privileged;

        Ok(())
    })
}

/// Sets the timezone of the container, either "local" or a zoneinfo path
/// relative to /usr/share/zoneinfo. The zone file must exist and must not be
/// a directory; stat failures are propagated unchanged.
pub fn with_timezone(path: &str) -> CtrCreateOption {
    let path = path.to_string();
    Box::new(move |ctr| {
        if ctr.valid {
            return Err(PodboxError::ContainerFinalized);
        }

        if path != "local" {
            let zone = Path::new("/usr/share/zoneinfo").join(&path);

            let meta = std::fs::metadata(&zone)?;
            if meta.is_dir() {
                return Err(PodboxError::InvalidArgument(
                    "invalid timezone: is a directory".to_string(),
                ));
            }
        }

        ctr.config.timezone = path;

        Ok(())
    })
}

/// Sets the umask applied inside the container.
pub fn with_umask(umask: &str) -> CtrCreateOption {
    let umask = umask.to_string();
    Box::new(move |ctr| {
        if ctr.valid {
            return Err(PodboxError::ContainerFinalized);
        }

        if !UMASK_REGEX.is_match(&umask) {
            return Err(PodboxError::InvalidArgument(format!(
                "invalid umask string {}",
                umask
            )));
        }
        ctr.config.umask = umask;

        Ok(())
    })
}

/// Adds file secrets to the container.
pub fn with_secrets(container_secrets: Vec<ContainerSecret>) -> CtrCreateOption {
    Box::new(move |ctr| {
        if ctr.valid {
            return Err(PodboxError::ContainerFinalized);
        }

        ctr.config.secrets = container_secrets.clone();

        Ok(())
    })
}

//--------------------------------------------------------------------------------------------------
// Functions: Crate-internal
//--------------------------------------------------------------------------------------------------

/// Marks the container as a pod's infra container.
pub(crate) fn with_is_infra() -> CtrCreateOption {
    Box::new(move |ctr| {
        if ctr.valid {
            return Err(PodboxError::ContainerFinalized);
        }

        ctr.config.is_infra = true;

        Ok(())
    })
}

//--------------------------------------------------------------------------------------------------
// Functions: Helpers
//--------------------------------------------------------------------------------------------------

/// Normalizes volume mount options: rejects ro/rw conflicts and duplicates,
/// and defaults to rw when neither was given.
fn process_mount_options(options: &[String]) -> PodboxResult<Vec<String>> {
    let mut processed = Vec::with_capacity(options.len() + 1);
    let mut access_set = false;

    for opt in options {
        match opt.as_str() {
            "ro" | "rw" => {
                if access_set {
                    return Err(PodboxError::InvalidArgument(format!(
                        "conflicting mount option {:?}",
                        opt
                    )));
                }
                access_set = true;
            }
            _ => {}
        }
        if processed.contains(opt) {
            return Err(PodboxError::InvalidArgument(format!(
                "duplicate mount option {:?}",
                opt
            )));
        }
        processed.push(opt.clone());
    }

    if !access_set {
        processed.push("rw".to_string());
    }

    Ok(processed)
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------
