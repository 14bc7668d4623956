//! Pod creation options.
//!
//! Applied in caller order by the runtime's pod builder; the first failure
//! aborts construction. Every option checks the finalize flag first.

use std::collections::HashMap;

use crate::validate::check_name;
use crate::PodboxError;

use super::{Pod, PodCreateOption};

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

/// Sets the pod's name.
pub fn with_pod_name(name: &str) -> PodCreateOption {
    let name = name.to_string();
    Box::new(move |pod| {
        if pod.valid {
            return Err(PodboxError::PodFinalized);
        }

        check_name(&name)?;
        pod.config.name = name;

        Ok(())
    })
}

/// Sets the hostname shared by containers joining the pod's UTS namespace.
pub fn with_pod_hostname(hostname: &str) -> PodCreateOption {
    let hostname = hostname.to_string();
    Box::new(move |pod| {
        if pod.valid {
            return Err(PodboxError::PodFinalized);
        }

        check_name(&hostname)?;
        pod.config.hostname = hostname;

        Ok(())
    })
}

/// Sets the namespace scope the pod will be created in. The empty string
/// corresponds to a lack of scoping.
pub fn with_pod_namespace(ns: &str) -> PodCreateOption {
    let ns = ns.to_string();
    Box::new(move |pod| {
        if pod.valid {
            return Err(PodboxError::PodFinalized);
        }

        pod.config.namespace = ns;

        Ok(())
    })
}

/// Adds labels to the pod.
pub fn with_pod_labels(labels: HashMap<String, String>) -> PodCreateOption {
    Box::new(move |pod| {
        if pod.valid {
            return Err(PodboxError::PodFinalized);
        }

        pod.config.labels = labels.clone();

        Ok(())
    })
}

/// Sets the cgroup parent of the pod.
pub fn with_pod_cgroup_parent(parent: &str) -> PodCreateOption {
    let parent = parent.to_string();
    Box::new(move |pod| {
        if pod.valid {
            return Err(PodboxError::PodFinalized);
        }

        pod.config.cgroup_parent = parent;

        Ok(())
    })
}

/// Tells the pod to create a pod-level cgroup for member containers to
/// parent under.
pub fn with_pod_cgroups() -> PodCreateOption {
    Box::new(move |pod| {
        if pod.valid {
            return Err(PodboxError::PodFinalized);
        }

        pod.config.use_pod_cgroup = true;

        Ok(())
    })
}

/// Gives the pod an infra container. Namespace sharing happens through the
/// infra container, so the sharing options below have no effect without it.
pub fn with_infra_container() -> PodCreateOption {
    Box::new(move |pod| {
        if pod.valid {
            return Err(PodboxError::PodFinalized);
        }

        pod.config.has_infra = true;

        Ok(())
    })
}

/// Records the command that created the pod.
pub fn with_pod_create_command(create_command: Vec<String>) -> PodCreateOption {
    Box::new(move |pod| {
        if pod.valid {
            return Err(PodboxError::PodFinalized);
        }

        pod.config.create_command = create_command.clone();

        Ok(())
    })
}

/// Containers joining the pod will share its IPC namespace.
pub fn with_pod_ipc() -> PodCreateOption {
    share_option(|pod| pod.config.use_pod_ipc = true)
}

/// Containers joining the pod will share its network namespace.
pub fn with_pod_net() -> PodCreateOption {
    share_option(|pod| pod.config.use_pod_net = true)
}

/// Containers joining the pod will share its PID namespace.
pub fn with_pod_pid() -> PodCreateOption {
    share_option(|pod| pod.config.use_pod_pid = true)
}

/// Containers joining the pod will share its UTS namespace.
pub fn with_pod_uts() -> PodCreateOption {
    share_option(|pod| pod.config.use_pod_uts = true)
}

/// Containers joining the pod will share its user namespace.
pub fn with_pod_user() -> PodCreateOption {
    share_option(|pod| pod.config.use_pod_user = true)
}

/// Containers joining the pod will share its mount namespace.
pub fn with_pod_mount() -> PodCreateOption {
    share_option(|pod| pod.config.use_pod_mount = true)
}

/// Containers joining the pod will share its cgroup namespace.
pub fn with_pod_cgroup_ns() -> PodCreateOption {
    share_option(|pod| pod.config.use_pod_cgroup_ns = true)
}

//--------------------------------------------------------------------------------------------------
// Functions: Helpers
//--------------------------------------------------------------------------------------------------

fn share_option(set: impl FnOnce(&mut Pod) + Send + 'static) -> PodCreateOption {
    Box::new(move |pod| {
        if pod.valid {
            return Err(PodboxError::PodFinalized);
        }

        set(pod);

        Ok(())
    })
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finalized_pod_rejects_options() {
        let mut pod = Pod::new();
        pod.valid = true;

        assert!(matches!(
            with_pod_name("prod")(&mut pod),
            Err(PodboxError::PodFinalized)
        ));
        assert!(matches!(
            with_pod_uts()(&mut pod),
            Err(PodboxError::PodFinalized)
        ));
        assert!(pod.config.name.is_empty());
        assert!(!pod.config.use_pod_uts);
    }

    #[test]
    fn test_pod_name_validation() {
        let mut pod = Pod::new();
        assert!(with_pod_name("prod")(&mut pod).is_ok());
        assert_eq!(pod.config.name, "prod");

        let mut pod = Pod::new();
        assert!(matches!(
            with_pod_name("-prod")(&mut pod),
            Err(PodboxError::InvalidName(_))
        ));
    }

    #[test]
    fn test_sharing_flags_set() {
        let mut pod = Pod::new();
        for opt in [
            with_pod_ipc(),
            with_pod_net(),
            with_pod_pid(),
            with_pod_uts(),
            with_pod_user(),
            with_pod_mount(),
            with_pod_cgroup_ns(),
            with_infra_container(),
        ] {
            assert!(opt(&mut pod).is_ok());
        }

        assert!(pod.config.use_pod_ipc);
        assert!(pod.config.use_pod_net);
        assert!(pod.config.use_pod_pid);
        assert!(pod.config.use_pod_uts);
        assert!(pod.config.use_pod_user);
        assert!(pod.config.use_pod_mount);
        assert!(pod.config.use_pod_cgroup_ns);
        assert!(pod.config.has_infra);
    }

    #[test]
    fn test_create_command_recorded() {
        let mut pod = Pod::new();
        let cmd = vec!["podbox".to_string(), "pod".to_string(), "create".to_string()];
        assert!(with_pod_create_command(cmd.clone())(&mut pod).is_ok());
        assert_eq!(pod.config.create_command, cmd);
    }
}
