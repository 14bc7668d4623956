//! Pod configuration model and creation options.
//!
//! A pod is a group of containers sharing Linux namespaces through an infra
//! container. Pod configuration is assembled from [`PodCreateOption`]
//! closures and becomes immutable once the pod is finalized; the infra
//! container's ID is runtime state and is recorded after finalization.

mod options;

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use getset::Getters;
use serde::{Deserialize, Serialize};

use crate::{PodboxError, PodboxResult};

//--------------------------------------------------------------------------------------------------
// Exports
//--------------------------------------------------------------------------------------------------

pub use options::*;

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// A configuration mutation applied to a pod under construction.
pub type PodCreateOption = Box<dyn FnOnce(&mut Pod) -> PodboxResult<()> + Send>;

/// The immutable-once-finalized configuration of a pod.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Getters)]
#[getset(get = "pub")]
pub struct PodConfig {
    /// Unique 64-hex-character ID
    pub(crate) id: String,

    /// Human-readable name
    pub(crate) name: String,

    /// Namespace scope the pod lives in; empty for no scoping
    pub(crate) namespace: String,

    /// Hostname shared by containers joining the pod's UTS namespace
    pub(crate) hostname: String,

    /// Free-form labels
    pub(crate) labels: HashMap<String, String>,

    /// CGroup parent of the pod's cgroup
    pub(crate) cgroup_parent: String,

    /// Whether a pod-level cgroup is created for member containers to parent
    /// under
    pub(crate) use_pod_cgroup: bool,

    /// Share the IPC namespace through the infra container
    pub(crate) use_pod_ipc: bool,

    /// Share the network namespace through the infra container
    pub(crate) use_pod_net: bool,

    /// Share the PID namespace through the infra container
    pub(crate) use_pod_pid: bool,

    /// Share the UTS namespace through the infra container
    pub(crate) use_pod_uts: bool,

    /// Share the user namespace through the infra container
    pub(crate) use_pod_user: bool,

    /// Share the mount namespace through the infra container
    pub(crate) use_pod_mount: bool,

    /// Share the cgroup namespace through the infra container
    pub(crate) use_pod_cgroup_ns: bool,

    /// Whether the pod has an infra container
    pub(crate) has_infra: bool,

    /// Command that created the pod, recorded for display
    pub(crate) create_command: Vec<String>,

    /// When construction of the pod began
    pub(crate) created: Option<DateTime<Utc>>,
}

/// Mutable runtime state of a pod, separate from its configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PodState {
    /// ID of the pod's infra container, empty until one is registered
    pub(crate) infra_container_id: String,
}

/// A pod under construction or finalized.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pod {
    pub(crate) config: PodConfig,
    pub(crate) state: PodState,
    pub(crate) valid: bool,
}

//--------------------------------------------------------------------------------------------------
// Implementations
//--------------------------------------------------------------------------------------------------

impl Pod {
    /// Allocates a pod with a fresh ID and default configuration.
    pub(crate) fn new() -> Self {
        let config = PodConfig {
            id: podbox_utils::new_id(),
            created: Some(Utc::now()),
            ..PodConfig::default()
        };
        Self {
            config,
            state: PodState::default(),
            valid: false,
        }
    }

    /// The pod's unique ID.
    pub fn id(&self) -> &str {
        &self.config.id
    }

    /// The pod's name.
    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// The pod's namespace scope.
    pub fn namespace(&self) -> &str {
        &self.config.namespace
    }

    /// The pod's configuration.
    pub fn config(&self) -> &PodConfig {
        &self.config
    }

    /// Whether the pod has been finalized.
    pub fn valid(&self) -> bool {
        self.valid
    }

    /// The ID of the pod's infra container.
    ///
    /// Fails when the pod was created without an infra container, or when no
    /// infra container has been registered yet.
    pub fn infra_container_id(&self) -> PodboxResult<&str> {
        if !self.config.has_infra {
            return Err(PodboxError::NoInfraContainer(self.config.id.clone()));
        }
        if self.state.infra_container_id.is_empty() {
            return Err(PodboxError::NoInfraContainer(self.config.id.clone()));
        }
        Ok(&self.state.infra_container_id)
    }

    /// Records the pod's infra container. Infra registration is runtime
    /// state, so it is permitted after finalization.
    pub(crate) fn record_infra_container(&mut self, ctr_id: &str) {
        self.state.infra_container_id = ctr_id.to_string();
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_infra_container_id_requires_infra() {
        let mut pod = Pod::new();
        assert!(matches!(
            pod.infra_container_id(),
            Err(PodboxError::NoInfraContainer(_))
        ));

        // Infra enabled but none registered yet
        pod.config.has_infra = true;
        assert!(matches!(
            pod.infra_container_id(),
            Err(PodboxError::NoInfraContainer(_))
        ));

        pod.record_infra_container("ctr-1");
        assert_eq!(pod.infra_container_id().unwrap(), "ctr-1");
    }

    #[test]
    fn test_new_pod_has_unique_id() {
        let a = Pod::new();
        let b = Pod::new();
        assert_eq!(a.id().len(), 64);
        assert_ne!(a.id(), b.id());
        assert!(!a.valid());
    }
}
