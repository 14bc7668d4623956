//! Runtime context and entity builders.
//!
//! The [`Runtime`] is the explicit context object everything else hangs off:
//! it owns the resolved configuration, the backing store, and the secrets
//! manager, and it is the only way to construct containers, pods, and
//! volumes. Runtime configuration is itself assembled from [`RuntimeOption`]
//! closures and becomes immutable once `Runtime::new` returns.

mod options;

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use getset::Getters;
use serde::{Deserialize, Serialize};
use tracing::debug;
use typed_builder::TypedBuilder;

use crate::container::{self, Container, CtrCreateOption};
use crate::pod::{Pod, PodCreateOption};
use crate::secret::SecretStore;
use crate::state::State;
use crate::validate::{EVENTS_LOG_FILE, SYSTEMD_CGROUPS_MANAGER};
use crate::volume::{self, Volume, VolumeCreateOption};
use crate::{PodboxError, PodboxResult};

//--------------------------------------------------------------------------------------------------
// Exports
//--------------------------------------------------------------------------------------------------

pub use options::*;

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// A configuration mutation applied to a runtime under construction.
pub type RuntimeOption = Box<dyn FnOnce(&mut Runtime) -> PodboxResult<()> + Send>;

/// The immutable-once-finalized configuration of the runtime.
#[derive(Debug, Clone, Serialize, Deserialize, Getters)]
#[getset(get = "pub")]
pub struct RuntimeConfig {
    /// Namespace scope new entities are created in; empty for no scoping
    pub(crate) namespace: String,

    /// Name or path of the OCI runtime binary
    pub(crate) oci_runtime: String,

    /// Path to the container supervisor binary
    pub(crate) conmon_path: PathBuf,

    /// CGroup manager, cgroupfs or systemd
    pub(crate) cgroup_manager: String,

    /// Directory for persistent engine bookkeeping, defaults to a
    /// subdirectory of the graph root
    pub(crate) static_dir: PathBuf,

    /// Directory for per-boot engine state
    pub(crate) tmp_dir: PathBuf,

    /// Directory volumes are created under, defaults to a subdirectory of
    /// the graph root
    pub(crate) volume_path: PathBuf,

    /// OCI hooks directories, searched in order
    pub(crate) hooks_dirs: Vec<PathBuf>,

    /// Events backend, file, journald or none
    pub(crate) events_logger: String,

    /// Image used for pod infra containers
    pub(crate) infra_image: String,

    /// Run the OCI runtime without pivot_root
    pub(crate) no_pivot_root: bool,
}

/// Storage configuration for the runtime.
///
/// Used both as the `with_storage_config` input, where `None` means "not
/// supplied", and as the runtime's resolved storage configuration, where the
/// roots are always populated after `Runtime::new`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TypedBuilder)]
pub struct StorageConfig {
    /// Per-boot container state directory
    #[builder(default, setter(strip_option, into))]
    pub run_root: Option<PathBuf>,

    /// Persistent image and container storage directory
    #[builder(default, setter(strip_option, into))]
    pub graph_root: Option<PathBuf>,

    /// Storage driver name
    #[builder(default, setter(strip_option, into))]
    pub graph_driver_name: Option<String>,

    /// Storage driver options
    #[builder(default, setter(strip_option))]
    pub graph_driver_options: Option<Vec<String>>,
}

/// Tracks which storage-related fields were set explicitly, so defaulting
/// never overwrites a user choice.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct StorageSetFlags {
    pub(crate) run_root_set: bool,
    pub(crate) graph_root_set: bool,
    pub(crate) static_dir_set: bool,
    pub(crate) volume_path_set: bool,
}

/// The engine's context object.
pub struct Runtime {
    pub(crate) config: RuntimeConfig,
    pub(crate) storage_config: StorageConfig,
    pub(crate) storage_set: StorageSetFlags,
    pub(crate) state: Arc<dyn State>,
    pub(crate) secrets: Arc<dyn SecretStore>,
    pub(crate) valid: bool,
}

//--------------------------------------------------------------------------------------------------
// Implementations
//--------------------------------------------------------------------------------------------------

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            namespace: String::new(),
            oci_runtime: "crun".to_string(),
            conmon_path: PathBuf::new(),
            cgroup_manager: SYSTEMD_CGROUPS_MANAGER.to_string(),
            static_dir: PathBuf::new(),
            tmp_dir: PathBuf::new(),
            volume_path: PathBuf::new(),
            hooks_dirs: Vec::new(),
            events_logger: EVENTS_LOG_FILE.to_string(),
            infra_image: String::new(),
            no_pivot_root: false,
        }
    }
}

impl Runtime {
    /// Builds a runtime from the given collaborators and options, applied in
    /// order with the first failure aborting construction. Unset storage
    /// paths are filled with rootless-aware host defaults, and the runtime is
    /// finalized before it is returned; all later runtime options fail.
    pub fn new(
        state: Arc<dyn State>,
        secrets: Arc<dyn SecretStore>,
        options: Vec<RuntimeOption>,
    ) -> PodboxResult<Self> {
        let mut runtime = Self {
            config: RuntimeConfig::default(),
            storage_config: StorageConfig::default(),
            storage_set: StorageSetFlags::default(),
            state,
            secrets,
            valid: false,
        };

        for option in options {
            option(&mut runtime)?;
        }

        let defaults =
            podbox_utils::default_store_paths(podbox_utils::is_rootless(), podbox_utils::rootless_uid());
        if runtime.storage_config.graph_root.is_none() {
            runtime.storage_config.graph_root = Some(defaults.graph_root);
        }
        if runtime.storage_config.run_root.is_none() {
            runtime.storage_config.run_root = Some(defaults.run_root);
        }

        // Both roots are Some from here on
        let graph_root = runtime
            .storage_config
            .graph_root
            .clone()
            .unwrap_or_default();
        let run_root = runtime.storage_config.run_root.clone().unwrap_or_default();
        if !runtime.storage_set.static_dir_set {
            runtime.config.static_dir = graph_root.join("libpod");
        }
        if !runtime.storage_set.volume_path_set {
            runtime.config.volume_path = graph_root.join("volumes");
        }
        if runtime.config.tmp_dir.as_os_str().is_empty() {
            runtime.config.tmp_dir = run_root.join("tmp");
        }

        runtime.valid = true;
        debug!(
            graph_root = %graph_root.display(),
            run_root = %run_root.display(),
            "runtime configuration finalized"
        );

        Ok(runtime)
    }

    /// The runtime's configuration.
    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// The runtime's resolved storage configuration.
    pub fn storage_config(&self) -> &StorageConfig {
        &self.storage_config
    }

    /// Builds a container: allocates defaults, applies the options in order,
    /// validates pod membership, finalizes, and hands the result to the
    /// backing store. The first failing option aborts the construction and
    /// no partial container escapes.
    pub fn new_container(&self, options: Vec<CtrCreateOption>) -> PodboxResult<Container> {
        let mut ctr = Container::new();
        ctr.config.namespace = self.config.namespace.clone();

        for option in options {
            option(&mut ctr)?;
        }

        if !ctr.config.pod.is_empty() {
            let pod = self.state.pod(&ctr.config.pod)?;
            if pod.namespace() != ctr.namespace() {
                return Err(PodboxError::InvalidArgument(format!(
                    "cannot create container in pod {}: pod is in namespace {:?} but container is in namespace {:?}",
                    pod.id(),
                    pod.namespace(),
                    ctr.namespace()
                )));
            }
        }

        ctr.valid = true;
        self.state.add_container(&ctr)?;

        if ctr.config.is_infra && !ctr.config.pod.is_empty() {
            self.state
                .set_pod_infra_container(&ctr.config.pod, ctr.id())?;
        }

        debug!(id = ctr.id(), name = ctr.name(), "created container");
        Ok(ctr)
    }

    /// Builds the infra container for a pod. The membership and infra
    /// options are appended after the caller's, so they cannot be overridden.
    pub fn new_infra_container(
        &self,
        pod: &Pod,
        mut options: Vec<CtrCreateOption>,
    ) -> PodboxResult<Container> {
        options.push(container::with_pod(pod));
        options.push(container::with_is_infra());
        self.new_container(options)
    }

    /// Builds a pod: allocates defaults, applies the options in order,
    /// finalizes, and hands the result to the backing store.
    pub fn new_pod(&self, options: Vec<PodCreateOption>) -> PodboxResult<Pod> {
        let mut pod = Pod::new();
        pod.config.namespace = self.config.namespace.clone();

        for option in options {
            option(&mut pod)?;
        }

        pod.valid = true;
        self.state.add_pod(&pod)?;

        debug!(id = pod.id(), name = pod.name(), "created pod");
        Ok(pod)
    }

    /// Builds a volume. When no name option was supplied the volume gets a
    /// fresh anonymous name and is flagged for removal with its container.
    pub fn new_volume(&self, options: Vec<VolumeCreateOption>) -> PodboxResult<Volume> {
        let mut vol = Volume::new();

        for option in options {
            option(&mut vol)?;
        }

        if vol.name().is_empty() {
            vol.config.name = podbox_utils::new_id();
            volume::with_set_anon()(&mut vol)?;
        }

        vol.valid = true;
        self.state.add_volume(&vol)?;

        debug!(name = vol.name(), "created volume");
        Ok(vol)
    }

    /// Resolves a container by ID through the backing store.
    pub fn container(&self, id: &str) -> PodboxResult<Container> {
        self.state.container(id)
    }

    /// Resolves a pod by ID through the backing store.
    pub fn pod(&self, id: &str) -> PodboxResult<Pod> {
        self.state.pod(id)
    }

    /// Resolves a volume by name through the backing store.
    pub fn volume(&self, name: &str) -> PodboxResult<Volume> {
        self.state.volume(name)
    }

    /// Adds secrets to a container as environment variables, keyed by target
    /// variable name and resolved through the runtime's secrets manager at
    /// application time.
    pub fn with_env_secrets(&self, variables: HashMap<String, String>) -> CtrCreateOption {
        let secrets = Arc::clone(&self.secrets);
        Box::new(move |ctr| {
            if ctr.valid {
                return Err(PodboxError::ContainerFinalized);
            }

            for (target, name) in &variables {
                let secret = secrets.lookup(name)?;
                ctr.config.env_secrets.insert(target.clone(), secret);
            }

            Ok(())
        })
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container;
    use crate::secret::{InMemorySecretStore, Secret};
    use crate::state::InMemoryState;

    fn test_runtime(options: Vec<RuntimeOption>) -> Runtime {
        Runtime::new(
            Arc::new(InMemoryState::new()),
            Arc::new(InMemorySecretStore::new()),
            options,
        )
        .unwrap()
    }

    #[test]
    fn test_runtime_defaults_populate_storage() {
        let rt = test_runtime(vec![]);

        assert!(rt.storage_config.graph_root.is_some());
        assert!(rt.storage_config.run_root.is_some());

        let graph_root = rt.storage_config.graph_root.clone().unwrap();
        assert_eq!(rt.config.static_dir, graph_root.join("libpod"));
        assert_eq!(rt.config.volume_path, graph_root.join("volumes"));
        assert!(!rt.config.tmp_dir.as_os_str().is_empty());
    }

    #[test]
    fn test_new_container_registers_in_state() {
        let rt = test_runtime(vec![]);
        let ctr = rt.new_container(vec![container::with_name("web")]).unwrap();

        assert!(ctr.valid());
        let looked_up = rt.container(ctr.id()).unwrap();
        assert_eq!(looked_up.name(), "web");
    }

    #[test]
    fn test_failing_option_aborts_container_creation() {
        let rt = test_runtime(vec![]);
        let err = rt.new_container(vec![
            container::with_name("web"),
            container::with_stop_signal(0),
        ]);

        assert!(matches!(err, Err(PodboxError::InvalidArgument(_))));
    }

    #[test]
    fn test_container_in_unknown_pod_rejected() {
        let rt = test_runtime(vec![]);
        let ghost = Pod::new();

        let err = rt.new_container(vec![container::with_pod(&ghost)]);
        assert!(matches!(err, Err(PodboxError::NoSuchPod(_))));
    }

    #[test]
    fn test_namespace_scope_must_match_pod() {
        let rt = test_runtime(vec![with_namespace("prod")]);
        let pod = rt.new_pod(vec![]).unwrap();
        assert_eq!(pod.namespace(), "prod");

        // Container overrides its scope away from the pod's
        let err = rt.new_container(vec![
            container::with_pod(&pod),
            container::with_ctr_namespace("dev"),
        ]);
        assert!(matches!(err, Err(PodboxError::InvalidArgument(_))));

        // Matching scope inherited from the runtime is accepted
        let ctr = rt.new_container(vec![container::with_pod(&pod)]).unwrap();
        assert_eq!(ctr.namespace(), "prod");
    }

    #[test]
    fn test_infra_container_registration() {
        let rt = test_runtime(vec![]);
        let pod = rt
            .new_pod(vec![crate::pod::with_infra_container()])
            .unwrap();

        // Snapshot taken before infra creation knows nothing about it
        assert!(pod.infra_container_id().is_err());

        let infra = rt.new_infra_container(&pod, vec![]).unwrap();
        let stored = rt.pod(pod.id()).unwrap();
        assert_eq!(stored.infra_container_id().unwrap(), infra.id());
    }

    #[test]
    fn test_anonymous_volume_naming() {
        let rt = test_runtime(vec![]);
        let vol = rt.new_volume(vec![]).unwrap();

        assert_eq!(vol.name().len(), 64);
        assert!(*vol.config().is_anon());

        let named = rt
            .new_volume(vec![crate::volume::with_volume_name("data")])
            .unwrap();
        assert!(!named.config().is_anon());
    }

    #[test]
    fn test_env_secret_resolution() {
        let secrets = Arc::new(InMemorySecretStore::new());
        secrets.add(Secret {
            id: "s1".into(),
            name: "db-password".into(),
        });
        let rt = Runtime::new(Arc::new(InMemoryState::new()), secrets, vec![]).unwrap();

        let mut variables = HashMap::new();
        variables.insert("DB_PASSWORD".to_string(), "db-password".to_string());
        let ctr = rt
            .new_container(vec![rt.with_env_secrets(variables)])
            .unwrap();
        assert_eq!(ctr.config().env_secrets()["DB_PASSWORD"].id, "s1");

        let mut missing = HashMap::new();
        missing.insert("TOKEN".to_string(), "absent".to_string());
        let err = rt.new_container(vec![rt.with_env_secrets(missing)]);
        assert!(matches!(err, Err(PodboxError::SecretNotFound(_))));
    }

    #[test]
    fn test_duplicate_names_are_distinct_entities() {
        // Names are not unique keys in the store; IDs are
        let rt = test_runtime(vec![]);
        let a = rt.new_container(vec![container::with_name("web")]).unwrap();
        let b = rt.new_container(vec![container::with_name("web")]).unwrap();
        assert_ne!(a.id(), b.id());
    }
}
