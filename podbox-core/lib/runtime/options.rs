//! Runtime creation options.
//!
//! Applied in caller order by [`Runtime::new`]; the first failure aborts
//! construction. The runtime is finalized exactly once, so every option
//! checks the finalize flag first and fails on an already-built runtime.

use std::path::PathBuf;

use crate::validate::{
    CGROUPFS_CGROUPS_MANAGER, EVENTS_BACKENDS, SYSTEMD_CGROUPS_MANAGER,
};
use crate::PodboxError;

use super::{RuntimeOption, StorageConfig};

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

/// Sets the storage configuration of the runtime.
///
/// Supplying any storage field commits the runtime to an explicit storage
/// configuration: after the call both roots are populated, falling back to
/// rootless-aware host defaults for whichever root was not given. Setting the
/// graph root also rebases the engine's static dir and volume path under it,
/// keeping engine bookkeeping inside the store.
pub fn with_storage_config(config: StorageConfig) -> RuntimeOption {
    Box::new(move |rt| {
        if rt.valid {
            return Err(PodboxError::RuntimeFinalized);
        }

        let mut set_field = false;

        if let Some(run_root) = config.run_root {
            rt.storage_config.run_root = Some(run_root);
            rt.storage_set.run_root_set = true;
            set_field = true;
        }
        if let Some(graph_root) = config.graph_root {
            rt.config.static_dir = graph_root.join("libpod");
            rt.storage_set.static_dir_set = true;
            rt.config.volume_path = graph_root.join("volumes");
            rt.storage_set.volume_path_set = true;

            rt.storage_config.graph_root = Some(graph_root);
            rt.storage_set.graph_root_set = true;
            set_field = true;
        }
        if let Some(name) = config.graph_driver_name {
            rt.storage_config.graph_driver_name = Some(name);
            set_field = true;
        }
        if let Some(options) = config.graph_driver_options {
            rt.storage_config.graph_driver_options = Some(options);
            set_field = true;
        }

        if set_field {
            let defaults = podbox_utils::default_store_paths(
                podbox_utils::is_rootless(),
                podbox_utils::rootless_uid(),
            );
            if rt.storage_config.graph_root.is_none() {
                rt.storage_config.graph_root = Some(defaults.graph_root);
            }
            if rt.storage_config.run_root.is_none() {
                rt.storage_config.run_root = Some(defaults.run_root);
            }
        }

        Ok(())
    })
}

/// Sets the OCI runtime the runtime will use to launch containers.
pub fn with_oci_runtime(runtime: &str) -> RuntimeOption {
    let runtime = runtime.to_string();
    Box::new(move |rt| {
        if rt.valid {
            return Err(PodboxError::RuntimeFinalized);
        }

        if runtime.is_empty() {
            return Err(PodboxError::InvalidArgument(
                "OCI runtime name must be set".to_string(),
            ));
        }

        rt.config.oci_runtime = runtime;

        Ok(())
    })
}

/// Sets the path to the container supervisor binary.
pub fn with_conmon_path(path: &str) -> RuntimeOption {
    let path = path.to_string();
    Box::new(move |rt| {
        if rt.valid {
            return Err(PodboxError::RuntimeFinalized);
        }

        if path.is_empty() {
            return Err(PodboxError::InvalidArgument(
                "conmon path must be set".to_string(),
            ));
        }

        rt.config.conmon_path = PathBuf::from(path);

        Ok(())
    })
}

/// Sets the cgroup manager, cgroupfs or systemd.
pub fn with_cgroup_manager(manager: &str) -> RuntimeOption {
    let manager = manager.to_string();
    Box::new(move |rt| {
        if rt.valid {
            return Err(PodboxError::RuntimeFinalized);
        }

        if manager != CGROUPFS_CGROUPS_MANAGER && manager != SYSTEMD_CGROUPS_MANAGER {
            return Err(PodboxError::InvalidArgument(format!(
                "cgroup manager must be {} or {}",
                CGROUPFS_CGROUPS_MANAGER, SYSTEMD_CGROUPS_MANAGER
            )));
        }

        rt.config.cgroup_manager = manager;

        Ok(())
    })
}

/// Sets the directory for persistent engine bookkeeping.
pub fn with_static_dir(dir: &str) -> RuntimeOption {
    let dir = dir.to_string();
    Box::new(move |rt| {
        if rt.valid {
            return Err(PodboxError::RuntimeFinalized);
        }

        rt.config.static_dir = PathBuf::from(dir);
        rt.storage_set.static_dir_set = true;

        Ok(())
    })
}

/// Sets the directory for per-boot engine state.
pub fn with_tmp_dir(dir: &str) -> RuntimeOption {
    let dir = dir.to_string();
    Box::new(move |rt| {
        if rt.valid {
            return Err(PodboxError::RuntimeFinalized);
        }

        rt.config.tmp_dir = PathBuf::from(dir);

        Ok(())
    })
}

/// Sets the directory volumes are created under.
pub fn with_volume_path(path: &str) -> RuntimeOption {
    let path = path.to_string();
    Box::new(move |rt| {
        if rt.valid {
            return Err(PodboxError::RuntimeFinalized);
        }

        rt.config.volume_path = PathBuf::from(path);
        rt.storage_set.volume_path_set = true;

        Ok(())
    })
}

/// Sets the namespace scope new entities are created in. The empty string
/// corresponds to a lack of scoping.
pub fn with_namespace(ns: &str) -> RuntimeOption {
    let ns = ns.to_string();
    Box::new(move |rt| {
        if rt.valid {
            return Err(PodboxError::RuntimeFinalized);
        }

        rt.config.namespace = ns;

        Ok(())
    })
}

/// Sets the OCI hooks directories, searched in order. Entries must be
/// non-empty and must exist; stat failures are propagated unchanged.
pub fn with_hooks_dirs(dirs: Vec<String>) -> RuntimeOption {
    Box::new(move |rt| {
        if rt.valid {
            return Err(PodboxError::RuntimeFinalized);
        }

        let mut hooks_dirs = Vec::with_capacity(dirs.len());
        for dir in &dirs {
            if dir.is_empty() {
                return Err(PodboxError::InvalidArgument(
                    "empty-string hook directories are not supported".to_string(),
                ));
            }
            std::fs::metadata(dir)?;
            hooks_dirs.push(PathBuf::from(dir));
        }
        rt.config.hooks_dirs = hooks_dirs;

        Ok(())
    })
}

/// Sets the events backend, file, journald or none.
pub fn with_events_logger(logger: &str) -> RuntimeOption {
    let logger = logger.to_string();
    Box::new(move |rt| {
        if rt.valid {
            return Err(PodboxError::RuntimeFinalized);
        }

        if !EVENTS_BACKENDS.contains(&logger.as_str()) {
            return Err(PodboxError::InvalidArgument(format!(
                "{:?} is not a valid events backend",
                logger
            )));
        }

        rt.config.events_logger = logger;

        Ok(())
    })
}

/// Sets the image used for pod infra containers.
pub fn with_default_infra_image(image: &str) -> RuntimeOption {
    let image = image.to_string();
    Box::new(move |rt| {
        if rt.valid {
            return Err(PodboxError::RuntimeFinalized);
        }

        rt.config.infra_image = image;

        Ok(())
    })
}

/// Tells the OCI runtime to run without pivot_root.
pub fn with_no_pivot_root() -> RuntimeOption {
    Box::new(move |rt| {
        if rt.valid {
            return Err(PodboxError::RuntimeFinalized);
        }

        rt.config.no_pivot_root = true;

        Ok(())
    })
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::secret::InMemorySecretStore;
    use crate::state::InMemoryState;
    use crate::Runtime;

    fn build(options: Vec<RuntimeOption>) -> crate::PodboxResult<Runtime> {
        Runtime::new(
            Arc::new(InMemoryState::new()),
            Arc::new(InMemorySecretStore::new()),
            options,
        )
    }

    #[test]
    fn test_finalized_runtime_rejects_options() {
        let mut rt = build(vec![]).unwrap();
        assert!(matches!(
            with_namespace("prod")(&mut rt),
            Err(PodboxError::RuntimeFinalized)
        ));
    }

    #[test]
    fn test_graph_root_derives_engine_paths() {
        let rt = build(vec![with_storage_config(
            StorageConfig::builder().graph_root("/srv/store").build(),
        )])
        .unwrap();

        assert_eq!(
            rt.storage_config().graph_root.as_deref().unwrap(),
            std::path::Path::new("/srv/store")
        );
        assert_eq!(rt.config().static_dir(), std::path::Path::new("/srv/store/libpod"));
        assert_eq!(
            rt.config().volume_path(),
            std::path::Path::new("/srv/store/volumes")
        );
    }

    #[test]
    fn test_partial_storage_config_fills_both_roots() {
        // Only a driver name is supplied; both roots still end up populated
        let rt = build(vec![with_storage_config(
            StorageConfig::builder().graph_driver_name("overlay").build(),
        )])
        .unwrap();

        assert!(rt.storage_config().run_root.is_some());
        assert!(rt.storage_config().graph_root.is_some());
        assert_eq!(
            rt.storage_config().graph_driver_name.as_deref(),
            Some("overlay")
        );

        // Engine paths derive from the defaulted graph root
        let graph_root = rt.storage_config().graph_root.clone().unwrap();
        assert_eq!(rt.config().static_dir(), &graph_root.join("libpod"));
        assert_eq!(rt.config().volume_path(), &graph_root.join("volumes"));
    }

    #[test]
    fn test_explicit_static_dir_survives_graph_root_defaulting() {
        let rt = build(vec![
            with_static_dir("/srv/podbox-static"),
            with_storage_config(StorageConfig::builder().run_root("/run/podbox").build()),
        ])
        .unwrap();

        assert_eq!(
            rt.config().static_dir(),
            std::path::Path::new("/srv/podbox-static")
        );
    }

    #[test]
    fn test_graph_driver_options_recorded() {
        let rt = build(vec![with_storage_config(
            StorageConfig::builder()
                .graph_driver_name("overlay")
                .graph_driver_options(vec!["overlay.mountopt=nodev".to_string()])
                .build(),
        )])
        .unwrap();

        assert_eq!(
            rt.storage_config().graph_driver_options.as_deref(),
            Some(&["overlay.mountopt=nodev".to_string()][..])
        );
    }

    #[test]
    fn test_cgroup_manager_validation() {
        assert!(build(vec![with_cgroup_manager("systemd")]).is_ok());
        assert!(build(vec![with_cgroup_manager("cgroupfs")]).is_ok());
        assert!(matches!(
            build(vec![with_cgroup_manager("runit")]),
            Err(PodboxError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_events_logger_validation() {
        for backend in ["file", "journald", "none"] {
            assert!(build(vec![with_events_logger(backend)]).is_ok());
        }
        assert!(matches!(
            build(vec![with_events_logger("syslog")]),
            Err(PodboxError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_hooks_dirs_validation() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().to_str().unwrap().to_string();

        let rt = build(vec![with_hooks_dirs(vec![path.clone()])]).unwrap();
        assert_eq!(rt.config().hooks_dirs(), &vec![PathBuf::from(&path)]);

        assert!(matches!(
            build(vec![with_hooks_dirs(vec![String::new()])]),
            Err(PodboxError::InvalidArgument(_))
        ));

        let missing = dir.path().join("missing").to_str().unwrap().to_string();
        assert!(matches!(
            build(vec![with_hooks_dirs(vec![missing])]),
            Err(PodboxError::Io(_))
        ));
    }

    #[test]
    fn test_oci_runtime_and_conmon_path_must_be_set() {
        assert!(matches!(
            build(vec![with_oci_runtime("")]),
            Err(PodboxError::InvalidArgument(_))
        ));
        assert!(matches!(
            build(vec![with_conmon_path("")]),
            Err(PodboxError::InvalidArgument(_))
        ));

        let rt = build(vec![
            with_oci_runtime("runc"),
            with_conmon_path("/usr/libexec/podbox/conmon"),
        ])
        .unwrap();
        assert_eq!(rt.config().oci_runtime(), "runc");
    }
}
