//! Default storage path computation.
//!
//! The storage run root holds per-boot container state and should live on a
//! tmpfs; the graph root holds image layers and persistent container data.
//! Both change depending on whether the process runs rootless.

use std::path::PathBuf;

use tracing::debug;

use crate::{get_graph_root_override, get_run_root_override};

//--------------------------------------------------------------------------------------------------
// Constants
//--------------------------------------------------------------------------------------------------

/// Subdirectory of the graph/run roots used for container storage
pub const STORAGE_SUBDIR: &str = "containers/storage";

/// Default graph root when running as root
pub const ROOTFUL_GRAPH_ROOT: &str = "/var/lib/containers/storage";

/// Default run root when running as root
pub const ROOTFUL_RUN_ROOT: &str = "/run/containers/storage";

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// Host-computed default storage paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorePaths {
    /// Per-boot runtime state directory
    pub run_root: PathBuf,

    /// Persistent image and container storage directory
    pub graph_root: PathBuf,
}

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

/// Computes the default storage paths for the host.
///
/// Environment overrides win; otherwise rootful processes get the system
/// locations and rootless processes get XDG-derived per-user locations.
pub fn default_store_paths(rootless: bool, uid: u32) -> StorePaths {
    let graph_root = get_graph_root_override().unwrap_or_else(|| {
        if rootless {
            rootless_data_dir().join(STORAGE_SUBDIR)
        } else {
            PathBuf::from(ROOTFUL_GRAPH_ROOT)
        }
    });

    let run_root = get_run_root_override().unwrap_or_else(|| {
        if rootless {
            rootless_runtime_dir(uid).join("containers")
        } else {
            PathBuf::from(ROOTFUL_RUN_ROOT)
        }
    });

    debug!(
        run_root = %run_root.display(),
        graph_root = %graph_root.display(),
        "computed default store paths"
    );

    StorePaths {
        run_root,
        graph_root,
    }
}

//--------------------------------------------------------------------------------------------------
// Functions: Helpers
//--------------------------------------------------------------------------------------------------

fn rootless_data_dir() -> PathBuf {
    dirs::data_dir().unwrap_or_else(|| {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("/tmp"))
            .join(".local/share")
    })
}

fn rootless_runtime_dir(uid: u32) -> PathBuf {
    dirs::runtime_dir().unwrap_or_else(|| PathBuf::from(format!("/run/user/{}", uid)))
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rootful_defaults() {
        // Clear any overrides leaking in from the environment
        std::env::remove_var(crate::PODBOX_ROOT_ENV_VAR);
        std::env::remove_var(crate::PODBOX_RUNROOT_ENV_VAR);

        let paths = default_store_paths(false, 0);
        assert_eq!(paths.graph_root, PathBuf::from(ROOTFUL_GRAPH_ROOT));
        assert_eq!(paths.run_root, PathBuf::from(ROOTFUL_RUN_ROOT));
    }

    #[test]
    fn test_rootless_defaults_are_per_user() {
        std::env::remove_var(crate::PODBOX_ROOT_ENV_VAR);
        std::env::remove_var(crate::PODBOX_RUNROOT_ENV_VAR);

        let paths = default_store_paths(true, 1000);
        assert!(paths.graph_root.ends_with(STORAGE_SUBDIR));
        assert!(!paths.graph_root.starts_with("/var/lib"));
    }
}
