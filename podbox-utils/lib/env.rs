//! Utility functions for working with environment variables.

use std::path::PathBuf;

//--------------------------------------------------------------------------------------------------
// Constants
//--------------------------------------------------------------------------------------------------

/// Environment variable overriding the storage graph root
pub const PODBOX_ROOT_ENV_VAR: &str = "PODBOX_ROOT";

/// Environment variable overriding the storage run root
pub const PODBOX_RUNROOT_ENV_VAR: &str = "PODBOX_RUNROOT";

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

/// Returns the graph root override from the environment, if one is set.
pub fn get_graph_root_override() -> Option<PathBuf> {
    std::env::var(PODBOX_ROOT_ENV_VAR).ok().map(PathBuf::from)
}

/// Returns the run root override from the environment, if one is set.
pub fn get_run_root_override() -> Option<PathBuf> {
    std::env::var(PODBOX_RUNROOT_ENV_VAR).ok().map(PathBuf::from)
}
