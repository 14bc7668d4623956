//! Rootless-mode detection.

use nix::unistd::geteuid;

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

/// Returns true when the current process is not running as root.
pub fn is_rootless() -> bool {
    !geteuid().is_root()
}

/// Returns the effective UID of the current process.
pub fn rootless_uid() -> u32 {
    geteuid().as_raw()
}
