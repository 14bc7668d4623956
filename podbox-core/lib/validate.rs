//! Shared validation patterns and enumerated configuration values.
//!
//! The patterns and value sets here are load-bearing: callers and tests
//! cross-check against them, so they are literal constants rather than
//! derived data.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::{PodboxError, PodboxResult};

//--------------------------------------------------------------------------------------------------
// Constants
//--------------------------------------------------------------------------------------------------

/// Pattern every container, pod, and volume name (and pod hostname) must match
pub static NAME_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new("^[a-zA-Z0-9][a-zA-Z0-9_.-]*$").expect("name pattern is a valid regex")
});

/// Pattern a umask string must match
pub static UMASK_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("^[0-7]{1,4}$").expect("umask pattern is a valid regex"));

/// Restart policy: no policy requested, identical to "no"
pub const RESTART_POLICY_NONE: &str = "";

/// Restart policy: never restart
pub const RESTART_POLICY_NO: &str = "no";

/// Restart policy: restart on nonzero exit
pub const RESTART_POLICY_ON_FAILURE: &str = "on-failure";

/// Restart policy: always restart
pub const RESTART_POLICY_ALWAYS: &str = "always";

/// Restart policy: restart unless explicitly stopped
pub const RESTART_POLICY_UNLESS_STOPPED: &str = "unless-stopped";

/// Log driver writing to the journal
pub const JOURNALD_LOGGING: &str = "journald";

/// Log driver writing kubernetes-style log files
pub const KUBERNETES_LOGGING: &str = "kubernetes";

/// Log driver writing JSON log files
pub const JSON_LOGGING: &str = "json";

/// Log driver that discards output
pub const NO_LOGGING: &str = "none";

/// Log driver passing streams through to the caller
pub const PASSTHROUGH_LOGGING: &str = "passthrough";

/// CGroup mode: no cgroups are created for the container
pub const CGROUPS_DISABLED: &str = "disabled";

/// CGroup mode: cgroups are created normally
pub const CGROUPS_ENABLED: &str = "enabled";

/// CGroup mode: no cgroup for the supervisor process
pub const CGROUPS_NO_CONMON: &str = "no-conmon";

/// CGroup mode: split the cgroup between supervisor and payload
pub const CGROUPS_SPLIT: &str = "split";

/// CGroup manager backed by the cgroup filesystem
pub const CGROUPFS_CGROUPS_MANAGER: &str = "cgroupfs";

/// CGroup manager delegating to systemd
pub const SYSTEMD_CGROUPS_MANAGER: &str = "systemd";

/// Events backend writing to a log file
pub const EVENTS_LOG_FILE: &str = "file";

/// Events backend writing to the journal
pub const EVENTS_JOURNALD: &str = "journald";

/// Events backend that discards events
pub const EVENTS_NONE: &str = "none";

/// The set of accepted restart policies
pub const RESTART_POLICIES: [&str; 5] = [
    RESTART_POLICY_NONE,
    RESTART_POLICY_NO,
    RESTART_POLICY_ON_FAILURE,
    RESTART_POLICY_ALWAYS,
    RESTART_POLICY_UNLESS_STOPPED,
];

/// The set of accepted log drivers
pub const LOG_DRIVERS: [&str; 5] = [
    JOURNALD_LOGGING,
    KUBERNETES_LOGGING,
    JSON_LOGGING,
    NO_LOGGING,
    PASSTHROUGH_LOGGING,
];

/// The set of accepted events backends
pub const EVENTS_BACKENDS: [&str; 3] = [EVENTS_LOG_FILE, EVENTS_JOURNALD, EVENTS_NONE];

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// A 48-bit hardware (MAC) address requested for a container interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HardwareAddr(
    /// Octets in transmission order
    pub [u8; 6],
);

//--------------------------------------------------------------------------------------------------
// Implementations
//--------------------------------------------------------------------------------------------------

impl fmt::Display for HardwareAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let b = &self.0;
        write!(
            f,
            "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
            b[0], b[1], b[2], b[3], b[4], b[5]
        )
    }
}

impl FromStr for HardwareAddr {
    type Err = PodboxError;

    fn from_str(s: &str) -> PodboxResult<Self> {
        let parts: Vec<&str> = s.split(':').collect();
        if parts.len() != 6 {
            return Err(PodboxError::InvalidArgument(format!(
                "invalid MAC address {}",
                s
            )));
        }
        let mut octets = [0u8; 6];
        for (i, part) in parts.iter().enumerate() {
            octets[i] = u8::from_str_radix(part, 16).map_err(|_| {
                PodboxError::InvalidArgument(format!("invalid MAC address {}", s))
            })?;
        }
        Ok(HardwareAddr(octets))
    }
}

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

/// Validates a name against the identifier pattern.
pub fn check_name(name: &str) -> PodboxResult<()> {
    if !NAME_REGEX.is_match(name) {
        return Err(PodboxError::InvalidName(name.to_string()));
    }
    Ok(())
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_pattern() {
        assert!(check_name("web").is_ok());
        assert!(check_name("Web-1.backend_x").is_ok());
        assert!(check_name("9lives").is_ok());

        assert!(check_name("").is_err());
        assert!(check_name("-leading-dash").is_err());
        assert!(check_name("has space").is_err());
        assert!(check_name("slash/name").is_err());
    }

    #[test]
    fn test_umask_pattern() {
        for good in ["0", "22", "022", "0022", "7777"] {
            assert!(UMASK_REGEX.is_match(good), "{} should match", good);
        }
        for bad in ["", "8", "08", "00222", "u=rwx"] {
            assert!(!UMASK_REGEX.is_match(bad), "{} should not match", bad);
        }
    }

    #[test]
    fn test_hardware_addr_round_trip() {
        let mac: HardwareAddr = "0a:1b:2c:3d:4e:5f".parse().unwrap();
        assert_eq!(mac.to_string(), "0a:1b:2c:3d:4e:5f");

        assert!("0a:1b:2c:3d:4e".parse::<HardwareAddr>().is_err());
        assert!("zz:1b:2c:3d:4e:5f".parse::<HardwareAddr>().is_err());
    }
}
