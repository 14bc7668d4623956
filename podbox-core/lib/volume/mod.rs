//! Volume configuration model and creation options.
//!
//! Volumes are keyed by name rather than ID. Configuration is assembled from
//! [`VolumeCreateOption`] closures and becomes immutable once the volume is
//! finalized; the ownership-fixup flag is runtime state and stays writable.

mod options;

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use getset::Getters;
use serde::{Deserialize, Serialize};

use crate::PodboxResult;

//--------------------------------------------------------------------------------------------------
// Exports
//--------------------------------------------------------------------------------------------------

pub use options::*;

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// A configuration mutation applied to a volume under construction.
pub type VolumeCreateOption = Box<dyn FnOnce(&mut Volume) -> PodboxResult<()> + Send>;

/// The immutable-once-finalized configuration of a volume.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Getters)]
#[getset(get = "pub")]
pub struct VolumeConfig {
    /// Name of the volume, the primary key
    pub(crate) name: String,

    /// Storage driver backing the volume
    pub(crate) driver: String,

    /// Free-form labels
    pub(crate) labels: HashMap<String, String>,

    /// Driver options
    pub(crate) options: HashMap<String, String>,

    /// UID the volume will be chowned to on first use
    pub(crate) uid: u32,

    /// GID the volume will be chowned to on first use
    pub(crate) gid: u32,

    /// Maximum size of the volume in bytes, 0 for unlimited
    pub(crate) size: u64,

    /// Maximum inode count of the volume, 0 for unlimited
    pub(crate) inodes: u64,

    /// Whether the volume was created anonymously for a container and is
    /// removed with it
    pub(crate) is_anon: bool,

    /// When construction of the volume began
    pub(crate) created: Option<DateTime<Utc>>,
}

/// Mutable runtime state of a volume, separate from its configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VolumeState {
    /// Whether the volume still needs its ownership adjusted on first use
    pub(crate) needs_chown: bool,
}

/// A volume under construction or finalized.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Volume {
    pub(crate) config: VolumeConfig,
    pub(crate) state: VolumeState,
    pub(crate) valid: bool,
}

//--------------------------------------------------------------------------------------------------
// Implementations
//--------------------------------------------------------------------------------------------------

impl Default for VolumeState {
    fn default() -> Self {
        Self { needs_chown: true }
    }
}

impl Volume {
    /// Allocates a volume with default configuration. The name is assigned
    /// by an option; unnamed volumes get an anonymous name from the runtime.
    pub(crate) fn new() -> Self {
        let config = VolumeConfig {
            created: Some(Utc::now()),
            ..VolumeConfig::default()
        };
        Self {
            config,
            state: VolumeState::default(),
            valid: false,
        }
    }

    /// The volume's name.
    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// The volume's configuration.
    pub fn config(&self) -> &VolumeConfig {
        &self.config
    }

    /// Whether the volume has been finalized.
    pub fn valid(&self) -> bool {
        self.valid
    }

    /// Whether the volume still needs its ownership adjusted on first use.
    pub fn needs_chown(&self) -> bool {
        self.state.needs_chown
    }

    /// Marks the ownership fixup as done. This is runtime state, so it is
    /// permitted after finalization.
    pub fn set_needs_chown(&mut self, needs_chown: bool) {
        self.state.needs_chown = needs_chown;
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_needs_chown_defaults_on_and_mutable_after_finalize() {
        let mut vol = Volume::new();
        assert!(vol.needs_chown());

        vol.valid = true;
        vol.set_needs_chown(false);
        assert!(!vol.needs_chown());
    }
}
