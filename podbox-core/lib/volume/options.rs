//! Volume creation options.
//!
//! Applied in caller order by the runtime's volume builder; the first failure
//! aborts construction. Every option checks the finalize flag first.

use std::collections::HashMap;

use crate::validate::check_name;
use crate::PodboxError;

use super::VolumeCreateOption;

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

/// Sets the volume's name.
pub fn with_volume_name(name: &str) -> VolumeCreateOption {
    let name = name.to_string();
    Box::new(move |vol| {
        if vol.valid {
            return Err(PodboxError::VolumeFinalized);
        }

        check_name(&name)?;
        vol.config.name = name;

        Ok(())
    })
}

/// Sets the storage driver backing the volume.
pub fn with_volume_driver(driver: &str) -> VolumeCreateOption {
    let driver = driver.to_string();
    Box::new(move |vol| {
        if vol.valid {
            return Err(PodboxError::VolumeFinalized);
        }

        vol.config.driver = driver;

        Ok(())
    })
}

/// Adds labels to the volume.
pub fn with_volume_labels(labels: HashMap<String, String>) -> VolumeCreateOption {
    Box::new(move |vol| {
        if vol.valid {
            return Err(PodboxError::VolumeFinalized);
        }

        vol.config.labels = labels.clone();

        Ok(())
    })
}

/// Sets driver options for the volume.
pub fn with_volume_options(options: HashMap<String, String>) -> VolumeCreateOption {
    Box::new(move |vol| {
        if vol.valid {
            return Err(PodboxError::VolumeFinalized);
        }

        vol.config.options = options.clone();

        Ok(())
    })
}

/// Sets the UID the volume will be chowned to on first use.
pub fn with_volume_uid(uid: u32) -> VolumeCreateOption {
    Box::new(move |vol| {
        if vol.valid {
            return Err(PodboxError::VolumeFinalized);
        }

        vol.config.uid = uid;

        Ok(())
    })
}

/// Sets the GID the volume will be chowned to on first use.
pub fn with_volume_gid(gid: u32) -> VolumeCreateOption {
    Box::new(move |vol| {
        if vol.valid {
            return Err(PodboxError::VolumeFinalized);
        }

        vol.config.gid = gid;

        Ok(())
    })
}

/// Sets the maximum size of the volume in bytes.
pub fn with_volume_size(size: u64) -> VolumeCreateOption {
    Box::new(move |vol| {
        if vol.valid {
            return Err(PodboxError::VolumeFinalized);
        }

        vol.config.size = size;

        Ok(())
    })
}

/// Sets the maximum inode count of the volume.
pub fn with_volume_inodes(inodes: u64) -> VolumeCreateOption {
    Box::new(move |vol| {
        if vol.valid {
            return Err(PodboxError::VolumeFinalized);
        }

        vol.config.inodes = inodes;

        Ok(())
    })
}

/// Skips the first-use ownership fixup for the volume.
pub fn with_volume_no_chown() -> VolumeCreateOption {
    Box::new(move |vol| {
        if vol.valid {
            return Err(PodboxError::VolumeFinalized);
        }

        vol.state.needs_chown = false;

        Ok(())
    })
}

/// Marks the volume as anonymously created for a container.
pub(crate) fn with_set_anon() -> VolumeCreateOption {
    Box::new(move |vol| {
        if vol.valid {
            return Err(PodboxError::VolumeFinalized);
        }

        vol.config.is_anon = true;

        Ok(())
    })
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::volume::Volume;

    #[test]
    fn test_finalized_volume_rejects_options() {
        let mut vol = Volume::new();
        vol.valid = true;

        assert!(matches!(
            with_volume_name("data")(&mut vol),
            Err(PodboxError::VolumeFinalized)
        ));
        assert!(matches!(
            with_volume_no_chown()(&mut vol),
            Err(PodboxError::VolumeFinalized)
        ));
        assert!(vol.config.name.is_empty());
        assert!(vol.state.needs_chown);
    }

    #[test]
    fn test_volume_name_validation() {
        let mut vol = Volume::new();
        assert!(with_volume_name("pg.data")(&mut vol).is_ok());
        assert_eq!(vol.name(), "pg.data");

        let mut vol = Volume::new();
        assert!(matches!(
            with_volume_name(".data")(&mut vol),
            Err(PodboxError::InvalidName(_))
        ));
    }

    #[test]
    fn test_no_chown_clears_flag() {
        let mut vol = Volume::new();
        assert!(with_volume_no_chown()(&mut vol).is_ok());
        assert!(!vol.state.needs_chown);
    }

    #[test]
    fn test_quota_fields() {
        let mut vol = Volume::new();
        assert!(with_volume_size(1 << 30)(&mut vol).is_ok());
        assert!(with_volume_inodes(100_000)(&mut vol).is_ok());
        assert_eq!(vol.config.size, 1 << 30);
        assert_eq!(vol.config.inodes, 100_000);
    }
}
