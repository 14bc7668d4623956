//! In-progress OCI spec generation.
//!
//! The engine only touches the part of the eventual OCI runtime spec it is
//! responsible for keeping consistent: the Linux UID/GID mapping tables.
//! When a user namespace is shared, the referencing container's spec must
//! carry the referenced container's mappings 1:1, in original order.

use getset::Getters;
use serde::{Deserialize, Serialize};

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// A single user-namespace ID translation range.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdMap {
    /// First ID on the host side of the mapping
    pub host_id: u32,

    /// First ID inside the container
    pub container_id: u32,

    /// Number of consecutive IDs the range covers
    pub size: u32,
}

/// The UID/GID mapping configuration of a container.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdMappingOptions {
    /// Use the host UID space unmapped
    pub host_uid_mapping: bool,

    /// Use the host GID space unmapped
    pub host_gid_mapping: bool,

    /// UID translation ranges, in application order
    pub uid_map: Vec<IdMap>,

    /// GID translation ranges, in application order
    pub gid_map: Vec<IdMap>,
}

/// The mutable, in-progress runtime spec attached to a container under
/// construction.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Getters)]
#[getset(get = "pub")]
pub struct SpecGenerator {
    /// Linux UID mappings accumulated so far
    uid_mappings: Vec<IdMap>,

    /// Linux GID mappings accumulated so far
    gid_mappings: Vec<IdMap>,
}

//--------------------------------------------------------------------------------------------------
// Implementations
//--------------------------------------------------------------------------------------------------

impl SpecGenerator {
    /// Removes all Linux UID mappings from the spec.
    pub fn clear_linux_uid_mappings(&mut self) {
        self.uid_mappings.clear();
    }

    /// Removes all Linux GID mappings from the spec.
    pub fn clear_linux_gid_mappings(&mut self) {
        self.gid_mappings.clear();
    }

    /// Appends a Linux UID mapping to the spec.
    pub fn add_linux_uid_mapping(&mut self, host_id: u32, container_id: u32, size: u32) {
        self.uid_mappings.push(IdMap {
            host_id,
            container_id,
            size,
        });
    }

    /// Appends a Linux GID mapping to the spec.
    pub fn add_linux_gid_mapping(&mut self, host_id: u32, container_id: u32, size: u32) {
        self.gid_mappings.push(IdMap {
            host_id,
            container_id,
            size,
        });
    }
}

//--------------------------------------------------------------------------------------------------
// Tests
//--------------------------------------------------------------------------------------------------
