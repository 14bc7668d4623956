//! Backing-store contract and an in-memory implementation.
//!
//! Entities reference each other only by string ID; the backing store is the
//! sole resolver of those references. The engine adds an entity to the store
//! exactly once, after its configuration has been finalized, and afterwards
//! only reads.

use std::collections::HashMap;
use std::sync::RwLock;

use crate::container::Container;
use crate::pod::Pod;
use crate::volume::Volume;
use crate::{PodboxError, PodboxResult};

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// The contract the engine requires from a persistence backend.
///
/// Lookups return owned snapshots; the store's own synchronization must make
/// a lookup-then-read of a finalized sibling consistent.
pub trait State: Send + Sync {
    /// Resolves a container by ID.
    fn container(&self, id: &str) -> PodboxResult<Container>;

    /// Reports whether a container with the given ID exists.
    fn container_exists(&self, id: &str) -> PodboxResult<bool>;

    /// Inserts a finalized container.
    fn add_container(&self, ctr: &Container) -> PodboxResult<()>;

    /// Resolves a pod by ID.
    fn pod(&self, id: &str) -> PodboxResult<Pod>;

    /// Reports whether a pod with the given ID exists.
    fn pod_exists(&self, id: &str) -> PodboxResult<bool>;

    /// Inserts a finalized pod.
    fn add_pod(&self, pod: &Pod) -> PodboxResult<()>;

    /// Records the infra container of a pod.
    ///
    /// Infra registration is pod runtime state, not configuration, so it may
    /// happen after the pod has been finalized.
    fn set_pod_infra_container(&self, pod_id: &str, ctr_id: &str) -> PodboxResult<()>;

    /// Resolves a volume by name.
    fn volume(&self, name: &str) -> PodboxResult<Volume>;

    /// Reports whether a volume with the given name exists.
    fn volume_exists(&self, name: &str) -> PodboxResult<bool>;

    /// Inserts a finalized volume.
    fn add_volume(&self, volume: &Volume) -> PodboxResult<()>;
}

/// A map-backed store for tests and embedding.
#[derive(Debug, Default)]
pub struct InMemoryState {
    containers: RwLock<HashMap<String, Container>>,
    pods: RwLock<HashMap<String, Pod>>,
    volumes: RwLock<HashMap<String, Volume>>,
}

//--------------------------------------------------------------------------------------------------
// Implementations
//--------------------------------------------------------------------------------------------------

impl InMemoryState {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl State for InMemoryState {
    fn container(&self, id: &str) -> PodboxResult<Container> {
        let containers = read_lock(&self.containers);
        containers
            .get(id)
            .cloned()
            .ok_or_else(|| PodboxError::NoSuchContainer(id.to_string()))
    }

    fn container_exists(&self, id: &str) -> PodboxResult<bool> {
        Ok(read_lock(&self.containers).contains_key(id))
    }

    fn add_container(&self, ctr: &Container) -> PodboxResult<()> {
        let mut containers = write_lock(&self.containers);
        if containers.contains_key(ctr.id()) {
            return Err(PodboxError::EntityExists(ctr.id().to_string()));
        }
        containers.insert(ctr.id().to_string(), ctr.clone());
        Ok(())
    }

    fn pod(&self, id: &str) -> PodboxResult<Pod> {
        let pods = read_lock(&self.pods);
        pods.get(id)
            .cloned()
            .ok_or_else(|| PodboxError::NoSuchPod(id.to_string()))
    }

    fn pod_exists(&self, id: &str) -> PodboxResult<bool> {
        Ok(read_lock(&self.pods).contains_key(id))
    }

    fn add_pod(&self, pod: &Pod) -> PodboxResult<()> {
        let mut pods = write_lock(&self.pods);
        if pods.contains_key(pod.id()) {
            return Err(PodboxError::EntityExists(pod.id().to_string()));
        }
        pods.insert(pod.id().to_string(), pod.clone());
        Ok(())
    }

    fn set_pod_infra_container(&self, pod_id: &str, ctr_id: &str) -> PodboxResult<()> {
        let mut pods = write_lock(&self.pods);
        let pod = pods
            .get_mut(pod_id)
            .ok_or_else(|| PodboxError::NoSuchPod(pod_id.to_string()))?;
        pod.record_infra_container(ctr_id);
        Ok(())
    }

    fn volume(&self, name: &str) -> PodboxResult<Volume> {
        let volumes = read_lock(&self.volumes);
        volumes
            .get(name)
            .cloned()
            .ok_or_else(|| PodboxError::NoSuchVolume(name.to_string()))
    }

    fn volume_exists(&self, name: &str) -> PodboxResult<bool> {
        Ok(read_lock(&self.volumes).contains_key(name))
    }

    fn add_volume(&self, volume: &Volume) -> PodboxResult<()> {
        let mut volumes = write_lock(&self.volumes);
        if volumes.contains_key(volume.name()) {
            return Err(PodboxError::EntityExists(volume.name().to_string()));
        }
        volumes.insert(volume.name().to_string(), volume.clone());
        Ok(())
    }
}

//--------------------------------------------------------------------------------------------------
// Functions: Helpers
//--------------------------------------------------------------------------------------------------

fn read_lock<T>(lock: &RwLock<T>) -> std::sync::RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn write_lock<T>(lock: &RwLock<T>) -> std::sync::RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(|poisoned| poisoned.into_inner())
}
