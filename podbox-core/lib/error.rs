//! The errors produced by the configuration engine.
//!
//! Every option function is terminal on failure: the first error aborts the
//! whole entity construction and is surfaced to the caller verbatim.

use thiserror::Error;

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// The result of a podbox-core operation.
pub type PodboxResult<T> = Result<T, PodboxError>;

/// An error from the configuration engine.
#[derive(pretty_error_debug::Debug, Error)]
pub enum PodboxError {
    /// A runtime-level option was applied after the runtime was finalized.
    #[error("runtime configuration has been finalized and can no longer be modified")]
    RuntimeFinalized,

    /// A container option was applied after the container was finalized.
    #[error("container configuration has been finalized and can no longer be modified")]
    ContainerFinalized,

    /// A pod option was applied after the pod was finalized.
    #[error("pod configuration has been finalized and can no longer be modified")]
    PodFinalized,

    /// A volume option was applied after the volume was finalized.
    #[error("volume configuration has been finalized and can no longer be modified")]
    VolumeFinalized,

    /// An option argument failed validation.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A name did not match the identifier pattern.
    #[error("names must match [a-zA-Z0-9][a-zA-Z0-9_.-]*: {0} is not valid")]
    InvalidName(String),

    /// A referenced dependency container is missing or in an incompatible
    /// namespace set.
    #[error("dependency error: {0}")]
    Dependency(String),

    /// A pod was asked for its infra container but has none.
    #[error("pod {0} has no infra container")]
    NoInfraContainer(String),

    /// No container with the given ID exists in the backing store.
    #[error("no container with ID {0} found")]
    NoSuchContainer(String),

    /// No pod with the given ID exists in the backing store.
    #[error("no pod with ID {0} found")]
    NoSuchPod(String),

    /// No volume with the given name exists in the backing store.
    #[error("no volume with name {0} found")]
    NoSuchVolume(String),

    /// An entity with the given ID already exists in the backing store.
    #[error("an entity with ID or name {0} already exists")]
    EntityExists(String),

    /// A secret lookup failed.
    #[error("no secret with name {0} found")]
    SecretNotFound(String),

    /// An underlying filesystem operation failed; propagated unchanged.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
