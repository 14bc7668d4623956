//! `podbox` is a container-runtime management core for a single host.
//!
//! # Overview
//!
//! podbox builds, validates, and tracks the immutable configuration of
//! containers, pods, and volumes before execution is handed off to an
//! OCI-compliant low-level runtime and its supervisor process. It handles:
//! - Entity configuration through ordered, composable option functions
//! - Namespace-sharing legality across pod boundaries
//! - ID-mapping propagation when user namespaces are shared
//! - One-time finalization of runtime and entity configuration
//!
//! # Architecture
//!
//! podbox consists of several key components:
//!
//! - **Runtime**: The process-wide context through which entities are created
//! - **Container/Pod/Volume**: Entity configuration models and their options
//! - **Dependency resolution**: Cross-entity namespace-sharing validation
//! - **State**: The abstract backing-store contract entities are handed to
//!
//! # Modules
//!
//! - [`container`] - Container configuration and creation options
//! - [`oci`] - In-progress OCI spec generation (ID mappings)
//! - [`pod`] - Pod configuration and creation options
//! - [`runtime`] - Runtime lifecycle and runtime-level options
//! - [`secret`] - Secrets-manager contract
//! - [`state`] - Backing-store contract and in-memory implementation
//! - [`validate`] - Shared validation patterns and enumerated values
//! - [`volume`] - Volume configuration and creation options

#![warn(missing_docs)]

mod error;

//--------------------------------------------------------------------------------------------------
// Exports
//--------------------------------------------------------------------------------------------------

pub mod container;
pub mod oci;
pub mod pod;
pub mod runtime;
pub mod secret;
pub mod state;
pub mod validate;
pub mod volume;

pub use error::*;
pub use runtime::Runtime;
