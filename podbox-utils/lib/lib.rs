//! `podbox_utils` is a library containing general host utilities for the podbox project.
//!
//! It provides the pieces of host knowledge the configuration engine needs but
//! that do not belong to any one entity: rootless detection, default storage
//! path computation, and ID generation.

#![warn(missing_docs)]

mod env;
mod id;
mod path;
mod rootless;

//--------------------------------------------------------------------------------------------------
// Exports
//--------------------------------------------------------------------------------------------------

pub use env::*;
pub use id::*;
pub use path::*;
pub use rootless::*;
