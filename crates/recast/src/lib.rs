//! ## Crate layout
//! - `core`: declared-type resolver, field builder, field library, and the
//!   serializer orchestration with its save contract.
//!
//! The `prelude` module mirrors the surface used by application code; deeper
//! configuration (registries, hooks, standalone fields) lives under
//! `recast::core`.

pub use recast_core as core;

/// Workspace version re-export for downstream tooling/tests.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use recast_core::{ConfigError, Error, UsageError, ValidateError};

///
/// Prelude
///

pub mod prelude {
    pub use recast_core::prelude::*;
}
