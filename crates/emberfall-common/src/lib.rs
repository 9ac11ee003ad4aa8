//! # Emberfall Common
//!
//! Common types shared across Emberfall subsystems:
//! - String-backed content ID types (items, monsters, locations)
//! - Prelude for convenient imports

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod ids;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::ids::*;
}

pub use prelude::*;
