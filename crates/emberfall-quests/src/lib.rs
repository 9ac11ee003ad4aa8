//! # Emberfall Quests
//!
//! The quest subsystem for Project Emberfall.
//!
//! This crate provides everything between quest data files and the
//! game session:
//! - Quest templates loaded from JSON, grouped by category
//! - Template-to-instance conversion with randomized variable targets
//! - Tier-based daily quest generation with date-stamped ids
//! - Quest lifecycle (available, active, completed, claimed, failed)
//! - Progress routing from game-world events to tracked quests
//! - Reward resolution against player, inventory and item catalog
//! - Compact save records and save-file reconstruction

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod convert;
pub mod daily;
pub mod events;
pub mod instance;
pub mod lifecycle;
pub mod objective;
pub mod reward;
pub mod save;
pub mod service;
pub mod template;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::convert::*;
    pub use crate::daily::*;
    pub use crate::events::*;
    pub use crate::instance::*;
    pub use crate::lifecycle::*;
    pub use crate::objective::*;
    pub use crate::reward::*;
    pub use crate::save::*;
    pub use crate::service::*;
    pub use crate::template::*;
}

pub use prelude::*;
