//! Prelude module for convenient imports
//!
//! ```rust
//! use craft_core::prelude::*;
//! ```

// Item state
pub use crate::item::Item;
pub use crate::modifier::Modifier;
pub use crate::types::{AffixType, ModType, Rarity};

// Content
pub use crate::catalog::{Catalog, SharedCatalog};
pub use crate::config::ConfigError;

// Crafting
pub use crate::error::{CraftError, Rejection};
pub use crate::mechanic::Mechanic;
pub use crate::simulator::{CraftOutcome, RevealDecision, Simulator};
