//! craft_core - Currency application engine for affix-based item crafting
//!
//! This library provides:
//! - Catalog: Validated modifiers, exclusion rules and currency definitions
//! - ModifierPool: Weighted, filtered modifier selection
//! - Mechanics: One state transition per currency, with omen decoration
//! - Essences and Desecration: Guaranteed and deferred modifiers
//! - Simulator: Check-then-apply entry point returning structured outcomes

pub mod catalog;
pub mod config;
pub mod desecration;
pub mod error;
pub mod essence;
pub mod exclusion;
pub mod factory;
pub mod item;
pub mod mechanic;
pub mod modifier;
pub mod omen;
pub mod pool;
pub mod prelude;
pub mod simulator;
pub mod types;

// Re-export core types for convenience
pub use catalog::{Catalog, SharedCatalog};
pub use config::{ConfigError, CraftingConfig};
pub use desecration::{BoneDef, RevealSession};
pub use error::{CraftError, Rejection};
pub use essence::{EssenceDef, EssenceEffect, EssenceMechanic, EssenceStrength};
pub use exclusion::{ExclusionEngine, ExclusionRule};
pub use factory::{CurrencyDef, MechanicFactory};
pub use item::{Item, UnrevealedMod};
pub use mechanic::{Currency, Mechanic, MechanicClass};
pub use modifier::{Modifier, ModifierCatalog};
pub use omen::{ComposedMechanic, OmenContext, OmenDef, OmenRule};
pub use pool::{ModifierPool, SelectionFilter};
pub use simulator::{CraftOutcome, RevealDecision, Simulator};
pub use types::{AffixType, BonePart, BoneType, ModType, Rarity};
