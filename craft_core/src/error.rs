//! Crafting failures
//!
//! A `Rejection` is an expected domain outcome (wrong rarity, no room, ...) and
//! leaves the item untouched. Configuration problems travel separately as
//! `CraftError::Config` so callers can report them as content bugs.

use crate::config::ConfigError;
use crate::types::{AffixType, Rarity};
use thiserror::Error;

/// Why a mechanic could not be applied to an item
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    #[error("Item is corrupted")]
    Corrupted,
    #[error("Item is mirrored")]
    Mirrored,
    #[error("Requires a {required} item (item is {actual})")]
    WrongRarity { required: Rarity, actual: Rarity },
    #[error("No open {0} slot")]
    NoRoomFor(AffixType),
    #[error("No open affix slots")]
    NoRoom,
    #[error("Item has no modifiers")]
    NoModifiers,
    #[error("Requires at least {required} modifiers (item has {actual})")]
    NotEnoughModifiers { required: usize, actual: usize },
    #[error("No modifiers can be removed (all remaining modifiers are fractured or protected)")]
    NoRemovableModifiers,
    #[error("No eligible {0} modifiers")]
    NoEligibleModifiers(AffixType),
    #[error("No eligible modifiers")]
    NoEligibleAny,
    #[error("Only {rolled} of {required} modifiers could be rolled")]
    IncompleteRoll { required: usize, rolled: usize },
    #[error("Result would exceed the affix limits of a {0} item")]
    CapsExceeded(Rarity),
    #[error("Item already has a fractured modifier")]
    AlreadyFractured,
    #[error("No modifiers can be fractured")]
    NoFracturableModifiers,
    #[error("{omen} cannot be used with {currency}")]
    IncompatibleOmen { omen: String, currency: String },
    #[error("{first} conflicts with {second}")]
    ConflictingOmens { first: String, second: String },
    #[error("Cannot be used on {category} items")]
    UnsupportedCategory { category: String },
    #[error("Item already has a modifier from group {group}")]
    ModGroupPresent { group: String },
    #[error("Item already has a desecrated modifier")]
    HasDesecrated,
    #[error("Item already has an unrevealed modifier")]
    HasUnrevealed,
    #[error("Item already carries {mark}")]
    MarkPresent { mark: String },
    #[error("Item level {item_level} exceeds the maximum of {max}")]
    ItemLevelTooHigh { item_level: u32, max: u32 },
    #[error("No unrevealed modifier with id {0}")]
    UnknownUnrevealed(u32),
    #[error("No desecrated modifiers available to reveal")]
    NoRevealCandidates,
    #[error("No reroll available for this reveal")]
    RerollUnavailable,
    #[error("Invalid candidate choice {0}")]
    InvalidChoice(usize),
    #[error("{candidate} conflicts with existing modifier {existing}")]
    ModifierConflict { candidate: String, existing: String },
}

/// Error returned by mechanics: either a domain rejection or a content bug
#[derive(Error, Debug)]
pub enum CraftError {
    #[error(transparent)]
    Rejected(#[from] Rejection),
    #[error("Configuration error: {0}")]
    Config(String),
}

impl CraftError {
    pub fn is_config_error(&self) -> bool {
        matches!(self, CraftError::Config(_))
    }

    /// The domain rejection, if this is one
    pub fn rejection(&self) -> Option<&Rejection> {
        match self {
            CraftError::Rejected(r) => Some(r),
            CraftError::Config(_) => None,
        }
    }
}

impl From<ConfigError> for CraftError {
    fn from(err: ConfigError) -> Self {
        CraftError::Config(err.to_string())
    }
}
