//! Core types shared across the crafting engine

use serde::{Deserialize, Serialize};
use std::fmt;

/// Item rarity tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rarity {
    Normal,
    Magic,
    Rare,
    Unique,
}

impl Rarity {
    /// Maximum number of prefixes an item of this rarity can hold
    pub fn max_prefixes(self) -> usize {
        match self {
            Rarity::Normal => 0,
            Rarity::Magic => 1,
            Rarity::Rare | Rarity::Unique => 3,
        }
    }

    /// Maximum number of suffixes an item of this rarity can hold
    pub fn max_suffixes(self) -> usize {
        self.max_prefixes()
    }

    /// Cap for the given affix type
    pub fn max_affixes(self, affix: AffixType) -> usize {
        match affix {
            AffixType::Prefix => self.max_prefixes(),
            AffixType::Suffix => self.max_suffixes(),
        }
    }

    /// Lowest craftable rarity whose caps fit the given affix counts
    pub fn smallest_fitting(prefixes: usize, suffixes: usize) -> Rarity {
        [Rarity::Normal, Rarity::Magic, Rarity::Rare]
            .into_iter()
            .find(|r| prefixes <= r.max_prefixes() && suffixes <= r.max_suffixes())
            .unwrap_or(Rarity::Rare)
    }
}

impl fmt::Display for Rarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Rarity::Normal => "Normal",
            Rarity::Magic => "Magic",
            Rarity::Rare => "Rare",
            Rarity::Unique => "Unique",
        };
        f.write_str(name)
    }
}

/// Affix slot on an item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AffixType {
    Prefix,
    Suffix,
}

impl AffixType {
    pub fn all() -> [AffixType; 2] {
        [AffixType::Prefix, AffixType::Suffix]
    }

    /// The other affix type
    pub fn opposite(self) -> AffixType {
        match self {
            AffixType::Prefix => AffixType::Suffix,
            AffixType::Suffix => AffixType::Prefix,
        }
    }

    pub fn mod_type(self) -> ModType {
        match self {
            AffixType::Prefix => ModType::Prefix,
            AffixType::Suffix => ModType::Suffix,
        }
    }
}

impl fmt::Display for AffixType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AffixType::Prefix => f.write_str("prefix"),
            AffixType::Suffix => f.write_str("suffix"),
        }
    }
}

/// Kind of a modifier entry
///
/// Desecrated modifiers occupy ordinary prefix/suffix slots and are flagged
/// with `is_desecrated` on the modifier instead of a separate kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModType {
    Prefix,
    Suffix,
    Implicit,
}

impl ModType {
    /// Affix slot for explicit kinds
    pub fn affix(self) -> Option<AffixType> {
        match self {
            ModType::Prefix => Some(AffixType::Prefix),
            ModType::Suffix => Some(AffixType::Suffix),
            ModType::Implicit => None,
        }
    }
}

impl fmt::Display for ModType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModType::Prefix => f.write_str("prefix"),
            ModType::Suffix => f.write_str("suffix"),
            ModType::Implicit => f.write_str("implicit"),
        }
    }
}

/// Quality grade of an abyssal bone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoneType {
    Gnawed,
    Preserved,
    Ancient,
}

/// Anatomical part of an abyssal bone, which decides the item families it fits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BonePart {
    Jawbone,
    Rib,
    Collarbone,
    Cranium,
    Vertebrae,
}

/// Tags that describe internal bookkeeping rather than player-visible categories
pub const HIDDEN_TAGS: &[&str] = &[
    "essence",
    "desecrated",
    "unrevealed",
    "abyssal_mark",
    "exclusive",
    "corrupted",
];

/// Whether a tag is shown to players (and therefore usable for tag matching)
pub fn is_visible_tag(tag: &str) -> bool {
    !HIDDEN_TAGS.contains(&tag)
}
