//! Crafting content files and the combined raw configuration

use super::{load_toml, load_toml_or_default, parse_toml, ConfigError};
use crate::desecration::BoneDef;
use crate::essence::EssenceDef;
use crate::exclusion::ExclusionRule;
use crate::factory::CurrencyDef;
use crate::modifier::Modifier;
use crate::omen::OmenDef;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModifiersFile {
    #[serde(default)]
    pub modifiers: Vec<Modifier>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExclusionsFile {
    #[serde(default)]
    pub exclusion_rules: Vec<ExclusionRule>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CurrenciesFile {
    #[serde(default)]
    pub currencies: Vec<CurrencyDef>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EssencesFile {
    #[serde(default)]
    pub essences: Vec<EssenceDef>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OmensFile {
    #[serde(default)]
    pub omens: Vec<OmenDef>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BonesFile {
    #[serde(default)]
    pub bones: Vec<BoneDef>,
}

/// Raw crafting content, as read from disk and before validation
#[derive(Debug, Clone, Default)]
pub struct CraftingConfig {
    pub modifiers: Vec<Modifier>,
    pub exclusion_rules: Vec<ExclusionRule>,
    pub currencies: Vec<CurrencyDef>,
    pub essences: Vec<EssenceDef>,
    pub omens: Vec<OmenDef>,
    pub bones: Vec<BoneDef>,
}

impl CraftingConfig {
    /// Load all content files from a directory
    ///
    /// `modifiers.toml` and `currencies.toml` are required; the rest default
    /// to empty tables when absent.
    pub fn load_from_dir(dir: &Path) -> Result<Self, ConfigError> {
        let modifiers: ModifiersFile = load_toml(&dir.join("modifiers.toml"))?;
        let currencies: CurrenciesFile = load_toml(&dir.join("currencies.toml"))?;
        let exclusions: ExclusionsFile = load_toml_or_default(&dir.join("exclusions.toml"))?;
        let essences: EssencesFile = load_toml_or_default(&dir.join("essences.toml"))?;
        let omens: OmensFile = load_toml_or_default(&dir.join("omens.toml"))?;
        let bones: BonesFile = load_toml_or_default(&dir.join("bones.toml"))?;

        log::info!(
            "Loaded crafting content from {:?}: {} modifiers, {} currencies, {} essences, {} omens, {} bones",
            dir,
            modifiers.modifiers.len(),
            currencies.currencies.len(),
            essences.essences.len(),
            omens.omens.len(),
            bones.bones.len()
        );

        Ok(CraftingConfig {
            modifiers: modifiers.modifiers,
            exclusion_rules: exclusions.exclusion_rules,
            currencies: currencies.currencies,
            essences: essences.essences,
            omens: omens.omens,
            bones: bones.bones,
        })
    }

    /// Build a configuration from TOML strings, one per content file
    ///
    /// Empty strings are treated as empty tables.
    pub fn parse(
        modifiers: &str,
        exclusions: &str,
        currencies: &str,
        essences: &str,
        omens: &str,
        bones: &str,
    ) -> Result<Self, ConfigError> {
        let modifiers: ModifiersFile = parse_toml(modifiers)?;
        let exclusions: ExclusionsFile = parse_toml(exclusions)?;
        let currencies: CurrenciesFile = parse_toml(currencies)?;
        let essences: EssencesFile = parse_toml(essences)?;
        let omens: OmensFile = parse_toml(omens)?;
        let bones: BonesFile = parse_toml(bones)?;

        Ok(CraftingConfig {
            modifiers: modifiers.modifiers,
            exclusion_rules: exclusions.exclusion_rules,
            currencies: currencies.currencies,
            essences: essences.essences,
            omens: omens.omens,
            bones: bones.bones,
        })
    }
}
