//! ModifierCatalog - Immutable set of modifier definitions

use super::weights::validate_conditions;
use super::Modifier;
use crate::config::ConfigError;
use crate::types::ModType;
use std::collections::HashSet;

/// All modifier definitions known to the engine
///
/// Built once from configuration and never mutated afterwards; a reload builds
/// a new catalog.
#[derive(Debug, Clone, Default)]
pub struct ModifierCatalog {
    modifiers: Vec<Modifier>,
}

impl ModifierCatalog {
    /// Validate and index a list of modifier definitions
    pub fn new(modifiers: Vec<Modifier>) -> Result<Self, ConfigError> {
        let mut seen = HashSet::new();

        for modifier in &modifiers {
            if modifier.name.trim().is_empty() {
                return Err(ConfigError::ValidationError(
                    "Modifier with empty name".to_string(),
                ));
            }
            // Same name may exist once per kind and tier
            if !seen.insert((modifier.name.as_str(), modifier.mod_type, modifier.tier)) {
                return Err(ConfigError::ValidationError(format!(
                    "Duplicate {} modifier '{}' (tier {})",
                    modifier.mod_type, modifier.name, modifier.tier
                )));
            }
            for range in modifier.ranges() {
                if range.min > range.max {
                    return Err(ConfigError::ValidationError(format!(
                        "Modifier '{}' has min {} greater than max {}",
                        modifier.name, range.min, range.max
                    )));
                }
            }
            if let Some(conditions) = &modifier.weight_conditions {
                validate_conditions(conditions).map_err(|e| {
                    ConfigError::ValidationError(format!("Modifier '{}': {}", modifier.name, e))
                })?;
            }
            if modifier.is_fractured || modifier.is_unrevealed || !modifier.current_values.is_empty() {
                return Err(ConfigError::ValidationError(format!(
                    "Catalog entry '{}' carries instance state",
                    modifier.name
                )));
            }
        }

        Ok(ModifierCatalog { modifiers })
    }

    pub fn len(&self) -> usize {
        self.modifiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modifiers.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Modifier> {
        self.modifiers.iter()
    }

    /// Entries of one kind, in declaration order
    pub fn of_type(&self, mod_type: ModType) -> impl Iterator<Item = &Modifier> {
        self.modifiers.iter().filter(move |m| m.mod_type == mod_type)
    }

    /// Look up an entry by name and kind (lowest tier number wins on ties)
    pub fn get(&self, name: &str, mod_type: ModType) -> Option<&Modifier> {
        self.of_type(mod_type)
            .filter(|m| m.name == name)
            .min_by_key(|m| m.tier)
    }
}
