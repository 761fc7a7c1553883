//! Catalog - Validated, immutable crafting content
//!
//! A `Catalog` is built once from a `CraftingConfig` and never mutated.
//! `SharedCatalog` lets long-lived callers swap in a reloaded catalog: readers
//! take an `Arc` snapshot and keep it for the whole operation, so a reload
//! never changes data under a running craft.

use crate::config::{ConfigError, CraftingConfig};
use crate::desecration::BoneDef;
use crate::essence::{EssenceDef, EssenceEffect};
use crate::exclusion::ExclusionEngine;
use crate::factory::CurrencyDef;
use crate::modifier::ModifierCatalog;
use crate::omen::OmenDef;
use crate::pool::ModifierPool;
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;

/// All crafting content, validated and indexed by name
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    modifiers: ModifierCatalog,
    exclusions: ExclusionEngine,
    currencies: HashMap<String, CurrencyDef>,
    essences: HashMap<String, EssenceDef>,
    omens: HashMap<String, OmenDef>,
    bones: HashMap<String, BoneDef>,
}

fn index_by_name<T>(
    kind: &str,
    entries: Vec<T>,
    name_of: impl Fn(&T) -> &str,
    taken: &mut HashSet<String>,
) -> Result<HashMap<String, T>, ConfigError> {
    let mut map = HashMap::with_capacity(entries.len());
    for entry in entries {
        let name = name_of(&entry).to_string();
        if name.trim().is_empty() {
            return Err(ConfigError::ValidationError(format!("{} with empty name", kind)));
        }
        if !taken.insert(name.clone()) {
            return Err(ConfigError::ValidationError(format!(
                "Duplicate name '{}' ({})",
                name, kind
            )));
        }
        map.insert(name, entry);
    }
    Ok(map)
}

fn validate_essence(essence: &EssenceDef) -> Result<(), ConfigError> {
    if essence.effects.is_empty() {
        return Err(ConfigError::ValidationError(format!(
            "Essence '{}' has an empty effect table",
            essence.name
        )));
    }
    for effect in &essence.effects {
        if effect.value_min > effect.value_max {
            return Err(ConfigError::ValidationError(format!(
                "Essence '{}' effect for '{}' has min {} greater than max {}",
                essence.name, effect.item_type, effect.value_min, effect.value_max
            )));
        }
    }
    Ok(())
}

/// A stronger essence never grants a lower range than a weaker one for the
/// same effect text on the same item type
fn validate_strength_ladder(essences: &[EssenceDef]) -> Result<(), ConfigError> {
    let mut ladders: HashMap<(&str, &str), Vec<(u32, &str, &EssenceEffect)>> = HashMap::new();
    for essence in essences {
        for effect in &essence.effects {
            ladders
                .entry((effect.effect_text.as_str(), effect.item_type.as_str()))
                .or_default()
                .push((essence.strength.tier(), essence.name.as_str(), effect));
        }
    }

    for ((text, item_type), mut rungs) in ladders {
        // Weakest (highest tier number) first
        rungs.sort_by(|a, b| b.0.cmp(&a.0));
        for pair in rungs.windows(2) {
            let (weak_tier, weak_name, weak) = pair[0];
            let (strong_tier, strong_name, strong) = pair[1];
            if weak_tier == strong_tier {
                continue;
            }
            if strong.value_min < weak.value_min || strong.value_max < weak.value_max {
                return Err(ConfigError::ValidationError(format!(
                    "Essence '{}' grants a lower '{}' range on {} than the weaker '{}'",
                    strong_name, text, item_type, weak_name
                )));
            }
        }
    }
    Ok(())
}

impl Catalog {
    /// Validate raw content and build the catalog
    pub fn from_config(config: CraftingConfig) -> Result<Self, ConfigError> {
        let modifiers = ModifierCatalog::new(config.modifiers)?;
        let exclusions = ExclusionEngine::new(config.exclusion_rules)?;

        for currency in &config.currencies {
            currency.to_currency()?;
        }
        for essence in &config.essences {
            validate_essence(essence)?;
        }
        validate_strength_ladder(&config.essences)?;

        // Currency, essence and bone names share one namespace for the factory
        let mut usable = HashSet::new();
        let currencies = index_by_name("currency", config.currencies, |c| c.name.as_str(), &mut usable)?;
        let essences = index_by_name("essence", config.essences, |e| e.name.as_str(), &mut usable)?;
        let bones = index_by_name("bone", config.bones, |b| b.name.as_str(), &mut usable)?;
        let omens = index_by_name("omen", config.omens, |o| o.name.as_str(), &mut HashSet::new())?;

        log::info!(
            "Built crafting catalog: {} modifiers, {} exclusion rules, {} currencies, {} essences, {} omens, {} bones",
            modifiers.len(),
            exclusions.len(),
            currencies.len(),
            essences.len(),
            omens.len(),
            bones.len()
        );

        Ok(Catalog {
            modifiers,
            exclusions,
            currencies,
            essences,
            omens,
            bones,
        })
    }

    pub fn load_from_dir(dir: &Path) -> Result<Self, ConfigError> {
        Catalog::from_config(CraftingConfig::load_from_dir(dir)?)
    }

    /// Selection view over this catalog's modifiers and exclusion rules
    pub fn pool(&self) -> ModifierPool<'_> {
        ModifierPool::new(&self.modifiers, &self.exclusions)
    }

    pub fn modifiers(&self) -> &ModifierCatalog {
        &self.modifiers
    }

    pub fn exclusions(&self) -> &ExclusionEngine {
        &self.exclusions
    }

    pub fn currency(&self, name: &str) -> Option<&CurrencyDef> {
        self.currencies.get(name)
    }

    pub fn essence(&self, name: &str) -> Option<&EssenceDef> {
        self.essences.get(name)
    }

    pub fn omen(&self, name: &str) -> Option<&OmenDef> {
        self.omens.get(name)
    }

    pub fn bone(&self, name: &str) -> Option<&BoneDef> {
        self.bones.get(name)
    }

    /// Names usable as a currency (orbs, essences and bones), sorted
    pub fn currency_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .currencies
            .keys()
            .chain(self.essences.keys())
            .chain(self.bones.keys())
            .map(String::as_str)
            .collect();
        names.sort_unstable();
        names
    }

    pub fn omen_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.omens.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

/// Catalog handle that supports atomic reloads
#[derive(Debug)]
pub struct SharedCatalog {
    current: RwLock<Arc<Catalog>>,
}

impl SharedCatalog {
    pub fn new(catalog: Catalog) -> Self {
        SharedCatalog {
            current: RwLock::new(Arc::new(catalog)),
        }
    }

    /// The catalog in effect right now; the lock is held only for the clone
    pub fn snapshot(&self) -> Arc<Catalog> {
        Arc::clone(&self.current.read())
    }

    /// Replace the catalog for all subsequent snapshots
    pub fn reload(&self, catalog: Catalog) {
        *self.current.write() = Arc::new(catalog);
        log::info!("Crafting catalog reloaded");
    }

    /// Rebuild from disk; on error the current catalog stays in effect
    pub fn reload_from_dir(&self, dir: &Path) -> Result<(), ConfigError> {
        let catalog = Catalog::load_from_dir(dir)?;
        self.reload(catalog);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::essence::{EffectAffix, EssenceMechanic, EssenceStrength};
    use crate::types::ModType;

    fn config(modifier_name: &str) -> CraftingConfig {
        let modifiers = format!(
            r#"
[[modifiers]]
name = "{}"
mod_type = "prefix"
stat_text = "+# to maximum Life"
stat_min = 10
stat_max = 19
weight = 1000
"#,
            modifier_name
        );
        let currencies = r#"
[[currencies]]
name = "Chaos Orb"
mechanic_class = "chaos"
"#;
        CraftingConfig::parse(&modifiers, "", currencies, "", "", "").unwrap()
    }

    #[test]
    fn test_snapshot_survives_reload() {
        let shared = SharedCatalog::new(Catalog::from_config(config("Hale")).unwrap());
        let before = shared.snapshot();

        shared.reload(Catalog::from_config(config("Robust")).unwrap());
        let after = shared.snapshot();

        assert!(before.modifiers().get("Hale", ModType::Prefix).is_some());
        assert!(after.modifiers().get("Hale", ModType::Prefix).is_none());
        assert!(after.modifiers().get("Robust", ModType::Prefix).is_some());
    }

    #[test]
    fn test_failed_reload_keeps_catalog() {
        let shared = SharedCatalog::new(Catalog::from_config(config("Hale")).unwrap());
        assert!(shared.reload_from_dir(Path::new("/nonexistent")).is_err());
        assert!(shared.snapshot().currency("Chaos Orb").is_some());
    }

    #[test]
    fn test_essence_without_effects_rejected() {
        let mut raw = config("Hale");
        raw.essences.push(EssenceDef {
            name: "Essence of Nothing".to_string(),
            mechanic: crate::essence::EssenceMechanic::MagicToRare,
            strength: Default::default(),
            abyssal_mark: false,
            effects: Vec::new(),
        });
        assert!(matches!(
            Catalog::from_config(raw),
            Err(ConfigError::ValidationError(_))
        ));
    }

    fn body_essence(name: &str, strength: EssenceStrength, min: f64, max: f64) -> EssenceDef {
        EssenceDef {
            name: name.to_string(),
            mechanic: EssenceMechanic::MagicToRare,
            strength,
            abyssal_mark: false,
            effects: vec![EssenceEffect {
                item_type: "armour".to_string(),
                modifier_type: EffectAffix::Prefix,
                effect_text: "+# to maximum Life".to_string(),
                value_min: min,
                value_max: max,
                mod_group: Some("IncreasedLife".to_string()),
                tags: vec!["life".to_string()],
            }],
        }
    }

    #[test]
    fn test_essence_strength_orders_ranges() {
        let mut raw = config("Hale");
        raw.essences.push(body_essence("Lesser Essence of the Body", EssenceStrength::Lesser, 20.0, 29.0));
        raw.essences.push(body_essence("Greater Essence of the Body", EssenceStrength::Greater, 40.0, 49.0));
        assert!(Catalog::from_config(raw.clone()).is_ok());

        raw.essences[1].effects[0].value_max = 25.0;
        raw.essences[1].effects[0].value_min = 15.0;
        assert!(matches!(
            Catalog::from_config(raw),
            Err(ConfigError::ValidationError(msg)) if msg.contains("Greater Essence of the Body")
        ));
    }

    #[test]
    fn test_duplicate_currency_names_rejected() {
        let mut raw = config("Hale");
        raw.currencies.push(raw.currencies[0].clone());
        assert!(Catalog::from_config(raw).is_err());
    }

    #[test]
    fn test_bundled_catalog() {
        let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("../config");
        let catalog = Catalog::load_from_dir(&dir).unwrap();
        assert!(catalog.currency_names().contains(&"Chaos Orb"));
        assert!(catalog.omen("Omen of Homogenising Coronation").is_some());
    }
}
