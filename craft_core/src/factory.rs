//! Mechanic factory - Resolve a currency name and omen names into a mechanic
//!
//! Lookup order for the currency name: currencies, then essences, then bones.
//! Unknown names are configuration errors, never domain rejections.

use crate::catalog::Catalog;
use crate::config::{decode_table, ConfigError};
use crate::mechanic::Currency;
use crate::omen::{ComposedMechanic, OmenDef};
use serde::{Deserialize, Serialize};

pub use crate::mechanic::MechanicClass;

/// Currency entry as declared in configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrencyDef {
    pub name: String,
    pub mechanic_class: MechanicClass,
    /// Free-form options decoded per mechanic class
    #[serde(default, skip_serializing_if = "toml::Table::is_empty")]
    pub config_data: toml::Table,
}

impl CurrencyDef {
    pub fn new(name: &str, mechanic_class: MechanicClass) -> Self {
        CurrencyDef {
            name: name.to_string(),
            mechanic_class,
            config_data: toml::Table::new(),
        }
    }

    /// Decode `config_data` into the concrete currency behaviour
    pub fn to_currency(&self) -> Result<Currency, ConfigError> {
        let data = &self.config_data;
        let currency = match self.mechanic_class {
            MechanicClass::Transmutation => Currency::Transmutation(decode_table(data)?),
            MechanicClass::Augmentation => Currency::Augmentation(decode_table(data)?),
            MechanicClass::Alchemy => Currency::Alchemy(decode_table(data)?),
            MechanicClass::Regal => Currency::Regal(decode_table(data)?),
            MechanicClass::Exalted => Currency::Exalted(decode_table(data)?),
            MechanicClass::Chaos => Currency::Chaos(decode_table(data)?),
            MechanicClass::Divine => Currency::Divine,
            MechanicClass::Annulment => Currency::Annulment,
            MechanicClass::Fracturing => Currency::Fracturing,
            MechanicClass::Scouring => Currency::Scouring,
            MechanicClass::Vaal => Currency::Vaal(decode_table(data)?),
            MechanicClass::Chance => Currency::Chance(decode_table(data)?),
            MechanicClass::Mirror => Currency::Mirror,
            MechanicClass::Essence | MechanicClass::Desecration | MechanicClass::Reveal => {
                return Err(ConfigError::ValidationError(format!(
                    "Currency '{}' uses class '{}', which is declared in its own content file",
                    self.name,
                    self.mechanic_class.label()
                )))
            }
        };
        Ok(currency)
    }
}

/// Builds composed mechanics from catalog definitions
#[derive(Debug, Clone, Copy)]
pub struct MechanicFactory<'a> {
    catalog: &'a Catalog,
}

impl<'a> MechanicFactory<'a> {
    pub fn new(catalog: &'a Catalog) -> Self {
        MechanicFactory { catalog }
    }

    /// Resolve a currency, essence or bone name
    pub fn currency(&self, name: &str) -> Result<Currency, ConfigError> {
        if let Some(def) = self.catalog.currency(name) {
            return def.to_currency();
        }
        if let Some(essence) = self.catalog.essence(name) {
            return Ok(Currency::Essence(essence.clone()));
        }
        if let Some(bone) = self.catalog.bone(name) {
            return Ok(Currency::Desecration(bone.clone()));
        }
        Err(ConfigError::UnknownEntry {
            kind: "currency",
            name: name.to_string(),
        })
    }

    pub fn omens(&self, names: &[&str]) -> Result<Vec<OmenDef>, ConfigError> {
        names
            .iter()
            .map(|name| {
                self.catalog
                    .omen(name)
                    .cloned()
                    .ok_or_else(|| ConfigError::UnknownEntry {
                        kind: "omen",
                        name: name.to_string(),
                    })
            })
            .collect()
    }

    /// Currency wrapped with its omens, in the given order
    ///
    /// Omen compatibility is a domain question and is answered when the
    /// mechanic is checked or applied, not here.
    pub fn create(&self, currency: &str, omen_names: &[&str]) -> Result<ComposedMechanic, ConfigError> {
        let base = self.currency(currency)?;
        let omens = self.omens(omen_names)?;
        log::debug!("Composed {} with {} omens", currency, omens.len());
        Ok(ComposedMechanic::new(currency, base, omens))
    }
}
