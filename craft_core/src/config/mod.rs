//! Configuration loading from TOML files

mod content;

pub use content::{
    BonesFile, CraftingConfig, CurrenciesFile, EssencesFile, ExclusionsFile, ModifiersFile,
    OmensFile,
};

use std::fs;
use std::path::Path;
use thiserror::Error;

/// Configuration loading error
///
/// These indicate a content bug (bad catalog data or an unknown name), never a
/// player action that simply did not work.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Configuration validation error: {0}")]
    ValidationError(String),
    #[error("Unknown {kind}: {name}")]
    UnknownEntry { kind: &'static str, name: String },
}

/// Load a TOML file and deserialize it
pub fn load_toml<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config: T = toml::from_str(&content)?;
    Ok(config)
}

/// Load a TOML file if it exists, falling back to the type's default
pub fn load_toml_or_default<T>(path: &Path) -> Result<T, ConfigError>
where
    T: serde::de::DeserializeOwned + Default,
{
    if path.exists() {
        load_toml(path)
    } else {
        Ok(T::default())
    }
}

/// Load a TOML string and deserialize it
pub fn parse_toml<T: serde::de::DeserializeOwned>(content: &str) -> Result<T, ConfigError> {
    let config: T = toml::from_str(content)?;
    Ok(config)
}

/// Decode a free-form `config_data` table into a typed options struct
pub fn decode_table<T: serde::de::DeserializeOwned>(table: &toml::Table) -> Result<T, ConfigError> {
    let value = toml::Value::Table(table.clone());
    Ok(value.try_into()?)
}
