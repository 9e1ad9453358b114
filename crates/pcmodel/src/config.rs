// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Model configuration.
//!
//! Supports both programmatic and file-based configuration. The type lists
//! extend the built-in `java.lang` / `java.util` / `java.math` tables used by
//! the [`TypeRegistry`](crate::types::TypeRegistry); they never replace them.

use crate::types::registry::{
    COLLECTION_TYPES, MAP_TYPES, ORDERABLE_VALUE_TYPES, VALUE_TYPES,
};
use crate::types::{PrimitiveKind, OBJECT_CLASS};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Model cache and type registry configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Whether new classes consult the metadata source when the caller
    /// does not say otherwise.
    #[serde(default = "default_true")]
    pub load_external_metadata_default: bool,

    /// Extra value classes that support ordering.
    #[serde(default)]
    pub orderable_value_types: Vec<String>,

    /// Extra value classes without ordering.
    #[serde(default)]
    pub value_types: Vec<String>,

    /// Extra single-valued container types.
    #[serde(default)]
    pub collection_types: Vec<String>,

    /// Extra key/value container types.
    #[serde(default)]
    pub map_types: Vec<String>,
}

fn default_true() -> bool {
    true
}

fn is_builtin(name: &str) -> bool {
    [ORDERABLE_VALUE_TYPES, VALUE_TYPES, COLLECTION_TYPES, MAP_TYPES]
        .iter()
        .any(|table| table.contains(&name))
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            load_external_metadata_default: true,
            orderable_value_types: Vec::new(),
            value_types: Vec::new(),
            collection_types: Vec::new(),
            map_types: Vec::new(),
        }
    }
}

impl ModelConfig {
    /// Load configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let lists: [(&str, &[String]); 4] = [
            ("orderable_value_types", &self.orderable_value_types),
            ("value_types", &self.value_types),
            ("collection_types", &self.collection_types),
            ("map_types", &self.map_types),
        ];

        let mut seen: HashSet<&str> = HashSet::new();
        for (list, names) in lists {
            for name in names {
                let name = name.trim();
                if name.is_empty() {
                    return Err(ConfigError::Invalid(format!("{} has an empty entry", list)));
                }
                if PrimitiveKind::from_keyword(name).is_some() {
                    return Err(ConfigError::Invalid(format!(
                        "{} lists primitive keyword '{}'",
                        list, name
                    )));
                }
                if PrimitiveKind::from_wrapper_name(name).is_some() || name == OBJECT_CLASS {
                    return Err(ConfigError::Invalid(format!(
                        "{} lists built-in type '{}'",
                        list, name
                    )));
                }
                if is_builtin(name) {
                    return Err(ConfigError::Invalid(format!(
                        "{} lists '{}', which is already a built-in value or container type",
                        list, name
                    )));
                }
                if !seen.insert(name) {
                    return Err(ConfigError::Invalid(format!(
                        "type '{}' is listed more than once",
                        name
                    )));
                }
            }
        }

        Ok(())
    }

    /// Add an orderable value class.
    pub fn with_orderable_value_type(mut self, name: impl Into<String>) -> Self {
        self.orderable_value_types.push(name.into());
        self
    }

    /// Add a collection container type.
    pub fn with_collection_type(mut self, name: impl Into<String>) -> Self {
        self.collection_types.push(name.into());
        self
    }

    /// Add a map container type.
    pub fn with_map_type(mut self, name: impl Into<String>) -> Self {
        self.map_types.push(name.into());
        self
    }

    /// Set the default for consulting the metadata source.
    pub fn load_external_metadata(mut self, enabled: bool) -> Self {
        self.load_external_metadata_default = enabled;
        self
    }
}
