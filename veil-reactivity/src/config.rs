//! Configuration parsing and management.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Read(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Behaviour switches of a [`Reactivity`](crate::Reactivity) context
///
/// Every field is optional in YAML/JSON input and defaults to `true`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReactivityConfig {
    /// Warn when a wrap function receives a non-object
    #[serde(default = "default_true")]
    pub warn_on_non_object: bool,

    /// Warn when a readonly view refuses a write or delete
    #[serde(default = "default_true")]
    pub warn_on_readonly_mutation: bool,

    /// Retry `includes`/`indexOf`/`lastIndexOf` with the raw argument when a
    /// view was searched for and not found
    #[serde(default = "default_true")]
    pub retry_search_with_raw: bool,

    /// Hold back notifications from `push`/`pop`/`shift`/`unshift`/`splice`
    /// until the method returns
    #[serde(default = "default_true")]
    pub defer_array_mutation_notifications: bool,
}

fn default_true() -> bool {
    true
}

impl Default for ReactivityConfig {
    fn default() -> Self {
        Self {
            warn_on_non_object: true,
            warn_on_readonly_mutation: true,
            retry_search_with_raw: true,
            defer_array_mutation_notifications: true,
        }
    }
}

impl ReactivityConfig {
    pub fn from_yaml_str(contents: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(contents)?)
    }

    pub fn from_json_str(contents: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(contents)?)
    }

    /// Load from a file; `.json` files are parsed as JSON, anything else as YAML
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if is_json {
            Self::from_json_str(&contents)
        } else {
            Self::from_yaml_str(&contents)
        }
    }

    /// Silence both diagnostics
    pub fn quiet() -> Self {
        Self {
            warn_on_non_object: false,
            warn_on_readonly_mutation: false,
            ..Self::default()
        }
    }
}
