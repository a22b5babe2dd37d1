use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::{LocatorError, LocatorResult};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LocatorConfig {
    /// Name given to the host container created for a lazily spawned global scope.
    #[serde(default = "default_global_container_name")]
    pub global_container_name: String,

    /// Keep a lazily spawned global scope alive across scene transitions.
    #[serde(default = "default_persistent_global")]
    pub persistent_global: bool,

    /// Emit info-level diagnostics. Warnings and errors are always emitted.
    #[serde(default)]
    pub verbose: bool,

    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

fn default_global_container_name() -> String {
    "ServiceLocator [Global]".to_string()
}
fn default_persistent_global() -> bool {
    true
}
fn default_log_filter() -> String {
    "info".to_string()
}

impl Default for LocatorConfig {
    fn default() -> Self {
        Self {
            global_container_name: default_global_container_name(),
            persistent_global: default_persistent_global(),
            verbose: false,
            log_filter: default_log_filter(),
        }
    }
}

impl LocatorConfig {
    pub fn from_toml_str(s: &str) -> LocatorResult<Self> {
        toml::from_str(s).map_err(|e| LocatorError::Config(format!("parse: {e}")))
    }

    /// Missing file means defaults; a file that does not parse is an error.
    pub fn load_or_default(path: impl AsRef<Path>) -> LocatorResult<Self> {
        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(s) => toml::from_str(&s)
                .map_err(|e| LocatorError::Config(format!("parse {}: {}", path.display(), e))),
            Err(_) => Ok(Self::default()),
        }
    }
}
