//! Global parameter-subsystem configuration.
//!
//! One [`GlobalConfig`] is bound per [`Registry`](crate::core::registry::Registry);
//! binding a second one to the same registry is a configuration error.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::constants;
use crate::error::{ConfigError, Result};

/// Settings shared by every parameter task in one registry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GlobalConfig {
    /// Directory that parameter value hashes are stored in.
    pub hash_dir: PathBuf,
    /// Name of the parameter task supplying the decryption secret.
    pub secret_param: String,
    /// Suffixes that encrypted environment variables can use, in lookup order.
    pub env_suffixes: Vec<String>,
    /// Config file that parameter values can be drawn from.
    pub config_file: Option<PathBuf>,
    /// YAML tags that mark config-document scalars as encrypted.
    ///
    /// Each entry must include the `!` prefix.
    pub vault_tags: Vec<String>,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            hash_dir: PathBuf::from(constants::HASH_DIR),
            secret_param: constants::SECRET_PARAM.to_string(),
            env_suffixes: constants::ENV_SUFFIXES
                .iter()
                .map(ToString::to_string)
                .collect(),
            config_file: None,
            vault_tags: constants::VAULT_TAGS
                .iter()
                .map(ToString::to_string)
                .collect(),
        }
    }
}

impl GlobalConfig {
    /// Load settings from a YAML file, filling omitted fields with defaults.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ReadFile` if the file cannot be read, or
    /// `ConfigError::Parse` if it is malformed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!(path = %path.display(), "loading settings");

        let contents = std::fs::read_to_string(path).map_err(ConfigError::ReadFile)?;
        let config: Self = serde_yaml::from_str(&contents).map_err(ConfigError::Parse)?;
        Ok(config)
    }

    /// Graph node name of the hash directory.
    pub(crate) fn hash_dir_node(&self) -> String {
        self.hash_dir.to_string_lossy().into_owned()
    }

    /// Graph node name of the config file, if one is set.
    pub(crate) fn config_file_node(&self) -> Option<String> {
        self.config_file
            .as_ref()
            .map(|p| p.to_string_lossy().into_owned())
    }
}
