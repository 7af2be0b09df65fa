use std::{collections::HashMap, env, fs, path::Path, path::PathBuf};

use super::keyed_config::{
    KeyedServicesConfig, PartialKeyedServicesConfig, ENV_AUTO_REGISTER, ENV_LOG_LEVEL,
};
use crate::errors::ConfigError;

pub const CONFIG_FILE_NAME: &str = "keyed-services.toml";

/// Configuration loader responsible for loading config from files and environment
pub struct ConfigLoader {
    base_path: Option<PathBuf>,
}

impl ConfigLoader {
    /// Create a new config loader that looks in the current directory
    pub fn new() -> Self {
        Self { base_path: None }
    }

    /// Create a config loader with custom base path (for testing)
    pub fn with_base_path(base_path: PathBuf) -> Self {
        Self {
            base_path: Some(base_path),
        }
    }

    /// Path of the configuration file this loader reads
    pub fn config_path(&self) -> PathBuf {
        match &self.base_path {
            Some(base_path) => base_path.join(CONFIG_FILE_NAME),
            None => PathBuf::from(CONFIG_FILE_NAME),
        }
    }

    /// Load configuration; a missing file means defaults
    pub fn load_config(&self) -> Result<KeyedServicesConfig, ConfigError> {
        let config_path = self.config_path();
        let partial = if config_path.exists() {
            Some(self.load_partial_config(&config_path)?)
        } else {
            tracing::debug!(path = %config_path.display(), "配置文件不存在，使用默认配置");
            None
        };
        KeyedServicesConfig::from_partial_and_env(partial, &self.collect_env_vars())
    }

    /// Load configuration from an explicit file
    pub fn load_from_file(&self, path: &Path) -> Result<KeyedServicesConfig, ConfigError> {
        let partial = self.load_partial_config(path)?;
        KeyedServicesConfig::from_partial_and_env(Some(partial), &self.collect_env_vars())
    }

    /// Load configuration from TOML text
    pub fn load_from_str(&self, content: &str) -> Result<KeyedServicesConfig, ConfigError> {
        let partial = parse_partial("<inline>", content)?;
        KeyedServicesConfig::from_partial_and_env(Some(partial), &self.collect_env_vars())
    }

    fn load_partial_config(&self, config_path: &Path) -> Result<PartialKeyedServicesConfig, ConfigError> {
        let content = fs::read_to_string(config_path).map_err(|e| {
            ConfigError::FileRead(config_path.to_string_lossy().to_string(), e)
        })?;
        parse_partial(&config_path.to_string_lossy(), &content)
    }

    /// Collect relevant environment variables
    fn collect_env_vars(&self) -> HashMap<String, String> {
        let env_keys = [ENV_AUTO_REGISTER, ENV_LOG_LEVEL];

        let mut env_map = HashMap::new();
        for key in &env_keys {
            if let Ok(value) = env::var(key) {
                env_map.insert(key.to_string(), value);
            }
        }
        env_map
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_partial(source: &str, content: &str) -> Result<PartialKeyedServicesConfig, ConfigError> {
    toml::from_str(content).map_err(|e| ConfigError::TomlParse(source.to_string(), e))
}
