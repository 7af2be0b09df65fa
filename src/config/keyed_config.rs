use serde::Deserialize;
use std::collections::HashMap;
use tracing::Level;

use crate::errors::ConfigError;
use crate::logging::{parse_level, LogFormat, LoggingConfig};

pub const ENV_AUTO_REGISTER: &str = "KEYED_SERVICES_AUTO_REGISTER";
pub const ENV_LOG_LEVEL: &str = "KEYED_SERVICES_LOG_LEVEL";

/// Keyed service configuration
#[derive(Debug, Clone, PartialEq)]
pub struct KeyedServicesConfig {
    /// Publish the registry, its two facets and the factory into the container
    pub auto_register: bool,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoggingSettings {
    pub level: Level,
    pub format: LogFormat,
}

impl Default for KeyedServicesConfig {
    fn default() -> Self {
        Self {
            auto_register: default_auto_register(),
            logging: LoggingSettings::default(),
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            format: LogFormat::Pretty,
        }
    }
}

/// Partial configurations for loading from files
#[derive(Deserialize, Debug, Default)]
pub struct PartialKeyedServicesConfig {
    auto_register: Option<bool>,
    logging: Option<PartialLoggingSettings>,
}

#[derive(Deserialize, Debug, Default)]
pub struct PartialLoggingSettings {
    level: Option<String>,
    format: Option<String>,
}

fn default_auto_register() -> bool {
    true
}

impl KeyedServicesConfig {
    /// Merge file values over defaults, then environment values over both
    pub fn from_partial_and_env(
        partial: Option<PartialKeyedServicesConfig>,
        env_map: &HashMap<String, String>,
    ) -> Result<Self, ConfigError> {
        let partial = partial.unwrap_or_default();
        let partial_logging = partial.logging.unwrap_or_default();

        let mut auto_register = partial.auto_register.unwrap_or_else(default_auto_register);
        if let Some(value) = env_map.get(ENV_AUTO_REGISTER) {
            auto_register = parse_bool(ENV_AUTO_REGISTER, value)?;
        }

        let level = match env_map.get(ENV_LOG_LEVEL).or(partial_logging.level.as_ref()) {
            Some(value) => parse_level(value)?,
            None => LoggingSettings::default().level,
        };
        let format = match partial_logging.format {
            Some(value) => value.parse()?,
            None => LoggingSettings::default().format,
        };

        Ok(Self {
            auto_register,
            logging: LoggingSettings { level, format },
        })
    }

    /// Logging configuration derived from these settings
    pub fn logging_config(&self) -> LoggingConfig {
        LoggingConfig::default().with_level(self.logging.level, self.logging.format)
    }
}

fn parse_bool(field: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            field: field.to_string(),
            value: value.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = KeyedServicesConfig::from_partial_and_env(None, &HashMap::new()).unwrap();
        assert_eq!(config, KeyedServicesConfig::default());
        assert!(config.auto_register);
    }

    #[test]
    fn test_partial_values_override_defaults() {
        let partial: PartialKeyedServicesConfig = toml::from_str(
            r#"
            auto_register = false

            [logging]
            format = "compact"
            "#,
        )
        .unwrap();

        let config = KeyedServicesConfig::from_partial_and_env(Some(partial), &HashMap::new()).unwrap();
        assert!(!config.auto_register);
        assert_eq!(config.logging.format, LogFormat::Compact);
        assert_eq!(config.logging.level, Level::INFO);
    }

    #[test]
    fn test_env_overrides_file() {
        let partial: PartialKeyedServicesConfig = toml::from_str(
            r#"
            auto_register = false
            [logging]
            level = "warn"
            "#,
        )
        .unwrap();
        let env_map = HashMap::from([
            (ENV_AUTO_REGISTER.to_string(), "yes".to_string()),
            (ENV_LOG_LEVEL.to_string(), "trace".to_string()),
        ]);

        let config = KeyedServicesConfig::from_partial_and_env(Some(partial), &env_map).unwrap();
        assert!(config.auto_register);
        assert_eq!(config.logging.level, Level::TRACE);
    }

    #[test]
    fn test_invalid_boolean() {
        let env_map = HashMap::from([(ENV_AUTO_REGISTER.to_string(), "maybe".to_string())]);
        let err = KeyedServicesConfig::from_partial_and_env(None, &env_map).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref field, .. } if field == ENV_AUTO_REGISTER));
    }

    #[test]
    fn test_logging_config() {
        let config = KeyedServicesConfig::default();
        let logging = config.logging_config();
        assert_eq!(logging.level, Level::INFO);
        assert_eq!(logging.format, LogFormat::Pretty);
    }
}
