use log::{debug, error, warn};
use thiserror::Error;

use crate::infrastructure::container::ContainerError;

/// 键控服务错误
#[derive(Debug, Error)]
pub enum KeyedServiceError {
    #[error("Invalid argument: '{param}' is required")]
    InvalidArgument { param: &'static str },
    #[error("Service '{key}' of type {type_name} is not registered")]
    NotRegistered { key: String, type_name: String },
    #[error("Service of type {actual_type} cannot be used as {expected_type}")]
    TypeCastFailed {
        expected_type: String,
        actual_type: String,
    },
    #[error("The service container is no longer available")]
    ContainerUnavailable,
    #[error("Container error: {0}")]
    Container(#[from] ContainerError),
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl KeyedServiceError {
    pub fn invalid_argument(param: &'static str) -> Self {
        KeyedServiceError::InvalidArgument { param }
    }

    /// 按错误类型记录日志
    pub fn log(&self) {
        match self {
            KeyedServiceError::InvalidArgument { .. }
            | KeyedServiceError::TypeCastFailed { .. }
            | KeyedServiceError::Config(_) => {
                error!("{}", self);
            }
            KeyedServiceError::NotRegistered { .. } => {
                debug!("{}", self);
            }
            KeyedServiceError::ContainerUnavailable | KeyedServiceError::Container(_) => {
                warn!("{}", self);
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read file '{0}': {1}")]
    FileRead(String, #[source] std::io::Error),
    #[error("Failed to parse TOML from file '{0}': {1}")]
    TomlParse(String, #[source] toml::de::Error),
    #[error("Invalid value '{value}' for configuration field '{field}'")]
    InvalidValue { field: String, value: String },
}
