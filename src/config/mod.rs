pub mod keyed_config;
pub mod loader;

// Re-export commonly used types
pub use keyed_config::{KeyedServicesConfig, LoggingSettings};
pub use loader::{ConfigLoader, CONFIG_FILE_NAME};
