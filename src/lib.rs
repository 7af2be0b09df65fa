//! 键控服务
//!
//! 在依赖注入容器之上按 (抽象, 键) 注册和解析服务实现。
//!
//! ```
//! use keyed_services::{
//!     implements, KeyedServiceProviderExt, KeyedServiceRegistrarExt, KeyedServiceRegistry,
//!     ServiceContainer,
//! };
//!
//! trait Notifier: Send + Sync {
//!     fn channel(&self) -> &'static str;
//! }
//!
//! #[derive(Default)]
//! struct Email;
//! #[derive(Default)]
//! struct Sms;
//!
//! impl Notifier for Email {
//!     fn channel(&self) -> &'static str { "email" }
//! }
//! impl Notifier for Sms {
//!     fn channel(&self) -> &'static str { "sms" }
//! }
//!
//! implements!(Email => dyn Notifier);
//! implements!(Sms => dyn Notifier);
//!
//! let container = ServiceContainer::new();
//! let registry = KeyedServiceRegistry::with_container(&container, true);
//! registry.add_singleton::<dyn Notifier, Email>("email").unwrap();
//! registry.add_transient::<dyn Notifier, Sms>("sms").unwrap();
//!
//! let sms = container.get_required_keyed::<dyn Notifier>("sms").unwrap();
//! assert_eq!(sms.channel(), "sms");
//! assert!(container.get_keyed::<dyn Notifier>("fax").unwrap().is_none());
//! ```

pub mod config;
pub mod errors;
pub mod infrastructure;
pub mod keyed;
pub mod logging;

// Re-export commonly used items for convenience
pub use config::{ConfigLoader, KeyedServicesConfig};
pub use errors::{ConfigError, KeyedServiceError};
pub use infrastructure::container::{
    ContainerError, ContainerStats, Instance, ServiceContainer, ServiceLifetime, ServiceResolver,
    ServiceType, WeakServiceContainer,
};
pub use keyed::{
    Implementation, Implements, KeyedServiceFactory, KeyedServiceProviderExt,
    KeyedServiceRegister, KeyedServiceRegisterExt, KeyedServiceRegistrar,
    KeyedServiceRegistrarExt, KeyedServiceRegistry, ServiceKey, TypeTable,
};
pub use logging::{init_logging, LoggingConfig};
