//! Container module

pub mod service_container;
pub mod service_type;

use std::any::Any;
use std::sync::Arc;

pub use service_container::{
    ContainerError, ContainerStats, ServiceContainer, ServiceFactory, WeakServiceContainer,
};
pub use service_type::ServiceType;

/// 类型擦除的服务实例
///
/// 具体类型 `T` 以 `Arc<T>` 的形式存放；抽象（trait object）`I` 以 `Arc<Arc<I>>` 的形式存放
pub type Instance = Arc<dyn Any + Send + Sync>;

// Lifecycle enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceLifetime {
    /// Single instance for the entire application lifetime
    Singleton,
    /// New instance per resolve
    Transient,
    /// Per-scope instance (shared within active scope)
    Scoped,
}

/// 服务解析边界 - 按具体类型解析实例
///
/// 未注册返回 `Ok(None)`；只有服务创建本身失败才返回错误
#[cfg_attr(test, mockall::automock)]
pub trait ServiceResolver: Send + Sync {
    fn resolve_instance(&self, service_type: &ServiceType) -> Result<Option<Instance>, ContainerError>;
}
