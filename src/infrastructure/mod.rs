//! 基础设施层
//!
//! 依赖注入容器：键控服务注册表解析实例时依赖的外部协作者

// 容器实现
pub mod container;

// 重新导出API
pub use container::{
    ContainerError, Instance, ServiceContainer, ServiceLifetime, ServiceResolver, ServiceType,
    WeakServiceContainer,
};
