//! 键控服务注册表
//!
//! 同一个对象提供两个视图：写入视图 [`KeyedServiceRegistrar`] 和读取视图 [`KeyedServiceRegister`]。
//! 注册表可以独立使用，也可以在构造时把自己发布到容器中。

use dashmap::DashMap;
use std::sync::Arc;
use tracing::{debug, trace};

use super::{Implementation, KeyedServiceFactory, ServiceKey, TypeTable};
use crate::config::KeyedServicesConfig;
use crate::errors::KeyedServiceError;
use crate::infrastructure::container::{
    ContainerError, ServiceContainer, ServiceResolver, ServiceType, WeakServiceContainer,
};

/// 写入视图
pub trait KeyedServiceRegistrar: Send + Sync {
    /// 注册表发布到的容器（如果有且仍然存活）
    fn services(&self) -> Option<ServiceContainer>;

    /// 记录 (抽象, 键) -> 实现；同一对已存在时覆盖
    fn add(
        &self,
        interface_type: Option<ServiceType>,
        instance_type: Option<Implementation>,
        key: ServiceKey,
    ) -> Result<(), KeyedServiceError>;
}

/// 读取视图
///
/// 所有方法在抽象缺失时返回 `InvalidArgument { param: "interface_type" }`；
/// 未注册的抽象或键不是错误。
#[cfg_attr(test, mockall::automock)]
pub trait KeyedServiceRegister: Send + Sync {
    fn lookup_implementation(
        &self,
        interface_type: Option<ServiceType>,
        key: &ServiceKey,
    ) -> Result<Option<Implementation>, KeyedServiceError>;

    fn lookup(
        &self,
        interface_type: Option<ServiceType>,
        key: &ServiceKey,
    ) -> Result<Option<ServiceType>, KeyedServiceError> {
        Ok(self
            .lookup_implementation(interface_type, key)?
            .map(|implementation| implementation.service_type()))
    }

    /// 抽象下所有键对应的实现类型
    fn lookup_all(&self, interface_type: Option<ServiceType>) -> Result<Vec<ServiceType>, KeyedServiceError>;

    fn keys(&self, interface_type: Option<ServiceType>) -> Result<Vec<ServiceKey>, KeyedServiceError>;

    fn contains(&self, interface_type: Option<ServiceType>, key: &ServiceKey) -> Result<bool, KeyedServiceError>;

    /// 抽象是否有过任何注册
    fn contains_any(&self, interface_type: Option<ServiceType>) -> Result<bool, KeyedServiceError>;
}

fn require_interface(interface_type: Option<ServiceType>) -> Result<ServiceType, KeyedServiceError> {
    interface_type.ok_or(KeyedServiceError::InvalidArgument {
        param: "interface_type",
    })
}

/// 键控服务注册表：抽象 -> [`TypeTable`]
pub struct KeyedServiceRegistry {
    tables: DashMap<ServiceType, Arc<TypeTable>>,
    services: Option<WeakServiceContainer>,
}

impl KeyedServiceRegistry {
    /// 不与任何容器关联的注册表
    pub fn new() -> Self {
        Self {
            tables: DashMap::new(),
            services: None,
        }
    }

    /// 关联容器的注册表
    ///
    /// 注册表只持有容器根作用域的弱引用，只要还有任一作用域句柄存活就能访问容器。`auto_register` 为 `true` 时向容器注册：
    /// 同一个注册表实例作为 `dyn KeyedServiceRegistrar`、`dyn KeyedServiceRegister` 和
    /// `KeyedServiceRegistry` 单例，以及 [`KeyedServiceFactory`] 单例。
    pub fn with_container(container: &ServiceContainer, auto_register: bool) -> Arc<Self> {
        let registry = Arc::new(Self {
            tables: DashMap::new(),
            services: Some(container.root().downgrade()),
        });
        if auto_register {
            registry.register_into(container);
        }
        registry
    }

    /// 按配置决定是否向容器注册
    pub fn from_config(container: &ServiceContainer, config: &KeyedServicesConfig) -> Arc<Self> {
        Self::with_container(container, config.auto_register)
    }

    fn register_into(self: &Arc<Self>, container: &ServiceContainer) {
        container.register_instance(Arc::clone(self));

        let registrar: Arc<dyn KeyedServiceRegistrar> = self.clone();
        container.register_interface_instance(registrar);
        let register: Arc<dyn KeyedServiceRegister> = self.clone();
        container.register_interface_instance(register);

        let root = container.root().downgrade();
        container.register_singleton(move |c| {
            let register = c.resolve_interface::<dyn KeyedServiceRegister>()?;
            let resolver: Arc<dyn ServiceResolver> = Arc::new(root.clone());
            KeyedServiceFactory::new(Some(register), Some(resolver))
                .map_err(ContainerError::creation_failed::<KeyedServiceFactory>)
        });

        debug!(scope_id = %container.scope_id(), "Keyed service registry registered into container");
    }

    /// 已注册的抽象
    pub fn abstractions(&self) -> Vec<ServiceType> {
        self.tables.iter().map(|entry| *entry.key()).collect()
    }

    /// 某个抽象的映射表
    pub fn table(&self, interface_type: &ServiceType) -> Option<Arc<TypeTable>> {
        self.tables
            .get(interface_type)
            .map(|entry| Arc::clone(entry.value()))
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

impl Default for KeyedServiceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyedServiceRegistrar for KeyedServiceRegistry {
    fn services(&self) -> Option<ServiceContainer> {
        self.services.as_ref()?.upgrade()
    }

    fn add(
        &self,
        interface_type: Option<ServiceType>,
        instance_type: Option<Implementation>,
        key: ServiceKey,
    ) -> Result<(), KeyedServiceError> {
        let interface_type = require_interface(interface_type)?;
        let implementation = instance_type.ok_or(KeyedServiceError::InvalidArgument {
            param: "instance_type",
        })?;

        debug!(
            abstraction = interface_type.name(),
            implementation = implementation.service_type().name(),
            key = %key,
            "Keyed service added"
        );

        // entry 持有分片写锁，并发的首次添加只会创建一张表
        let table = self
            .tables
            .entry(interface_type)
            .or_insert_with(|| Arc::new(TypeTable::new()))
            .clone();
        table.add(key, implementation);
        Ok(())
    }
}

impl KeyedServiceRegister for KeyedServiceRegistry {
    fn lookup_implementation(
        &self,
        interface_type: Option<ServiceType>,
        key: &ServiceKey,
    ) -> Result<Option<Implementation>, KeyedServiceError> {
        let interface_type = require_interface(interface_type)?;
        let implementation = self
            .table(&interface_type)
            .and_then(|table| table.lookup(key));

        trace!(
            abstraction = interface_type.name(),
            key = %key,
            found = implementation.is_some(),
            "Keyed service lookup"
        );
        Ok(implementation)
    }

    fn lookup_all(&self, interface_type: Option<ServiceType>) -> Result<Vec<ServiceType>, KeyedServiceError> {
        let interface_type = require_interface(interface_type)?;
        Ok(self
            .table(&interface_type)
            .map(|table| table.types())
            .unwrap_or_default())
    }

    fn keys(&self, interface_type: Option<ServiceType>) -> Result<Vec<ServiceKey>, KeyedServiceError> {
        let interface_type = require_interface(interface_type)?;
        Ok(self
            .table(&interface_type)
            .map(|table| table.keys())
            .unwrap_or_default())
    }

    fn contains(&self, interface_type: Option<ServiceType>, key: &ServiceKey) -> Result<bool, KeyedServiceError> {
        let interface_type = require_interface(interface_type)?;
        Ok(self
            .table(&interface_type)
            .map_or(false, |table| table.contains_key(key)))
    }

    fn contains_any(&self, interface_type: Option<ServiceType>) -> Result<bool, KeyedServiceError> {
        let interface_type = require_interface(interface_type)?;
        Ok(self.tables.contains_key(&interface_type))
    }
}
