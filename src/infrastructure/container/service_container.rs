//! 依赖注入容器实现
//!
//! 解决以下问题：
//! - 类型擦除和向下转型（具体类型与 trait object 两种形式）
//! - 单例与作用域实例的并发安全（每个类型一个 OnceCell，只创建一次）
//! - 注册表与容器之间的循环引用（提供弱引用句柄）

use dashmap::DashMap;
use once_cell::sync::OnceCell;
use std::any::TypeId;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Weak};
use tracing::{debug, trace};
use uuid::Uuid;

use super::{Instance, ServiceLifetime, ServiceResolver, ServiceType};

/// 容器错误类型
#[derive(Debug)]
pub enum ContainerError {
    /// 服务未注册
    ServiceNotRegistered { type_name: String },
    /// 服务创建失败
    ServiceCreationFailed { service_type: String, reason: String },
    /// 类型转换失败
    TypeCastFailed {
        expected_type: String,
        actual_type: String,
    },
}

impl ContainerError {
    /// 包装工厂内部的错误
    pub fn creation_failed<T: ?Sized + 'static>(reason: impl fmt::Display) -> Self {
        ContainerError::ServiceCreationFailed {
            service_type: std::any::type_name::<T>().to_string(),
            reason: reason.to_string(),
        }
    }
}

impl fmt::Display for ContainerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContainerError::ServiceNotRegistered { type_name } => {
                write!(f, "Service '{}' is not registered", type_name)
            }
            ContainerError::ServiceCreationFailed { service_type, reason } => {
                write!(f, "Failed to create service '{}': {}", service_type, reason)
            }
            ContainerError::TypeCastFailed {
                expected_type,
                actual_type,
            } => {
                write!(
                    f,
                    "Type cast failed: expected '{}', found '{}'",
                    expected_type, actual_type
                )
            }
        }
    }
}

impl std::error::Error for ContainerError {}

/// 服务工厂trait - 产出类型擦除的实例
pub trait ServiceFactory: Send + Sync {
    /// 创建服务实例
    fn create(&self, container: &ServiceContainer) -> Result<Instance, ContainerError>;

    /// 工厂产出的服务类型
    fn service_type(&self) -> ServiceType;
}

/// 函数式服务工厂
struct FnServiceFactory<F> {
    factory_fn: F,
    service_type: ServiceType,
}

impl<F> ServiceFactory for FnServiceFactory<F>
where
    F: Fn(&ServiceContainer) -> Result<Instance, ContainerError> + Send + Sync,
{
    fn create(&self, container: &ServiceContainer) -> Result<Instance, ContainerError> {
        (self.factory_fn)(container)
    }

    fn service_type(&self) -> ServiceType {
        self.service_type
    }
}

/// 服务注册信息
#[derive(Clone)]
struct ServiceDescriptor {
    lifetime: ServiceLifetime,
    factory: Arc<dyn ServiceFactory>,
}

type InstanceCache = DashMap<TypeId, Arc<OnceCell<Instance>>>;

/// 内部容器统计信息（原子计数器）
#[derive(Default)]
struct InnerStats {
    total_resolutions: AtomicUsize,
    cache_hits: AtomicUsize,
    cache_misses: AtomicUsize,
    transient_creations: AtomicUsize,
}

/// 所有作用域共享的状态
struct ContainerInner {
    descriptors: DashMap<TypeId, ServiceDescriptor>,
    singletons: InstanceCache,
    stats: InnerStats,
    /// 根作用域随共享状态存活，与根句柄是否释放无关
    root: Arc<Scope>,
}

/// 作用域 - 缓存 `Scoped` 生命周期的实例
struct Scope {
    id: Uuid,
    instances: InstanceCache,
}

impl Scope {
    fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            instances: DashMap::new(),
        }
    }
}

/// 服务容器
///
/// 克隆得到的是同一个容器（同一作用域）的另一个句柄；
/// [`ServiceContainer::create_scope`] 得到共享注册和单例、但拥有独立作用域缓存的新句柄。
#[derive(Clone)]
pub struct ServiceContainer {
    inner: Arc<ContainerInner>,
    scope: Arc<Scope>,
}

impl ServiceContainer {
    /// 创建新的容器实例（根作用域）
    pub fn new() -> Self {
        let root = Arc::new(Scope::new());
        Self {
            inner: Arc::new(ContainerInner {
                descriptors: DashMap::new(),
                singletons: DashMap::new(),
                stats: InnerStats::default(),
                root: Arc::clone(&root),
            }),
            scope: root,
        }
    }

    /// 注册具体类型 `T` 的服务工厂
    pub fn register<T, F>(&self, lifetime: ServiceLifetime, factory: F)
    where
        F: Fn(&ServiceContainer) -> Result<T, ContainerError> + Send + Sync + 'static,
        T: Send + Sync + 'static,
    {
        let service_type = ServiceType::of::<T>();
        let factory_fn = move |container: &ServiceContainer| -> Result<Instance, ContainerError> {
            Ok(Arc::new(factory(container)?))
        };
        self.insert_descriptor(service_type, lifetime, Arc::new(FnServiceFactory { factory_fn, service_type }));
    }

    /// 注册单例服务 - 便捷方法
    pub fn register_singleton<T, F>(&self, factory: F)
    where
        F: Fn(&ServiceContainer) -> Result<T, ContainerError> + Send + Sync + 'static,
        T: Send + Sync + 'static,
    {
        self.register(ServiceLifetime::Singleton, factory);
    }

    /// 注册作用域服务 - 便捷方法
    pub fn register_scoped<T, F>(&self, factory: F)
    where
        F: Fn(&ServiceContainer) -> Result<T, ContainerError> + Send + Sync + 'static,
        T: Send + Sync + 'static,
    {
        self.register(ServiceLifetime::Scoped, factory);
    }

    /// 注册瞬态服务 - 便捷方法
    pub fn register_transient<T, F>(&self, factory: F)
    where
        F: Fn(&ServiceContainer) -> Result<T, ContainerError> + Send + Sync + 'static,
        T: Send + Sync + 'static,
    {
        self.register(ServiceLifetime::Transient, factory);
    }

    /// 注册已有实例（单例）
    pub fn register_instance<T: Send + Sync + 'static>(&self, instance: Arc<T>) {
        let service_type = ServiceType::of::<T>();
        let factory_fn = move |_: &ServiceContainer| -> Result<Instance, ContainerError> {
            Ok(instance.clone())
        };
        self.insert_descriptor(
            service_type,
            ServiceLifetime::Singleton,
            Arc::new(FnServiceFactory { factory_fn, service_type }),
        );
    }

    /// 注册抽象 `I`（通常是 `dyn Trait`）的服务工厂
    pub fn register_interface<I, F>(&self, lifetime: ServiceLifetime, factory: F)
    where
        I: ?Sized + Send + Sync + 'static,
        F: Fn(&ServiceContainer) -> Result<Arc<I>, ContainerError> + Send + Sync + 'static,
    {
        let service_type = ServiceType::of::<I>();
        let factory_fn = move |container: &ServiceContainer| -> Result<Instance, ContainerError> {
            Ok(Arc::new(factory(container)?))
        };
        self.insert_descriptor(service_type, lifetime, Arc::new(FnServiceFactory { factory_fn, service_type }));
    }

    /// 以抽象 `I` 注册已有实例（单例）
    pub fn register_interface_instance<I>(&self, instance: Arc<I>)
    where
        I: ?Sized + Send + Sync + 'static,
    {
        self.register_interface::<I, _>(ServiceLifetime::Singleton, move |_| Ok(instance.clone()));
    }

    fn insert_descriptor(
        &self,
        service_type: ServiceType,
        lifetime: ServiceLifetime,
        factory: Arc<dyn ServiceFactory>,
    ) {
        let type_id = service_type.id();
        self.inner
            .descriptors
            .insert(type_id, ServiceDescriptor { lifetime, factory });
        // 重新注册后旧的缓存实例不再有效
        self.inner.singletons.remove(&type_id);
        self.scope.instances.remove(&type_id);

        debug!(
            service = service_type.name(),
            lifetime = ?lifetime,
            "Service registered"
        );
    }

    /// 解析具体类型 `T` - 主要API
    pub fn resolve<T: Send + Sync + 'static>(&self) -> Result<Arc<T>, ContainerError> {
        let service_type = ServiceType::of::<T>();
        let instance = self
            .resolve_descriptor(&service_type)?
            .ok_or_else(|| ContainerError::ServiceNotRegistered {
                type_name: service_type.name().to_string(),
            })?;

        instance.downcast::<T>().map_err(|_| ContainerError::TypeCastFailed {
            expected_type: service_type.name().to_string(),
            actual_type: "unknown type".to_string(),
        })
    }

    /// 解析抽象 `I`（通过 `register_interface` 注册）
    pub fn resolve_interface<I>(&self) -> Result<Arc<I>, ContainerError>
    where
        I: ?Sized + Send + Sync + 'static,
    {
        let service_type = ServiceType::of::<I>();
        let instance = self
            .resolve_descriptor(&service_type)?
            .ok_or_else(|| ContainerError::ServiceNotRegistered {
                type_name: service_type.name().to_string(),
            })?;

        instance
            .downcast::<Arc<I>>()
            .map(|boxed| Arc::clone(&*boxed))
            .map_err(|_| ContainerError::TypeCastFailed {
                expected_type: std::any::type_name::<Arc<I>>().to_string(),
                actual_type: "unknown type".to_string(),
            })
    }

    /// 检查服务是否已注册（具体类型或抽象均可）
    pub fn is_registered<T: ?Sized + 'static>(&self) -> bool {
        self.inner.descriptors.contains_key(&TypeId::of::<T>())
    }

    /// 所有已注册的服务类型
    pub fn registered_services(&self) -> Vec<ServiceType> {
        self.inner
            .descriptors
            .iter()
            .map(|entry| entry.value().factory.service_type())
            .collect()
    }

    /// 创建新的作用域：共享注册信息和单例，作用域实例独立缓存
    pub fn create_scope(&self) -> ServiceContainer {
        let scope = Scope::new();
        debug!(scope_id = %scope.id, parent_scope_id = %self.scope.id, "Scope created");
        Self {
            inner: Arc::clone(&self.inner),
            scope: Arc::new(scope),
        }
    }

    /// 当前作用域ID
    pub fn scope_id(&self) -> Uuid {
        self.scope.id
    }

    /// 根作用域的句柄；任一作用域句柄存活时都可以取得
    pub fn root(&self) -> ServiceContainer {
        Self {
            inner: Arc::clone(&self.inner),
            scope: Arc::clone(&self.inner.root),
        }
    }

    pub fn is_root(&self) -> bool {
        Arc::ptr_eq(&self.scope, &self.inner.root)
    }

    /// 创建不延长容器生命周期的弱引用句柄
    pub fn downgrade(&self) -> WeakServiceContainer {
        WeakServiceContainer {
            inner: Arc::downgrade(&self.inner),
            scope: Arc::downgrade(&self.scope),
        }
    }

    /// 获取容器统计信息
    pub fn get_stats(&self) -> ContainerStats {
        let stats = &self.inner.stats;
        ContainerStats {
            total_resolutions: stats.total_resolutions.load(Ordering::Relaxed),
            cache_hits: stats.cache_hits.load(Ordering::Relaxed),
            cache_misses: stats.cache_misses.load(Ordering::Relaxed),
            transient_creations: stats.transient_creations.load(Ordering::Relaxed),
            registered_services: self.inner.descriptors.len(),
        }
    }

    fn resolve_descriptor(&self, service_type: &ServiceType) -> Result<Option<Instance>, ContainerError> {
        self.inner
            .stats
            .total_resolutions
            .fetch_add(1, Ordering::Relaxed);

        // 先克隆出注册信息再调用工厂，工厂内部可以继续解析其他服务
        let descriptor = match self.inner.descriptors.get(&service_type.id()) {
            Some(entry) => entry.value().clone(),
            None => {
                trace!(service = service_type.name(), "Service not registered");
                return Ok(None);
            }
        };

        let instance = match descriptor.lifetime {
            ServiceLifetime::Transient => {
                self.inner
                    .stats
                    .transient_creations
                    .fetch_add(1, Ordering::Relaxed);
                descriptor.factory.create(self)?
            }
            ServiceLifetime::Singleton => {
                self.get_or_create(&self.inner.singletons, service_type, &descriptor)?
            }
            ServiceLifetime::Scoped => {
                self.get_or_create(&self.scope.instances, service_type, &descriptor)?
            }
        };

        trace!(
            service = service_type.name(),
            lifetime = ?descriptor.lifetime,
            scope_id = %self.scope.id,
            "Service resolved"
        );
        Ok(Some(instance))
    }

    fn get_or_create(
        &self,
        cache: &InstanceCache,
        service_type: &ServiceType,
        descriptor: &ServiceDescriptor,
    ) -> Result<Instance, ContainerError> {
        // 获取或创建OnceCell
        let cell = cache
            .entry(service_type.id())
            .or_insert_with(|| Arc::new(OnceCell::new()))
            .clone();

        if let Some(instance) = cell.get() {
            self.inner.stats.cache_hits.fetch_add(1, Ordering::Relaxed);
            return Ok(instance.clone());
        }

        self.inner.stats.cache_misses.fetch_add(1, Ordering::Relaxed);
        // 使用OnceCell确保只创建一次
        cell.get_or_try_init(|| descriptor.factory.create(self))
            .cloned()
    }
}

impl Default for ServiceContainer {
    fn default() -> Self {
        Self::new()
    }
}

impl ServiceResolver for ServiceContainer {
    fn resolve_instance(&self, service_type: &ServiceType) -> Result<Option<Instance>, ContainerError> {
        self.resolve_descriptor(service_type)
    }
}

/// 容器的弱引用句柄
///
/// 容器全部句柄释放后，解析结果为 `Ok(None)`
#[derive(Clone)]
pub struct WeakServiceContainer {
    inner: Weak<ContainerInner>,
    scope: Weak<Scope>,
}

impl WeakServiceContainer {
    pub fn upgrade(&self) -> Option<ServiceContainer> {
        Some(ServiceContainer {
            inner: self.inner.upgrade()?,
            scope: self.scope.upgrade()?,
        })
    }
}

impl ServiceResolver for WeakServiceContainer {
    fn resolve_instance(&self, service_type: &ServiceType) -> Result<Option<Instance>, ContainerError> {
        match self.upgrade() {
            Some(container) => container.resolve_instance(service_type),
            None => Ok(None),
        }
    }
}

/// 容器统计信息
#[derive(Debug, Clone)]
pub struct ContainerStats {
    pub total_resolutions: usize,
    pub cache_hits: usize,
    pub cache_misses: usize,
    pub transient_creations: usize,
    pub registered_services: usize,
}

impl ContainerStats {
    /// 获取总解析次数
    pub fn total(&self) -> usize {
        self.total_resolutions
    }

    /// 获取缓存命中率（单例与作用域缓存）
    pub fn hit_rate(&self) -> f64 {
        let cached = self.cache_hits + self.cache_misses;
        if cached == 0 {
            0.0
        } else {
            self.cache_hits as f64 / cached as f64
        }
    }
}
