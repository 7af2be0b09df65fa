//! 类型化的便捷方法

use std::sync::Arc;

use super::factory::not_registered;
use super::{
    Implementation, Implements, KeyedServiceFactory, KeyedServiceRegister, KeyedServiceRegistrar,
    ServiceKey,
};
use crate::errors::KeyedServiceError;
use crate::infrastructure::container::{
    ContainerError, ServiceContainer, ServiceLifetime, ServiceResolver, ServiceType,
};

/// 写入视图的类型化方法
///
/// 带生命周期的变体先向容器注册具体类型 `S`，再把非键控的抽象 `I` 转发到 `S`，最后记录键
pub trait KeyedServiceRegistrarExt: KeyedServiceRegistrar {
    /// 只记录映射，不向容器注册
    fn add_typed<I, S>(&self, key: impl Into<ServiceKey>) -> Result<(), KeyedServiceError>
    where
        I: ?Sized + Send + Sync + 'static,
        S: Implements<I>,
    {
        self.add(
            Some(ServiceType::of::<I>()),
            Some(Implementation::of::<I, S>()),
            key.into(),
        )
    }

    fn add_with_lifetime<I, S, F>(
        &self,
        lifetime: ServiceLifetime,
        key: impl Into<ServiceKey>,
        factory: F,
    ) -> Result<(), KeyedServiceError>
    where
        I: ?Sized + Send + Sync + 'static,
        S: Implements<I>,
        F: Fn(&ServiceContainer) -> Result<S, ContainerError> + Send + Sync + 'static,
    {
        let services = self
            .services()
            .ok_or(KeyedServiceError::ContainerUnavailable)?;

        services.register(lifetime, factory);
        if ServiceType::of::<I>() != ServiceType::of::<S>() {
            services.register_interface::<I, _>(lifetime, |c| {
                Ok(<S as Implements<I>>::upcast(c.resolve::<S>()?))
            });
        }
        self.add_typed::<I, S>(key)
    }

    fn add_singleton<I, S>(&self, key: impl Into<ServiceKey>) -> Result<(), KeyedServiceError>
    where
        I: ?Sized + Send + Sync + 'static,
        S: Implements<I> + Default,
    {
        self.add_with_lifetime::<I, S, _>(ServiceLifetime::Singleton, key, |_| Ok(S::default()))
    }

    fn add_singleton_with<I, S, F>(&self, key: impl Into<ServiceKey>, factory: F) -> Result<(), KeyedServiceError>
    where
        I: ?Sized + Send + Sync + 'static,
        S: Implements<I>,
        F: Fn(&ServiceContainer) -> Result<S, ContainerError> + Send + Sync + 'static,
    {
        self.add_with_lifetime::<I, S, F>(ServiceLifetime::Singleton, key, factory)
    }

    fn add_scoped<I, S>(&self, key: impl Into<ServiceKey>) -> Result<(), KeyedServiceError>
    where
        I: ?Sized + Send + Sync + 'static,
        S: Implements<I> + Default,
    {
        self.add_with_lifetime::<I, S, _>(ServiceLifetime::Scoped, key, |_| Ok(S::default()))
    }

    fn add_scoped_with<I, S, F>(&self, key: impl Into<ServiceKey>, factory: F) -> Result<(), KeyedServiceError>
    where
        I: ?Sized + Send + Sync + 'static,
        S: Implements<I>,
        F: Fn(&ServiceContainer) -> Result<S, ContainerError> + Send + Sync + 'static,
    {
        self.add_with_lifetime::<I, S, F>(ServiceLifetime::Scoped, key, factory)
    }

    fn add_transient<I, S>(&self, key: impl Into<ServiceKey>) -> Result<(), KeyedServiceError>
    where
        I: ?Sized + Send + Sync + 'static,
        S: Implements<I> + Default,
    {
        self.add_with_lifetime::<I, S, _>(ServiceLifetime::Transient, key, |_| Ok(S::default()))
    }

    fn add_transient_with<I, S, F>(&self, key: impl Into<ServiceKey>, factory: F) -> Result<(), KeyedServiceError>
    where
        I: ?Sized + Send + Sync + 'static,
        S: Implements<I>,
        F: Fn(&ServiceContainer) -> Result<S, ContainerError> + Send + Sync + 'static,
    {
        self.add_with_lifetime::<I, S, F>(ServiceLifetime::Transient, key, factory)
    }
}

impl<T: KeyedServiceRegistrar + ?Sized> KeyedServiceRegistrarExt for T {}

/// 读取视图的类型化方法
pub trait KeyedServiceRegisterExt: KeyedServiceRegister {
    fn lookup_of<I: ?Sized + 'static>(
        &self,
        key: impl Into<ServiceKey>,
    ) -> Result<Option<ServiceType>, KeyedServiceError> {
        self.lookup(Some(ServiceType::of::<I>()), &key.into())
    }

    fn lookup_all_of<I: ?Sized + 'static>(&self) -> Result<Vec<ServiceType>, KeyedServiceError> {
        self.lookup_all(Some(ServiceType::of::<I>()))
    }

    fn keys_of<I: ?Sized + 'static>(&self) -> Result<Vec<ServiceKey>, KeyedServiceError> {
        self.keys(Some(ServiceType::of::<I>()))
    }

    /// 值类型为 `K` 的键
    fn typed_keys_of<I, K>(&self) -> Result<Vec<K>, KeyedServiceError>
    where
        I: ?Sized + 'static,
        K: Clone + 'static,
    {
        Ok(self
            .keys_of::<I>()?
            .iter()
            .filter_map(|key| key.downcast_ref::<K>().cloned())
            .collect())
    }

    fn contains_of<I: ?Sized + 'static>(&self, key: impl Into<ServiceKey>) -> Result<bool, KeyedServiceError> {
        self.contains(Some(ServiceType::of::<I>()), &key.into())
    }

    fn contains_any_of<I: ?Sized + 'static>(&self) -> Result<bool, KeyedServiceError> {
        self.contains_any(Some(ServiceType::of::<I>()))
    }
}

impl<T: KeyedServiceRegister + ?Sized> KeyedServiceRegisterExt for T {}

/// 容器上的键控解析
pub trait KeyedServiceProviderExt {
    /// 容器中没有键控注册表时返回 `Ok(None)`
    fn get_keyed<I>(&self, key: impl Into<ServiceKey>) -> Result<Option<Arc<I>>, KeyedServiceError>
    where
        I: ?Sized + Send + Sync + 'static;

    fn get_required_keyed<I>(&self, key: impl Into<ServiceKey>) -> Result<Arc<I>, KeyedServiceError>
    where
        I: ?Sized + Send + Sync + 'static;
}

impl KeyedServiceProviderExt for ServiceContainer {
    fn get_keyed<I>(&self, key: impl Into<ServiceKey>) -> Result<Option<Arc<I>>, KeyedServiceError>
    where
        I: ?Sized + Send + Sync + 'static,
    {
        match scoped_factory(self)? {
            Some(factory) => factory.get::<I>(key),
            None => Ok(None),
        }
    }

    fn get_required_keyed<I>(&self, key: impl Into<ServiceKey>) -> Result<Arc<I>, KeyedServiceError>
    where
        I: ?Sized + Send + Sync + 'static,
    {
        let key = key.into();
        self.get_keyed::<I>(&key)?
            .ok_or_else(|| not_registered(&key, &ServiceType::of::<I>()))
    }
}

/// 以调用方容器（作用域）作为解析器的工厂
fn scoped_factory(container: &ServiceContainer) -> Result<Option<KeyedServiceFactory>, KeyedServiceError> {
    if !container.is_registered::<dyn KeyedServiceRegister>() {
        return Ok(None);
    }
    let register = container.resolve_interface::<dyn KeyedServiceRegister>()?;
    let resolver: Arc<dyn ServiceResolver> = Arc::new(container.clone());
    KeyedServiceFactory::new(Some(register), Some(resolver)).map(Some)
}
