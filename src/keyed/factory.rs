//! 键控服务工厂：读取视图 + 容器解析器 -> 实例

use std::sync::Arc;
use tracing::trace;

use super::{Implementation, KeyedServiceRegister, ServiceKey};
use crate::errors::KeyedServiceError;
use crate::infrastructure::container::{Instance, ServiceResolver, ServiceType};

/// 按 (抽象, 键) 解析服务实例
///
/// 键未注册与容器未能给出实例在这一层都表现为 `Ok(None)`
#[derive(Clone)]
pub struct KeyedServiceFactory {
    register: Arc<dyn KeyedServiceRegister>,
    services: Arc<dyn ServiceResolver>,
}

impl KeyedServiceFactory {
    pub fn new(
        registrar: Option<Arc<dyn KeyedServiceRegister>>,
        services: Option<Arc<dyn ServiceResolver>>,
    ) -> Result<Self, KeyedServiceError> {
        let register = registrar.ok_or(KeyedServiceError::InvalidArgument { param: "registrar" })?;
        let services = services.ok_or(KeyedServiceError::InvalidArgument { param: "services" })?;
        Ok(Self { register, services })
    }

    /// 读取视图
    pub fn register(&self) -> &Arc<dyn KeyedServiceRegister> {
        &self.register
    }

    pub fn get_service(
        &self,
        interface_type: Option<ServiceType>,
        key: &ServiceKey,
    ) -> Result<Option<Instance>, KeyedServiceError> {
        Ok(self
            .resolve(interface_type, key)?
            .map(|(_, instance)| instance))
    }

    /// 与 [`get_service`](Self::get_service) 相同，但缺失时返回 `NotRegistered`
    pub fn get_required_service(
        &self,
        interface_type: Option<ServiceType>,
        key: &ServiceKey,
    ) -> Result<Instance, KeyedServiceError> {
        let interface_type = interface_type.ok_or(KeyedServiceError::InvalidArgument {
            param: "interface_type",
        })?;
        self.get_service(Some(interface_type), key)?
            .ok_or_else(|| not_registered(key, &interface_type))
    }

    /// 以抽象 `I` 的形式解析
    pub fn get<I>(&self, key: impl Into<ServiceKey>) -> Result<Option<Arc<I>>, KeyedServiceError>
    where
        I: ?Sized + Send + Sync + 'static,
    {
        let key = key.into();
        match self.resolve(Some(ServiceType::of::<I>()), &key)? {
            None => Ok(None),
            Some((implementation, instance)) => implementation
                .cast::<I>(instance)
                .map(Some)
                .ok_or_else(|| KeyedServiceError::TypeCastFailed {
                    expected_type: std::any::type_name::<I>().to_string(),
                    actual_type: implementation.service_type().name().to_string(),
                }),
        }
    }

    pub fn get_required<I>(&self, key: impl Into<ServiceKey>) -> Result<Arc<I>, KeyedServiceError>
    where
        I: ?Sized + Send + Sync + 'static,
    {
        let key = key.into();
        self.get::<I>(&key)?
            .ok_or_else(|| not_registered(&key, &ServiceType::of::<I>()))
    }

    fn resolve(
        &self,
        interface_type: Option<ServiceType>,
        key: &ServiceKey,
    ) -> Result<Option<(Implementation, Instance)>, KeyedServiceError> {
        let implementation = match self.register.lookup_implementation(interface_type, key)? {
            Some(implementation) => implementation,
            None => return Ok(None),
        };

        let instance = self
            .services
            .resolve_instance(&implementation.service_type())?;
        if instance.is_none() {
            trace!(
                implementation = implementation.service_type().name(),
                key = %key,
                "Keyed implementation is not registered in the container"
            );
        }
        Ok(instance.map(|instance| (implementation, instance)))
    }
}

pub(crate) fn not_registered(key: &ServiceKey, interface_type: &ServiceType) -> KeyedServiceError {
    KeyedServiceError::NotRegistered {
        key: key.to_string(),
        type_name: interface_type.short_name().to_string(),
    }
}
