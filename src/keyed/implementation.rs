//! 实现类型描述符与向上转型

use std::fmt;
use std::sync::Arc;

use crate::infrastructure::container::{Instance, ServiceType};

/// 具体类型 `Self` 可以作为抽象 `I` 使用
///
/// 对每个 `T` 自动实现 `Implements<T>`；trait object 的实现通过 [`implements!`](crate::implements) 声明：
///
/// ```
/// use keyed_services::implements;
///
/// trait Greeter: Send + Sync {
///     fn greet(&self) -> String;
/// }
///
/// #[derive(Default)]
/// struct English;
///
/// impl Greeter for English {
///     fn greet(&self) -> String {
///         "hello".into()
///     }
/// }
///
/// implements!(English => dyn Greeter);
/// ```
pub trait Implements<I: ?Sized>: Send + Sync + 'static {
    fn upcast(self: Arc<Self>) -> Arc<I>;
}

impl<T: Send + Sync + 'static> Implements<T> for T {
    fn upcast(self: Arc<Self>) -> Arc<T> {
        self
    }
}

/// 为具体类型声明它实现的抽象
#[macro_export]
macro_rules! implements {
    ($concrete:ty => $($abstraction:ty),+ $(,)?) => {
        $(
            impl $crate::Implements<$abstraction> for $concrete {
                fn upcast(self: ::std::sync::Arc<Self>) -> ::std::sync::Arc<$abstraction> {
                    self
                }
            }
        )+
    };
}

type Upcast = Arc<dyn Fn(Instance) -> Instance + Send + Sync>;

/// 实现类型描述符：具体服务类型，以及可选的"具体实例 -> 抽象实例"转换
///
/// 相等性只比较具体类型
#[derive(Clone)]
pub struct Implementation {
    service_type: ServiceType,
    upcast: Option<Upcast>,
}

impl Implementation {
    /// 只记录具体类型，不带转换；通过它解析出的实例只能以类型擦除的形式使用
    pub fn untyped(service_type: ServiceType) -> Self {
        Self {
            service_type,
            upcast: None,
        }
    }

    /// 具体类型 `S` 作为抽象 `I` 的实现
    pub fn of<I, S>() -> Self
    where
        I: ?Sized + Send + Sync + 'static,
        S: Implements<I>,
    {
        let upcast = |instance: Instance| -> Instance {
            match instance.downcast::<S>() {
                Ok(concrete) => {
                    let abstraction: Arc<I> = <S as Implements<I>>::upcast(concrete);
                    Arc::new(abstraction) as Instance
                }
                // 容器中以抽象形式注册的实例原样返回
                Err(other) => other,
            }
        };
        Self {
            service_type: ServiceType::of::<S>(),
            upcast: Some(Arc::new(upcast)),
        }
    }

    pub fn service_type(&self) -> ServiceType {
        self.service_type
    }

    pub fn is_typed(&self) -> bool {
        self.upcast.is_some()
    }

    /// 把容器解析出的具体实例转换为抽象 `I`
    pub fn cast<I>(&self, instance: Instance) -> Option<Arc<I>>
    where
        I: ?Sized + Send + Sync + 'static,
    {
        let instance = match &self.upcast {
            Some(upcast) => upcast(instance),
            None => instance,
        };
        instance
            .downcast::<Arc<I>>()
            .ok()
            .map(|boxed| Arc::clone(&*boxed))
    }
}

impl From<ServiceType> for Implementation {
    fn from(service_type: ServiceType) -> Self {
        Self::untyped(service_type)
    }
}

impl PartialEq for Implementation {
    fn eq(&self, other: &Self) -> bool {
        self.service_type == other.service_type
    }
}

impl Eq for Implementation {}

impl PartialEq<ServiceType> for Implementation {
    fn eq(&self, other: &ServiceType) -> bool {
        self.service_type == *other
    }
}

impl fmt::Debug for Implementation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Implementation")
            .field("service_type", &self.service_type.name())
            .field("typed", &self.is_typed())
            .finish()
    }
}
