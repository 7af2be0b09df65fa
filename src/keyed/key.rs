//! 服务键
//!
//! 任意 `Eq + Hash` 值都可以作为键。键先按值的动态类型比较，再按值比较；
//! `ServiceKey::none()` 是一个合法且独立的"无键"哨兵值。

use std::any::{Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// 类型擦除的键值
trait KeyValue: Send + Sync + 'static {
    /// 返回被包装的原始值
    fn as_any(&self) -> &dyn Any;
    fn eq_key(&self, other: &dyn KeyValue) -> bool;
    fn hash_key(&self, state: &mut dyn Hasher);
    fn fmt_key(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result;
    fn type_name(&self) -> &'static str;
}

/// 以 `Display` 渲染的键
struct Displayed<T>(T);

/// 以 `Debug` 渲染的键（无字段枚举）
struct Debugged<T>(T);

macro_rules! key_value_impl {
    ($wrapper:ident, $render:ident) => {
        impl<T> KeyValue for $wrapper<T>
        where
            T: Eq + Hash + fmt::$render + Send + Sync + 'static,
        {
            fn as_any(&self) -> &dyn Any {
                &self.0
            }

            fn eq_key(&self, other: &dyn KeyValue) -> bool {
                other
                    .as_any()
                    .downcast_ref::<T>()
                    .map_or(false, |value| *value == self.0)
            }

            fn hash_key(&self, mut state: &mut dyn Hasher) {
                TypeId::of::<T>().hash(&mut state);
                self.0.hash(&mut state);
            }

            fn fmt_key(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                <T as fmt::$render>::fmt(&self.0, f)
            }

            fn type_name(&self) -> &'static str {
                std::any::type_name::<T>()
            }
        }
    };
}

key_value_impl!(Displayed, Display);
key_value_impl!(Debugged, Debug);

/// 区分同一抽象多个实现的键
#[derive(Clone, Default)]
pub struct ServiceKey(Option<Arc<dyn KeyValue>>);

impl ServiceKey {
    /// "无键"哨兵
    pub fn none() -> Self {
        Self(None)
    }

    /// 用 `Display` 作为显示形式的键；`&str` 与 `String` 存为同一种键
    pub fn new<T>(value: T) -> Self
    where
        T: Eq + Hash + fmt::Display + Send + Sync + 'static,
    {
        if let Some(text) = (&value as &dyn Any).downcast_ref::<&'static str>() {
            return Self(Some(Arc::new(Displayed(text.to_string()))));
        }
        Self(Some(Arc::new(Displayed(value))))
    }

    /// 用 `Debug` 作为显示形式的键，适合无字段枚举
    ///
    /// ```
    /// use keyed_services::ServiceKey;
    ///
    /// #[derive(Debug, PartialEq, Eq, Hash)]
    /// enum Channel { Email, Sms }
    ///
    /// let key = ServiceKey::from_debug(Channel::Sms);
    /// assert_eq!(key.to_string(), "Sms");
    /// assert_eq!(key, ServiceKey::from_debug(Channel::Sms));
    /// assert_ne!(key, ServiceKey::from_debug(Channel::Email));
    /// ```
    pub fn from_debug<T>(value: T) -> Self
    where
        T: Eq + Hash + fmt::Debug + Send + Sync + 'static,
    {
        Self(Some(Arc::new(Debugged(value))))
    }

    pub fn is_none(&self) -> bool {
        self.0.is_none()
    }

    /// 以原始类型访问键值
    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        self.0.as_ref()?.as_any().downcast_ref::<T>()
    }

    pub fn is<T: 'static>(&self) -> bool {
        self.downcast_ref::<T>().is_some()
    }

    /// 键值的类型名称，哨兵返回 `None`
    pub fn type_name(&self) -> Option<&'static str> {
        self.0.as_ref().map(|value| value.type_name())
    }
}

impl PartialEq for ServiceKey {
    fn eq(&self, other: &Self) -> bool {
        match (&self.0, &other.0) {
            (None, None) => true,
            (Some(left), Some(right)) => left.eq_key(right.as_ref()),
            _ => false,
        }
    }
}

impl Eq for ServiceKey {}

impl Hash for ServiceKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match &self.0 {
            None => 0u8.hash(state),
            Some(value) => {
                1u8.hash(state);
                value.hash_key(state);
            }
        }
    }
}

impl fmt::Display for ServiceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Some(value) => value.fmt_key(f),
            None => Ok(()),
        }
    }
}

impl fmt::Debug for ServiceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Some(value) => write!(f, "ServiceKey({}: {})", value.type_name(), self),
            None => f.write_str("ServiceKey(none)"),
        }
    }
}

impl From<&str> for ServiceKey {
    fn from(value: &str) -> Self {
        Self::new(value.to_string())
    }
}

impl From<String> for ServiceKey {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<&String> for ServiceKey {
    fn from(value: &String) -> Self {
        Self::new(value.clone())
    }
}

impl From<&ServiceKey> for ServiceKey {
    fn from(value: &ServiceKey) -> Self {
        value.clone()
    }
}

impl<T> From<Option<T>> for ServiceKey
where
    T: Into<ServiceKey>,
{
    fn from(value: Option<T>) -> Self {
        value.map_or_else(Self::none, Into::into)
    }
}

macro_rules! display_key_from {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for ServiceKey {
                fn from(value: $ty) -> Self {
                    Self::new(value)
                }
            }
        )*
    };
}

display_key_from!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, char, bool);
