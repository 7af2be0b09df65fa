//! 运行时类型标签
//!
//! 用 `TypeId` 作为身份，`type_name` 只用于日志和错误信息

use std::any::TypeId;
use std::fmt;
use std::hash::{Hash, Hasher};

/// 服务类型描述符 - 可作为抽象（`dyn Trait`）或具体类型的标识
#[derive(Clone, Copy)]
pub struct ServiceType {
    id: TypeId,
    name: &'static str,
}

impl ServiceType {
    /// 获取类型 `T` 的描述符，`T` 可以是 trait object
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    /// 完整类型名称，例如 `dyn my_app::services::Greeter`
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// 短类型名称：去掉 `dyn`、模块路径、泛型参数和附加约束
    ///
    /// `dyn my_app::services::Greeter + Send` -> `Greeter`
    ///
    /// 元组、切片、数组、裸指针和函数指针不是路径类型，返回完整名称
    pub fn short_name(&self) -> &'static str {
        let name = self.name.trim_start_matches('&');
        let name = name.strip_prefix("mut ").unwrap_or(name);
        let name = name.strip_prefix("dyn ").unwrap_or(name);
        if name.starts_with(|c: char| c == '(' || c == '[' || c == '*') || name.starts_with("fn(") {
            return self.name;
        }
        let end = name
            .find(|c: char| c == '<' || c == ' ')
            .unwrap_or(name.len());
        let base = &name[..end];
        base.rsplit("::").next().unwrap_or(base)
    }
}

impl PartialEq for ServiceType {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ServiceType {}

impl Hash for ServiceType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for ServiceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

impl fmt::Debug for ServiceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ServiceType({})", self.name)
    }
}
