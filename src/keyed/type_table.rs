//! 单个抽象的 键 -> 实现 映射表

use dashmap::DashMap;

use super::{Implementation, ServiceKey};
use crate::infrastructure::container::ServiceType;

/// 某个抽象下所有已注册的键及其实现
///
/// 同一个键只保留最后一次添加的实现。枚举方法返回调用时刻的快照，顺序不固定。
#[derive(Debug, Default)]
pub struct TypeTable {
    entries: DashMap<ServiceKey, Implementation>,
}

impl TypeTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// 添加或覆盖
    pub fn add(&self, key: ServiceKey, implementation: Implementation) {
        self.entries.insert(key, implementation);
    }

    pub fn lookup(&self, key: &ServiceKey) -> Option<Implementation> {
        self.entries.get(key).map(|entry| entry.value().clone())
    }

    pub fn contains_key(&self, key: &ServiceKey) -> bool {
        self.entries.contains_key(key)
    }

    /// 所有实现的具体类型
    pub fn types(&self) -> Vec<ServiceType> {
        self.entries
            .iter()
            .map(|entry| entry.value().service_type())
            .collect()
    }

    pub fn implementations(&self) -> Vec<Implementation> {
        self.entries
            .iter()
            .map(|entry| entry.value().clone())
            .collect()
    }

    pub fn keys(&self) -> Vec<ServiceKey> {
        self.entries.iter().map(|entry| entry.key().clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
