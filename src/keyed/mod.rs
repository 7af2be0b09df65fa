//! 键控服务
//!
//! 同一个抽象可以注册多个实现，每个实现用一个键区分；
//! 解析时先查到具体类型，再交给容器创建实例。

pub mod extensions;
pub mod factory;
pub mod implementation;
pub mod key;
pub mod registry;
pub mod type_table;

pub use extensions::{KeyedServiceProviderExt, KeyedServiceRegisterExt, KeyedServiceRegistrarExt};
pub use factory::KeyedServiceFactory;
pub use implementation::{Implementation, Implements};
pub use key::ServiceKey;
pub use registry::{KeyedServiceRegister, KeyedServiceRegistrar, KeyedServiceRegistry};
pub use type_table::TypeTable;
