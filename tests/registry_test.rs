//! 键控服务注册表的集成测试

#![allow(clippy::uninlined_format_args, clippy::print_stdout)]

use futures_util::future;
use keyed_services::{
    implements, Implementation, KeyedServiceError, KeyedServiceFactory, KeyedServiceProviderExt,
    KeyedServiceRegister, KeyedServiceRegisterExt, KeyedServiceRegistrar, KeyedServiceRegistrarExt,
    KeyedServiceRegistry, ServiceContainer, ServiceKey, ServiceResolver, ServiceType,
};
use std::collections::HashSet;
use std::sync::Arc;

/// 测试用的服务trait
#[allow(clippy::upper_case_acronyms)]
trait IMyService: Send + Sync {
    fn name(&self) -> &'static str;
}

trait IOtherService: Send + Sync {}

#[derive(Default)]
struct MyService1;

#[derive(Default)]
struct MyService2;

impl IMyService for MyService1 {
    fn name(&self) -> &'static str {
        "MyService1"
    }
}

impl IMyService for MyService2 {
    fn name(&self) -> &'static str {
        "MyService2"
    }
}

implements!(MyService1 => dyn IMyService);
implements!(MyService2 => dyn IMyService);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Variant {
    First,
    Second,
}

fn my_service() -> Option<ServiceType> {
    Some(ServiceType::of::<dyn IMyService>())
}

fn other_service() -> Option<ServiceType> {
    Some(ServiceType::of::<dyn IOtherService>())
}

fn implementation<T: 'static>() -> Option<Implementation> {
    Some(Implementation::untyped(ServiceType::of::<T>()))
}

#[test]
fn test_add_then_lookup_round_trip() {
    let registry = KeyedServiceRegistry::new();
    registry
        .add(my_service(), implementation::<MyService1>(), "Service1".into())
        .unwrap();
    registry
        .add(my_service(), implementation::<MyService2>(), ServiceKey::from_debug(Variant::Second))
        .unwrap();
    registry
        .add(my_service(), implementation::<MyService1>(), ServiceKey::none())
        .unwrap();

    assert_eq!(
        registry.lookup(my_service(), &"Service1".into()).unwrap(),
        Some(ServiceType::of::<MyService1>())
    );
    assert_eq!(
        registry
            .lookup(my_service(), &ServiceKey::from_debug(Variant::Second))
            .unwrap(),
        Some(ServiceType::of::<MyService2>())
    );
    assert_eq!(
        registry.lookup(my_service(), &ServiceKey::none()).unwrap(),
        Some(ServiceType::of::<MyService1>())
    );
}

#[test]
fn test_last_write_wins() {
    let registry = KeyedServiceRegistry::new();
    registry
        .add(my_service(), implementation::<MyService1>(), "k".into())
        .unwrap();
    registry
        .add(my_service(), implementation::<MyService2>(), "k".into())
        .unwrap();

    assert_eq!(
        registry.lookup(my_service(), &"k".into()).unwrap(),
        Some(ServiceType::of::<MyService2>())
    );
    assert_eq!(registry.lookup_all(my_service()).unwrap().len(), 1);
}

#[test]
fn test_keys_and_abstractions_are_isolated() {
    let registry = KeyedServiceRegistry::new();
    registry
        .add(my_service(), implementation::<MyService1>(), "k1".into())
        .unwrap();

    assert!(registry.lookup(my_service(), &"k2".into()).unwrap().is_none());
    assert!(registry.lookup(other_service(), &"k1".into()).unwrap().is_none());
    assert!(registry
        .lookup(my_service(), &ServiceKey::from_debug(Variant::First))
        .unwrap()
        .is_none());
}

#[test]
fn test_absent_pairs_are_not_errors() {
    let registry = KeyedServiceRegistry::new();

    assert!(registry.lookup(my_service(), &"never".into()).unwrap().is_none());
    assert!(registry.lookup(my_service(), &ServiceKey::none()).unwrap().is_none());
}

#[test]
fn test_null_guards_name_the_parameter() {
    let registry = KeyedServiceRegistry::new();

    match registry.add(None, implementation::<MyService1>(), "k".into()) {
        Err(KeyedServiceError::InvalidArgument { param }) => assert_eq!(param, "interface_type"),
        other => panic!("unexpected result: {:?}", other),
    }
    match registry.add(my_service(), None, "k".into()) {
        Err(KeyedServiceError::InvalidArgument { param }) => assert_eq!(param, "instance_type"),
        other => panic!("unexpected result: {:?}", other),
    }
    match registry.lookup(None, &"k".into()) {
        Err(KeyedServiceError::InvalidArgument { param }) => assert_eq!(param, "interface_type"),
        other => panic!("unexpected result: {:?}", other),
    }
}

#[test]
fn test_enumeration() {
    let registry = KeyedServiceRegistry::new();
    registry
        .add(my_service(), implementation::<MyService1>(), "k1".into())
        .unwrap();
    registry
        .add(my_service(), implementation::<MyService2>(), "k2".into())
        .unwrap();

    let types: HashSet<_> = registry.lookup_all(my_service()).unwrap().into_iter().collect();
    let keys: HashSet<_> = registry.keys(my_service()).unwrap().into_iter().collect();

    assert_eq!(types.len(), 2);
    assert!(types.contains(&ServiceType::of::<MyService1>()));
    assert!(types.contains(&ServiceType::of::<MyService2>()));
    assert_eq!(keys.len(), 2);
    assert!(keys.contains(&ServiceKey::from("k1")));
    assert!(keys.contains(&ServiceKey::from("k2")));
}

#[test]
fn test_contains() {
    let registry = KeyedServiceRegistry::new();
    registry
        .add(my_service(), implementation::<MyService1>(), "k1".into())
        .unwrap();

    assert!(registry.contains(my_service(), &"k1".into()).unwrap());
    assert!(!registry.contains(my_service(), &"unknown".into()).unwrap());
    assert!(registry.contains_any(my_service()).unwrap());
    assert!(!registry.contains_any(other_service()).unwrap());
}

#[test]
fn test_enum_keys() {
    let registry = KeyedServiceRegistry::new();
    registry
        .add_typed::<dyn IMyService, MyService1>(ServiceKey::from_debug(Variant::First))
        .unwrap();
    registry
        .add_typed::<dyn IMyService, MyService2>(ServiceKey::from_debug(Variant::Second))
        .unwrap();
    registry.add_typed::<dyn IMyService, MyService2>("text").unwrap();

    let mut variants = registry.typed_keys_of::<dyn IMyService, Variant>().unwrap();
    variants.sort_by_key(|variant| *variant as u8);
    assert_eq!(variants, vec![Variant::First, Variant::Second]);
    assert_eq!(
        registry
            .lookup_of::<dyn IMyService>(ServiceKey::from_debug(Variant::First))
            .unwrap(),
        Some(ServiceType::of::<MyService1>())
    );
}

/// 场景1：两个实现按键注册，工厂通过容器解析出实例
#[test]
fn test_scenario_factory_resolves_live_instance() {
    let container = ServiceContainer::new();
    let registry = KeyedServiceRegistry::with_container(&container, true);
    registry
        .add_singleton::<dyn IMyService, MyService1>("Service1")
        .unwrap();
    registry
        .add_singleton::<dyn IMyService, MyService2>("Service2")
        .unwrap();

    assert_eq!(
        registry.lookup(my_service(), &"Service1".into()).unwrap(),
        Some(ServiceType::of::<MyService1>())
    );

    let factory = container.resolve::<KeyedServiceFactory>().unwrap();
    let service = factory.get_required::<dyn IMyService>("Service1").unwrap();
    assert_eq!(service.name(), "MyService1");

    let instance = factory
        .get_service(my_service(), &"Service2".into())
        .unwrap()
        .unwrap();
    assert!(instance.downcast::<MyService2>().is_ok());
}

/// 场景2：缺失的键
#[test]
fn test_scenario_required_service_message() {
    let container = ServiceContainer::new();
    let _registry = KeyedServiceRegistry::with_container(&container, true);
    let factory = container.resolve::<KeyedServiceFactory>().unwrap();

    let err = factory
        .get_required_service(my_service(), &"missing".into())
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "Service 'missing' of type IMyService is not registered"
    );
}

#[test]
fn test_factory_over_standalone_registry() {
    let container = ServiceContainer::new();
    container.register_singleton(|_| Ok(MyService2));

    let registry = Arc::new(KeyedServiceRegistry::new());
    registry
        .add_typed::<dyn IMyService, MyService2>(ServiceKey::none())
        .unwrap();

    let register: Arc<dyn KeyedServiceRegister> = registry;
    let resolver: Arc<dyn ServiceResolver> = Arc::new(container);
    let factory = KeyedServiceFactory::new(Some(register), Some(resolver)).unwrap();

    let service = factory.get::<dyn IMyService>(ServiceKey::none()).unwrap().unwrap();
    assert_eq!(service.name(), "MyService2");
}

#[test]
fn test_auto_register_shares_identity() {
    let container = ServiceContainer::new();
    let registry = KeyedServiceRegistry::with_container(&container, true);

    let registrar = container
        .resolve_interface::<dyn KeyedServiceRegistrar>()
        .unwrap();
    let register = container
        .resolve_interface::<dyn KeyedServiceRegister>()
        .unwrap();
    let concrete = container.resolve::<KeyedServiceRegistry>().unwrap();

    let registry_ptr = Arc::as_ptr(&registry) as *const u8;
    assert_eq!(Arc::as_ptr(&registrar) as *const u8, registry_ptr);
    assert_eq!(Arc::as_ptr(&register) as *const u8, registry_ptr);
    assert!(Arc::ptr_eq(&concrete, &registry));

    // 通过写入视图添加，读取视图立即可见
    registrar
        .add(my_service(), implementation::<MyService1>(), "via-container".into())
        .unwrap();
    assert!(register.contains(my_service(), &"via-container".into()).unwrap());

    let factory1 = container.resolve::<KeyedServiceFactory>().unwrap();
    let factory2 = container.resolve::<KeyedServiceFactory>().unwrap();
    assert!(Arc::ptr_eq(&factory1, &factory2));
}

#[test]
fn test_factory_resolves_after_root_handle_is_dropped() {
    let container = ServiceContainer::new();
    let registry = KeyedServiceRegistry::with_container(&container, true);
    registry
        .add_singleton::<dyn IMyService, MyService1>("Service1")
        .unwrap();
    let scope = container.create_scope();
    drop(container);

    let factory = scope.resolve::<KeyedServiceFactory>().unwrap();
    let service = factory.get::<dyn IMyService>("Service1").unwrap().unwrap();
    assert_eq!(service.name(), "MyService1");
    assert!(factory.get::<dyn IMyService>("missing").unwrap().is_none());
    assert!(scope.get_keyed::<dyn IMyService>("Service1").unwrap().is_some());
    assert!(registry.services().is_some());
}

#[test]
fn test_constructed_str_key_matches_converted_key() {
    let registry = KeyedServiceRegistry::new();
    registry
        .add_typed::<dyn IMyService, MyService1>(ServiceKey::new("k"))
        .unwrap();

    assert!(registry.contains(my_service(), &"k".into()).unwrap());
    assert!(registry.contains(my_service(), &"k".to_string().into()).unwrap());
}

/// 场景3：两个线程同时为未见过的抽象添加不同的键
#[test]
fn test_scenario_concurrent_first_adds_with_threads() {
    for _ in 0..100 {
        let registry = Arc::new(KeyedServiceRegistry::new());
        let barrier = Arc::new(std::sync::Barrier::new(2));

        let handles: Vec<_> = ["left", "right"]
            .into_iter()
            .map(|key| {
                let registry = registry.clone();
                let barrier = barrier.clone();
                std::thread::spawn(move || {
                    barrier.wait();
                    registry
                        .add(my_service(), implementation::<MyService1>(), key.into())
                        .unwrap();
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert!(registry.contains(my_service(), &"left".into()).unwrap());
        assert!(registry.contains(my_service(), &"right".into()).unwrap());
        assert_eq!(registry.keys(my_service()).unwrap().len(), 2);
        assert_eq!(registry.len(), 1);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_adds_and_lookups() {
    let registry = Arc::new(KeyedServiceRegistry::new());

    let mut handles = vec![];
    for task_id in 0..50u32 {
        let registry = registry.clone();
        handles.push(tokio::task::spawn_blocking(move || {
            registry
                .add(my_service(), implementation::<MyService1>(), task_id.into())
                .unwrap();
            // 读者要么看不到，要么看到完整的条目
            registry
                .lookup(my_service(), &task_id.into())
                .unwrap()
                .map(|service_type| service_type == ServiceType::of::<MyService1>())
        }));
    }

    let results = future::join_all(handles).await;
    for result in results {
        assert_eq!(result.unwrap(), Some(true));
    }
    assert_eq!(registry.keys(my_service()).unwrap().len(), 50);
    assert_eq!(registry.len(), 1);
}
