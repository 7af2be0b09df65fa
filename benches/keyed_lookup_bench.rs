#![allow(clippy::uninlined_format_args)]
//! 键控查找与解析的性能基准测试

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use keyed_services::{
    implements, KeyedServiceFactory, KeyedServiceProviderExt, KeyedServiceRegister,
    KeyedServiceRegistrarExt, KeyedServiceRegistry, ServiceContainer, ServiceKey, ServiceType,
};

trait Handler: Send + Sync {
    fn handle(&self, input: u64) -> u64;
}

#[derive(Default)]
struct DoubleHandler;

impl Handler for DoubleHandler {
    fn handle(&self, input: u64) -> u64 {
        input * 2
    }
}

implements!(DoubleHandler => dyn Handler);

/// 基准测试：不同键数量下的查找
fn bench_registry_lookup(c: &mut Criterion) {
    let mut group = c.benchmark_group("registry_lookup");

    for key_count in [1usize, 10, 100, 1000].iter() {
        let registry = KeyedServiceRegistry::new();
        for i in 0..*key_count {
            registry
                .add_typed::<dyn Handler, DoubleHandler>(format!("handler-{}", i))
                .unwrap();
        }
        let interface_type = Some(ServiceType::of::<dyn Handler>());
        let key = ServiceKey::from(format!("handler-{}", key_count / 2));

        group.bench_with_input(BenchmarkId::from_parameter(key_count), key_count, |b, _| {
            b.iter(|| black_box(registry.lookup(interface_type, &key).unwrap()));
        });
    }

    group.finish();
}

/// 基准测试：通过容器解析键控单例和瞬态服务
fn bench_keyed_resolution(c: &mut Criterion) {
    let container = ServiceContainer::new();
    let registry = KeyedServiceRegistry::with_container(&container, true);
    registry
        .add_singleton::<dyn Handler, DoubleHandler>("singleton")
        .unwrap();
    registry
        .add_transient::<dyn Handler, DoubleHandler>("transient")
        .unwrap();
    let factory = container.resolve::<KeyedServiceFactory>().unwrap();

    let mut group = c.benchmark_group("keyed_resolution");
    group.bench_function("factory_singleton", |b| {
        b.iter(|| black_box(factory.get_required::<dyn Handler>("singleton").unwrap().handle(21)));
    });
    group.bench_function("factory_transient", |b| {
        b.iter(|| black_box(factory.get_required::<dyn Handler>("transient").unwrap().handle(21)));
    });
    group.bench_function("container_get_keyed", |b| {
        b.iter(|| {
            black_box(
                container
                    .get_required_keyed::<dyn Handler>("singleton")
                    .unwrap()
                    .handle(21),
            )
        });
    });
    group.finish();
}

criterion_group!(benches, bench_registry_lookup, bench_keyed_resolution);
criterion_main!(benches);
