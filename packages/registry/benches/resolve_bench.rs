//! Resolve + build benchmarks
//!
//! Target: resolve and build a cached element in <5µs

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use dashcraft_config::{ElementConfig, Value};
use dashcraft_registry::{
    Element, ElementCategory, ElementDefinition, ElementError, Factory, Registry, Resolver, Tag,
};

#[derive(Default)]
struct Counter {
    label: String,
}

impl Element for Counter {
    fn set_config(&mut self, config: &ElementConfig) -> Result<(), ElementError> {
        self.label = config
            .get("label")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        Ok(())
    }

    fn render(&self) -> String {
        self.label.clone()
    }
}

fn registry_with(count: usize) -> Registry {
    let registry = Registry::new();
    for i in 0..count {
        registry
            .register(format!("dash-counter{}-card", i), ElementDefinition::new(Counter::default))
            .unwrap();
    }
    registry
}

fn resolve_cached(c: &mut Criterion) {
    let resolver = Resolver::new(registry_with(50), ElementCategory::Card);
    resolver.resolve("counter7");

    c.bench_function("resolve_cached", |b| {
        b.iter(|| resolver.resolve(black_box("counter7")))
    });
}

fn resolve_custom(c: &mut Criterion) {
    let resolver = Resolver::new(Registry::new(), ElementCategory::Card);

    c.bench_function("resolve_custom_pending", |b| {
        b.iter(|| resolver.resolve(black_box("custom:mini-graph-card")))
    });
}

fn resolve_and_build(c: &mut Criterion) {
    let registry = registry_with(50);
    let resolver = Resolver::new(registry.clone(), ElementCategory::Card);
    let factory = Factory::new(registry);
    let config = ElementConfig::new("counter7")
        .with_field("label", Some(Value::from("Visitors")))
        .unwrap();

    c.bench_function("resolve_and_build", |b| {
        b.iter(|| {
            let resolution = resolver.resolve(config.element_type());
            factory.build(black_box(&resolution.tag), black_box(&config))
        })
    });
}

fn update_in_place(c: &mut Criterion) {
    let registry = registry_with(1);
    let factory = Factory::new(registry);
    let tag = Tag::new("dash-counter0-card");
    let first = ElementConfig::new("counter0");
    let second = first.with_field("label", Some(Value::from("Updated"))).unwrap();
    let mut instance = factory.build(&tag, &first);

    c.bench_function("update_in_place", |b| {
        b.iter(|| factory.update(&mut instance, black_box(&second)))
    });
}

criterion_group!(
    benches,
    resolve_cached,
    resolve_custom,
    resolve_and_build,
    update_in_place
);
criterion_main!(benches);
