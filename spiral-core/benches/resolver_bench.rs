use criterion::{black_box, criterion_group, criterion_main, Criterion};
use spiral_core::prelude::*;
use spiral_core::parse_signature;

#[derive(Default)]
struct Engine;

fn container() -> Container {
    let container = Container::new();
    container.register_class(
        ClassDefinition::builder::<Engine>("Engine")
            .implements("EngineInterface")
            .default_constructor()
            .build()
            .unwrap(),
    );
    container.bind_singleton("EngineInterface", "Engine").unwrap();
    container
}

fn parse_benchmark(c: &mut Criterion) {
    let declaration = "EngineInterface $engine, ?string $name = null, (A&B)|null $both, int ...$ids";
    c.bench_function("parse_signature", |b| {
        b.iter(|| parse_signature(black_box(declaration)).unwrap())
    });
}

fn resolve_benchmark(c: &mut Criterion) {
    let container = container();
    let callable = container
        .closure("target", "EngineInterface $engine, string $name = 'x', int ...$ids", |_| {
            Ok(Value::Null)
        })
        .unwrap();

    c.bench_function("resolve_arguments", |b| {
        b.iter(|| {
            container
                .resolve_arguments(
                    &callable,
                    black_box(arguments!["name" => "bench", "ids" => Arguments::positional([1, 2, 3])]),
                    true,
                )
                .unwrap()
        })
    });
}

fn scope_benchmark(c: &mut Criterion) {
    let container = container();
    c.bench_function("run_scope", |b| {
        b.iter(|| {
            container
                .run_scope(Scope::named("request"), |scope| scope.get("EngineInterface"))
                .unwrap()
        })
    });
}

criterion_group!(benches, parse_benchmark, resolve_benchmark, scope_benchmark);
criterion_main!(benches);
