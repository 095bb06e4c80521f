//! Argument resolution through the container

mod common;

use common::{EngineMarkTwo, EngineZIL130};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use spiral_core::prelude::*;
use spiral_core::Reference;

fn resolve(container: &Container, declaration: &str, arguments: Arguments) -> DiResult<Arguments> {
    let callable = container.closure("test", declaration, |_| Ok(Value::Null))?;
    container.resolve_arguments(&callable, arguments, true)
}

fn values(arguments: Arguments) -> Vec<Value> {
    arguments.into_values()
}

#[test]
fn test_empty_signature() {
    let container = common::container();
    let resolved = resolve(&container, "", arguments![]).unwrap();
    assert!(resolved.is_empty());
}

#[test]
fn test_explicit_null_overrides_default() {
    let container = common::container();
    let resolved = resolve(&container, "?string $p = 'scalar'", arguments!["p" => Value::Null]).unwrap();
    assert_eq!(values(resolved), vec![Value::Null]);
}

#[test]
fn test_default_used_when_missing() {
    let container = common::container();
    let resolved = resolve(&container, "?string $p = 'scalar'", arguments![]).unwrap();
    assert_eq!(values(resolved), vec![Value::from("scalar")]);
}

#[test]
fn test_positional_keys_sorted() {
    let container = common::container();
    let callable = container
        .closure("sum", "int $a, int $b", |args| Ok(Value::Array(args)))
        .unwrap();

    let result = container
        .invoke(&callable, arguments![1usize => 1, 2usize => 2, 0usize => 0])
        .unwrap();
    let result = result.as_array().cloned().unwrap();
    assert_eq!(values(result), vec![Value::Int(0), Value::Int(1), Value::Int(2)]);
}

#[test]
fn test_named_overrides_container() {
    let container = common::container();
    container.bind("EngineInterface", "EngineZIL130").unwrap();
    let mark_two = container.get("EngineMarkTwo").unwrap();

    let resolved = resolve(
        &container,
        "EngineInterface $engine",
        arguments!["engine" => mark_two.clone()],
    )
    .unwrap();
    assert_eq!(values(resolved), vec![mark_two]);
}

#[test]
fn test_class_parameter_autowired_from_container() {
    let container = common::container();
    container.bind("EngineInterface", "EngineZIL130").unwrap();

    let resolved = resolve(&container, "EngineInterface $engine, int $n = 3", arguments![]).unwrap();
    assert_eq!(resolved.len(), 2);
    assert!(resolved.at(0).unwrap().downcast_ref::<EngineZIL130>().is_some());
    assert_eq!(resolved.at(1), Some(&Value::Int(3)));
}

#[test]
fn test_positional_object_matched_by_instance() {
    let container = common::container();
    let mark_two = container.get("EngineMarkTwo").unwrap();

    let resolved = resolve(
        &container,
        "EngineInterface $engine, string $name",
        arguments!["mark two", mark_two.clone()],
    )
    .unwrap();
    assert_eq!(values(resolved), vec![mark_two, Value::from("mark two")]);
}

#[test]
fn test_variadic_spreads_array_of_objects() {
    let container = common::container();
    let engines: Vec<Value> = (0..3).map(|_| container.get("EngineMarkTwo").unwrap()).collect();

    let resolved = resolve(
        &container,
        "object ...$engines",
        arguments![Arguments::positional(engines.clone())],
    )
    .unwrap();
    assert_eq!(values(resolved), engines);
}

#[test]
fn test_named_variadic_array_is_flattened() {
    let container = common::container();
    let resolved = resolve(
        &container,
        "int ...$ids",
        arguments!["ids" => Arguments::positional([1, 2, 3])],
    )
    .unwrap();
    assert_eq!(values(resolved), vec![Value::Int(1), Value::Int(2), Value::Int(3)]);
}

#[test]
fn test_untyped_variadic_takes_everything() {
    let container = common::container();
    let resolved = resolve(&container, "$head, ...$rest", arguments![1, "two", 3.0]).unwrap();
    assert_eq!(
        values(resolved),
        vec![Value::Int(1), Value::from("two"), Value::Float(3.0)]
    );
}

#[test]
fn test_typed_variadic_drops_rejected_values() {
    let container = common::container();
    let resolved = resolve(&container, "int ...$n", arguments![1, "x", 2]).unwrap();
    assert_eq!(values(resolved), vec![Value::Int(1), Value::Int(2)]);
}

#[test]
fn test_named_value_rejected_by_variadic_is_unknown() {
    let container = common::container();
    let err = resolve(&container, "int ...$n", arguments!["x" => "str"]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnknownParameter);
    assert_eq!(err.parameter(), Some("x"));

    // without validation the rejected value is dropped
    let callable = container.closure("test", "int ...$n", |_| Ok(Value::Null)).unwrap();
    let resolved = container
        .resolve_arguments(&callable, arguments!["x" => "str"], false)
        .unwrap();
    assert!(resolved.is_empty());
}

#[test]
fn test_named_value_accepted_by_variadic_is_trailing() {
    let container = common::container();
    let resolved = resolve(&container, "int ...$n", arguments![0usize => 1, "x" => 2]).unwrap();
    assert_eq!(resolved.at(0), Some(&Value::Int(1)));
    assert_eq!(resolved.named("x"), Some(&Value::Int(2)));
}

#[test]
fn test_nullable_class_falls_back_to_null() {
    let container = common::container();
    let resolved = resolve(&container, "?EngineInterface $engine", arguments![]).unwrap();
    assert_eq!(values(resolved), vec![Value::Null]);
}

#[test]
fn test_union_resolves_class_member() {
    let container = common::container();
    let resolved = resolve(&container, "int|EngineMarkTwo $x", arguments![]).unwrap();
    assert!(resolved.at(0).unwrap().downcast_ref::<EngineMarkTwo>().is_some());
}

#[test]
fn test_missing_class_reports_not_found() {
    let container = common::container();
    let err = resolve(&container, "EngineInterface $engine", arguments![]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert_eq!(err.id(), Some("EngineInterface"));
}

#[derive(Debug, Default)]
struct CountingEngine;

fn counting_engine() -> ClassDefinition {
    ClassDefinition::builder::<CountingEngine>("CountingEngine")
        .implements("EngineInterface")
        .implements("Countable")
        .default_constructor()
        .build()
        .unwrap()
}

#[test]
fn test_intersection_resolved_through_single_binding() {
    let container = common::container();
    container.register_class(counting_engine());
    container.bind("Countable", "CountingEngine").unwrap();

    let resolved = resolve(&container, "EngineInterface&Countable $engine", arguments![]).unwrap();
    assert!(resolved.at(0).unwrap().downcast_ref::<CountingEngine>().is_some());
}

#[test]
fn test_intersection_binding_must_satisfy_every_member() {
    let container = common::container();
    container.bind("Countable", "EngineZIL130").unwrap();

    // the bound instance is not an engine-and-countable, so the default applies
    let callable = container
        .closure("test", "EngineInterface&Countable $engine = null", |_| Ok(Value::Null))
        .unwrap();
    for validate in [false, true] {
        let resolved = container.resolve_arguments(&callable, arguments![], validate).unwrap();
        assert_eq!(values(resolved), vec![Value::Null]);
    }

    let err = resolve(&container, "EngineInterface&Countable $engine", arguments![]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);
    assert_eq!(err.parameter(), Some("engine"));
}

#[test]
fn test_intersection_picks_the_binding_that_satisfies_every_member() {
    let container = common::container();
    container.register_class(counting_engine());
    container.bind("EngineInterface", "EngineZIL130").unwrap();
    container.bind("Countable", "CountingEngine").unwrap();

    let resolved = resolve(&container, "EngineInterface&Countable $engine", arguments![]).unwrap();
    assert!(resolved.at(0).unwrap().downcast_ref::<CountingEngine>().is_some());
}

#[test]
fn test_intersection_with_several_satisfying_bindings_is_unresolved() {
    let container = common::container();
    container.register_class(counting_engine());
    container.bind("EngineInterface", "CountingEngine").unwrap();
    container.bind("Countable", "CountingEngine").unwrap();

    let resolved = resolve(&container, "(EngineInterface&Countable)|null $engine", arguments![]);
    assert_eq!(values(resolved.unwrap()), vec![Value::Null]);
}

#[test]
fn test_intersection_without_binding_uses_null() {
    let container = common::container();
    let resolved = resolve(&container, "(EngineInterface&Countable)|null $engine", arguments![]).unwrap();
    assert_eq!(values(resolved), vec![Value::Null]);
}

#[test]
fn test_reference_reaches_by_reference_parameter() {
    let container = common::container();
    let counter = Reference::new(1);
    let callable = container
        .closure("bump", "int &$counter", |args| {
            let reference = args.at(0).and_then(Value::as_reference).cloned();
            if let Some(reference) = reference {
                let current = reference.get().as_int().unwrap_or_default();
                reference.set(current + 1);
            }
            Ok(Value::Null)
        })
        .unwrap();

    container.invoke(&callable, arguments![counter.clone()]).unwrap();
    assert_eq!(counter.get(), Value::Int(2));
}

#[test]
fn test_reference_is_dereferenced_for_value_parameter() {
    let container = common::container();
    let resolved = resolve(&container, "int $n", arguments![Reference::new(7)]).unwrap();
    assert_eq!(values(resolved), vec![Value::Int(7)]);
}

#[test]
fn test_autowire_argument_is_resolved() {
    let container = common::container();
    let resolved = resolve(
        &container,
        "EngineInterface $engine",
        arguments!["engine" => Autowire::wire("EngineMarkTwo")],
    )
    .unwrap();
    assert!(resolved.at(0).unwrap().downcast_ref::<EngineMarkTwo>().is_some());
}

#[test]
fn test_missing_required_argument() {
    let container = common::container();
    let err = resolve(&container, "int $a", arguments![]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);
    assert_eq!(err.parameter(), Some("a"));
}

#[test]
fn test_unknown_named_argument() {
    let container = common::container();
    let err = resolve(&container, "int $a", arguments!["a" => 1, "b" => 2]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnknownParameter);
    assert_eq!(err.parameter(), Some("b"));
}

#[test]
fn test_invalid_argument_type() {
    let container = common::container();
    let err = resolve(&container, "int $a", arguments!["a" => "x"]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgumentType);
    assert_eq!(err.parameter(), Some("a"));
}

#[test]
fn test_positional_after_named_is_rejected() {
    let container = common::container();
    let callable = container.closure("f", "int $a, int $b", |_| Ok(Value::Null)).unwrap();

    let mut arguments = Arguments::new();
    arguments.insert("a", 1);
    arguments.insert(0usize, 2);

    let err = container.validate_arguments(&callable, &arguments).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::PositionalArgument);
    assert_eq!(err.parameter(), Some("#0"));
}

#[test]
fn test_without_validation_any_positional_fills_typed_slot() {
    let container = common::container();
    let callable = container
        .closure("f", "EngineInterface $engine", |_| Ok(Value::Null))
        .unwrap();

    let resolved = container.resolve_arguments(&callable, arguments![5], false).unwrap();
    assert_eq!(values(resolved), vec![Value::Int(5)]);
}

#[test]
fn test_parameters_are_described() {
    let container = common::container();
    let callable = container
        .closure("f", "EngineInterface $engine, int ...$ids", |_| Ok(Value::Null))
        .unwrap();

    let parameters = container.parameters(&callable);
    assert_eq!(parameters.len(), 2);
    assert_eq!(parameters[0].name, "engine");
    assert!(parameters[1].is_variadic());
}

proptest! {
    #[test]
    fn prop_positional_order_ignores_insertion_order(
        order in (1usize..6).prop_flat_map(|n| Just((0..n).collect::<Vec<_>>()).prop_shuffle())
    ) {
        let container = Container::new();
        let declaration = (0..order.len())
            .map(|i| format!("int $p{}", i))
            .collect::<Vec<_>>()
            .join(", ");

        let mut arguments = Arguments::new();
        for &index in &order {
            arguments.insert(index, index as i64);
        }

        let resolved = resolve(&container, &declaration, arguments).unwrap();
        let expected: Vec<Value> = (0..order.len() as i64).map(Value::Int).collect();
        prop_assert_eq!(values(resolved), expected);
    }
}
