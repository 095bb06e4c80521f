//! Scope hierarchy, checkpoints and scope constraints

mod common;

use common::{AttrScopeFoo, AttrScopeFooSingleton, EngineMarkTwo, EngineZIL130};
use spiral_core::prelude::*;
use spiral_core::ScopeState;

#[test]
fn test_named_scope_duplication() {
    let container = common::container();

    let err = container
        .run_scope(Scope::new(), |c| {
            c.run_scope(Scope::new(), |c| c.run_scope(Scope::named("root"), |_| Ok(())))
        })
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::NamedScopeDuplication);
    assert_eq!(err.scope(), Some("root"));
}

#[test]
fn test_sibling_scopes_may_share_a_name() {
    let container = common::container();
    container.run_scope(Scope::named("foo"), |_| Ok(())).unwrap();
    container.run_scope(Scope::named("foo"), |_| Ok(())).unwrap();
}

#[test]
fn test_scoped_class_rejected_outside_its_scope() {
    let container = common::container();

    let err = container.get("AttrScopeFoo").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::BadScope);
    assert_eq!(err.scope(), Some("foo"));
}

#[test]
fn test_scoped_class_resolved_in_its_scope() {
    let container = common::container();

    container
        .run_scope(Scope::named("foo"), |c| {
            let instance = c.get("AttrScopeFoo")?;
            assert!(instance.downcast_ref::<AttrScopeFoo>().is_some());
            Ok(())
        })
        .unwrap();
}

#[test]
fn test_scoped_class_from_unnamed_child_lives_in_named_ancestor() {
    let container = common::container();

    container
        .run_scope(Scope::named("foo"), |foo| {
            let from_child = foo.run_scope(Scope::new(), |child| child.get("AttrScopeFooSingleton"))?;
            let from_foo = foo.get("AttrScopeFooSingleton")?;
            assert_eq!(from_child, from_foo);
            assert!(from_foo.downcast_ref::<AttrScopeFooSingleton>().is_some());
            Ok(())
        })
        .unwrap();
}

#[test]
fn test_scoped_singleton_is_per_scope() {
    let container = common::container();

    let first = container
        .run_scope(Scope::named("foo"), |c| {
            let a = c.get("AttrScopeFooSingleton")?;
            let b = c.get("AttrScopeFooSingleton")?;
            assert_eq!(a, b);
            Ok(a)
        })
        .unwrap();
    let second = container
        .run_scope(Scope::named("foo"), |c| c.get("AttrScopeFooSingleton"))
        .unwrap();

    assert_ne!(first, second);
}

#[test]
fn test_scope_check_can_be_disabled() {
    let container = Container::with_options(Options {
        check_scope: false,
        ..Options::default()
    });
    for class in common::scoped_classes() {
        container.register_class(class);
    }

    assert!(container.get("AttrScopeFoo").is_ok());
}

#[test]
fn test_factory_result_checked_against_scope() {
    let container = common::container();
    let factory = container
        .closure("factory", "", |_| Ok(Value::from(Object::new("AttrScopeFoo", AttrScopeFoo))))
        .unwrap();
    container.bind("foo-thing", factory.clone()).unwrap();

    let err = container.get("foo-thing").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::BadScope);

    container
        .run_scope(Scope::named("foo").bind("foo-thing", factory), |c| {
            assert!(c.get("foo-thing")?.downcast_ref::<AttrScopeFoo>().is_some());
            Ok(())
        })
        .unwrap();
}

#[test]
fn test_child_sees_parent_bindings() {
    let container = common::container();
    container.bind_singleton("EngineInterface", "EngineZIL130").unwrap();
    let root_engine = container.get("EngineInterface").unwrap();

    container
        .run_scope(Scope::new(), |c| {
            assert!(c.has("EngineInterface"));
            assert_eq!(c.get("EngineInterface")?, root_engine);
            Ok(())
        })
        .unwrap();
}

#[test]
fn test_scope_bindings_shadow_parent() {
    let container = common::container();
    container.bind("EngineInterface", "EngineZIL130").unwrap();

    container
        .run_scope(
            Scope::named("garage").bind("EngineInterface", "EngineMarkTwo"),
            |c| {
                assert!(c.get("EngineInterface")?.downcast_ref::<EngineMarkTwo>().is_some());
                Ok(())
            },
        )
        .unwrap();

    let engine = container.get("EngineInterface").unwrap();
    assert!(engine.downcast_ref::<EngineZIL130>().is_some());
}

#[test]
fn test_checkpoint_blocks_parent_bindings() {
    let container = common::container();
    container.bind("EngineInterface", "EngineZIL130").unwrap();

    container
        .run_scope(Scope::new().checkpoint(), |c| {
            assert!(c.is_checkpoint());
            assert!(!c.has("EngineInterface"));
            let err = c.get("EngineInterface").unwrap_err();
            assert_eq!(err.kind(), ErrorKind::NotFound);

            // registered classes are still autowired locally
            assert!(c.get("EngineMarkTwo")?.downcast_ref::<EngineMarkTwo>().is_some());
            Ok(())
        })
        .unwrap();
}

#[test]
fn test_checkpoint_allows_scoped_class_of_ancestor() {
    let container = common::container();

    container
        .run_scope(Scope::named("foo"), |foo| {
            foo.run_scope(Scope::new().checkpoint(), |c| {
                assert!(c.get("AttrScopeFoo")?.downcast_ref::<AttrScopeFoo>().is_some());
                Ok(())
            })
        })
        .unwrap();
}

#[test]
fn test_not_found_wraps_parent_failure() {
    let container = common::container();

    let err = container
        .run_scope(Scope::named("request"), |c| c.get("Missing"))
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert_eq!(err.scope(), Some("request"));
    let previous = err.previous().unwrap();
    assert_eq!(previous.scope(), Some("root"));
}

#[test]
fn test_binder_defaults_apply_to_matching_scopes() {
    let container = common::container();
    let binder = container.binder("foo");
    binder.bind_singleton("EngineInterface", "EngineMarkTwo").unwrap();
    assert!(binder.has("EngineInterface"));
    assert!(!container.has("EngineInterface"));

    container
        .run_scope(Scope::named("foo"), |c| {
            let a = c.get("EngineInterface")?;
            assert_eq!(a, c.get("EngineInterface")?);
            assert!(a.downcast_ref::<EngineMarkTwo>().is_some());
            Ok(())
        })
        .unwrap();

    container
        .run_scope(Scope::named("bar"), |c| {
            assert!(!c.has("EngineInterface"));
            Ok(())
        })
        .unwrap();
}

#[test]
fn test_scope_callback_error_propagates() {
    let container = common::container();

    let err = container
        .run_scope(Scope::new(), |c| c.get("Missing").map(|_| ()))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn test_scope_is_ambient_and_destroyed_after_run() {
    let container = common::container();

    let child = container
        .run_scope(Scope::named("request"), |c| {
            let current = ContainerScope::current().unwrap();
            assert!(current.same(c));
            assert_eq!(current.name(), Some("request"));
            Ok(c.clone())
        })
        .unwrap();

    assert_eq!(child.state(), ScopeState::Destroyed);
    assert!(!child.has("EngineInterface"));
}
