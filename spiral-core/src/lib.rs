//! Dependency injection core
//!
//! This crate provides a scoped dependency injection container:
//!
//! - argument resolution that matches named, positional and container-provided
//!   values against a callable's declared parameters
//! - a hierarchy of scopes with per-scope bindings, singletons and finalizers
//! - an ambient "current container" that stays correct across async tasks
//!
//! Classes and callables describe their parameters with a small declaration
//! language, e.g. `EngineInterface $engine, ?string $name = null, int ...$ids`.

pub mod binding;
pub mod callable;
pub mod class;
pub mod container;
pub mod context;
pub mod error;
pub mod lexer;
pub mod lifecycle;
pub mod options;
pub mod parser;
pub mod provider;
pub mod reflector;
pub mod resolver;
pub mod scope;
pub mod types;
pub mod value;

#[cfg(feature = "config")]
pub mod config;

pub use binding::{Binding, BindingRegistry, Definition, Receiver};
pub use callable::{Callable, Method};
pub use class::{ClassBuilder, ClassDefinition, ClassRegistry, Constructor};
pub use container::{Container, ROOT_SCOPE};
pub use context::ContainerScope;
pub use error::{DiError, DiResult, ErrorKind};
pub use lifecycle::{FinalizerQueue, ScopeState};
pub use options::Options;
pub use parser::{parse_signature, SignatureError};
pub use provider::ServiceProvider;
pub use reflector::Reflector;
pub use resolver::ArgumentResolver;
pub use scope::{Scope, ScopeBinder};
pub use types::{Parameter, ScalarKind, Signature, Type};
pub use value::{Arguments, Autowire, Key, Object, Reference, Value};

/// Prelude module for common imports
pub mod prelude {
    pub use crate::{
        arguments, Arguments, Autowire, Callable, ClassDefinition, Container, ContainerScope,
        Definition, DiError, DiResult, ErrorKind, Object, Options, Scope, ServiceProvider, Value,
    };

    #[cfg(feature = "config")]
    pub use crate::config::{BindingConfig, BindingLifetime, ContainerConfig};
}

#[cfg(test)]
mod tests {
    use super::prelude::*;

    #[derive(Debug, PartialEq)]
    struct Greeting(String);

    #[test]
    fn test_basic_container() {
        let container = Container::new();
        container.register_class(
            ClassDefinition::builder::<Greeting>("Greeting")
                .constructor("string $text = 'Hello, DI!'", |args| {
                    Ok(Greeting(args.at(0).and_then(Value::as_str).unwrap_or_default().to_string()))
                })
                .build()
                .unwrap(),
        );

        let greeting = container.get("Greeting").unwrap();
        assert_eq!(
            greeting.downcast_ref::<Greeting>(),
            Some(&Greeting("Hello, DI!".to_string()))
        );
    }
}
