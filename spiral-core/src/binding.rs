//! Per-scope binding registry

use rustc_hash::FxHashMap;
use std::sync::Arc;

use crate::callable::Callable;
use crate::error::{DiError, DiResult};
use crate::value::{Autowire, Object, Value};

/// Receiver of a `[receiver, method]` binding
#[derive(Debug, Clone)]
pub enum Receiver {
    /// Identifier resolved through the container on each call
    Class(String),
    Object(Object),
}

/// How an identifier is produced
#[derive(Debug, Clone)]
pub enum Definition {
    /// Ready value, always shared
    Instance(Value),
    /// Class name or another identifier
    Alias(String),
    /// Factory invoked with autowired parameters
    Factory(Callable),
    /// `[receiver, method]` pair
    Method { receiver: Receiver, method: String },
    /// Deferred `make(alias, arguments)`
    Autowire(Autowire),
}

impl Definition {
    pub fn method(receiver: Receiver, method: impl Into<String>) -> Self {
        Definition::Method {
            receiver,
            method: method.into(),
        }
    }
}

impl From<&str> for Definition {
    fn from(alias: &str) -> Self {
        Definition::Alias(alias.to_string())
    }
}

impl From<String> for Definition {
    fn from(alias: String) -> Self {
        Definition::Alias(alias)
    }
}

impl From<Value> for Definition {
    fn from(value: Value) -> Self {
        match value {
            Value::String(alias) => Definition::Alias(alias),
            Value::Callable(callable) => Definition::Factory(callable),
            Value::Autowire(autowire) => Definition::Autowire((*autowire).clone()),
            other => Definition::Instance(other),
        }
    }
}

impl From<Object> for Definition {
    fn from(object: Object) -> Self {
        Definition::Instance(Value::Object(object))
    }
}

impl From<Callable> for Definition {
    fn from(callable: Callable) -> Self {
        Definition::Factory(callable)
    }
}

impl From<Autowire> for Definition {
    fn from(autowire: Autowire) -> Self {
        Definition::Autowire(autowire)
    }
}

#[derive(Debug, Clone)]
pub struct Binding {
    pub definition: Definition,
    pub singleton: bool,
}

impl Binding {
    pub fn new(definition: Definition, singleton: bool) -> Self {
        Self {
            definition,
            singleton,
        }
    }
}

/// Bindings, cached singletons and inflectors of one scope
#[derive(Debug, Clone, Default)]
pub struct BindingRegistry {
    bindings: FxHashMap<String, Binding>,
    singletons: FxHashMap<String, Value>,
    inflectors: Vec<(Arc<str>, Callable)>,
}

impl BindingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind(&mut self, id: impl Into<String>, definition: impl Into<Definition>) -> DiResult<()> {
        self.insert(id.into(), Binding::new(definition.into(), false))
    }

    pub fn bind_singleton(
        &mut self,
        id: impl Into<String>,
        definition: impl Into<Definition>,
    ) -> DiResult<()> {
        self.insert(id.into(), Binding::new(definition.into(), true))
    }

    /// Replace a binding; fails when its singleton is already in use
    pub fn insert(&mut self, id: String, binding: Binding) -> DiResult<()> {
        if self.singletons.contains_key(&id) {
            return Err(DiError::SingletonOverload { alias: id });
        }
        self.bindings.insert(id, binding);
        Ok(())
    }

    pub fn bind_inflector(&mut self, ty: impl Into<Arc<str>>, inflector: Callable) {
        self.inflectors.push((ty.into(), inflector));
    }

    pub fn has(&self, id: &str) -> bool {
        self.bindings.contains_key(id) || self.singletons.contains_key(id)
    }

    pub fn has_instance(&self, id: &str) -> bool {
        if self.singletons.contains_key(id) {
            return true;
        }
        matches!(
            self.bindings.get(id).map(|b| &b.definition),
            Some(Definition::Instance(Value::Object(_)))
        )
    }

    pub fn binding(&self, id: &str) -> Option<&Binding> {
        self.bindings.get(id)
    }

    pub fn singleton(&self, id: &str) -> Option<&Value> {
        self.singletons.get(id)
    }

    /// Cache a singleton unless another resolution got there first
    pub fn store_singleton(&mut self, id: &str, value: Value) -> Value {
        self.singletons
            .entry(id.to_string())
            .or_insert(value)
            .clone()
    }

    /// Drop a binding and its cached singleton
    pub fn remove(&mut self, id: &str) {
        self.bindings.remove(id);
        self.singletons.remove(id);
    }

    pub fn inflectors(&self) -> &[(Arc<str>, Callable)] {
        &self.inflectors
    }

    /// Copy bindings and inflectors into `target` without touching its singletons
    pub fn apply_to(&self, target: &mut BindingRegistry) {
        for (id, binding) in &self.bindings {
            target.bindings.insert(id.clone(), binding.clone());
        }
        target.inflectors.extend(self.inflectors.iter().cloned());
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty() && self.singletons.is_empty() && self.inflectors.is_empty()
    }
}
