//! Scope descriptions and per-scope-name binders

use std::sync::Arc;

use crate::binding::Definition;
use crate::callable::Callable;
use crate::container::Shared;
use crate::error::DiResult;

/// Description of a scope to open with `Container::run_scope`
#[derive(Debug, Clone, Default)]
pub struct Scope {
    name: Option<String>,
    bindings: Vec<(String, Definition)>,
    checkpoint: bool,
}

impl Scope {
    /// Anonymous scope
    pub fn new() -> Self {
        Self::default()
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// Stop upward binding lookup at this scope
    pub fn checkpoint(mut self) -> Self {
        self.checkpoint = true;
        self
    }

    /// Binding local to the new scope; never a singleton
    pub fn bind(mut self, id: impl Into<String>, definition: impl Into<Definition>) -> Self {
        self.bindings.push((id.into(), definition.into()));
        self
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn is_checkpoint(&self) -> bool {
        self.checkpoint
    }

    pub(crate) fn into_parts(self) -> (Option<String>, Vec<(String, Definition)>, bool) {
        (self.name, self.bindings, self.checkpoint)
    }
}

/// Default bindings for every future scope with a given name
pub struct ScopeBinder {
    shared: Arc<Shared>,
    scope: String,
}

impl ScopeBinder {
    pub(crate) fn new(shared: Arc<Shared>, scope: String) -> Self {
        Self { shared, scope }
    }

    pub fn scope(&self) -> &str {
        &self.scope
    }

    pub fn bind(&self, id: impl Into<String>, definition: impl Into<Definition>) -> DiResult<()> {
        self.shared
            .binders
            .write()
            .entry(self.scope.clone())
            .or_default()
            .bind(id, definition)
    }

    pub fn bind_singleton(
        &self,
        id: impl Into<String>,
        definition: impl Into<Definition>,
    ) -> DiResult<()> {
        self.shared
            .binders
            .write()
            .entry(self.scope.clone())
            .or_default()
            .bind_singleton(id, definition)
    }

    pub fn bind_inflector(&self, ty: impl Into<Arc<str>>, inflector: Callable) {
        self.shared
            .binders
            .write()
            .entry(self.scope.clone())
            .or_default()
            .bind_inflector(ty, inflector);
    }

    pub fn has(&self, id: &str) -> bool {
        self.shared
            .binders
            .read()
            .get(&self.scope)
            .map_or(false, |registry| registry.has(id))
    }

    pub fn remove_binding(&self, id: &str) {
        if let Some(registry) = self.shared.binders.write().get_mut(&self.scope) {
            registry.remove(id);
        }
    }
}
