//! Core container implementation
//!
//! A [`Container`] is a handle to one scope. The root container is the scope
//! named `root`; [`Container::run_scope`] opens a child scope, runs a callback
//! with it and finalizes it afterwards. Every scope owns its bindings,
//! singletons and finalizers. Class declarations, per-scope-name binders and
//! the signature cache are shared by the whole tree.

use parking_lot::{Mutex, RwLock};
use rustc_hash::FxHashMap;
use std::cell::RefCell;
use std::future::Future;
use std::sync::{Arc, Weak};
use tracing::{debug, error, trace, warn};

use crate::binding::{Binding, BindingRegistry, Definition, Receiver};
use crate::callable::Callable;
use crate::class::{ClassDefinition, ClassRegistry};
use crate::context::ContainerScope;
use crate::error::{DiError, DiResult, ErrorKind};
use crate::lifecycle::{FinalizerQueue, ScopeState};
use crate::options::Options;
use crate::provider::ServiceProvider;
use crate::reflector::Reflector;
use crate::resolver::ArgumentResolver;
use crate::scope::{Scope, ScopeBinder};
use crate::types::{Parameter, Signature};
use crate::value::{Arguments, Object, Value};

/// Name of the root scope
pub const ROOT_SCOPE: &str = "root";

/// State shared by every scope of one container tree
pub(crate) struct Shared {
    pub(crate) classes: ClassRegistry,
    pub(crate) binders: RwLock<FxHashMap<String, BindingRegistry>>,
    pub(crate) reflector: Reflector,
    pub(crate) options: Options,
}

struct ScopeNode {
    name: Option<String>,
    checkpoint: bool,
    parent: Option<Weak<ScopeNode>>,
    registry: RwLock<BindingRegistry>,
    finalizers: Mutex<FinalizerQueue>,
    state: Mutex<ScopeState>,
    shared: Arc<Shared>,
}

/// Thread-safe handle to a scope
#[derive(Clone)]
pub struct Container {
    inner: Arc<ScopeNode>,
}

thread_local! {
    static RESOLVING: RefCell<Vec<(usize, String)>> = const { RefCell::new(Vec::new()) };
}

/// Marks an identifier as being resolved in one scope on this thread
struct ResolvingGuard;

impl ResolvingGuard {
    fn enter(node: &Arc<ScopeNode>, alias: &str) -> DiResult<Self> {
        let key = Arc::as_ptr(node) as usize;
        RESOLVING.with(|stack| {
            let mut stack = stack.borrow_mut();
            if stack.iter().any(|(n, a)| *n == key && a == alias) {
                let path = stack
                    .iter()
                    .map(|(_, a)| a.as_str())
                    .chain(std::iter::once(alias))
                    .collect::<Vec<_>>()
                    .join(" -> ");
                return Err(DiError::CircularDependency { path });
            }
            stack.push((key, alias.to_string()));
            Ok(ResolvingGuard)
        })
    }
}

impl Drop for ResolvingGuard {
    fn drop(&mut self) {
        RESOLVING.with(|stack| {
            stack.borrow_mut().pop();
        });
    }
}

/// The scope itself followed by its living ancestors
struct Ancestors {
    next: Option<Container>,
}

impl Iterator for Ancestors {
    type Item = Container;

    fn next(&mut self) -> Option<Container> {
        let current = self.next.take()?;
        self.next = current.parent();
        Some(current)
    }
}

impl Container {
    /// Create a root container with default options
    pub fn new() -> Self {
        Self::with_options(Options::default())
    }

    pub fn with_options(options: Options) -> Self {
        let shared = Arc::new(Shared {
            classes: ClassRegistry::new(),
            binders: RwLock::new(FxHashMap::default()),
            reflector: Reflector::new(),
            options,
        });
        Self::from_node(ScopeNode {
            name: Some(ROOT_SCOPE.to_string()),
            checkpoint: false,
            parent: None,
            registry: RwLock::new(BindingRegistry::new()),
            finalizers: Mutex::new(FinalizerQueue::new()),
            state: Mutex::new(ScopeState::Active),
            shared,
        })
    }

    fn from_node(node: ScopeNode) -> Self {
        Self {
            inner: Arc::new(node),
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.inner.name.as_deref()
    }

    pub fn parent(&self) -> Option<Container> {
        self.inner
            .parent
            .as_ref()
            .and_then(Weak::upgrade)
            .map(|inner| Container { inner })
    }

    pub fn is_checkpoint(&self) -> bool {
        self.inner.checkpoint
    }

    pub fn options(&self) -> &Options {
        &self.inner.shared.options
    }

    pub fn state(&self) -> ScopeState {
        *self.inner.state.lock()
    }

    /// Both handles point at the same scope
    pub fn same(&self, other: &Container) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    fn ancestors(&self) -> Ancestors {
        Ancestors {
            next: Some(self.clone()),
        }
    }

    fn chain_contains(&self, scope: &str) -> bool {
        self.ancestors().any(|c| c.name() == Some(scope))
    }

    // Registration

    pub fn register_class(&self, class: ClassDefinition) {
        trace!("Registering class `{}`", class.name());
        self.inner.shared.classes.register(class);
    }

    pub fn bind(&self, id: impl Into<String>, definition: impl Into<Definition>) -> DiResult<()> {
        self.inner.registry.write().bind(id, definition)
    }

    pub fn bind_singleton(
        &self,
        id: impl Into<String>,
        definition: impl Into<Definition>,
    ) -> DiResult<()> {
        self.inner.registry.write().bind_singleton(id, definition)
    }

    /// Run `inflector` on every new instance of `ty` created in this scope or below
    pub fn bind_inflector(&self, ty: impl Into<Arc<str>>, inflector: Callable) {
        self.inner.registry.write().bind_inflector(ty, inflector);
    }

    /// Binding or cached instance visible from this scope
    pub fn has(&self, id: &str) -> bool {
        for container in self.ancestors() {
            if container.inner.registry.read().has(id) {
                return true;
            }
            if container.is_checkpoint() {
                break;
            }
        }
        false
    }

    /// Ready instance visible from this scope
    pub fn has_instance(&self, id: &str) -> bool {
        for container in self.ancestors() {
            if container.inner.registry.read().has_instance(id) {
                return true;
            }
            if container.is_checkpoint() {
                break;
            }
        }
        false
    }

    /// Remove a binding and its singleton from this scope
    pub fn remove_binding(&self, id: &str) {
        self.inner.registry.write().remove(id);
    }

    /// Default bindings for every scope named `scope` opened from now on
    pub fn binder(&self, scope: impl Into<String>) -> ScopeBinder {
        ScopeBinder::new(self.inner.shared.clone(), scope.into())
    }

    // Resolution

    pub fn get(&self, id: &str) -> DiResult<Value> {
        self.get_with_context(id, None)
    }

    /// Resolve `id` on behalf of the parameter named `context`
    pub fn get_with_context(&self, id: &str, context: Option<&str>) -> DiResult<Value> {
        ContainerScope::enter(self, || self.resolve(id, Arguments::new(), context))
    }

    /// Resolve `id` with explicit constructor arguments.
    ///
    /// Instances built with arguments are never cached as singletons.
    pub fn make(&self, id: &str, arguments: Arguments) -> DiResult<Value> {
        ContainerScope::enter(self, || self.resolve(id, arguments, None))
    }

    /// Resolve the callable's parameters and call it
    pub fn invoke(&self, callable: &Callable, arguments: Arguments) -> DiResult<Value> {
        ContainerScope::enter(self, || {
            let validate = self.options().validate_arguments;
            let resolved = self.resolve_arguments(callable, arguments, validate)?;
            callable.call(resolved).map_err(|err| {
                DiError::from_body(err, |source| DiError::Invocation {
                    function: callable.name().to_string(),
                    source,
                })
            })
        })
    }

    pub fn resolve_arguments(
        &self,
        callable: &Callable,
        arguments: Arguments,
        validate: bool,
    ) -> DiResult<Arguments> {
        ArgumentResolver::new(self).resolve(callable.name(), callable.signature(), arguments, validate)
    }

    pub fn validate_arguments(&self, callable: &Callable, arguments: &Arguments) -> DiResult<()> {
        ArgumentResolver::validate(callable.name(), callable.signature(), arguments)
    }

    /// Parameter descriptors of a callable
    pub fn parameters<'c>(&self, callable: &'c Callable) -> &'c [Parameter] {
        self.inner.shared.reflector.parameters(callable)
    }

    /// Parse a declaration through the shared signature cache
    pub fn describe(&self, declaration: &str) -> DiResult<Signature> {
        Ok(self.inner.shared.reflector.describe(declaration)?)
    }

    /// Build a callable from a declaration such as `LoggerInterface $logger, int $n = 1`
    pub fn closure<F>(&self, name: &str, declaration: &str, body: F) -> DiResult<Callable>
    where
        F: Fn(Arguments) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        Ok(Callable::new(name, self.describe(declaration)?, body))
    }

    fn resolve(&self, alias: &str, arguments: Arguments, context: Option<&str>) -> DiResult<Value> {
        if arguments.is_empty() {
            let cached = self.inner.registry.read().singleton(alias).cloned();
            if let Some(value) = cached {
                return Ok(value);
            }
        }

        let _guard = ResolvingGuard::enter(&self.inner, alias)?;

        let binding = self.inner.registry.read().binding(alias).cloned();
        match binding {
            Some(binding) => self.resolve_binding(alias, binding, arguments, context),
            None => self.resolve_without_binding(alias, arguments, context),
        }
    }

    fn resolve_binding(
        &self,
        alias: &str,
        binding: Binding,
        arguments: Arguments,
        context: Option<&str>,
    ) -> DiResult<Value> {
        trace!(
            "Resolving `{}` from binding in scope {:?}",
            alias,
            self.name()
        );
        let no_arguments = arguments.is_empty();

        let value = match binding.definition {
            Definition::Instance(Value::Object(object)) if !no_arguments => {
                // explicit arguments bypass the shared instance
                let class = self.class_of(alias, object.class())?;
                return Ok(Value::Object(self.create_instance(&class, arguments)?));
            }
            Definition::Instance(value) => return Ok(value),
            Definition::Alias(target) if target == alias => {
                return self.autowire(alias, arguments, binding.singleton);
            }
            Definition::Alias(target) => {
                let value = self.resolve(&target, arguments, context)?;
                if binding.singleton && no_arguments {
                    return Ok(self.inner.registry.write().store_singleton(alias, value));
                }
                return Ok(value);
            }
            Definition::Factory(factory) => self.invoke(&factory, arguments)?,
            Definition::Method { receiver, method } => {
                let callable = self.bind_method(alias, receiver, &method)?;
                self.invoke(&callable, arguments)?
            }
            Definition::Autowire(autowire) => {
                let merged = autowire.arguments.clone().merge(arguments);
                if autowire.alias != alias {
                    let value = self.resolve(&autowire.alias, merged, context)?;
                    if binding.singleton && no_arguments {
                        return Ok(self.inner.registry.write().store_singleton(alias, value));
                    }
                    return Ok(value);
                }
                let class = self.class_of(alias, alias)?;
                Value::Object(self.create_instance(&class, merged)?)
            }
        };

        self.validate_new_instance(&value)?;

        if !no_arguments {
            return Ok(value);
        }
        match value {
            Value::Object(object) => self.register_instance(alias, object, binding.singleton),
            value if binding.singleton => {
                Ok(self.inner.registry.write().store_singleton(alias, value))
            }
            value => Ok(value),
        }
    }

    fn resolve_without_binding(
        &self,
        alias: &str,
        arguments: Arguments,
        context: Option<&str>,
    ) -> DiResult<Value> {
        if !self.is_checkpoint() {
            if let Some(parent) = self.parent() {
                trace!(
                    "Jump to parent scope {:?} from {:?} for `{}`",
                    parent.name(),
                    self.name(),
                    alias
                );
                match parent.resolve(alias, arguments.clone(), context) {
                    Ok(value) => return Ok(value),
                    Err(DiError::BadScope { scope, class }) => {
                        if self.name() != Some(scope.as_str()) {
                            return Err(DiError::BadScope { scope, class });
                        }
                    }
                    Err(err) if err.kind() == ErrorKind::NotFound => {
                        return Err(DiError::NotFound {
                            id: alias.to_string(),
                            scope: self.name().map(str::to_string),
                            previous: Some(Box::new(err)),
                        });
                    }
                    Err(err) => return Err(err),
                }
            }
        }

        debug!("Autowiring `{}` in scope {:?}", alias, self.name());
        self.autowire(alias, arguments, false)
    }

    fn class_of(&self, alias: &str, class: &str) -> DiResult<Arc<ClassDefinition>> {
        self.inner
            .shared
            .classes
            .get(class)
            .ok_or_else(|| DiError::not_found(alias, self.name()))
    }

    /// Construct the class named `alias` in this scope
    fn autowire(&self, alias: &str, arguments: Arguments, singleton: bool) -> DiResult<Value> {
        let class = self.class_of(alias, alias)?;
        let no_arguments = arguments.is_empty();
        let object = self.create_instance(&class, arguments)?;

        if no_arguments {
            self.register_instance(alias, object, singleton)
        } else {
            Ok(Value::Object(object))
        }
    }

    fn create_instance(&self, class: &ClassDefinition, arguments: Arguments) -> DiResult<Object> {
        if self.options().check_scope {
            if let Some(scope) = class.scope() {
                let allowed = self.name() == Some(scope)
                    || (self.is_checkpoint() && self.chain_contains(scope));
                if !allowed {
                    return Err(DiError::BadScope {
                        scope: scope.to_string(),
                        class: class.name().to_string(),
                    });
                }
            }
        }

        let constructor = class.constructor().ok_or_else(|| DiError::NotInstantiable {
            class: class.name().to_string(),
        })?;

        let resolved = ArgumentResolver::new(self).resolve(
            class.name(),
            &constructor.signature,
            arguments,
            self.options().validate_arguments,
        )?;

        let payload = (constructor.body)(resolved).map_err(|err| {
            DiError::from_body(err, |source| DiError::Construction {
                class: class.name().to_string(),
                source,
            })
        })?;

        Ok(class.instantiate(payload))
    }

    /// Inflectors, declarative singletons and finalizer registration
    fn register_instance(&self, alias: &str, object: Object, singleton: bool) -> DiResult<Value> {
        let value = self.run_inflectors(object)?;
        let object = match &value {
            Value::Object(object) => object.clone(),
            _ => return Ok(value),
        };

        let class = self.inner.shared.classes.get(object.class());
        let singleton = singleton || class.as_ref().map_or(false, |c| c.is_singleton());

        if singleton {
            let stored = self.inner.registry.write().store_singleton(alias, value.clone());
            if stored != value {
                return Ok(stored);
            }
        }

        if let Some(class) = class {
            if let Some(method) = class.finalize() {
                let finalizer = class.method(method).ok_or_else(|| DiError::UndefinedMethod {
                    class: class.name().to_string(),
                    method: method.to_string(),
                })?;
                trace!(
                    "Registering finalizer `{}::{}` in scope {:?}",
                    class.name(),
                    method,
                    self.name()
                );
                self.inner.finalizers.lock().push(finalizer.bind(object));
            }
        }

        Ok(value)
    }

    fn run_inflectors(&self, object: Object) -> DiResult<Value> {
        let mut current = object;
        for container in self.ancestors() {
            let inflectors = container.inner.registry.read().inflectors().to_vec();
            for (ty, inflector) in inflectors {
                if !current.is_instance_of(&ty) {
                    continue;
                }
                let result = self.invoke(&inflector, Arguments::positional([current.clone()]))?;
                if let Value::Object(replaced) = result {
                    current = replaced;
                }
            }
        }
        Ok(Value::Object(current))
    }

    /// Objects produced by factories must live in their declared scope
    fn validate_new_instance(&self, value: &Value) -> DiResult<()> {
        if !self.options().check_scope {
            return Ok(());
        }
        let Some(object) = value.as_object() else {
            return Ok(());
        };
        let Some(class) = self.inner.shared.classes.get(object.class()) else {
            return Ok(());
        };
        match class.scope() {
            Some(scope) if !self.chain_contains(scope) => Err(DiError::BadScope {
                scope: scope.to_string(),
                class: class.name().to_string(),
            }),
            _ => Ok(()),
        }
    }

    fn bind_method(&self, alias: &str, receiver: Receiver, method: &str) -> DiResult<Callable> {
        let object = match receiver {
            Receiver::Object(object) => object,
            Receiver::Class(id) => {
                let value = self.resolve(&id, Arguments::new(), None)?;
                value
                    .as_object()
                    .cloned()
                    .ok_or_else(|| DiError::InvalidBinding {
                        alias: alias.to_string(),
                        reason: format!("`{}` did not resolve to an object", id),
                    })?
            }
        };

        let class = self
            .inner
            .shared
            .classes
            .get(object.class())
            .ok_or_else(|| DiError::UndefinedMethod {
                class: object.class().to_string(),
                method: method.to_string(),
            })?;
        let bound = class
            .method(method)
            .ok_or_else(|| DiError::UndefinedMethod {
                class: object.class().to_string(),
                method: method.to_string(),
            })?
            .bind(object);
        Ok(bound)
    }

    // Scopes

    /// Open a child scope, run `f` with it as the ambient container, then finalize it.
    ///
    /// A finalizer failure is reported even when `f` succeeded.
    pub fn run_scope<R, F>(&self, scope: Scope, f: F) -> DiResult<R>
    where
        F: FnOnce(&Container) -> DiResult<R>,
    {
        let child = self.open_scope(scope)?;
        let result = ContainerScope::run(&child, || f(&child));
        child.close(result)
    }

    /// Async flavour of [`Container::run_scope`]; the child stays ambient across awaits
    pub async fn run_scope_async<R, F, Fut>(&self, scope: Scope, f: F) -> DiResult<R>
    where
        F: FnOnce(Container) -> Fut,
        Fut: Future<Output = DiResult<R>>,
    {
        let child = self.open_scope(scope)?;
        let scoped = child.clone();
        // `f` itself is called inside the scope, not just its future
        let result =
            ContainerScope::run_async(child.clone(), async move { f(scoped).await }).await;
        child.close(result)
    }

    fn open_scope(&self, scope: Scope) -> DiResult<Container> {
        let (name, bindings, checkpoint) = scope.into_parts();

        let mut registry = BindingRegistry::new();
        if let Some(name) = &name {
            if self.chain_contains(name) {
                return Err(DiError::NamedScopeDuplication {
                    scope: name.clone(),
                });
            }
            if let Some(defaults) = self.inner.shared.binders.read().get(name) {
                defaults.apply_to(&mut registry);
            }
        }
        for (id, definition) in bindings {
            registry.bind(id, definition)?;
        }

        debug!(
            "Opening scope {:?} under {:?}{}",
            name,
            self.name(),
            if checkpoint { " (checkpoint)" } else { "" }
        );

        Ok(Self::from_node(ScopeNode {
            name,
            checkpoint,
            parent: Some(Arc::downgrade(&self.inner)),
            registry: RwLock::new(registry),
            finalizers: Mutex::new(FinalizerQueue::new()),
            state: Mutex::new(ScopeState::Active),
            shared: self.inner.shared.clone(),
        }))
    }

    fn close<R>(&self, result: DiResult<R>) -> DiResult<R> {
        *self.inner.state.lock() = ScopeState::Ending;
        match self.finalize() {
            Ok(()) => result,
            Err(err) => {
                if let Err(callback) = &result {
                    warn!(
                        "Scope {:?} callback failed before finalization: {}",
                        self.name(),
                        callback
                    );
                }
                Err(err)
            }
        }
    }

    /// Run every pending finalizer, collecting failures, then release bindings
    fn finalize(&self) -> DiResult<()> {
        *self.inner.state.lock() = ScopeState::Finalizing;
        let mut errors = Vec::new();

        loop {
            let batch = self.inner.finalizers.lock().take_all();
            if batch.is_empty() {
                break;
            }
            for finalizer in batch {
                if let Err(err) = self.invoke(&finalizer, Arguments::new()) {
                    warn!("Finalizer `{}` failed: {}", finalizer.name(), err);
                    errors.push(err);
                }
            }
        }

        let released = std::mem::take(&mut *self.inner.registry.write());
        drop(released);
        *self.inner.state.lock() = ScopeState::Destroyed;
        debug!("Scope {:?} destroyed", self.name());

        if errors.is_empty() {
            Ok(())
        } else {
            Err(DiError::Finalizers {
                scope: self.name().map(str::to_string),
                errors,
            })
        }
    }
}

impl Default for Container {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Container {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Container")
            .field("scope", &self.name())
            .field("checkpoint", &self.is_checkpoint())
            .field("state", &self.state())
            .finish()
    }
}

impl ServiceProvider for Container {
    fn has(&self, id: &str) -> bool {
        Container::has(self, id)
    }

    fn get(&self, id: &str, context: Option<&str>) -> DiResult<Value> {
        self.get_with_context(id, context)
    }

    fn make(&self, id: &str, arguments: Arguments) -> DiResult<Value> {
        Container::make(self, id, arguments)
    }
}

impl Drop for ScopeNode {
    fn drop(&mut self) {
        let pending = self.finalizers.get_mut().take_all();
        if pending.is_empty() {
            return;
        }

        // finalizers need a live handle to autowire their parameters
        let mut finalizers = FinalizerQueue::new();
        for finalizer in pending {
            finalizers.push(finalizer);
        }
        let container = Container::from_node(ScopeNode {
            name: self.name.take(),
            checkpoint: self.checkpoint,
            parent: self.parent.take(),
            registry: RwLock::new(std::mem::take(self.registry.get_mut())),
            finalizers: Mutex::new(finalizers),
            state: Mutex::new(ScopeState::Ending),
            shared: self.shared.clone(),
        });

        if let Err(err) = container.finalize() {
            error!("{}", err);
            for inner in err.errors() {
                error!("  {}", inner);
            }
        }
    }
}
