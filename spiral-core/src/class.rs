//! Explicit class declarations
//!
//! Classes are described up front: what they implement, how they are
//! constructed, which methods they expose, and the lifecycle declarations the
//! container honours (singleton, scope constraint, finalizer method).

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use std::any::Any;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::callable::Method;
use crate::error::DiResult;
use crate::parser::parse_signature;
use crate::parser::SignatureError;
use crate::types::Signature;
use crate::value::{Arguments, Object, Value};

pub type ConstructorBody =
    Arc<dyn Fn(Arguments) -> anyhow::Result<Box<dyn Any + Send + Sync>> + Send + Sync>;

#[derive(Clone)]
pub struct Constructor {
    pub signature: Signature,
    pub body: ConstructorBody,
}

#[derive(Clone)]
pub struct ClassDefinition {
    name: Arc<str>,
    types: Arc<[Arc<str>]>,
    constructor: Option<Constructor>,
    methods: FxHashMap<String, Method>,
    singleton: bool,
    scope: Option<String>,
    finalize: Option<String>,
}

impl ClassDefinition {
    pub fn builder<T: Any + Send + Sync>(name: impl Into<Arc<str>>) -> ClassBuilder<T> {
        ClassBuilder::new(name.into())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The class itself followed by its interfaces
    pub fn types(&self) -> &[Arc<str>] {
        &self.types
    }

    pub fn constructor(&self) -> Option<&Constructor> {
        self.constructor.as_ref()
    }

    pub fn method(&self, name: &str) -> Option<&Method> {
        self.methods.get(name)
    }

    pub fn is_singleton(&self) -> bool {
        self.singleton
    }

    /// Name of the only scope the class may be created in
    pub fn scope(&self) -> Option<&str> {
        self.scope.as_deref()
    }

    /// Method to run when the owning scope ends
    pub fn finalize(&self) -> Option<&str> {
        self.finalize.as_deref()
    }

    pub fn is_instantiable(&self) -> bool {
        self.constructor.is_some()
    }

    pub(crate) fn instantiate(&self, payload: Box<dyn Any + Send + Sync>) -> Object {
        Object::from_boxed(self.name.clone(), self.types.clone(), payload)
    }
}

impl std::fmt::Debug for ClassDefinition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClassDefinition")
            .field("name", &self.name)
            .field("types", &self.types)
            .field("singleton", &self.singleton)
            .field("scope", &self.scope)
            .field("finalize", &self.finalize)
            .finish()
    }
}

/// Builder for a class whose instances carry a `T` payload
pub struct ClassBuilder<T> {
    name: Arc<str>,
    types: Vec<Arc<str>>,
    constructor: Option<Constructor>,
    methods: FxHashMap<String, Method>,
    singleton: bool,
    scope: Option<String>,
    finalize: Option<String>,
    error: Option<SignatureError>,
    _payload: PhantomData<fn() -> T>,
}

impl<T: Any + Send + Sync> ClassBuilder<T> {
    fn new(name: Arc<str>) -> Self {
        Self {
            types: vec![name.clone()],
            name,
            constructor: None,
            methods: FxHashMap::default(),
            singleton: false,
            scope: None,
            finalize: None,
            error: None,
            _payload: PhantomData,
        }
    }

    /// Declare an implemented interface or parent class
    pub fn implements(mut self, interface: impl Into<Arc<str>>) -> Self {
        self.types.push(interface.into());
        self
    }

    pub fn constructor<F>(mut self, declaration: &str, body: F) -> Self
    where
        F: Fn(Arguments) -> anyhow::Result<T> + Send + Sync + 'static,
    {
        if let Some(signature) = self.signature(declaration) {
            self.constructor = Some(Constructor {
                signature,
                body: Arc::new(move |arguments| {
                    body(arguments).map(|payload| Box::new(payload) as Box<dyn Any + Send + Sync>)
                }),
            });
        }
        self
    }

    pub fn method<F>(mut self, name: &str, declaration: &str, body: F) -> Self
    where
        F: Fn(&T, Arguments) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        if let Some(signature) = self.signature(declaration) {
            let class = self.name.clone();
            let method = Method::new(
                name,
                signature,
                Arc::new(move |object: &Object, arguments: Arguments| {
                    let payload = object.downcast_ref::<T>().ok_or_else(|| {
                        anyhow::anyhow!("`{}` is not an instance of `{}`", object.class(), class)
                    })?;
                    body(payload, arguments)
                }),
            );
            self.methods.insert(name.to_string(), method);
        }
        self
    }

    pub fn singleton(mut self) -> Self {
        self.singleton = true;
        self
    }

    pub fn scope(mut self, name: impl Into<String>) -> Self {
        self.scope = Some(name.into());
        self
    }

    pub fn finalize(mut self, method: impl Into<String>) -> Self {
        self.finalize = Some(method.into());
        self
    }

    pub fn build(self) -> DiResult<ClassDefinition> {
        if let Some(error) = self.error {
            return Err(error.into());
        }
        Ok(ClassDefinition {
            name: self.name,
            types: Arc::from(self.types),
            constructor: self.constructor,
            methods: self.methods,
            singleton: self.singleton,
            scope: self.scope,
            finalize: self.finalize,
        })
    }

    fn signature(&mut self, declaration: &str) -> Option<Signature> {
        match parse_signature(declaration) {
            Ok(signature) => Some(signature),
            Err(error) => {
                self.error.get_or_insert(error);
                None
            }
        }
    }
}

impl<T: Any + Send + Sync + Default> ClassBuilder<T> {
    /// Constructor without parameters
    pub fn default_constructor(self) -> Self {
        self.constructor("", |_| Ok(T::default()))
    }
}

/// Class declarations shared by every scope of a container
#[derive(Default)]
pub struct ClassRegistry {
    classes: RwLock<FxHashMap<String, Arc<ClassDefinition>>>,
}

impl ClassRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, class: ClassDefinition) {
        self.classes
            .write()
            .insert(class.name().to_string(), Arc::new(class));
    }

    pub fn get(&self, name: &str) -> Option<Arc<ClassDefinition>> {
        self.classes.read().get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.classes.read().contains_key(name)
    }
}
