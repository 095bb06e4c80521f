//! Callables and methods invoked by the container

use std::fmt;
use std::sync::Arc;

use crate::types::Signature;
use crate::value::{Arguments, Object, Value};

pub type CallableBody = Arc<dyn Fn(Arguments) -> anyhow::Result<Value> + Send + Sync>;
pub type MethodBody = Arc<dyn Fn(&Object, Arguments) -> anyhow::Result<Value> + Send + Sync>;

/// A function with a declared signature.
///
/// The body receives the resolved argument list: one entry per parameter keyed
/// by position, variadic values spread after it, and named trailing entries
/// at the end.
#[derive(Clone)]
pub struct Callable {
    name: Arc<str>,
    signature: Signature,
    body: CallableBody,
}

impl Callable {
    pub fn new<F>(name: impl Into<Arc<str>>, signature: Signature, body: F) -> Self
    where
        F: Fn(Arguments) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            signature,
            body: Arc::new(body),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    pub fn call(&self, arguments: Arguments) -> anyhow::Result<Value> {
        (self.body)(arguments)
    }

    pub fn ptr_eq(&self, other: &Callable) -> bool {
        Arc::ptr_eq(&self.body, &other.body)
    }
}

impl fmt::Debug for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callable")
            .field("name", &self.name)
            .field("parameters", &self.signature.len())
            .finish()
    }
}

/// A method declared on a class; bound to an instance before invocation
#[derive(Clone)]
pub struct Method {
    name: Arc<str>,
    signature: Signature,
    body: MethodBody,
}

impl Method {
    pub fn new(name: impl Into<Arc<str>>, signature: Signature, body: MethodBody) -> Self {
        Self {
            name: name.into(),
            signature,
            body,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    /// `[object, method]` as a plain callable
    pub fn bind(&self, object: Object) -> Callable {
        let body = self.body.clone();
        let name = format!("{}::{}", object.class(), self.name);
        Callable::new(name, self.signature.clone(), move |arguments| {
            body(&object, arguments)
        })
    }
}

impl fmt::Debug for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Method").field("name", &self.name).finish()
    }
}
