//! Dynamic values passed through the container

use parking_lot::RwLock;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::callable::Callable;
use crate::error::DiResult;
use crate::provider::ServiceProvider;

/// Argument or array key
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Key {
    Index(usize),
    Name(String),
}

impl Key {
    pub fn is_index(&self) -> bool {
        matches!(self, Key::Index(_))
    }

    pub fn as_index(&self) -> Option<usize> {
        match self {
            Key::Index(i) => Some(*i),
            Key::Name(_) => None,
        }
    }

    pub fn as_name(&self) -> Option<&str> {
        match self {
            Key::Name(name) => Some(name),
            Key::Index(_) => None,
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Index(i) => write!(f, "#{}", i),
            Key::Name(name) => f.write_str(name),
        }
    }
}

impl From<usize> for Key {
    fn from(index: usize) -> Self {
        Key::Index(index)
    }
}

impl From<&str> for Key {
    fn from(name: &str) -> Self {
        Key::Name(name.to_string())
    }
}

impl From<String> for Key {
    fn from(name: String) -> Self {
        Key::Name(name)
    }
}

/// Ordered map of positional and named entries.
///
/// Used both for caller-supplied arguments and for array values. Entries keep
/// insertion order; pushing without a key uses one past the largest index seen.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Arguments {
    entries: Vec<(Key, Value)>,
    next_index: usize,
}

impl Arguments {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a list from positional values
    pub fn positional<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let mut args = Self::new();
        for value in values {
            args.push(value);
        }
        args
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Append under the next free index
    ///
    /// Once `usize::MAX` is taken, further pushes replace that entry.
    pub fn push(&mut self, value: impl Into<Value>) {
        let index = self.next_index;
        if index == usize::MAX {
            self.insert(index, value);
            return;
        }
        self.entries.push((Key::Index(index), value.into()));
        self.next_index = index + 1;
    }

    /// Insert or replace the entry under `key`
    pub fn insert(&mut self, key: impl Into<Key>, value: impl Into<Value>) {
        let key = key.into();
        let value = value.into();
        if let Key::Index(i) = key {
            self.next_index = self.next_index.max(i.saturating_add(1));
        }
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => *slot = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Builder flavour of [`Arguments::insert`]
    pub fn with(mut self, key: impl Into<Key>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn get(&self, key: &Key) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Entry under the integer key `index`
    pub fn at(&self, index: usize) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(k, _)| *k == Key::Index(index))
            .map(|(_, v)| v)
    }

    /// Entry under the string key `name`
    pub fn named(&self, name: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(k, _)| k.as_name() == Some(name))
            .map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &Key) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }

    pub fn remove(&mut self, key: &Key) -> Option<Value> {
        let position = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(position).1)
    }

    /// Merge another map in: string keys overwrite, integer keys are appended
    pub fn merge(mut self, other: Arguments) -> Self {
        for (key, value) in other.entries {
            match key {
                Key::Index(_) => self.push(value),
                Key::Name(name) => self.insert(name, value),
            }
        }
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Key, &Value)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &Key> {
        self.entries.iter().map(|(k, _)| k)
    }

    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.entries.iter().map(|(_, v)| v)
    }

    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut Value> {
        self.entries.iter_mut().map(|(_, v)| v)
    }

    pub fn into_values(self) -> Vec<Value> {
        self.entries.into_iter().map(|(_, v)| v).collect()
    }

    pub fn has_named(&self) -> bool {
        self.entries.iter().any(|(k, _)| !k.is_index())
    }
}

impl IntoIterator for Arguments {
    type Item = (Key, Value);
    type IntoIter = std::vec::IntoIter<(Key, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<K: Into<Key>, V: Into<Value>> FromIterator<(K, V)> for Arguments {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut args = Arguments::new();
        for (key, value) in iter {
            args.insert(key, value);
        }
        args
    }
}

/// Build an [`Arguments`] map: `arguments![a, b]` or `arguments!["x" => a, 2 => b]`
#[macro_export]
macro_rules! arguments {
    () => {
        $crate::Arguments::new()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut args = $crate::Arguments::new();
        $(args.insert($key, $value);)+
        args
    }};
    ($($value:expr),+ $(,)?) => {{
        let mut args = $crate::Arguments::new();
        $(args.push($value);)+
        args
    }};
}

/// Explicit shared cell for by-reference arguments
#[derive(Clone)]
pub struct Reference(Arc<RwLock<Value>>);

impl Reference {
    pub fn new(value: impl Into<Value>) -> Self {
        Reference(Arc::new(RwLock::new(value.into())))
    }

    pub fn get(&self) -> Value {
        self.0.read().clone()
    }

    pub fn set(&self, value: impl Into<Value>) {
        *self.0.write() = value.into();
    }

    pub fn ptr_eq(&self, other: &Reference) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Reference").field(&*self.0.read()).finish()
    }
}

struct ObjectInner {
    class: Arc<str>,
    types: Arc<[Arc<str>]>,
    payload: Box<dyn Any + Send + Sync>,
}

/// Instance of a class: name, implemented types and a typed payload
#[derive(Clone)]
pub struct Object(Arc<ObjectInner>);

impl Object {
    pub fn new<T: Any + Send + Sync>(class: impl Into<Arc<str>>, payload: T) -> Self {
        let class = class.into();
        let types: Arc<[Arc<str>]> = Arc::from(vec![class.clone()]);
        Self::with_types(class, types, payload)
    }

    /// `types` lists every class and interface the instance satisfies
    pub fn with_types<T: Any + Send + Sync>(
        class: impl Into<Arc<str>>,
        types: Arc<[Arc<str>]>,
        payload: T,
    ) -> Self {
        Object(Arc::new(ObjectInner {
            class: class.into(),
            types,
            payload: Box::new(payload),
        }))
    }

    pub(crate) fn from_boxed(
        class: Arc<str>,
        types: Arc<[Arc<str>]>,
        payload: Box<dyn Any + Send + Sync>,
    ) -> Self {
        Object(Arc::new(ObjectInner {
            class,
            types,
            payload,
        }))
    }

    pub fn class(&self) -> &str {
        &self.0.class
    }

    pub fn types(&self) -> &[Arc<str>] {
        &self.0.types
    }

    pub fn is_instance_of(&self, name: &str) -> bool {
        &*self.0.class == name || self.0.types.iter().any(|t| &**t == name)
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.payload.downcast_ref::<T>()
    }

    pub fn ptr_eq(&self, other: &Object) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Object({}@{:p})", self.0.class, Arc::as_ptr(&self.0))
    }
}

/// Deferred `make(alias, arguments)`
#[derive(Debug, Clone, PartialEq)]
pub struct Autowire {
    pub alias: String,
    pub arguments: Arguments,
}

impl Autowire {
    pub fn new(alias: impl Into<String>, arguments: Arguments) -> Self {
        Self {
            alias: alias.into(),
            arguments,
        }
    }

    pub fn wire(alias: impl Into<String>) -> Self {
        Self::new(alias, Arguments::new())
    }

    /// Produce the instance, `extra` entries merged over the stored ones
    pub fn resolve(&self, provider: &dyn ServiceProvider, extra: Arguments) -> DiResult<Value> {
        let arguments = self.arguments.clone().merge(extra);
        provider.make(&self.alias, arguments)
    }
}

/// Any value the container can pass around
#[derive(Debug, Clone, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Array(Arguments),
    Object(Object),
    Callable(Callable),
    Reference(Reference),
    Autowire(Arc<Autowire>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&Arguments> {
        match self {
            Value::Array(array) => Some(array),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Value::Object(object) => Some(object),
            _ => None,
        }
    }

    pub fn as_callable(&self) -> Option<&Callable> {
        match self {
            Value::Callable(callable) => Some(callable),
            _ => None,
        }
    }

    pub fn as_reference(&self) -> Option<&Reference> {
        match self {
            Value::Reference(reference) => Some(reference),
            _ => None,
        }
    }

    /// Typed payload of an object value
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.as_object()?.downcast_ref::<T>()
    }

    /// Current value behind a reference, or the value itself
    pub fn deref_value(&self) -> Value {
        match self {
            Value::Reference(reference) => reference.get(),
            other => other.clone(),
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
            Value::Callable(_) => "callable",
            Value::Reference(_) => "reference",
            Value::Autowire(_) => "autowire",
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a.ptr_eq(b),
            (Value::Callable(a), Value::Callable(b)) => a.ptr_eq(b),
            (Value::Reference(a), Value::Reference(b)) => a.ptr_eq(b),
            (Value::Autowire(a), Value::Autowire(b)) => a == b,
            _ => false,
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Arguments> for Value {
    fn from(array: Arguments) -> Self {
        Value::Array(array)
    }
}

impl From<Object> for Value {
    fn from(object: Object) -> Self {
        Value::Object(object)
    }
}

impl From<Callable> for Value {
    fn from(callable: Callable) -> Self {
        Value::Callable(callable)
    }
}

impl From<Reference> for Value {
    fn from(reference: Reference) -> Self {
        Value::Reference(reference)
    }
}

impl From<Autowire> for Value {
    fn from(autowire: Autowire) -> Self {
        Value::Autowire(Arc::new(autowire))
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}
