//! Parameter descriptors and runtime type checks

use std::fmt;
use std::sync::Arc;

use crate::value::Value;

/// Builtin (non-class) type names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    Mixed,
    Int,
    Float,
    String,
    Bool,
    Array,
    Iterable,
    Callable,
    Object,
    True,
    False,
    Null,
}

impl ScalarKind {
    pub fn from_name(name: &str) -> Option<Self> {
        let kind = match name.to_ascii_lowercase().as_str() {
            "mixed" => ScalarKind::Mixed,
            "int" => ScalarKind::Int,
            "float" => ScalarKind::Float,
            "string" => ScalarKind::String,
            "bool" => ScalarKind::Bool,
            "array" => ScalarKind::Array,
            "iterable" => ScalarKind::Iterable,
            "callable" => ScalarKind::Callable,
            "object" => ScalarKind::Object,
            "true" => ScalarKind::True,
            "false" => ScalarKind::False,
            "null" => ScalarKind::Null,
            _ => return None,
        };
        Some(kind)
    }

    pub fn name(self) -> &'static str {
        match self {
            ScalarKind::Mixed => "mixed",
            ScalarKind::Int => "int",
            ScalarKind::Float => "float",
            ScalarKind::String => "string",
            ScalarKind::Bool => "bool",
            ScalarKind::Array => "array",
            ScalarKind::Iterable => "iterable",
            ScalarKind::Callable => "callable",
            ScalarKind::Object => "object",
            ScalarKind::True => "true",
            ScalarKind::False => "false",
            ScalarKind::Null => "null",
        }
    }

    /// Strict runtime check; `int` never accepts floats or numeric strings
    pub fn accepts(self, value: &Value) -> bool {
        match self {
            ScalarKind::Mixed => true,
            ScalarKind::Int => matches!(value, Value::Int(_)),
            ScalarKind::Float => matches!(value, Value::Float(_)),
            ScalarKind::String => matches!(value, Value::String(_)),
            ScalarKind::Bool => matches!(value, Value::Bool(_)),
            ScalarKind::Array => matches!(value, Value::Array(_)),
            ScalarKind::Iterable => match value {
                Value::Array(_) => true,
                Value::Object(object) => object.is_instance_of("Traversable"),
                _ => false,
            },
            ScalarKind::Callable => matches!(value, Value::Callable(_)),
            ScalarKind::Object => matches!(value, Value::Object(_)),
            ScalarKind::True => matches!(value, Value::Bool(true)),
            ScalarKind::False => matches!(value, Value::Bool(false)),
            ScalarKind::Null => value.is_null(),
        }
    }
}

/// Declared parameter type
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Type {
    /// No type hint; accepts anything
    None,
    Scalar(ScalarKind),
    Class(Arc<str>),
    Nullable(Box<Type>),
    Union(Vec<Type>),
    Intersection(Vec<Type>),
    /// Element type of a variadic parameter
    Variadic(Box<Type>),
}

impl Type {
    pub fn class(name: impl Into<Arc<str>>) -> Self {
        Type::Class(name.into())
    }

    pub fn nullable(inner: Type) -> Self {
        Type::Nullable(Box::new(inner))
    }

    pub fn variadic(inner: Type) -> Self {
        Type::Variadic(Box::new(inner))
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Type::None)
    }

    /// Element type for variadic parameters, the type itself otherwise
    pub fn element(&self) -> &Type {
        match self {
            Type::Variadic(inner) => inner,
            other => other,
        }
    }

    /// True for untyped and `mixed`
    pub fn is_unconstrained(&self) -> bool {
        matches!(self.element(), Type::None | Type::Scalar(ScalarKind::Mixed))
    }

    /// Whether `null` satisfies the declared type
    pub fn allows_null(&self) -> bool {
        match self {
            Type::None => true,
            Type::Scalar(kind) => matches!(kind, ScalarKind::Mixed | ScalarKind::Null),
            Type::Class(_) => false,
            Type::Nullable(_) => true,
            Type::Union(members) => members.iter().any(Type::allows_null),
            Type::Intersection(_) => false,
            Type::Variadic(inner) => inner.allows_null(),
        }
    }

    /// Runtime check of a value against the declared type
    pub fn accepts(&self, value: &Value) -> bool {
        if let Value::Reference(reference) = value {
            return self.accepts(&reference.get());
        }
        match self {
            Type::None => true,
            Type::Scalar(kind) => kind.accepts(value),
            Type::Class(name) => value
                .as_object()
                .map_or(false, |object| object.is_instance_of(name)),
            Type::Nullable(inner) => value.is_null() || inner.accepts(value),
            Type::Union(members) => members.iter().any(|t| t.accepts(value)),
            Type::Intersection(members) => members.iter().all(|t| t.accepts(value)),
            Type::Variadic(inner) => inner.accepts(value),
        }
    }

    /// Object-like types consume positional values by instance match
    pub fn is_object_like(&self) -> bool {
        match self {
            Type::Class(_) | Type::Intersection(_) => true,
            Type::Scalar(ScalarKind::Object) => true,
            Type::Nullable(inner) | Type::Variadic(inner) => inner.is_object_like(),
            Type::Union(members) => members.iter().any(Type::is_object_like),
            _ => false,
        }
    }

    /// Class names the container may be asked for, in declaration order
    pub fn class_names(&self) -> Vec<&str> {
        let mut names = Vec::new();
        self.collect_class_names(&mut names);
        names
    }

    fn collect_class_names<'a>(&'a self, names: &mut Vec<&'a str>) {
        match self {
            Type::Class(name) => names.push(&**name),
            Type::Nullable(inner) | Type::Variadic(inner) => inner.collect_class_names(names),
            Type::Union(members) => {
                for member in members {
                    // intersections inside a union are never autowired
                    if let Type::Class(name) = member {
                        names.push(&**name);
                    } else if let Type::Nullable(_) = member {
                        member.collect_class_names(names);
                    }
                }
            }
            _ => {}
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn join(f: &mut fmt::Formatter<'_>, members: &[Type], sep: &str) -> fmt::Result {
            for (i, member) in members.iter().enumerate() {
                if i > 0 {
                    f.write_str(sep)?;
                }
                if sep == "|" && matches!(member, Type::Intersection(_)) {
                    write!(f, "({})", member)?;
                } else {
                    write!(f, "{}", member)?;
                }
            }
            Ok(())
        }

        match self {
            Type::None => Ok(()),
            Type::Scalar(kind) => f.write_str(kind.name()),
            Type::Class(name) => f.write_str(name),
            Type::Nullable(inner) => write!(f, "?{}", inner),
            Type::Union(members) => join(f, members, "|"),
            Type::Intersection(members) => join(f, members, "&"),
            Type::Variadic(inner) => write!(f, "{}...", inner),
        }
    }
}

/// One formal parameter of a callable
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub name: String,
    pub position: usize,
    pub ty: Type,
    pub default: Option<Value>,
    pub by_reference: bool,
}

impl Parameter {
    pub fn new(name: impl Into<String>, ty: Type) -> Self {
        Self {
            name: name.into(),
            position: 0,
            ty,
            default: None,
            by_reference: false,
        }
    }

    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn by_reference(mut self) -> Self {
        self.by_reference = true;
        self
    }

    pub fn is_variadic(&self) -> bool {
        matches!(self.ty, Type::Variadic(_))
    }

    pub fn has_type(&self) -> bool {
        !self.ty.element().is_none()
    }

    pub fn is_optional(&self) -> bool {
        self.default.is_some() || self.is_variadic()
    }

    /// Nullable type, or an implicit `= null` default
    pub fn allows_null(&self) -> bool {
        self.ty.element().allows_null() || matches!(self.default, Some(Value::Null))
    }
}

/// Ordered, immutable parameter list of a callable
#[derive(Debug, Clone, PartialEq)]
pub struct Signature(Arc<[Parameter]>);

impl Signature {
    pub fn new(parameters: Vec<Parameter>) -> Self {
        let parameters: Vec<Parameter> = parameters
            .into_iter()
            .enumerate()
            .map(|(position, mut parameter)| {
                parameter.position = position;
                parameter
            })
            .collect();
        Signature(Arc::from(parameters))
    }

    pub fn empty() -> Self {
        Signature(Arc::from(Vec::new()))
    }

    pub fn parameters(&self) -> &[Parameter] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn has_variadic(&self) -> bool {
        self.0.iter().any(Parameter::is_variadic)
    }

    pub fn parameter(&self, name: &str) -> Option<&Parameter> {
        self.0.iter().find(|p| p.name == name)
    }
}

impl Default for Signature {
    fn default() -> Self {
        Self::empty()
    }
}

impl std::ops::Deref for Signature {
    type Target = [Parameter];

    fn deref(&self) -> &[Parameter] {
        &self.0
    }
}
