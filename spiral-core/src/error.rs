//! Error types for the container

use thiserror::Error;

use crate::parser::SignatureError;

/// Result type alias for container operations
pub type DiResult<T> = Result<T, DiError>;

/// Errors that can occur while resolving, invoking or finalizing
#[derive(Error, Debug)]
pub enum DiError {
    /// A required parameter had no named, positional, default or container value
    #[error("Unable to resolve required argument `{parameter}` when resolving `{function}`")]
    MissingRequiredArgument { function: String, parameter: String },

    /// A supplied value does not satisfy the declared parameter type
    #[error("Invalid argument value type for the `{parameter}` parameter when validating arguments for `{function}`")]
    InvalidArgumentType { function: String, parameter: String },

    /// A named argument matches no parameter
    #[error("Unknown named parameter `{parameter}` when resolving `{function}`")]
    UnknownParameter { function: String, parameter: String },

    /// A positional argument follows a named one
    #[error("Cannot use positional argument after named argument `{parameter}` when resolving `{function}`")]
    PositionalArgument { function: String, parameter: String },

    /// Identifier could not be resolved in any reachable scope
    #[error("{}", not_found_message(.id, .scope.as_deref()))]
    NotFound {
        id: String,
        scope: Option<String>,
        #[source]
        previous: Option<Box<DiError>>,
    },

    /// Scope-constrained class requested outside of its scope
    #[error("Class `{class}` can be resolved only in `{scope}` scope")]
    BadScope { scope: String, class: String },

    /// Scope name already used by an ancestor
    #[error("Duplicate scope name `{scope}` in the scope chain")]
    NamedScopeDuplication { scope: String },

    /// One or more finalizers failed while a scope was ending
    #[error("{}", finalizers_message(.scope.as_deref(), .errors))]
    Finalizers {
        scope: Option<String>,
        errors: Vec<DiError>,
    },

    /// Circular dependency detected
    #[error("Circular dependency detected: {path}")]
    CircularDependency { path: String },

    /// Binding replaced while its singleton is already cached
    #[error("Can't overload the singleton `{alias}` because it's already used")]
    SingletonOverload { alias: String },

    /// Registered class has no way to be constructed
    #[error("Class `{class}` can not be constructed")]
    NotInstantiable { class: String },

    /// Method binding names a method the class does not declare
    #[error("Undefined method `{class}::{method}`")]
    UndefinedMethod { class: String, method: String },

    /// Binding definition cannot be used for the requested operation
    #[error("Invalid binding for `{alias}`: {reason}")]
    InvalidBinding { alias: String, reason: String },

    /// Constructor body failed
    #[error("Failed constructing `{class}`: {source}")]
    Construction {
        class: String,
        #[source]
        source: anyhow::Error,
    },

    /// Callable body failed
    #[error("Invocation of `{function}` failed: {source}")]
    Invocation {
        function: String,
        #[source]
        source: anyhow::Error,
    },

    /// Callable declaration could not be parsed
    #[error(transparent)]
    Signature(#[from] SignatureError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    MissingRequiredArgument,
    InvalidArgumentType,
    UnknownParameter,
    PositionalArgument,
    NotFound,
    BadScope,
    NamedScopeDuplication,
    Finalizers,
    CircularDependency,
    SingletonOverload,
    NotInstantiable,
    UndefinedMethod,
    InvalidBinding,
    Construction,
    Invocation,
    Signature,
    Config,
}

fn not_found_message(id: &str, scope: Option<&str>) -> String {
    match scope {
        Some(scope) => format!("Can't resolve `{}` in scope `{}`", id, scope),
        None => format!("Can't resolve `{}`", id),
    }
}

fn finalizers_message(scope: Option<&str>, errors: &[DiError]) -> String {
    let scope = match scope {
        Some(name) => format!("the scope `{}`", name),
        None => "an unnamed scope".to_string(),
    };
    let head = if errors.len() == 1 {
        format!("An exception has been thrown during finalization of {}", scope)
    } else {
        format!(
            "{} exceptions have been thrown during finalization of {}",
            errors.len(),
            scope
        )
    };
    let causes: Vec<String> = errors.iter().map(ToString::to_string).collect();
    format!("{}: {}", head, causes.join("; "))
}

impl DiError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DiError::MissingRequiredArgument { .. } => ErrorKind::MissingRequiredArgument,
            DiError::InvalidArgumentType { .. } => ErrorKind::InvalidArgumentType,
            DiError::UnknownParameter { .. } => ErrorKind::UnknownParameter,
            DiError::PositionalArgument { .. } => ErrorKind::PositionalArgument,
            DiError::NotFound { .. } => ErrorKind::NotFound,
            DiError::BadScope { .. } => ErrorKind::BadScope,
            DiError::NamedScopeDuplication { .. } => ErrorKind::NamedScopeDuplication,
            DiError::Finalizers { .. } => ErrorKind::Finalizers,
            DiError::CircularDependency { .. } => ErrorKind::CircularDependency,
            DiError::SingletonOverload { .. } => ErrorKind::SingletonOverload,
            DiError::NotInstantiable { .. } => ErrorKind::NotInstantiable,
            DiError::UndefinedMethod { .. } => ErrorKind::UndefinedMethod,
            DiError::InvalidBinding { .. } => ErrorKind::InvalidBinding,
            DiError::Construction { .. } => ErrorKind::Construction,
            DiError::Invocation { .. } => ErrorKind::Invocation,
            DiError::Signature(_) => ErrorKind::Signature,
            DiError::Config(_) => ErrorKind::Config,
        }
    }

    /// Parameter name carried by argument errors
    pub fn parameter(&self) -> Option<&str> {
        match self {
            DiError::MissingRequiredArgument { parameter, .. }
            | DiError::InvalidArgumentType { parameter, .. }
            | DiError::UnknownParameter { parameter, .. }
            | DiError::PositionalArgument { parameter, .. } => Some(parameter),
            _ => None,
        }
    }

    /// Scope name carried by scope-related errors
    pub fn scope(&self) -> Option<&str> {
        match self {
            DiError::BadScope { scope, .. } | DiError::NamedScopeDuplication { scope } => {
                Some(scope)
            }
            DiError::NotFound { scope, .. } | DiError::Finalizers { scope, .. } => {
                scope.as_deref()
            }
            _ => None,
        }
    }

    /// Identifier that could not be resolved
    pub fn id(&self) -> Option<&str> {
        match self {
            DiError::NotFound { id, .. } => Some(id),
            _ => None,
        }
    }

    /// The parent-scope failure wrapped by a `NotFound`
    pub fn previous(&self) -> Option<&DiError> {
        match self {
            DiError::NotFound { previous, .. } => previous.as_deref(),
            _ => None,
        }
    }

    /// Errors collected while finalizing a scope
    pub fn errors(&self) -> &[DiError] {
        match self {
            DiError::Finalizers { errors, .. } => errors,
            _ => &[],
        }
    }

    pub(crate) fn not_found(id: impl Into<String>, scope: Option<&str>) -> Self {
        DiError::NotFound {
            id: id.into(),
            scope: scope.map(str::to_string),
            previous: None,
        }
    }

    /// Unwrap a container error raised inside a user body, or wrap a foreign one
    pub(crate) fn from_body(err: anyhow::Error, wrap: impl FnOnce(anyhow::Error) -> DiError) -> Self {
        match err.downcast::<DiError>() {
            Ok(err) => err,
            Err(err) => wrap(err),
        }
    }
}
