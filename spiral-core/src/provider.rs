//! Service provider interface used by the argument resolver

use crate::error::DiResult;
use crate::value::{Arguments, Value};

/// What the resolver needs from a container
pub trait ServiceProvider: Send + Sync {
    /// Check whether the identifier has a binding or cached instance
    fn has(&self, id: &str) -> bool;

    /// Resolve an identifier; `context` is the name of the parameter asking for it
    fn get(&self, id: &str, context: Option<&str>) -> DiResult<Value>;

    /// Create an instance with explicit constructor arguments
    fn make(&self, id: &str, arguments: Arguments) -> DiResult<Value>;
}
