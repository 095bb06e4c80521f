//! Parameter descriptors for callables, memoised per container

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use tracing::trace;

use crate::callable::Callable;
use crate::parser::{parse_signature, SignatureError};
use crate::types::{Parameter, Signature};

/// Signature cache owned by one container tree
#[derive(Default)]
pub struct Reflector {
    cache: RwLock<FxHashMap<String, Signature>>,
}

impl Reflector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a declaration, reusing the cached signature for identical text
    pub fn describe(&self, declaration: &str) -> Result<Signature, SignatureError> {
        if let Some(signature) = self.cache.read().get(declaration) {
            return Ok(signature.clone());
        }

        trace!("Parsing declaration `{}`", declaration);
        let signature = parse_signature(declaration)?;
        Ok(self
            .cache
            .write()
            .entry(declaration.to_string())
            .or_insert(signature)
            .clone())
    }

    /// Parameter descriptors of a callable
    pub fn parameters<'c>(&self, callable: &'c Callable) -> &'c [Parameter] {
        callable.signature().parameters()
    }

    pub fn cached(&self) -> usize {
        self.cache.read().len()
    }
}
