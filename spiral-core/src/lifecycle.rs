//! Scope lifecycle and finalizer bookkeeping

use std::fmt;

use crate::callable::Callable;

/// Lifecycle of a scope
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeState {
    /// Callback running; resolution allowed
    Active,
    /// Callback returned or unwound
    Ending,
    /// Finalizers running
    Finalizing,
    /// Finalized and released
    Destroyed,
}

impl fmt::Display for ScopeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ScopeState::Active => "active",
            ScopeState::Ending => "ending",
            ScopeState::Finalizing => "finalizing",
            ScopeState::Destroyed => "destroyed",
        };
        f.write_str(name)
    }
}

/// Finalizers registered in one scope, run in registration order
#[derive(Default)]
pub struct FinalizerQueue {
    finalizers: Vec<Callable>,
}

impl FinalizerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, finalizer: Callable) {
        self.finalizers.push(finalizer);
    }

    /// Take everything queued so far; finalizers may queue more while running
    pub fn take_all(&mut self) -> Vec<Callable> {
        std::mem::take(&mut self.finalizers)
    }

    pub fn len(&self) -> usize {
        self.finalizers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.finalizers.is_empty()
    }
}
