//! Container behaviour switches

#[cfg(feature = "config")]
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config", serde(default))]
pub struct Options {
    /// Enforce scope constraints declared on classes
    pub check_scope: bool,
    /// Type-check resolved arguments before invoking constructors and callables
    pub validate_arguments: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            check_scope: true,
            validate_arguments: true,
        }
    }
}
