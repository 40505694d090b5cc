//! Error types for the advice engine

use crate::state::{AdviceState, Trigger};
use advice_symbol::{OpName, SymbolError};

/// Advice engine error
///
/// Errors raised by method bodies and interceptors travel through the
/// pipeline untouched; the engine never wraps or retries them.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AdviceError {
    /// No implementation to wrap on the type or any ancestor
    #[error("no implementation of {op} on {type_name} or its ancestors")]
    Lookup {
        /// Type that was searched
        type_name: String,
        /// Missing operation
        op: OpName,
    },

    /// Argument count does not match the callee's arity
    #[error("wrong number of arguments for {op} (given {actual}, expected {expected})")]
    ArityMismatch {
        /// Operation being invoked
        op: OpName,
        /// Declared arity
        expected: usize,
        /// Arguments supplied
        actual: usize,
    },

    /// Invocation of an operation no type in the chain defines
    #[error("undefined operation {op} for instance of {type_name}")]
    NoMethod {
        /// Receiver's type
        type_name: String,
        /// Missing operation
        op: OpName,
    },

    /// Unknown type key or name
    #[error("unknown type: {0}")]
    UnknownType(String),

    /// Type name already declared
    #[error("type already defined: {0}")]
    DuplicateType(String),

    /// Advice requested on a type that has not enabled it
    #[error("advice is not enabled on {0}")]
    AdviceNotEnabled(String),

    /// State machine rejected a transition
    #[error("illegal advice transition {from:?} --{trigger:?}--> {to:?} for {op}")]
    IllegalTransition {
        /// Operation whose record changed
        op: OpName,
        /// State before the mutation
        from: AdviceState,
        /// Mutation applied
        trigger: Trigger,
        /// State after the mutation
        to: AdviceState,
    },

    /// Invalid operation name
    #[error("invalid operation name: {0}")]
    Symbol(#[from] SymbolError),

    /// Failure raised by a method body or interceptor
    #[error("{0}")]
    Raised(String),
}

impl AdviceError {
    /// Create error raised from user code
    #[inline]
    #[must_use]
    pub fn raised(message: impl Into<String>) -> Self {
        Self::Raised(message.into())
    }

    /// Check if error originated in user code rather than the engine
    #[inline]
    #[must_use]
    pub fn is_raised(&self) -> bool {
        matches!(self, Self::Raised(_))
    }
}
