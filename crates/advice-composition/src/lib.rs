//! Method Advice Composition Engine
//!
//! Before/after advice for named operations, shared across a type
//! hierarchy and preserved when subtypes override the advised operation.
//!
//! # Core Concepts
//!
//! - [`Interceptor`]: zero-arg (side effect) or n-ary (transforming) advice
//! - [`AdviceChain`]: before-chain runs newest-first, after-chain oldest-first
//! - [`CompositionRecord`]: {before, original, after} for one operation
//! - [`Registries`]: per-owner record tables, resolved through ancestors
//! - [`rebuild::synthesize`]: record to effective [`Method`]
//! - [`hook::method_added`]: re-captures `original` when an operation is redefined
//! - [`AdviceHost`]: the type-system primitives the engine drives
//!
//! # Example
//!
//! ```rust,ignore
//! use advice_composition::{advice, Interceptor};
//!
//! // `host` implements AdviceHost; Child inherits one(x) = x + 1
//! let double = Interceptor::nary(|_rx, args| Ok(json!(args[0].as_i64().unwrap() * 2)));
//! advice::add_before(&mut host, child, &[OpName::new("one")], &double.into())?;
//!
//! // one(5) now runs 5 -> 10 -> 11
//! ```
//!
//! # Concurrency
//!
//! The engine assumes mutations are serialized by the host. The per-type
//! [`DefinitionFlag`] only absorbs synchronous re-entry caused by a rebuild
//! installing its own result.

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod advice;
pub mod chain;
pub mod error;
pub mod hook;
pub mod host;
pub mod interceptor;
pub mod method;
pub mod rebuild;
pub mod record;
pub mod registry;
pub mod state;

#[cfg(test)]
mod testing;

// Re-exports
pub use chain::{AdviceChain, ANONYMOUS};
pub use error::AdviceError;
pub use host::{AdviceHost, DefinitionFlag, DefinitionGuard};
pub use interceptor::{expand, Advice, Interceptor, NAryFn, ZeroArgFn};
pub use method::{ArityClass, Dispatch, Instance, Method, MethodBody, MethodKind, Receiver};
pub use record::{CompositionRecord, RecordId, RecordSnapshot};
pub use registry::{CompositionRegistry, Registries};
pub use state::{allowed_transitions, validate_transition, AdviceState, Trigger};

pub use advice_symbol::{OpName, TypeKey};
pub use serde_json::Value;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
