//! Advice Kernel
//!
//! A host type system for the composition engine: named types with single
//! inheritance, per-type method tables, definition observers, and the
//! public before/after/reset surface.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use advice_kernel::prelude::*;
//!
//! let rt = Runtime::default();
//! let parent = rt.define_type("Parent", None)?;
//! let child = rt.define_type("Child", Some(parent))?;
//! rt.define_method(parent, "one", Method::new(1, |_, a| Ok(json!(a[0].as_i64().unwrap() + 1))))?;
//!
//! rt.before(child, &["one"], Interceptor::nary(|_, a| Ok(json!(a[0].as_i64().unwrap() * 2))))?;
//! let obj = rt.instantiate(child)?;
//! assert_eq!(rt.invoke(&obj, "one", vec![json!(5)])?, json!(11));
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod config;
pub mod demo;
pub mod logging;
pub mod runtime;
pub mod types;

// Re-exports
pub use config::{ConfigError, LogFormat, RuntimeConfig};
pub use runtime::Runtime;
pub use types::{DefinitionEvent, DefinitionObserver, TypeEntry, TypeTable};

/// Common imports for runtime users
pub mod prelude {
    pub use crate::config::RuntimeConfig;
    pub use crate::runtime::Runtime;
    pub use crate::types::DefinitionEvent;
    pub use advice_composition::{
        Advice, AdviceError, AdviceState, Instance, Interceptor, Method, Receiver, RecordSnapshot,
    };
    pub use advice_symbol::{OpName, TypeKey};
    pub use serde_json::{json, Value};
}

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
