//! Advice Symbol System
//!
//! Identities shared by the advice engine and its host runtime.
//!
//! # Overview
//!
//! - **OpName**: interned operation name, the key of every composition record
//! - **TypeKey**: stable identifier of a type in the host hierarchy
//! - **Interner**: process-wide name table backing [`OpName`]
//!
//! # Example
//!
//! ```rust
//! use advice_symbol::OpName;
//!
//! let a: OpName = "one".parse().unwrap();
//! let b = OpName::new("one");
//! assert_eq!(a, b);
//! assert!(a.shares_storage_with(&b));
//! ```

#![warn(missing_docs)]

pub mod interner;
pub mod symbol;
pub mod type_key;

// Re-exports
pub use interner::Interner;
pub use symbol::{OpName, SymbolError};
pub use type_key::TypeKey;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
