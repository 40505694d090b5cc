//! Testing utilities for the method advice workspace
//!
//! Shared fixtures and recording interceptors.

#![allow(missing_docs)]

use advice_composition::{Advice, Interceptor, Method};
use advice_kernel::demo::{declare_family, FamilyKeys};
use advice_kernel::{Runtime, RuntimeConfig};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::sync::Arc;

pub use advice_kernel::demo::int;

/// Parent { one(x) = x + 1, two(x, y) = x * y } < Child < Grandchild,
/// advice enabled on Child
pub struct Family {
    pub runtime: Runtime,
    pub parent: advice_composition::TypeKey,
    pub child: advice_composition::TypeKey,
    pub grandchild: advice_composition::TypeKey,
}

impl Family {
    /// Invoke `name` on a fresh instance of `ty`
    pub fn call(&self, ty: advice_composition::TypeKey, name: &str, args: Vec<Value>) -> Value {
        let instance = self.runtime.instantiate(ty).unwrap();
        self.runtime.invoke(&instance, name, args).unwrap()
    }

    /// `one(x)` on a Child instance
    pub fn child_one(&self, x: i64) -> i64 {
        int(&self.call(self.child, "one", vec![json!(x)]))
    }

    /// `two(x, y)` on a Child instance
    pub fn child_two(&self, x: i64, y: i64) -> i64 {
        int(&self.call(self.child, "two", vec![json!(x), json!(y)]))
    }
}

pub fn family() -> Family {
    family_with(RuntimeConfig::default())
}

pub fn family_with(config: RuntimeConfig) -> Family {
    let runtime = Runtime::new(config);
    let FamilyKeys {
        parent,
        child,
        grandchild,
    } = declare_family(&runtime).unwrap();
    Family {
        runtime,
        parent,
        child,
        grandchild,
    }
}

/// Method of arity `arity` computing `f(args)`
pub fn method<F>(arity: usize, f: F) -> Method
where
    F: Fn(&[Value]) -> Value + Send + Sync + 'static,
{
    Method::new(arity, move |_, args| Ok(f(&args)))
}

/// `x -> x * factor`
pub fn times(factor: i64) -> Interceptor {
    Interceptor::nary(move |_, args| Ok(json!(int(&args[0]) * factor)))
}

/// `x -> x + delta`
pub fn plus(delta: i64) -> Interceptor {
    Interceptor::nary(move |_, args| Ok(json!(int(&args[0]) + delta)))
}

/// Shared log of interceptor firings
#[derive(Debug, Clone, Default)]
pub struct Recorder(Arc<Mutex<Vec<String>>>);

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, entry: impl Into<String>) {
        self.0.lock().push(entry.into());
    }

    /// Zero-arg advice that logs `label`
    pub fn zero(&self, label: &str) -> Advice {
        let log = self.clone();
        let entry = label.to_string();
        Interceptor::zero(move |_| {
            log.push(entry.clone());
            Ok(())
        })
        .labelled(label)
    }

    /// N-ary advice that logs `label` and passes its input through
    pub fn pass(&self, label: &str) -> Advice {
        let log = self.clone();
        let entry = label.to_string();
        Interceptor::nary(move |_, args| {
            log.push(entry.clone());
            Ok(args.into_iter().next().unwrap_or(Value::Null))
        })
        .labelled(label)
    }

    /// Method that logs `label` and returns `value`
    pub fn body(&self, label: &str, arity: usize, value: Value) -> Method {
        let log = self.clone();
        let entry = label.to_string();
        Method::new(arity, move |_, _| {
            log.push(entry.clone());
            Ok(value.clone())
        })
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().clone()
    }

    pub fn clear(&self) {
        self.0.lock().clear();
    }
}
