//! In-crate test host

use crate::error::AdviceError;
use crate::hook::method_added;
use crate::host::{AdviceHost, DefinitionFlag};
use crate::method::{Dispatch, Instance, Method, Receiver};
use crate::registry::Registries;
use advice_symbol::{OpName, TypeKey};
use serde_json::{json, Value};
use std::collections::HashMap;

/// Dispatcher that knows no operations
pub(crate) struct NullDispatch;

impl Dispatch for NullDispatch {
    fn dispatch(&self, instance: &Instance, op: &OpName, _args: Vec<Value>) -> Result<Value, AdviceError> {
        Err(AdviceError::NoMethod {
            type_name: instance.type_key().to_string(),
            op: op.clone(),
        })
    }
}

pub(crate) fn int(value: &Value) -> i64 {
    value.as_i64().unwrap_or_default()
}

struct TestType {
    name: String,
    parent: Option<TypeKey>,
    advised: bool,
    flag: DefinitionFlag,
}

/// Minimal host: a type list, a flat method table, and a forwarding log
#[derive(Default)]
pub(crate) struct TestHost {
    types: Vec<TestType>,
    methods: HashMap<(TypeKey, OpName), Method>,
    registries: Registries,
    pub(crate) forwarded: Vec<(TypeKey, OpName)>,
}

impl TestHost {
    /// Parent { one(x) = x + 1, two(x, y) = x * y } < Child < Grandchild,
    /// advice enabled from Child down
    pub(crate) fn family() -> Self {
        let mut host = Self::default();
        let parent = host.add_type("Parent", None, false);
        let child = host.add_type("Child", Some(parent), true);
        host.add_type("Grandchild", Some(child), true);

        host.define(parent, "one", 1, |args| json!(int(&args[0]) + 1))
            .expect("plain definition");
        host.define(parent, "two", 2, |args| json!(int(&args[0]) * int(&args[1])))
            .expect("plain definition");
        host
    }

    pub(crate) fn add_type(&mut self, name: &str, parent: Option<TypeKey>, advised: bool) -> TypeKey {
        let key = TypeKey::new(u32::try_from(self.types.len()).expect("few types"));
        self.types.push(TestType {
            name: name.to_string(),
            parent,
            advised,
            flag: DefinitionFlag::new(),
        });
        key
    }

    pub(crate) fn key(&self, name: &str) -> TypeKey {
        let index = self
            .types
            .iter()
            .position(|t| t.name == name)
            .expect("declared type");
        TypeKey::new(u32::try_from(index).expect("few types"))
    }

    pub(crate) fn define<F>(&mut self, ty: TypeKey, name: &str, arity: usize, f: F) -> Result<(), AdviceError>
    where
        F: Fn(&[Value]) -> Value + Send + Sync + 'static,
    {
        let method = Method::new(arity, move |_, args| Ok(f(&args)));
        self.install_method(ty, &OpName::new(name), method)
    }

    pub(crate) fn call(&self, ty: TypeKey, name: &str, args: Vec<Value>) -> Result<Value, AdviceError> {
        let op = OpName::new(name);
        let method = self.instance_method(ty, &op).ok_or_else(|| AdviceError::NoMethod {
            type_name: self.type_name(ty),
            op: op.clone(),
        })?;
        let instance = Instance::new(ty);
        let rx = Receiver::new(&instance, &op, &NullDispatch);
        method.call(&rx, args)
    }
}

impl AdviceHost for TestHost {
    fn ancestors(&self, ty: TypeKey) -> Vec<TypeKey> {
        let mut chain = Vec::new();
        let mut current = Some(ty);
        while let Some(key) = current {
            chain.push(key);
            current = self.types[key.as_usize()].parent;
        }
        chain
    }

    fn type_name(&self, ty: TypeKey) -> String {
        self.types[ty.as_usize()].name.clone()
    }

    fn instance_method(&self, ty: TypeKey, op: &OpName) -> Option<Method> {
        self.ancestors(ty)
            .into_iter()
            .find_map(|key| self.methods.get(&(key, op.clone())).cloned())
    }

    fn defines(&self, ty: TypeKey, op: &OpName) -> bool {
        self.methods.contains_key(&(ty, op.clone()))
    }

    fn install_method(&mut self, ty: TypeKey, op: &OpName, method: Method) -> Result<(), AdviceError> {
        self.methods.insert((ty, op.clone()), method);
        if self.types[ty.as_usize()].advised {
            method_added(self, ty, op)
        } else {
            Ok(())
        }
    }

    fn definition_flag(&self, ty: TypeKey) -> DefinitionFlag {
        self.types[ty.as_usize()].flag.clone()
    }

    fn registries(&self) -> &Registries {
        &self.registries
    }

    fn registries_mut(&mut self) -> &mut Registries {
        &mut self.registries
    }

    fn forward_definition(&mut self, ty: TypeKey, op: &OpName) {
        self.forwarded.push((ty, op.clone()));
    }
}
