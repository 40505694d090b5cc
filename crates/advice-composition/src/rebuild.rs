//! Rebuild engine
//!
//! Turns a [`CompositionRecord`] into the effective [`Method`] a host
//! installs. The effective method captures a snapshot of the chains, so a
//! later mutation is only observable after the next rebuild; the hook
//! rebuilds every type installed from the record.

use crate::error::AdviceError;
use crate::interceptor::Interceptor;
use crate::method::{ArityClass, Method, Receiver};
use crate::record::CompositionRecord;
use serde_json::Value;

/// Synthesize the effective operation wrapping `original` in `record`'s chains
///
/// The result always has the arity of `original`.
#[must_use]
pub fn synthesize(record: &CompositionRecord, original: &Method) -> Method {
    let original = original.clone();
    let arity = original.arity();

    if !record.is_advised() {
        return Method::effective(arity, move |rx, args| original.call(rx, args));
    }

    let befores = record.before().interceptors();
    let afters = record.after().interceptors();

    match original.arity_class() {
        ArityClass::Zero => Method::effective(0, move |rx, _args| {
            for before in befores.iter() {
                before.run_for_effect(rx)?;
            }
            let result = original.call(rx, Vec::new())?;
            fold_after(rx, &afters, result)
        }),
        ArityClass::NAry => Method::effective(arity, move |rx, args| {
            let args = fold_before(rx, &befores, args)?;
            let result = original.call(rx, args)?;
            fold_after(rx, &afters, result)
        }),
    }
}

fn fold_before(
    rx: &Receiver<'_>,
    befores: &[Interceptor],
    args: Vec<Value>,
) -> Result<Vec<Value>, AdviceError> {
    befores
        .iter()
        .try_fold(args, |args, before| before.filter_args(rx, args))
}

fn fold_after(rx: &Receiver<'_>, afters: &[Interceptor], result: Value) -> Result<Value, AdviceError> {
    afters
        .iter()
        .try_fold(result, |result, after| after.filter_result(rx, result))
}
