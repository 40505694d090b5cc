//! Advice registration
//!
//! Entry points behind a host's `before` / `after` / `reset` surface.
//! Multi-name calls are applied name by name; a failure leaves earlier
//! names advised.

use crate::error::AdviceError;
use crate::hook::{lookup_record, rebuild};
use crate::host::AdviceHost;
use crate::interceptor::Advice;
use crate::record::{CompositionRecord, RecordSnapshot};
use crate::state::{validate_transition, AdviceState, Trigger};
use advice_symbol::{OpName, TypeKey};

/// Prepend `advice` to the before-chain of each operation
///
/// # Errors
/// Returns [`AdviceError::Lookup`] for the first name with no
/// implementation; names before it keep their new advice.
pub fn add_before<H>(host: &mut H, ty: TypeKey, ops: &[OpName], advice: &Advice) -> Result<(), AdviceError>
where
    H: AdviceHost + ?Sized,
{
    for op in ops {
        mutate(host, ty, op, Trigger::AddBefore, |record| record.add_before(advice.clone()))?;
    }
    Ok(())
}

/// Append `advice` to the after-chain of each operation
///
/// # Errors
/// Returns [`AdviceError::Lookup`] for the first name with no
/// implementation; names before it keep their new advice.
pub fn add_after<H>(host: &mut H, ty: TypeKey, ops: &[OpName], advice: &Advice) -> Result<(), AdviceError>
where
    H: AdviceHost + ?Sized,
{
    for op in ops {
        mutate(host, ty, op, Trigger::AddAfter, |record| record.add_after(advice.clone()))?;
    }
    Ok(())
}

/// Clear both chains of each operation; `original` is kept
///
/// # Errors
/// Returns [`AdviceError::Lookup`] for a name with no implementation.
pub fn reset<H>(host: &mut H, ty: TypeKey, ops: &[OpName]) -> Result<(), AdviceError>
where
    H: AdviceHost + ?Sized,
{
    for op in ops {
        mutate(host, ty, op, Trigger::Reset, CompositionRecord::clear)?;
    }
    Ok(())
}

fn mutate<H, F>(host: &mut H, ty: TypeKey, op: &OpName, trigger: Trigger, apply: F) -> Result<(), AdviceError>
where
    H: AdviceHost + ?Sized,
    F: FnOnce(&mut CompositionRecord),
{
    let record = lookup_record(host, ty, op)?;
    let from = record.state();
    apply(record);
    let to = record.state();
    validate_transition(op, from, trigger, to)?;

    tracing::debug!(
        ty = %ty,
        op = %op,
        record = %record.id(),
        ?trigger,
        ?to,
        "advice updated"
    );
    rebuild(host, ty, op)
}

/// Summary of the record `ty` resolves for `op`, if one exists
///
/// Never creates a registry or record.
#[must_use]
pub fn snapshot<H>(host: &H, ty: TypeKey, op: &OpName) -> Option<RecordSnapshot>
where
    H: AdviceHost + ?Sized,
{
    let owner = host.registries().find_owner(&host.ancestors(ty))?;
    let record = host.registries().registry(owner)?.get(op)?;
    Some(record.snapshot(owner, &host.type_name(owner)))
}

/// Advice state of `op` as seen from `ty`
#[must_use]
pub fn advice_state<H>(host: &H, ty: TypeKey, op: &OpName) -> AdviceState
where
    H: AdviceHost + ?Sized,
{
    snapshot(host, ty, op).map_or(AdviceState::Unadvised, |s| s.state)
}
