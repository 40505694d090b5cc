//! Definition-change hook and rebuild driver

use crate::error::AdviceError;
use crate::host::AdviceHost;
use crate::method::Method;
use crate::record::CompositionRecord;
use crate::rebuild::synthesize;
use crate::state::{validate_transition, Trigger};
use advice_symbol::{OpName, TypeKey};

/// React to `ty` (re)defining `op`
///
/// Hosts call this after installing any method on an advice-enabled type.
/// While a rebuild of `ty` is in progress the call is absorbed; otherwise
/// the new implementation is captured as `ty`'s original, earlier
/// observers are notified, and the effective operation is rebuilt.
///
/// # Errors
/// Returns [`AdviceError::Lookup`] if `op` no longer resolves from `ty`, or
/// any error raised while re-installing the effective operation.
pub fn method_added<H>(host: &mut H, ty: TypeKey, op: &OpName) -> Result<(), AdviceError>
where
    H: AdviceHost + ?Sized,
{
    let flag = host.definition_flag(ty);
    if flag.is_set() {
        tracing::trace!(ty = %ty, op = %op, "absorbed reentrant definition");
        return Ok(());
    }
    let _guard = flag.acquire();

    let original = host
        .instance_method(ty, op)
        .ok_or_else(|| lookup_error(host, ty, op))?;
    let record = lookup_record(host, ty, op)?;
    let from = record.state();
    record.set_original(ty, original);
    validate_transition(op, from, Trigger::Redefine, record.state())?;

    tracing::debug!(ty = %ty, op = %op, record = %record.id(), "captured new original");
    host.forward_definition(ty, op);
    rebuild(host, ty, op)
}

/// Regenerate the effective operation of `op` on `ty` and on every other
/// type installed from the same record
///
/// Each type wraps its nearest captured original in the shared chains.
/// Types that have since moved to another registry are dropped.
///
/// # Errors
/// Returns [`AdviceError::Lookup`] if no record or implementation exists.
pub fn rebuild<H>(host: &mut H, ty: TypeKey, op: &OpName) -> Result<(), AdviceError>
where
    H: AdviceHost + ?Sized,
{
    let ancestors = host.ancestors(ty);
    let owner = host.registries_mut().resolve_owner(ty, &ancestors);

    let targets: Vec<TypeKey> = {
        let record = lookup_record(host, ty, op)?;
        record.mark_installed(ty);
        tracing::debug!(
            ty = %ty,
            op = %op,
            record = %record.id(),
            before = record.before().len(),
            after = record.after().len(),
            "rebuilding effective operation"
        );
        record.installed().collect()
    };

    for target in targets {
        let chain = host.ancestors(target);
        if host.registries_mut().resolve_owner(target, &chain) != owner {
            lookup_record(host, ty, op)?.forget_installed(target);
            continue;
        }
        install_effective(host, target, op, &chain)?;
    }
    Ok(())
}

fn install_effective<H>(host: &mut H, ty: TypeKey, op: &OpName, ancestors: &[TypeKey]) -> Result<(), AdviceError>
where
    H: AdviceHost + ?Sized,
{
    let _guard = host.definition_flag(ty).acquire();

    if lookup_record(host, ty, op)?.original_for(ancestors).is_none() {
        let (definer, original) = resolve_raw(host, ty, op)?;
        lookup_record(host, ty, op)?.set_original(definer, original);
    }

    let effective = {
        let record = lookup_record(host, ty, op)?;
        let original = record.original_for(ancestors).ok_or_else(|| AdviceError::Lookup {
            type_name: ty.to_string(),
            op: op.clone(),
        })?;
        synthesize(record, original)
    };
    host.install_method(ty, op, effective)
}

/// Record for `op` as seen from `ty`, created on first reference
///
/// A new record wraps the implementation `ty` currently resolves, filed
/// under the type that defines it.
///
/// # Errors
/// Returns [`AdviceError::Lookup`] if a record must be created but `op` has
/// no implementation on `ty` or its ancestors.
pub fn lookup_record<'h, H>(
    host: &'h mut H,
    ty: TypeKey,
    op: &OpName,
) -> Result<&'h mut CompositionRecord, AdviceError>
where
    H: AdviceHost + ?Sized,
{
    let ancestors = host.ancestors(ty);
    let owner = host.registries_mut().resolve_owner(ty, &ancestors);

    let exists = host
        .registries()
        .registry(owner)
        .is_some_and(|registry| registry.contains(op));

    if !exists {
        let (definer, original) = resolve_raw(host, ty, op)?;
        let record = CompositionRecord::new(op.clone(), definer, original);
        tracing::debug!(owner = %owner, definer = %definer, op = %op, record = %record.id(), "created composition record");
        host.registries_mut().registry_mut(owner).insert(record);
    }

    host.registries_mut()
        .registry_mut(owner)
        .get_mut(op)
        .ok_or_else(|| AdviceError::Lookup {
            type_name: ty.to_string(),
            op: op.clone(),
        })
}

/// Nearest type defining `op` for `ty`, with the implementation `ty` resolves
fn resolve_raw<H>(host: &H, ty: TypeKey, op: &OpName) -> Result<(TypeKey, Method), AdviceError>
where
    H: AdviceHost + ?Sized,
{
    let definer = host.ancestors(ty).into_iter().find(|a| host.defines(*a, op));
    match (definer, host.instance_method(ty, op)) {
        (Some(definer), Some(original)) => Ok((definer, original)),
        _ => Err(lookup_error(host, ty, op)),
    }
}

pub(crate) fn lookup_error<H>(host: &H, ty: TypeKey, op: &OpName) -> AdviceError
where
    H: AdviceHost + ?Sized,
{
    AdviceError::Lookup {
        type_name: host.type_name(ty),
        op: op.clone(),
    }
}
