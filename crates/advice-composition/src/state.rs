//! Advice state machine
//!
//! Every (type, operation) pair is either `Unadvised` or `Advised`. Each
//! registry mutation is checked against [`allowed_transitions`].

use crate::error::AdviceError;
use advice_symbol::OpName;
use serde::Serialize;

/// Advice state of one operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AdviceState {
    /// Both chains empty
    #[default]
    Unadvised,

    /// At least one interceptor attached
    Advised,
}

/// Mutation applied to a composition record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Trigger {
    /// Before-advice added
    AddBefore,

    /// After-advice added
    AddAfter,

    /// Operation (re)defined, `original` re-captured
    Redefine,

    /// Chains cleared
    Reset,
}

/// Targets reachable from `from`, per trigger
#[must_use]
pub fn allowed_transitions(from: AdviceState) -> Vec<(Trigger, AdviceState)> {
    use AdviceState::{Advised, Unadvised};
    use Trigger::{AddAfter, AddBefore, Redefine, Reset};
    match from {
        Unadvised => vec![
            (AddBefore, Advised),
            (AddAfter, Advised),
            (Redefine, Unadvised),
            (Reset, Unadvised),
        ],
        Advised => vec![
            (AddBefore, Advised),
            (AddAfter, Advised),
            (Redefine, Advised),
            (Reset, Unadvised),
        ],
    }
}

/// Validates a state transition.
///
/// # Errors
/// Returns [`AdviceError::IllegalTransition`] if `trigger` cannot move
/// `from` to `to`.
pub fn validate_transition(
    op: &OpName,
    from: AdviceState,
    trigger: Trigger,
    to: AdviceState,
) -> Result<(), AdviceError> {
    if allowed_transitions(from).contains(&(trigger, to)) {
        Ok(())
    } else {
        Err(AdviceError::IllegalTransition {
            op: op.clone(),
            from,
            trigger,
            to,
        })
    }
}
