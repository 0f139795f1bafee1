//! Engine error kinds. See spec.md §7.
//!
//! Every error is semantic, not textual: outer layers match on the
//! variant, not the `Display` string. `apply()` guarantees no mutation
//! happened when it returns `Err`.

use thiserror::Error;

use crate::player::PlayerId;

/// The reason an action was rejected by the dispatcher or a `validate` call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// The action's player is not the current turn holder and no pending
    /// follow-up matches.
    #[error("player {0:?} is not the current actor and owes no follow-up")]
    NotCurrentActor(PlayerId),

    /// The player has already passed this round.
    #[error("player {0:?} has already passed this round")]
    HasPassed(PlayerId),

    /// A named resource was insufficient to pay a cost.
    #[error("insufficient {resource}: required {required}, available {available}")]
    InsufficientResources {
        resource: &'static str,
        required: u32,
        available: u32,
    },

    /// The hex/building target was invalid for this action.
    #[error("illegal target: {0}")]
    IllegalTarget(String),

    /// The action is blocked by a pending offer/choice.
    #[error("player {player:?} owes a follow-up: {kind}")]
    OwesFollowUp { player: PlayerId, kind: String },

    /// Catch-all for condition violations not covered by a more specific kind.
    #[error("rule violation: {0}")]
    RuleViolation(String),

    /// A faction-specific action was issued by a different faction.
    #[error("action requires faction {expected:?}, player is {actual:?}")]
    WrongFaction {
        expected: &'static str,
        actual: &'static str,
    },

    /// A one-shot special action was reused this round.
    #[error("special action already used this round")]
    AlreadyUsedThisRound,
}

pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages_name_the_offending_resource() {
        let err = EngineError::InsufficientResources {
            resource: "workers",
            required: 3,
            available: 1,
        };
        assert!(err.to_string().contains("workers"));
    }
}
