//! # Domain Invariants
//!
//! Rules that MUST hold for the contract state after every operation.
//!
//! State invariants (checked on any single snapshot):
//! - INVARIANT-1: Trigger Soundness - triggered implies an armed target,
//!   `<=` the observed height when that height was recorded
//! - INVARIANT-2: Positive Target - an armed target is never zero
//!
//! Transition invariants (checked on a before/after pair):
//! - INVARIANT-3: Monotonic Trigger - `triggered` never returns to false
//! - INVARIANT-4: Frozen Target - the target never changes once triggered
//! - INVARIANT-5: Immutable Owner - the owner is never reassigned
//! - INVARIANT-6: Custody - the balance only grows through a deposit

use super::entities::{ContractState, Operation};
use super::value_objects::{Amount, BlockHeight};

// =============================================================================
// STATE INVARIANTS
// =============================================================================

/// INVARIANT-1: Trigger Soundness
///
/// `triggered` implies `target_height` is present, and `<= triggered_at`
/// when the fire height was recorded. Snapshots written without
/// `triggered_at` carry `None` there. `triggered_at` never appears on an
/// untriggered state.
#[must_use]
pub fn check_trigger_soundness_invariant(state: &ContractState) -> bool {
    match (state.triggered, state.target_height, state.triggered_at) {
        (true, Some(target), Some(observed)) => target <= observed,
        (true, Some(_), None) | (false, _, None) => true,
        _ => false,
    }
}

/// INVARIANT-2: Positive Target
#[must_use]
pub fn check_positive_target_invariant(state: &ContractState) -> bool {
    state.target_height != Some(0)
}

// =============================================================================
// TRANSITION INVARIANTS
// =============================================================================

/// INVARIANT-3: Monotonic Trigger
#[must_use]
pub fn check_monotonic_trigger_invariant(before: &ContractState, after: &ContractState) -> bool {
    !before.triggered || after.triggered
}

/// INVARIANT-4: Frozen Target
#[must_use]
pub fn check_frozen_target_invariant(before: &ContractState, after: &ContractState) -> bool {
    !before.triggered
        || (after.target_height == before.target_height
            && after.triggered_at == before.triggered_at)
}

/// INVARIANT-5: Immutable Owner
#[must_use]
pub fn check_immutable_owner_invariant(before: &ContractState, after: &ContractState) -> bool {
    before.owner == after.owner && before.policy == after.policy
}

/// INVARIANT-6: Custody
///
/// Only `deposit` may increase the balance and only `withdraw` may decrease it.
#[must_use]
pub fn check_custody_invariant(
    before: &ContractState,
    after: &ContractState,
    operation: Operation,
) -> bool {
    let (b, a) = (before.balance(), after.balance());
    match operation {
        Operation::Deposit => a >= b,
        Operation::Withdraw => a <= b,
        _ => a == b,
    }
}

// =============================================================================
// AGGREGATE CHECKS
// =============================================================================

/// A single invariant failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvariantViolation {
    /// INVARIANT-1 failed.
    UnsoundTrigger {
        /// Whether the action is marked fired.
        triggered: bool,
        /// Armed target.
        target_height: Option<BlockHeight>,
        /// Recorded trigger height.
        triggered_at: Option<BlockHeight>,
    },
    /// INVARIANT-2 failed.
    ZeroTarget,
    /// INVARIANT-3 failed.
    TriggerReverted,
    /// INVARIANT-4 failed.
    TargetChangedAfterTrigger {
        /// Target before the operation.
        before: Option<BlockHeight>,
        /// Target after the operation.
        after: Option<BlockHeight>,
    },
    /// INVARIANT-5 failed.
    OwnerChanged,
    /// INVARIANT-6 failed.
    UnauthorizedBalanceChange {
        /// Operation that changed the balance.
        operation: Operation,
        /// Balance before.
        before: Amount,
        /// Balance after.
        after: Amount,
    },
}

/// Result of checking a set of invariants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvariantCheckResult {
    /// Every invariant holds.
    Valid,
    /// One or more invariants failed.
    Invalid(Vec<InvariantViolation>),
}

impl InvariantCheckResult {
    /// Returns true if every invariant held.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }

    fn from_violations(violations: Vec<InvariantViolation>) -> Self {
        if violations.is_empty() {
            Self::Valid
        } else {
            Self::Invalid(violations)
        }
    }
}

/// Check INVARIANT-1 and INVARIANT-2 on one snapshot.
#[must_use]
pub fn check_state_invariants(state: &ContractState) -> InvariantCheckResult {
    let mut violations = Vec::new();
    collect_state_violations(state, &mut violations);
    InvariantCheckResult::from_violations(violations)
}

/// Check every invariant across one operation.
#[must_use]
pub fn check_all_invariants(
    before: &ContractState,
    after: &ContractState,
    operation: Operation,
) -> InvariantCheckResult {
    let mut violations = Vec::new();
    collect_state_violations(after, &mut violations);

    if !check_monotonic_trigger_invariant(before, after) {
        violations.push(InvariantViolation::TriggerReverted);
    }

    if !check_frozen_target_invariant(before, after) {
        violations.push(InvariantViolation::TargetChangedAfterTrigger {
            before: before.target_height,
            after: after.target_height,
        });
    }

    if !check_immutable_owner_invariant(before, after) {
        violations.push(InvariantViolation::OwnerChanged);
    }

    if !check_custody_invariant(before, after, operation) {
        violations.push(InvariantViolation::UnauthorizedBalanceChange {
            operation,
            before: before.balance(),
            after: after.balance(),
        });
    }

    InvariantCheckResult::from_violations(violations)
}

fn collect_state_violations(state: &ContractState, violations: &mut Vec<InvariantViolation>) {
    if !check_trigger_soundness_invariant(state) {
        violations.push(InvariantViolation::UnsoundTrigger {
            triggered: state.triggered,
            target_height: state.target_height,
            triggered_at: state.triggered_at,
        });
    }

    if !check_positive_target_invariant(state) {
        violations.push(InvariantViolation::ZeroTarget);
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::TargetPolicy;
    use crate::domain::treasury::Treasury;
    use crate::domain::value_objects::Principal;

    fn fresh() -> ContractState {
        ContractState::new(Principal::new([1u8; 20]), TargetPolicy::Rearmable, 100)
    }

    fn fired(target: BlockHeight, at: BlockHeight) -> ContractState {
        let mut state = fresh();
        state.target_height = Some(target);
        state.triggered = true;
        state.triggered_at = Some(at);
        state
    }

    #[test]
    fn test_fresh_state_is_valid() {
        assert!(check_state_invariants(&fresh()).is_valid());
    }

    #[test]
    fn test_soundness_detects_early_trigger() {
        assert!(check_trigger_soundness_invariant(&fired(10, 10)));
        assert!(!check_trigger_soundness_invariant(&fired(10, 9)));
    }

    #[test]
    fn test_soundness_detects_missing_target() {
        let mut state = fresh();
        state.triggered = true;
        state.triggered_at = Some(5);
        assert!(!check_trigger_soundness_invariant(&state));
    }

    #[test]
    fn test_soundness_accepts_unrecorded_trigger_height() {
        let mut state = fresh();
        state.target_height = Some(10);
        state.triggered = true;
        assert!(check_trigger_soundness_invariant(&state));
        assert!(check_state_invariants(&state).is_valid());
    }

    #[test]
    fn test_soundness_detects_stray_trigger_height() {
        let mut state = fresh();
        state.triggered_at = Some(5);
        assert!(!check_trigger_soundness_invariant(&state));
    }

    #[test]
    fn test_zero_target_detected() {
        let mut state = fresh();
        state.target_height = Some(0);
        assert_eq!(
            check_state_invariants(&state),
            InvariantCheckResult::Invalid(vec![InvariantViolation::ZeroTarget])
        );
    }

    #[test]
    fn test_trigger_reverted_detected() {
        let before = fired(10, 12);
        let mut after = before.clone();
        after.triggered = false;
        after.triggered_at = None;
        let result = check_all_invariants(&before, &after, Operation::ResetTargetHeight);
        assert!(matches!(
            result,
            InvariantCheckResult::Invalid(ref v) if v.contains(&InvariantViolation::TriggerReverted)
        ));
    }

    #[test]
    fn test_target_frozen_after_trigger() {
        let before = fired(10, 12);
        let mut after = before.clone();
        after.target_height = Some(11);
        assert!(!check_frozen_target_invariant(&before, &after));
    }

    #[test]
    fn test_custody_only_deposit_increases() {
        let before = fresh();
        let mut after = before.clone();
        after.balance = Treasury::new(150);
        assert!(check_custody_invariant(&before, &after, Operation::Deposit));
        assert!(!check_custody_invariant(&before, &after, Operation::Trigger));
        assert!(!check_custody_invariant(&before, &after, Operation::Withdraw));
    }

    #[test]
    fn test_owner_change_detected() {
        let before = fresh();
        let mut after = before.clone();
        after.owner = Principal::new([2u8; 20]);
        assert!(!check_immutable_owner_invariant(&before, &after));
    }

    #[test]
    fn test_valid_transition() {
        let before = fresh();
        let mut after = before.clone();
        after.target_height = Some(10);
        assert!(check_all_invariants(&before, &after, Operation::SetTargetHeight).is_valid());
    }
}
