//! # Trigger State Machine
//!
//! Owns the `ContractState` aggregate and implements every transition.
//!
//! ```text
//! Unset ──set──▶ Armed ──trigger──▶ Triggered (terminal)
//!   ▲              │
//!   └────reset─────┘
//! ```
//!
//! Every method validates all of its preconditions before touching state, so
//! a returned error always leaves the aggregate exactly as it was.
//!
//! The machine is pure: it never reads the oracle itself. `trigger` takes the
//! observed height as an argument so that the caller reads the oracle once and
//! the same snapshot drives both the comparison and the recorded height.

use super::access::require_owner;
use super::entities::{ContractState, TargetPolicy, TriggerPhase, TriggerStatus};
use super::invariants::{check_state_invariants, InvariantCheckResult};
use super::value_objects::{Amount, BlockHeight, Principal};
use crate::errors::TriggerError;

/// Outcome of a successful trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fired {
    /// Target that was armed.
    pub target_height: BlockHeight,
    /// Oracle height observed by the call.
    pub observed_height: BlockHeight,
}

/// Height-gated one-shot state machine with attached treasury.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerStateMachine {
    state: ContractState,
}

impl TriggerStateMachine {
    /// Deploy a fresh machine.
    #[must_use]
    pub fn new(owner: Principal, policy: TargetPolicy, initial_balance: Amount) -> Self {
        Self {
            state: ContractState::new(owner, policy, initial_balance),
        }
    }

    /// Rebuild a machine from persisted state.
    ///
    /// # Errors
    ///
    /// * `CorruptState` - the state violates a contract invariant
    pub fn restore(state: ContractState) -> Result<Self, TriggerError> {
        match check_state_invariants(&state) {
            InvariantCheckResult::Valid => Ok(Self { state }),
            InvariantCheckResult::Invalid(violations) => {
                Err(TriggerError::CorruptState(format!("{violations:?}")))
            }
        }
    }

    /// Read access to the aggregate.
    #[must_use]
    pub fn state(&self) -> &ContractState {
        &self.state
    }

    /// Consume the machine, yielding the aggregate for persistence.
    #[must_use]
    pub fn into_state(self) -> ContractState {
        self.state
    }

    // =========================================================================
    // COMMANDS
    // =========================================================================

    /// Arm (or re-arm) the target height.
    ///
    /// Returns the previously armed target, if any.
    ///
    /// # Errors
    ///
    /// * `InvalidHeight` - `height` is zero (checked for every caller)
    /// * `OwnerOnly` - caller is not the owner
    /// * `AlreadyTriggered` - the action already fired
    /// * `TargetLocked` - `SetOnce` policy and a target is already armed
    pub fn set_target_height(
        &mut self,
        caller: Principal,
        height: BlockHeight,
    ) -> Result<Option<BlockHeight>, TriggerError> {
        if height == 0 {
            return Err(TriggerError::InvalidHeight(height));
        }
        require_owner(caller, &self.state)?;
        self.ensure_rearmable()?;

        Ok(self.state.target_height.replace(height))
    }

    /// Disarm the target height.
    ///
    /// Returns the previously armed target. Resetting an unset machine is a
    /// no-op that succeeds.
    ///
    /// # Errors
    ///
    /// * `OwnerOnly` - caller is not the owner
    /// * `AlreadyTriggered` - the action already fired
    /// * `TargetLocked` - `SetOnce` policy and a target is armed
    pub fn reset_target_height(
        &mut self,
        caller: Principal,
    ) -> Result<Option<BlockHeight>, TriggerError> {
        require_owner(caller, &self.state)?;
        self.ensure_rearmable()?;

        Ok(self.state.target_height.take())
    }

    /// Fire the action if `observed_height` has reached the target.
    ///
    /// Callable by anyone.
    ///
    /// # Errors
    ///
    /// * `AlreadyTriggered` - the action already fired
    /// * `TargetNotSet` - no target armed
    /// * `HeightNotReached` - `observed_height < target`
    pub fn trigger(&mut self, observed_height: BlockHeight) -> Result<Fired, TriggerError> {
        if self.state.triggered {
            return Err(TriggerError::AlreadyTriggered);
        }
        let target_height = self.state.target_height.ok_or(TriggerError::TargetNotSet)?;
        if observed_height < target_height {
            return Err(TriggerError::HeightNotReached {
                current: observed_height,
                target: target_height,
            });
        }

        self.state.triggered = true;
        self.state.triggered_at = Some(observed_height);
        Ok(Fired {
            target_height,
            observed_height,
        })
    }

    /// Withdraw custodied funds to the owner. Returns the remaining balance.
    ///
    /// # Errors
    ///
    /// * `OwnerOnly` - caller is not the owner
    /// * `NotYetTriggered` - the action has not fired
    /// * `InsufficientFunds` - `amount` exceeds the balance
    pub fn withdraw(&mut self, caller: Principal, amount: Amount) -> Result<Amount, TriggerError> {
        require_owner(caller, &self.state)?;
        let triggered = self.state.triggered;
        self.state.balance.withdraw(amount, triggered)
    }

    /// Credit an external deposit. Returns the new balance.
    ///
    /// # Errors
    ///
    /// * `InvalidAmount` - `amount` is zero
    /// * `BalanceOverflow` - the balance would overflow
    pub fn deposit(&mut self, amount: Amount) -> Result<Amount, TriggerError> {
        self.state.balance.deposit(amount)
    }

    // =========================================================================
    // QUERIES
    // =========================================================================

    /// `get-status` view.
    #[must_use]
    pub fn status(&self) -> TriggerStatus {
        TriggerStatus::from(&self.state)
    }

    /// Current lifecycle phase.
    #[must_use]
    pub fn phase(&self) -> TriggerPhase {
        self.state.phase()
    }

    /// Whether the action has fired.
    #[must_use]
    pub fn is_triggered(&self) -> bool {
        self.state.triggered
    }

    /// Owner identity.
    #[must_use]
    pub fn owner(&self) -> Principal {
        self.state.owner
    }

    /// Custodied balance.
    #[must_use]
    pub fn balance(&self) -> Amount {
        self.state.balance()
    }

    /// Blocks left until the target at `current`; `Some(0)` once reached or
    /// triggered, `None` while unset.
    #[must_use]
    pub fn blocks_remaining(&self, current: BlockHeight) -> Option<u64> {
        self.state
            .target_height
            .map(|target| target.saturating_sub(current))
    }

    fn ensure_rearmable(&self) -> Result<(), TriggerError> {
        if self.state.triggered {
            return Err(TriggerError::AlreadyTriggered);
        }
        match (self.state.policy, self.state.target_height) {
            (TargetPolicy::SetOnce, Some(locked)) => Err(TriggerError::TargetLocked(locked)),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OWNER: Principal = Principal::new([1u8; 20]);
    const STRANGER: Principal = Principal::new([2u8; 20]);

    fn machine() -> TriggerStateMachine {
        TriggerStateMachine::new(OWNER, TargetPolicy::Rearmable, 1_000)
    }

    fn set_once() -> TriggerStateMachine {
        TriggerStateMachine::new(OWNER, TargetPolicy::SetOnce, 1_000)
    }

    #[test]
    fn test_set_target_height_arms() {
        let mut m = machine();
        assert_eq!(m.set_target_height(OWNER, 500), Ok(None));
        assert_eq!(m.status().target_height, Some(500));
        assert_eq!(m.phase(), TriggerPhase::Armed);
    }

    #[test]
    fn test_set_target_height_overwrites_when_rearmable() {
        let mut m = machine();
        m.set_target_height(OWNER, 500).unwrap();
        assert_eq!(m.set_target_height(OWNER, 600), Ok(Some(500)));
        assert_eq!(m.status().target_height, Some(600));
    }

    #[test]
    fn test_set_target_height_zero_rejected_for_anyone() {
        let mut m = machine();
        assert_eq!(
            m.set_target_height(OWNER, 0),
            Err(TriggerError::InvalidHeight(0))
        );
        assert_eq!(
            m.set_target_height(STRANGER, 0),
            Err(TriggerError::InvalidHeight(0))
        );
        assert_eq!(m.phase(), TriggerPhase::Unset);
    }

    #[test]
    fn test_set_target_height_non_owner() {
        let mut m = machine();
        assert_eq!(
            m.set_target_height(STRANGER, 500),
            Err(TriggerError::OwnerOnly { caller: STRANGER })
        );
        assert_eq!(m.status().target_height, None);
    }

    #[test]
    fn test_reset_returns_to_unset() {
        let mut m = machine();
        m.set_target_height(OWNER, 10).unwrap();
        assert_eq!(m.reset_target_height(OWNER), Ok(Some(10)));
        assert_eq!(m.phase(), TriggerPhase::Unset);
        // idempotent
        assert_eq!(m.reset_target_height(OWNER), Ok(None));
    }

    #[test]
    fn test_reset_non_owner() {
        let mut m = machine();
        m.set_target_height(OWNER, 10).unwrap();
        assert!(matches!(
            m.reset_target_height(STRANGER),
            Err(TriggerError::OwnerOnly { .. })
        ));
        assert_eq!(m.status().target_height, Some(10));
    }

    #[test]
    fn test_trigger_without_target() {
        let mut m = machine();
        assert_eq!(m.trigger(1_000), Err(TriggerError::TargetNotSet));
    }

    #[test]
    fn test_trigger_one_block_early() {
        let mut m = machine();
        m.set_target_height(OWNER, 10).unwrap();
        assert_eq!(
            m.trigger(9),
            Err(TriggerError::HeightNotReached {
                current: 9,
                target: 10
            })
        );
        assert!(!m.is_triggered());
    }

    #[test]
    fn test_trigger_at_exact_height() {
        let mut m = machine();
        m.set_target_height(OWNER, 10).unwrap();
        assert_eq!(
            m.trigger(10),
            Ok(Fired {
                target_height: 10,
                observed_height: 10
            })
        );
        assert!(m.is_triggered());
        assert_eq!(m.state().triggered_at(), Some(10));
    }

    #[test]
    fn test_triggered_is_terminal() {
        let mut m = machine();
        m.set_target_height(OWNER, 10).unwrap();
        m.trigger(15).unwrap();

        assert_eq!(m.trigger(20), Err(TriggerError::AlreadyTriggered));
        assert_eq!(
            m.set_target_height(OWNER, 20),
            Err(TriggerError::AlreadyTriggered)
        );
        assert_eq!(
            m.reset_target_height(OWNER),
            Err(TriggerError::AlreadyTriggered)
        );
        assert_eq!(m.phase(), TriggerPhase::Triggered);
        assert_eq!(m.status().target_height, Some(10));
    }

    #[test]
    fn test_set_once_locks_target() {
        let mut m = set_once();
        m.set_target_height(OWNER, 500).unwrap();
        let err = m.set_target_height(OWNER, 600).unwrap_err();
        assert_eq!(err, TriggerError::TargetLocked(500));
        assert_eq!(err.code(), 101);
        assert_eq!(
            m.reset_target_height(OWNER),
            Err(TriggerError::TargetLocked(500))
        );
        assert_eq!(m.status().target_height, Some(500));
    }

    #[test]
    fn test_withdraw_gated_on_trigger() {
        let mut m = machine();
        assert_eq!(m.withdraw(OWNER, 1), Err(TriggerError::NotYetTriggered));

        m.set_target_height(OWNER, 1).unwrap();
        m.trigger(1).unwrap();
        assert!(matches!(
            m.withdraw(STRANGER, 1),
            Err(TriggerError::OwnerOnly { .. })
        ));
        assert_eq!(m.withdraw(OWNER, 400), Ok(600));
        assert!(matches!(
            m.withdraw(OWNER, 601),
            Err(TriggerError::InsufficientFunds { .. })
        ));
        assert_eq!(m.balance(), 600);
    }

    #[test]
    fn test_blocks_remaining() {
        let mut m = machine();
        assert_eq!(m.blocks_remaining(5), None);
        m.set_target_height(OWNER, 10).unwrap();
        assert_eq!(m.blocks_remaining(5), Some(5));
        assert_eq!(m.blocks_remaining(12), Some(0));
    }

    #[test]
    fn test_restore_rejects_corrupt_state() {
        let mut state = ContractState::new(OWNER, TargetPolicy::Rearmable, 0);
        state.triggered = true;
        assert!(matches!(
            TriggerStateMachine::restore(state),
            Err(TriggerError::CorruptState(_))
        ));
    }

    #[test]
    fn test_restore_round_trip() {
        let mut m = machine();
        m.set_target_height(OWNER, 7).unwrap();
        m.trigger(8).unwrap();
        let restored = TriggerStateMachine::restore(m.clone().into_state()).unwrap();
        assert_eq!(restored, m);
    }
}
