//! # Driving Ports (API - Inbound)
//!
//! The public surface of the height trigger.
//!
//! `execute` is the single required primitive; the typed operations are
//! provided on top of it so every entry point goes through the same
//! authorization, atomicity and invariant checks.

use crate::domain::entities::TriggerStatus;
use crate::domain::value_objects::{Amount, BlockHeight, Principal};
use crate::errors::TriggerError;
use crate::events::{CallValue, ContractCall, TriggerEvent};

/// Result of executing one call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallExecution {
    /// Success value or typed error.
    pub result: Result<CallValue, TriggerError>,
    /// Events emitted by the call; empty on error.
    pub events: Vec<TriggerEvent>,
}

impl CallExecution {
    /// Failed execution with no events.
    #[must_use]
    pub fn failed(err: TriggerError) -> Self {
        Self {
            result: Err(err),
            events: Vec::new(),
        }
    }
}

/// Primary API of the height trigger.
///
/// Calls are processed one at a time, each to completion, in the order the
/// host submits them.
pub trait HeightTriggerApi: Send + Sync {
    /// Execute `call` on behalf of `sender`.
    fn execute(&self, sender: Principal, call: &ContractCall) -> CallExecution;

    /// `set-target-height` (owner only).
    ///
    /// # Errors
    ///
    /// `InvalidHeight`, `OwnerOnly`, `AlreadyTriggered`, `TargetLocked`.
    fn set_target_height(&self, sender: Principal, height: BlockHeight) -> Result<bool, TriggerError> {
        expect_bool(self.execute(sender, &ContractCall::SetTargetHeight { height }))
    }

    /// `reset-target-height` (owner only).
    ///
    /// # Errors
    ///
    /// `OwnerOnly`, `AlreadyTriggered`, `TargetLocked`.
    fn reset_target_height(&self, sender: Principal) -> Result<bool, TriggerError> {
        expect_bool(self.execute(sender, &ContractCall::ResetTargetHeight))
    }

    /// `trigger-action-if-height-reached` (anyone).
    ///
    /// # Errors
    ///
    /// `AlreadyTriggered`, `TargetNotSet`, `HeightNotReached`.
    fn trigger_action_if_height_reached(&self, sender: Principal) -> Result<bool, TriggerError> {
        expect_bool(self.execute(sender, &ContractCall::TriggerActionIfHeightReached))
    }

    /// `withdraw` (owner only, after trigger).
    ///
    /// # Errors
    ///
    /// `OwnerOnly`, `NotYetTriggered`, `InsufficientFunds`, `TransferFailed`.
    fn withdraw(&self, sender: Principal, amount: Amount) -> Result<bool, TriggerError> {
        expect_bool(self.execute(sender, &ContractCall::Withdraw { amount }))
    }

    /// `deposit` (anyone).
    ///
    /// # Errors
    ///
    /// `InvalidAmount`, `BalanceOverflow`.
    fn deposit(&self, sender: Principal, amount: Amount) -> Result<bool, TriggerError> {
        expect_bool(self.execute(sender, &ContractCall::Deposit { amount }))
    }

    /// `get-status`
    fn get_status(&self) -> TriggerStatus;

    /// `get-current-btc-block-height`
    fn get_current_btc_block_height(&self) -> BlockHeight;

    /// `get-balance`
    fn get_balance(&self) -> Amount;
}

fn expect_bool(execution: CallExecution) -> Result<bool, TriggerError> {
    Ok(matches!(execution.result?, CallValue::Bool(true)))
}
