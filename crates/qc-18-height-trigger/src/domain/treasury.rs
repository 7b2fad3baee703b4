//! # Treasury
//!
//! Custody of the contract balance. Withdrawals are gated on the trigger
//! flag, which the treasury only ever reads.

use super::value_objects::Amount;
use crate::errors::TriggerError;
use serde::{Deserialize, Serialize};

/// Balance counter held by the contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Treasury {
    balance: Amount,
}

impl Treasury {
    /// Treasury holding `balance`.
    #[must_use]
    pub const fn new(balance: Amount) -> Self {
        Self { balance }
    }

    /// Funds available for withdrawal.
    #[must_use]
    pub const fn balance(&self) -> Amount {
        self.balance
    }

    /// Debit `amount` once the action has fired.
    ///
    /// Returns the remaining balance. The balance is untouched on error.
    ///
    /// # Errors
    ///
    /// * `NotYetTriggered` - `triggered` is false
    /// * `InsufficientFunds` - `amount` exceeds the balance
    pub fn withdraw(&mut self, amount: Amount, triggered: bool) -> Result<Amount, TriggerError> {
        if !triggered {
            return Err(TriggerError::NotYetTriggered);
        }
        let remaining =
            self.balance
                .checked_sub(amount)
                .ok_or(TriggerError::InsufficientFunds {
                    requested: amount,
                    available: self.balance,
                })?;
        self.balance = remaining;
        Ok(remaining)
    }

    /// Credit an external deposit. Returns the new balance.
    ///
    /// # Errors
    ///
    /// * `InvalidAmount` - `amount` is zero
    /// * `BalanceOverflow` - the counter would overflow
    pub fn deposit(&mut self, amount: Amount) -> Result<Amount, TriggerError> {
        if amount == 0 {
            return Err(TriggerError::InvalidAmount(amount));
        }
        let balance = self
            .balance
            .checked_add(amount)
            .ok_or(TriggerError::BalanceOverflow {
                balance: self.balance,
                amount,
            })?;
        self.balance = balance;
        Ok(balance)
    }
}
