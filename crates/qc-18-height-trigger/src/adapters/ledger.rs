//! # Ledger Adapter
//!
//! In-memory funds transfer for tests and the dev node.
//! A production host moves real assets behind the same port.

use crate::domain::value_objects::{Amount, Principal};
use crate::errors::TransferError;
use crate::ports::outbound::FundsTransfer;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use tracing::{info, warn};

/// A transfer that left custody.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferRecord {
    /// Recipient.
    pub recipient: Principal,
    /// Amount moved.
    pub amount: Amount,
}

/// In-memory ledger recording every transfer.
#[derive(Debug, Default)]
pub struct InMemoryLedger {
    accounts: Mutex<HashMap<Principal, Amount>>,
    history: Mutex<Vec<TransferRecord>>,
    rejected: Mutex<HashSet<Principal>>,
    offline: Mutex<bool>,
}

impl InMemoryLedger {
    /// Empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Funds received by `principal` so far.
    #[must_use]
    pub fn balance_of(&self, principal: Principal) -> Amount {
        self.accounts
            .lock()
            .get(&principal)
            .copied()
            .unwrap_or_default()
    }

    /// Every successful transfer, oldest first.
    #[must_use]
    pub fn history(&self) -> Vec<TransferRecord> {
        self.history.lock().clone()
    }

    /// Refuse transfers to `principal`.
    pub fn reject_recipient(&self, principal: Principal) {
        self.rejected.lock().insert(principal);
    }

    /// Simulate the ledger going offline or coming back.
    pub fn set_offline(&self, offline: bool) {
        *self.offline.lock() = offline;
    }
}

impl FundsTransfer for InMemoryLedger {
    fn transfer(&self, recipient: Principal, amount: Amount) -> Result<(), TransferError> {
        if *self.offline.lock() {
            warn!(%recipient, amount, "[qc-18] ledger offline, transfer refused");
            return Err(TransferError::Unavailable);
        }
        if self.rejected.lock().contains(&recipient) {
            warn!(%recipient, amount, "[qc-18] recipient rejected by ledger");
            return Err(TransferError::RecipientRejected(recipient));
        }

        let mut accounts = self.accounts.lock();
        let entry = accounts.entry(recipient).or_default();
        *entry = entry
            .checked_add(amount)
            .ok_or_else(|| TransferError::Other("recipient balance overflow".to_string()))?;
        drop(accounts);

        self.history.lock().push(TransferRecord { recipient, amount });
        info!(%recipient, amount, "[qc-18] funds transferred");
        Ok(())
    }
}
