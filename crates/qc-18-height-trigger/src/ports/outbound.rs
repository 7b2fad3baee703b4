//! # Driven Ports (SPI - Outbound)
//!
//! Interfaces the height trigger depends on. The host environment provides
//! implementations:
//! - Height oracle (external burn-chain height feed)
//! - Funds transfer (asset movement to the owner)
//!
//! Both are consumed through narrow, synchronous interfaces. The core never
//! writes to the oracle and never moves assets itself.

use crate::domain::value_objects::{Amount, BlockHeight, Principal};
use crate::errors::TransferError;
use std::sync::Arc;

// =============================================================================
// HEIGHT ORACLE
// =============================================================================

/// Read-only source of the current external block height.
///
/// Implementations MUST be monotonically non-decreasing across calls: the
/// reported height may stay constant but never goes down.
pub trait HeightOracle: Send + Sync {
    /// Current external height.
    fn current(&self) -> BlockHeight;
}

impl<T: HeightOracle + ?Sized> HeightOracle for Arc<T> {
    fn current(&self) -> BlockHeight {
        (**self).current()
    }
}

impl<T: HeightOracle + ?Sized> HeightOracle for &T {
    fn current(&self) -> BlockHeight {
        (**self).current()
    }
}

// =============================================================================
// FUNDS TRANSFER
// =============================================================================

/// Moves withdrawn funds out of custody.
///
/// Called at most once per successful `withdraw`, after every precondition
/// has passed and before the new balance is committed. An `Err` aborts the
/// withdrawal with the balance unchanged.
pub trait FundsTransfer: Send + Sync {
    /// Transfer `amount` to `recipient`.
    ///
    /// # Errors
    ///
    /// Any `TransferError` aborts the enclosing withdrawal.
    fn transfer(&self, recipient: Principal, amount: Amount) -> Result<(), TransferError>;
}

impl<T: FundsTransfer + ?Sized> FundsTransfer for Arc<T> {
    fn transfer(&self, recipient: Principal, amount: Amount) -> Result<(), TransferError> {
        (**self).transfer(recipient, amount)
    }
}
