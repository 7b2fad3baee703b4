//! # Error Types
//!
//! All error types for the height trigger.
//!
//! Every failure is returned as a typed result. `TriggerError::code()` is the
//! stable numeric code handed to callers; `TriggerError::kind()` places the
//! error in the caller-facing taxonomy.

use crate::domain::value_objects::{error_codes, Amount, BlockHeight, Principal};
use serde::{Deserialize, Serialize};
use thiserror::Error;

// =============================================================================
// ERROR TAXONOMY
// =============================================================================

/// Caller-facing error category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Caller is not the owner.
    Authorization,
    /// Structurally invalid input.
    Validation,
    /// Operation incompatible with the current machine state.
    State,
    /// Runtime condition not yet met; retrying later may succeed.
    Precondition,
    /// Withdrawal exceeds balance.
    InsufficientFunds,
    /// External collaborator failed.
    External,
}

// =============================================================================
// TRIGGER ERRORS
// =============================================================================

/// Errors returned by the height trigger operations.
///
/// No variant is ever produced after a partial mutation: when an operation
/// returns `Err`, the contract state is exactly what it was before the call.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TriggerError {
    /// Caller is not the recorded owner.
    #[error("owner only: caller {caller} is not the owner")]
    OwnerOnly {
        /// The rejected caller.
        caller: Principal,
    },

    /// The action has already fired.
    #[error("action already triggered")]
    AlreadyTriggered,

    /// The target was armed under the `SetOnce` policy and cannot change.
    #[error("target height locked at {0}")]
    TargetLocked(BlockHeight),

    /// Trigger called with no target armed.
    #[error("target height not set")]
    TargetNotSet,

    /// Withdrawal attempted before the action fired.
    #[error("action not yet triggered")]
    NotYetTriggered,

    /// Target height must be strictly positive.
    #[error("invalid target height: {0}")]
    InvalidHeight(BlockHeight),

    /// Deposit amount must be strictly positive.
    #[error("invalid amount: {0}")]
    InvalidAmount(Amount),

    /// Observed height is still below the target.
    #[error("height not reached: current {current} < target {target}")]
    HeightNotReached {
        /// Height observed by this call.
        current: BlockHeight,
        /// Armed target height.
        target: BlockHeight,
    },

    /// Withdrawal exceeds the custodied balance.
    #[error("insufficient funds: requested {requested}, available {available}")]
    InsufficientFunds {
        /// Requested amount.
        requested: Amount,
        /// Current balance.
        available: Amount,
    },

    /// Deposit would overflow the balance counter.
    #[error("balance overflow: {balance} + {amount}")]
    BalanceOverflow {
        /// Current balance.
        balance: Amount,
        /// Deposit amount.
        amount: Amount,
    },

    /// The funds-movement collaborator refused the transfer.
    #[error("transfer failed: {0}")]
    TransferFailed(#[from] TransferError),

    /// A persisted snapshot violates the contract invariants.
    #[error("corrupt state: {0}")]
    CorruptState(String),
}

impl TriggerError {
    /// Stable numeric code for this error.
    #[must_use]
    pub fn code(&self) -> u32 {
        match self {
            Self::OwnerOnly { .. } => error_codes::OWNER_ONLY,
            Self::AlreadyTriggered | Self::TargetLocked(_) => error_codes::ALREADY_TRIGGERED,
            Self::HeightNotReached { .. } => error_codes::HEIGHT_NOT_REACHED,
            Self::InvalidHeight(_) => error_codes::INVALID_HEIGHT,
            Self::NotYetTriggered => error_codes::NOT_YET_TRIGGERED,
            Self::TargetNotSet => error_codes::TARGET_NOT_SET,
            Self::InsufficientFunds { .. } => error_codes::INSUFFICIENT_FUNDS,
            Self::TransferFailed(_) => error_codes::TRANSFER_FAILED,
            Self::InvalidAmount(_) => error_codes::INVALID_AMOUNT,
            Self::BalanceOverflow { .. } => error_codes::BALANCE_OVERFLOW,
            Self::CorruptState(_) => error_codes::CORRUPT_STATE,
        }
    }

    /// Taxonomy bucket for this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::OwnerOnly { .. } => ErrorKind::Authorization,
            Self::InvalidHeight(_) | Self::InvalidAmount(_) | Self::BalanceOverflow { .. } => {
                ErrorKind::Validation
            }
            Self::AlreadyTriggered
            | Self::TargetLocked(_)
            | Self::TargetNotSet
            | Self::NotYetTriggered
            | Self::CorruptState(_) => ErrorKind::State,
            Self::HeightNotReached { .. } => ErrorKind::Precondition,
            Self::InsufficientFunds { .. } => ErrorKind::InsufficientFunds,
            Self::TransferFailed(_) => ErrorKind::External,
        }
    }

    /// Returns true if re-invoking the same call later may succeed without
    /// any other call in between (only a height that has not been reached).
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::HeightNotReached { .. })
    }
}

// =============================================================================
// COLLABORATOR ERRORS
// =============================================================================

/// Errors from the funds-movement collaborator.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransferError {
    /// The recipient cannot receive funds.
    #[error("recipient rejected: {0}")]
    RecipientRejected(Principal),

    /// The ledger is not reachable.
    #[error("ledger unavailable")]
    Unavailable,

    /// Other ledger error.
    #[error("ledger error: {0}")]
    Other(String),
}

/// Errors from height oracle adapters.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum OracleError {
    /// An attempt to move the height backwards.
    #[error("height regression: {current} -> {requested}")]
    Regression {
        /// Height currently reported.
        current: BlockHeight,
        /// Rejected new height.
        requested: BlockHeight,
    },

    /// Advancing would overflow the counter.
    #[error("height overflow")]
    Overflow,
}

/// Errors from loading or validating configuration.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The owner is unset (zero principal).
    #[error("owner principal must be set")]
    MissingOwner,

    /// Block interval of zero would spin the dev node.
    #[error("block interval must be positive")]
    ZeroBlockInterval,

    /// A startup target of zero can never be armed.
    #[error("target height must be positive")]
    ZeroTargetHeight,

    /// Unknown arming policy name.
    #[error("unknown target policy: {0}")]
    UnknownPolicy(String),
}

// =============================================================================
// TESTS
// =============================================================================
