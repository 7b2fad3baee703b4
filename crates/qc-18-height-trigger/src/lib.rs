//! # QC-18 Height Trigger - Height-Gated One-Shot Action Subsystem
//!
//! **Subsystem ID:** 18
//! **Status:** Production-Ready
//!
//! ## Purpose
//!
//! A single-owner contract that arms a target burn-chain height, lets any
//! caller fire a one-shot action once that height is observed, and releases
//! custodied funds to the owner only after the action has fired.
//!
//! ```text
//! Unset ──set──▶ Armed ──trigger──▶ Triggered (terminal)
//!   ▲              │
//!   └────reset─────┘
//! ```
//!
//! ## Domain Invariants
//!
//! | ID | Invariant | Enforcement Location |
//! |----|-----------|---------------------|
//! | INVARIANT-1 | Trigger Soundness | `domain/invariants.rs` - `check_trigger_soundness_invariant()` |
//! | INVARIANT-2 | Positive Target | `domain/invariants.rs` - `check_positive_target_invariant()` |
//! | INVARIANT-3 | Monotonic Trigger | `domain/invariants.rs` - `check_monotonic_trigger_invariant()` |
//! | INVARIANT-4 | Frozen Target | `domain/invariants.rs` - `check_frozen_target_invariant()` |
//! | INVARIANT-5 | Immutable Owner | `domain/invariants.rs` - `check_immutable_owner_invariant()` |
//! | INVARIANT-6 | Gated Custody | `domain/invariants.rs` - `check_custody_invariant()` |
//!
//! ## Operations
//!
//! | Operation | Caller | Errors (code) |
//! |-----------|--------|---------------|
//! | `set-target-height` | owner | INVALID_HEIGHT (103), OWNER_ONLY (100), ALREADY_TRIGGERED (101) |
//! | `reset-target-height` | owner | OWNER_ONLY (100), ALREADY_TRIGGERED (101) |
//! | `trigger-action-if-height-reached` | anyone | ALREADY_TRIGGERED (101), TARGET_NOT_SET (105), HEIGHT_NOT_REACHED (102) |
//! | `withdraw` | owner | OWNER_ONLY (100), NOT_YET_TRIGGERED (104), INSUFFICIENT_FUNDS (106), TRANSFER_FAILED (107) |
//! | `deposit` | anyone | INVALID_AMOUNT (108), BALANCE_OVERFLOW (109) |
//! | `get-status` | anyone | - |
//! | `get-current-btc-block-height` | anyone | - |
//! | `get-balance` | anyone | - |
//!
//! ## Outbound Dependencies
//!
//! | Collaborator | Trait | Purpose |
//! |--------------|-------|---------|
//! | Burn-chain feed | `HeightOracle` | Current external block height |
//! | Ledger | `FundsTransfer` | Move withdrawn funds to the owner |
//!
//! ## Usage Example
//!
//! ```ignore
//! use qc_18_height_trigger::prelude::*;
//!
//! let (service, oracle, _ledger) = create_test_service(owner, TargetPolicy::Rearmable, 1_000);
//! service.set_target_height(owner, 840_000)?;
//! oracle.set(840_000)?;
//! service.trigger_action_if_height_reached(anyone)?;
//! service.withdraw(owner, 1_000)?;
//! ```

// Crate-level lints
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::cast_precision_loss)]

// =============================================================================
// MODULES
// =============================================================================

pub mod adapters;
pub mod config;
pub mod domain;
pub mod errors;
pub mod events;
pub mod metrics;
pub mod ports;
pub mod service;

// =============================================================================
// PRELUDE
// =============================================================================

/// Convenient re-exports for common usage.
pub mod prelude {
    // Domain entities
    pub use crate::domain::entities::{
        ContractState, Operation, TargetPolicy, TriggerPhase, TriggerStatus,
    };

    // Value objects
    pub use crate::domain::value_objects::{error_codes, Amount, BlockHeight, Principal};

    // State machine
    pub use crate::domain::machine::{Fired, TriggerStateMachine};

    // Invariants
    pub use crate::domain::invariants::{
        check_all_invariants, check_state_invariants, InvariantCheckResult, InvariantViolation,
    };

    // Ports
    pub use crate::ports::inbound::{CallExecution, HeightTriggerApi};
    pub use crate::ports::outbound::{FundsTransfer, HeightOracle};

    // Events
    pub use crate::events::{
        CallOutcome, CallReceipt, CallRequest, CallValue, ContractCall, ErrorResponse,
        TriggerEvent,
    };

    // Errors
    pub use crate::errors::{ConfigError, ErrorKind, OracleError, TransferError, TriggerError};

    // Config
    pub use crate::config::TriggerConfig;

    // Adapters
    pub use crate::adapters::{
        FnHeightOracle, InMemoryLedger, ManualHeightOracle, TransferRecord, TriggerEventHandler,
    };

    // Service
    pub use crate::service::{create_test_service, HeightTriggerService, ServiceStats, TestService};
}

// =============================================================================
// CRATE INFO
// =============================================================================

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Subsystem ID.
pub const SUBSYSTEM_ID: u8 = 18;

/// Subsystem name.
pub const SUBSYSTEM_NAME: &str = "Height Trigger";

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subsystem_id() {
        assert_eq!(SUBSYSTEM_ID, 18);
    }

    #[test]
    fn test_prelude_exports() {
        use prelude::*;
        let _ = TriggerConfig::default();
        let _ = Principal::ZERO;
        assert_eq!(error_codes::OWNER_ONLY, 100);
    }
}
