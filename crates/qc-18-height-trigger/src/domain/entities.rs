//! # Domain Entities
//!
//! The `ContractState` aggregate and the read models derived from it.

use super::treasury::Treasury;
use super::value_objects::{Amount, BlockHeight, Principal};
use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// TARGET POLICY
// =============================================================================

/// How often the owner may arm the target before the action fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TargetPolicy {
    /// Overwrite or reset freely until triggered.
    #[default]
    Rearmable,
    /// The first armed target is final; later set/reset calls are rejected.
    SetOnce,
}

impl TargetPolicy {
    /// Policy name as used in configuration.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Rearmable => "rearmable",
            Self::SetOnce => "set-once",
        }
    }
}

impl fmt::Display for TargetPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// CONTRACT STATE
// =============================================================================

/// The single aggregate owned by the trigger state machine.
///
/// Created once at deployment with `owner` fixed; never destroyed. Fields are
/// only reachable for mutation through [`super::TriggerStateMachine`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractState {
    /// Immutable owner identity.
    pub(crate) owner: Principal,
    /// Armed target height; `None` while unset.
    pub(crate) target_height: Option<BlockHeight>,
    /// Monotonic one-shot flag.
    pub(crate) triggered: bool,
    /// Oracle height observed by the successful trigger call. Optional in
    /// snapshots; a triggered state without it still restores.
    #[serde(default)]
    pub(crate) triggered_at: Option<BlockHeight>,
    /// Arming policy fixed at deployment.
    #[serde(default)]
    pub(crate) policy: TargetPolicy,
    /// Custodied funds.
    pub(crate) balance: Treasury,
}

impl ContractState {
    /// Fresh deployment state.
    #[must_use]
    pub fn new(owner: Principal, policy: TargetPolicy, initial_balance: Amount) -> Self {
        Self {
            owner,
            target_height: None,
            triggered: false,
            triggered_at: None,
            policy,
            balance: Treasury::new(initial_balance),
        }
    }

    /// Owner identity.
    #[must_use]
    pub fn owner(&self) -> Principal {
        self.owner
    }

    /// Armed target, if any.
    #[must_use]
    pub fn target_height(&self) -> Option<BlockHeight> {
        self.target_height
    }

    /// Whether the action has fired.
    #[must_use]
    pub fn triggered(&self) -> bool {
        self.triggered
    }

    /// Height observed when the action fired.
    #[must_use]
    pub fn triggered_at(&self) -> Option<BlockHeight> {
        self.triggered_at
    }

    /// Arming policy.
    #[must_use]
    pub fn policy(&self) -> TargetPolicy {
        self.policy
    }

    /// Custodied balance.
    #[must_use]
    pub fn balance(&self) -> Amount {
        self.balance.balance()
    }

    /// Current lifecycle phase.
    #[must_use]
    pub fn phase(&self) -> TriggerPhase {
        match (self.triggered, self.target_height) {
            (true, _) => TriggerPhase::Triggered,
            (false, Some(_)) => TriggerPhase::Armed,
            (false, None) => TriggerPhase::Unset,
        }
    }
}

// =============================================================================
// PHASE
// =============================================================================

/// Lifecycle phase of the machine.
///
/// ```text
/// Unset ──set──▶ Armed ──trigger──▶ Triggered
///   ▲              │ ▲
///   └────reset─────┘ └─set (overwrite)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TriggerPhase {
    /// No target armed.
    Unset,
    /// Target armed, waiting for the height.
    Armed,
    /// Action fired. Terminal.
    Triggered,
}

impl TriggerPhase {
    /// Numeric encoding used by the phase gauge.
    #[must_use]
    pub const fn as_gauge(&self) -> i64 {
        match self {
            Self::Unset => 0,
            Self::Armed => 1,
            Self::Triggered => 2,
        }
    }
}

// =============================================================================
// OPERATIONS
// =============================================================================

/// State-changing operations, used for invariant checks, logs and metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Operation {
    /// `set-target-height`
    SetTargetHeight,
    /// `reset-target-height`
    ResetTargetHeight,
    /// `trigger-action-if-height-reached`
    Trigger,
    /// `withdraw`
    Withdraw,
    /// `deposit`
    Deposit,
}

impl Operation {
    /// External operation name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::SetTargetHeight => "set-target-height",
            Self::ResetTargetHeight => "reset-target-height",
            Self::Trigger => "trigger-action-if-height-reached",
            Self::Withdraw => "withdraw",
            Self::Deposit => "deposit",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// =============================================================================
// STATUS
// =============================================================================

/// Read-only view returned by `get-status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerStatus {
    /// Owner identity.
    pub owner: Principal,
    /// Armed target, if any.
    pub target_height: Option<BlockHeight>,
    /// Whether the action has fired.
    pub triggered: bool,
}

impl From<&ContractState> for TriggerStatus {
    fn from(state: &ContractState) -> Self {
        Self {
            owner: state.owner,
            target_height: state.target_height,
            triggered: state.triggered,
        }
    }
}
