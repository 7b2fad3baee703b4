//! # Call & Event Schema
//!
//! Wire payloads exchanged with the host.
//!
//! - `CallRequest` - one contract call, carrying the sender identity
//! - `CallReceipt` - the result plus the events emitted by that call
//! - `TriggerEvent` - notifications emitted by successful state changes
//!
//! ## Identity
//!
//! The sender is carried on the request envelope only. Payloads never contain
//! a caller field; `CallRequest::sender` is authoritative.
//!
//! ## Encoding
//!
//! ```json
//! {"correlation_id": "...", "sender": "0x01..01", "call": {"set-target-height": {"height": 500}}}
//! {"correlation_id": "...", "result": {"ok": {"bool": true}}, "events": [...]}
//! {"correlation_id": "...", "result": {"err": {"code": 100, "message": "..."}}, "events": []}
//! ```

use crate::domain::entities::{Operation, TriggerStatus};
use crate::domain::value_objects::{Amount, BlockHeight, Principal};
use crate::errors::TriggerError;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// =============================================================================
// INBOUND CALLS
// =============================================================================

/// A contract call, named after the public operation it invokes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ContractCall {
    /// Arm the target (owner only).
    SetTargetHeight {
        /// Target burn height; must be positive.
        height: BlockHeight,
    },
    /// Disarm the target (owner only).
    ResetTargetHeight,
    /// Fire the action if the height is reached (anyone).
    TriggerActionIfHeightReached,
    /// Withdraw custodied funds (owner only, after trigger).
    Withdraw {
        /// Amount to withdraw.
        amount: Amount,
    },
    /// Credit an external deposit (anyone).
    Deposit {
        /// Amount deposited; must be positive.
        amount: Amount,
    },
    /// Read `{owner, target_height, triggered}`.
    GetStatus,
    /// Read the oracle height.
    GetCurrentBtcBlockHeight,
    /// Read the custodied balance.
    GetBalance,
}

impl ContractCall {
    /// The state-changing operation this call performs, if any.
    #[must_use]
    pub fn operation(&self) -> Option<Operation> {
        match self {
            Self::SetTargetHeight { .. } => Some(Operation::SetTargetHeight),
            Self::ResetTargetHeight => Some(Operation::ResetTargetHeight),
            Self::TriggerActionIfHeightReached => Some(Operation::Trigger),
            Self::Withdraw { .. } => Some(Operation::Withdraw),
            Self::Deposit { .. } => Some(Operation::Deposit),
            Self::GetStatus | Self::GetCurrentBtcBlockHeight | Self::GetBalance => None,
        }
    }

    /// External operation name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::GetStatus => "get-status",
            Self::GetCurrentBtcBlockHeight => "get-current-btc-block-height",
            Self::GetBalance => "get-balance",
            other => other
                .operation()
                .map_or("unknown", |operation| operation.name()),
        }
    }

    /// Returns true for read-only calls.
    #[must_use]
    pub fn is_read_only(&self) -> bool {
        self.operation().is_none()
    }
}

/// A call envelope submitted by the host.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CallRequest {
    /// Request/receipt correlation.
    pub correlation_id: Uuid,
    /// Authoritative caller identity.
    pub sender: Principal,
    /// The call.
    pub call: ContractCall,
}

impl CallRequest {
    /// New request with a fresh correlation ID.
    #[must_use]
    pub fn new(sender: Principal, call: ContractCall) -> Self {
        Self {
            correlation_id: Uuid::new_v4(),
            sender,
            call,
        }
    }
}

// =============================================================================
// RESULTS
// =============================================================================

/// Success value of a call.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallValue {
    /// State-changing calls answer `true`.
    Bool(bool),
    /// `get-status`
    Status(TriggerStatus),
    /// `get-current-btc-block-height`
    Height(BlockHeight),
    /// `get-balance`
    Balance(Amount),
}

/// Structured error record carried on the wire.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Stable numeric code.
    pub code: u32,
    /// Human-readable description.
    pub message: String,
}

impl From<&TriggerError> for ErrorResponse {
    fn from(err: &TriggerError) -> Self {
        Self {
            code: err.code(),
            message: err.to_string(),
        }
    }
}

/// `(ok value)` or `(err code)`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallOutcome {
    /// The call succeeded.
    Ok(CallValue),
    /// The call failed; state is unchanged.
    Err(ErrorResponse),
}

impl CallOutcome {
    /// Returns true on success.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok(_))
    }

    /// Error code, if the call failed.
    #[must_use]
    pub fn err_code(&self) -> Option<u32> {
        match self {
            Self::Ok(_) => None,
            Self::Err(e) => Some(e.code),
        }
    }
}

impl From<Result<CallValue, TriggerError>> for CallOutcome {
    fn from(result: Result<CallValue, TriggerError>) -> Self {
        match result {
            Ok(value) => Self::Ok(value),
            Err(err) => Self::Err(ErrorResponse::from(&err)),
        }
    }
}

/// Receipt for one `CallRequest`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CallReceipt {
    /// Correlation ID copied from the request.
    pub correlation_id: Uuid,
    /// Result of the call.
    pub result: CallOutcome,
    /// Events emitted; always empty on error.
    pub events: Vec<TriggerEvent>,
}

// =============================================================================
// OUTBOUND EVENTS
// =============================================================================

/// Notifications emitted by successful state-changing calls.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TriggerEvent {
    /// Target armed or re-armed.
    TargetHeightSet {
        /// New target.
        height: BlockHeight,
        /// Target it replaced.
        previous: Option<BlockHeight>,
    },
    /// Target disarmed.
    TargetHeightReset {
        /// Target that was cleared.
        previous: Option<BlockHeight>,
    },
    /// The one-shot action fired.
    ActionTriggered {
        /// Armed target.
        target_height: BlockHeight,
        /// Oracle height observed by the call.
        observed_height: BlockHeight,
        /// Whoever fired it.
        caller: Principal,
    },
    /// Funds left custody.
    Withdrawn {
        /// Recipient (the owner).
        recipient: Principal,
        /// Amount moved.
        amount: Amount,
        /// Balance left.
        remaining: Amount,
    },
    /// Funds entered custody.
    Deposited {
        /// Depositor.
        from: Principal,
        /// Amount credited.
        amount: Amount,
        /// New balance.
        balance: Amount,
    },
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_call_wire_names() {
        let json = serde_json::to_value(ContractCall::SetTargetHeight { height: 500 }).unwrap();
        assert_eq!(json["set-target-height"]["height"], 500);

        let json = serde_json::to_value(ContractCall::TriggerActionIfHeightReached).unwrap();
        assert_eq!(json, "trigger-action-if-height-reached");

        let call: ContractCall = serde_json::from_str("\"get-current-btc-block-height\"").unwrap();
        assert_eq!(call, ContractCall::GetCurrentBtcBlockHeight);
    }

    #[test]
    fn test_call_names_match_wire() {
        for call in [
            ContractCall::SetTargetHeight { height: 1 },
            ContractCall::ResetTargetHeight,
            ContractCall::TriggerActionIfHeightReached,
            ContractCall::Withdraw { amount: 1 },
            ContractCall::Deposit { amount: 1 },
            ContractCall::GetStatus,
            ContractCall::GetCurrentBtcBlockHeight,
            ContractCall::GetBalance,
        ] {
            let json = serde_json::to_value(&call).unwrap();
            let wire = match &json {
                serde_json::Value::String(s) => s.clone(),
                serde_json::Value::Object(map) => map.keys().next().cloned().unwrap(),
                other => panic!("unexpected encoding: {other}"),
            };
            assert_eq!(wire, call.name());
        }
    }

    #[test]
    fn test_read_only_calls() {
        assert!(ContractCall::GetStatus.is_read_only());
        assert!(ContractCall::GetBalance.is_read_only());
        assert!(!ContractCall::TriggerActionIfHeightReached.is_read_only());
    }

    #[test]
    fn test_outcome_encoding() {
        let ok = CallOutcome::from(Ok(CallValue::Bool(true)));
        assert_eq!(
            serde_json::to_value(&ok).unwrap(),
            serde_json::json!({"ok": {"bool": true}})
        );

        let err = CallOutcome::from(Err(TriggerError::TargetNotSet));
        assert_eq!(err.err_code(), Some(105));
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["err"]["code"], 105);
    }

    #[test]
    fn test_receipt_decodes() {
        let receipt = CallReceipt {
            correlation_id: Uuid::new_v4(),
            result: CallOutcome::Ok(CallValue::Balance(1_000)),
            events: vec![TriggerEvent::Withdrawn {
                recipient: Principal::new([1u8; 20]),
                amount: 10,
                remaining: 1_000,
            }],
        };
        let json = serde_json::to_string(&receipt).unwrap();
        let back: CallReceipt = serde_json::from_str(&json).unwrap();
        assert_eq!(back.result, receipt.result);
        assert_eq!(back.events, receipt.events);
    }
}
