//! # Call Handler Adapter
//!
//! Turns host call envelopes into API calls and API results into receipts.
//!
//! - Identity comes from `CallRequest::sender` only
//! - Receipts echo the request's `correlation_id`
//! - Malformed JSON never reaches the contract

use crate::events::{CallOutcome, CallReceipt, CallRequest};
use crate::ports::inbound::HeightTriggerApi;
use std::sync::Arc;
use tracing::{debug, warn};

/// Dispatches `CallRequest`s to a [`HeightTriggerApi`].
pub struct TriggerEventHandler<T: HeightTriggerApi> {
    api: Arc<T>,
}

impl<T: HeightTriggerApi> TriggerEventHandler<T> {
    /// Create a new handler.
    pub fn new(api: Arc<T>) -> Self {
        Self { api }
    }

    /// Execute one request and build its receipt.
    pub fn handle(&self, request: CallRequest) -> CallReceipt {
        debug!(
            correlation_id = %request.correlation_id,
            sender = %request.sender,
            call = request.call.name(),
            "[qc-18] handling call"
        );

        let execution = self.api.execute(request.sender, &request.call);

        CallReceipt {
            correlation_id: request.correlation_id,
            result: CallOutcome::from(execution.result),
            events: execution.events,
        }
    }

    /// Execute a batch in order. Each call sees the effects of the ones before it.
    pub fn handle_batch(&self, requests: Vec<CallRequest>) -> Vec<CallReceipt> {
        requests.into_iter().map(|r| self.handle(r)).collect()
    }

    /// Decode a JSON `CallRequest`, execute it and encode the receipt.
    ///
    /// # Errors
    ///
    /// Returns the decode error if `payload` is not a valid `CallRequest`;
    /// the contract is not touched in that case.
    pub fn handle_json(&self, payload: &str) -> Result<String, serde_json::Error> {
        let request: CallRequest = serde_json::from_str(payload).map_err(|e| {
            warn!(error = %e, "[qc-18] rejecting malformed call payload");
            e
        })?;
        serde_json::to_string(&self.handle(request))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{InMemoryLedger, ManualHeightOracle};
    use crate::domain::entities::TargetPolicy;
    use crate::domain::value_objects::Principal;
    use crate::events::{CallValue, ContractCall, TriggerEvent};
    use crate::service::HeightTriggerService;

    const DEPLOYER: Principal = Principal::new([1u8; 20]);
    const WALLET_1: Principal = Principal::new([2u8; 20]);

    type Service = HeightTriggerService<Arc<ManualHeightOracle>, InMemoryLedger>;

    fn handler() -> (TriggerEventHandler<Service>, Arc<ManualHeightOracle>) {
        let oracle = Arc::new(ManualHeightOracle::new(0));
        let service = HeightTriggerService::new(
            DEPLOYER,
            TargetPolicy::Rearmable,
            0,
            Arc::clone(&oracle),
            InMemoryLedger::new(),
        );
        (TriggerEventHandler::new(Arc::new(service)), oracle)
    }

    #[test]
    fn test_receipt_echoes_correlation_id() {
        let (handler, _) = handler();
        let request = CallRequest::new(DEPLOYER, ContractCall::SetTargetHeight { height: 500 });
        let id = request.correlation_id;
        let receipt = handler.handle(request);
        assert_eq!(receipt.correlation_id, id);
        assert_eq!(receipt.result, CallOutcome::Ok(CallValue::Bool(true)));
        assert_eq!(
            receipt.events,
            vec![TriggerEvent::TargetHeightSet {
                height: 500,
                previous: None
            }]
        );
    }

    #[test]
    fn test_error_receipt_has_no_events() {
        let (handler, _) = handler();
        let receipt = handler.handle(CallRequest::new(
            WALLET_1,
            ContractCall::SetTargetHeight { height: 500 },
        ));
        assert_eq!(receipt.result.err_code(), Some(100));
        assert!(receipt.events.is_empty());
    }

    #[test]
    fn test_batch_runs_in_order() {
        let (handler, oracle) = handler();
        oracle.set(10).unwrap();
        let receipts = handler.handle_batch(vec![
            CallRequest::new(DEPLOYER, ContractCall::SetTargetHeight { height: 10 }),
            CallRequest::new(WALLET_1, ContractCall::TriggerActionIfHeightReached),
            CallRequest::new(DEPLOYER, ContractCall::SetTargetHeight { height: 20 }),
        ]);
        assert!(receipts[0].result.is_ok());
        assert!(receipts[1].result.is_ok());
        assert_eq!(receipts[2].result.err_code(), Some(101));
    }

    #[test]
    fn test_handle_json() {
        let (handler, _) = handler();
        let payload = serde_json::json!({
            "correlation_id": "67e55044-10b1-426f-9247-bb680e5fe0c8",
            "sender": DEPLOYER.to_hex(),
            "call": "trigger-action-if-height-reached",
        })
        .to_string();
        let receipt: serde_json::Value =
            serde_json::from_str(&handler.handle_json(&payload).unwrap()).unwrap();
        assert_eq!(receipt["result"]["err"]["code"], 105);
        assert_eq!(
            receipt["correlation_id"],
            "67e55044-10b1-426f-9247-bb680e5fe0c8"
        );
    }

    #[test]
    fn test_handle_json_malformed() {
        let oracle = Arc::new(ManualHeightOracle::new(0));
        let service = Arc::new(HeightTriggerService::new(
            DEPLOYER,
            TargetPolicy::Rearmable,
            0,
            oracle,
            InMemoryLedger::new(),
        ));
        let handler = TriggerEventHandler::new(Arc::clone(&service));
        assert!(handler.handle_json("{\"call\": 1}").is_err());
        assert_eq!(service.get_status().target_height, None);
        assert_eq!(service.stats().calls_executed, 0);
    }
}
