//! # Height Trigger Service
//!
//! Hosts one `TriggerStateMachine` and serializes every call against it.
//!
//! ## Execution Model
//!
//! Each state-changing call runs as a single transaction:
//!
//! 1. Lock the machine (calls never interleave)
//! 2. Apply the operation to a staged copy
//! 3. Check every invariant between the live and staged state
//! 4. Settle external effects (`withdraw` moves funds here)
//! 5. Commit the staged copy
//!
//! Any failure before step 5 drops the staged copy, so no error leaves the
//! contract partially mutated. The oracle is read at most once per call,
//! and only by `trigger-action-if-height-reached` and
//! `get-current-btc-block-height`.

use crate::adapters::{InMemoryLedger, ManualHeightOracle};
use crate::config::TriggerConfig;
use crate::domain::entities::{ContractState, Operation, TargetPolicy, TriggerPhase, TriggerStatus};
use crate::domain::invariants::{check_all_invariants, InvariantCheckResult};
use crate::domain::machine::TriggerStateMachine;
use crate::domain::value_objects::{Amount, BlockHeight, Principal};
use crate::errors::{ConfigError, TriggerError};
use crate::events::{CallValue, ContractCall, TriggerEvent};
use crate::metrics;
use crate::ports::inbound::{CallExecution, HeightTriggerApi};
use crate::ports::outbound::{FundsTransfer, HeightOracle};

use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

/// Statistics for the Height Trigger Service.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ServiceStats {
    /// Calls executed, including queries.
    pub calls_executed: u64,
    /// Calls that returned an error.
    pub calls_rejected: u64,
    /// Rejections for a non-owner caller.
    pub unauthorized_calls: u64,
    /// Trigger attempts made before the target height.
    pub premature_triggers: u64,
    /// Units moved out of custody.
    pub total_withdrawn: Amount,
    /// Units moved into custody.
    pub total_deposited: Amount,
}

/// The Height Trigger Service.
///
/// Generic over the oracle and the funds transfer so hosts can plug in a
/// real chain reader and ledger, and tests can plug in in-memory ones.
pub struct HeightTriggerService<O: HeightOracle, F: FundsTransfer> {
    /// The contract. Holding the lock is holding the call slot.
    machine: Mutex<TriggerStateMachine>,
    /// External height feed.
    oracle: O,
    /// Funds movement for withdrawals.
    funds: F,
    /// Service statistics.
    stats: Mutex<ServiceStats>,
}

impl<O: HeightOracle, F: FundsTransfer> HeightTriggerService<O, F> {
    /// Deploy a fresh contract.
    pub fn new(
        owner: Principal,
        policy: TargetPolicy,
        initial_balance: Amount,
        oracle: O,
        funds: F,
    ) -> Self {
        info!(
            %owner,
            %policy,
            initial_balance,
            "[qc-18] Height trigger deployed"
        );
        let machine = TriggerStateMachine::new(owner, policy, initial_balance);
        Self::with_machine(machine, oracle, funds)
    }

    /// Deploy from configuration.
    ///
    /// # Errors
    ///
    /// Returns the first `ConfigError` found by [`TriggerConfig::validate`].
    pub fn from_config(config: &TriggerConfig, oracle: O, funds: F) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::new(
            config.owner,
            config.policy,
            config.initial_balance,
            oracle,
            funds,
        ))
    }

    /// Resume a contract from a persisted snapshot.
    ///
    /// # Errors
    ///
    /// * `CorruptState` - the snapshot violates a contract invariant
    pub fn restore(state: ContractState, oracle: O, funds: F) -> Result<Self, TriggerError> {
        let machine = TriggerStateMachine::restore(state).map_err(|e| {
            error!(error = %e, "[qc-18] Refusing to restore corrupt snapshot");
            e
        })?;
        info!(phase = ?machine.phase(), "[qc-18] Height trigger restored");
        Ok(Self::with_machine(machine, oracle, funds))
    }

    fn with_machine(machine: TriggerStateMachine, oracle: O, funds: F) -> Self {
        metrics::set_state(machine.phase(), machine.balance());
        Self {
            machine: Mutex::new(machine),
            oracle,
            funds,
            stats: Mutex::new(ServiceStats::default()),
        }
    }

    /// Copy of the committed contract state, for persistence.
    #[must_use]
    pub fn snapshot(&self) -> ContractState {
        self.machine.lock().state().clone()
    }

    /// Committed contract state as JSON.
    ///
    /// # Errors
    ///
    /// Propagates the serializer error.
    pub fn snapshot_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.snapshot())
    }

    /// Current lifecycle phase.
    #[must_use]
    pub fn phase(&self) -> TriggerPhase {
        self.machine.lock().phase()
    }

    /// Blocks left until the armed target at the oracle's current height.
    #[must_use]
    pub fn blocks_remaining(&self) -> Option<u64> {
        let machine = self.machine.lock();
        machine.blocks_remaining(self.oracle.current())
    }

    /// Current service statistics.
    #[must_use]
    pub fn stats(&self) -> ServiceStats {
        self.stats.lock().clone()
    }

    /// The height oracle.
    pub fn oracle(&self) -> &O {
        &self.oracle
    }

    /// The funds transfer.
    pub fn funds(&self) -> &F {
        &self.funds
    }

    // =========================================================================
    // TRANSACTION
    // =========================================================================

    /// Run `apply` on a staged copy, check invariants, `settle` and commit.
    fn transact<A, S>(&self, operation: Operation, apply: A, settle: S) -> CallExecution
    where
        A: FnOnce(&mut TriggerStateMachine) -> Result<TriggerEvent, TriggerError>,
        S: FnOnce(&TriggerEvent) -> Result<(), TriggerError>,
    {
        let mut machine = self.machine.lock();
        let mut staged = machine.clone();

        let event = match apply(&mut staged) {
            Ok(event) => event,
            Err(e) => return CallExecution::failed(e),
        };

        if let InvariantCheckResult::Invalid(violations) =
            check_all_invariants(machine.state(), staged.state(), operation)
        {
            error!(
                %operation,
                ?violations,
                "[qc-18] Invariant violation, discarding staged state"
            );
            return CallExecution::failed(TriggerError::CorruptState(format!("{violations:?}")));
        }

        if let Err(e) = settle(&event) {
            return CallExecution::failed(e);
        }

        *machine = staged;
        metrics::set_state(machine.phase(), machine.balance());
        drop(machine);

        CallExecution {
            result: Ok(CallValue::Bool(true)),
            events: vec![event],
        }
    }

    fn record(&self, sender: Principal, call: &ContractCall, execution: &CallExecution) {
        metrics::record_call(call.name());
        let mut stats = self.stats.lock();
        stats.calls_executed += 1;

        match &execution.result {
            Ok(_) => {
                for event in &execution.events {
                    match event {
                        TriggerEvent::ActionTriggered {
                            target_height,
                            observed_height,
                            caller,
                        } => {
                            metrics::record_trigger();
                            info!(
                                target_height,
                                observed_height,
                                %caller,
                                "[qc-18] Action triggered"
                            );
                        }
                        TriggerEvent::Withdrawn {
                            recipient,
                            amount,
                            remaining,
                        } => {
                            stats.total_withdrawn = stats.total_withdrawn.saturating_add(*amount);
                            metrics::record_withdrawal(*amount);
                            info!(%recipient, amount, remaining, "[qc-18] Funds withdrawn");
                        }
                        TriggerEvent::Deposited { amount, .. } => {
                            stats.total_deposited = stats.total_deposited.saturating_add(*amount);
                            debug!(%sender, amount, "[qc-18] Funds deposited");
                        }
                        TriggerEvent::TargetHeightSet { height, previous } => {
                            info!(height, ?previous, "[qc-18] Target height set");
                        }
                        TriggerEvent::TargetHeightReset { previous } => {
                            info!(?previous, "[qc-18] Target height reset");
                        }
                    }
                }
            }
            Err(e) => {
                stats.calls_rejected += 1;
                match e {
                    TriggerError::OwnerOnly { .. } => stats.unauthorized_calls += 1,
                    TriggerError::HeightNotReached { .. } => stats.premature_triggers += 1,
                    _ => {}
                }
                metrics::record_rejection(e.code());
                if matches!(e, TriggerError::CorruptState(_) | TriggerError::TransferFailed(_)) {
                    error!(%sender, call = call.name(), code = e.code(), error = %e, "[qc-18] Call failed");
                } else {
                    warn!(%sender, call = call.name(), code = e.code(), error = %e, "[qc-18] Call rejected");
                }
            }
        }
    }
}

impl<O: HeightOracle, F: FundsTransfer> HeightTriggerApi for HeightTriggerService<O, F> {
    #[instrument(skip_all, fields(call = call.name(), sender = %sender))]
    fn execute(&self, sender: Principal, call: &ContractCall) -> CallExecution {
        let execution = match *call {
            ContractCall::SetTargetHeight { height } => self.transact(
                Operation::SetTargetHeight,
                |m| {
                    let previous = m.set_target_height(sender, height)?;
                    Ok(TriggerEvent::TargetHeightSet { height, previous })
                },
                no_effect,
            ),
            ContractCall::ResetTargetHeight => self.transact(
                Operation::ResetTargetHeight,
                |m| {
                    let previous = m.reset_target_height(sender)?;
                    Ok(TriggerEvent::TargetHeightReset { previous })
                },
                no_effect,
            ),
            ContractCall::TriggerActionIfHeightReached => self.transact(
                Operation::Trigger,
                |m| {
                    let fired = m.trigger(self.oracle.current())?;
                    Ok(TriggerEvent::ActionTriggered {
                        target_height: fired.target_height,
                        observed_height: fired.observed_height,
                        caller: sender,
                    })
                },
                no_effect,
            ),
            ContractCall::Withdraw { amount } => self.transact(
                Operation::Withdraw,
                |m| {
                    let remaining = m.withdraw(sender, amount)?;
                    Ok(TriggerEvent::Withdrawn {
                        recipient: m.owner(),
                        amount,
                        remaining,
                    })
                },
                |event| match *event {
                    TriggerEvent::Withdrawn { amount: 0, .. } => Ok(()),
                    TriggerEvent::Withdrawn {
                        recipient, amount, ..
                    } => self.funds.transfer(recipient, amount).map_err(TriggerError::from),
                    _ => Ok(()),
                },
            ),
            ContractCall::Deposit { amount } => self.transact(
                Operation::Deposit,
                |m| {
                    let balance = m.deposit(amount)?;
                    Ok(TriggerEvent::Deposited {
                        from: sender,
                        amount,
                        balance,
                    })
                },
                no_effect,
            ),
            ContractCall::GetStatus => read_only(CallValue::Status(self.get_status())),
            ContractCall::GetCurrentBtcBlockHeight => {
                read_only(CallValue::Height(self.get_current_btc_block_height()))
            }
            ContractCall::GetBalance => read_only(CallValue::Balance(self.get_balance())),
        };

        self.record(sender, call, &execution);
        execution
    }

    fn get_status(&self) -> TriggerStatus {
        self.machine.lock().status()
    }

    fn get_current_btc_block_height(&self) -> BlockHeight {
        self.oracle.current()
    }

    fn get_balance(&self) -> Amount {
        self.machine.lock().balance()
    }
}

fn no_effect(_: &TriggerEvent) -> Result<(), TriggerError> {
    Ok(())
}

fn read_only(value: CallValue) -> CallExecution {
    CallExecution {
        result: Ok(value),
        events: Vec::new(),
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================

/// Service wired to a shared manual oracle and in-memory ledger.
pub type TestService = HeightTriggerService<Arc<ManualHeightOracle>, Arc<InMemoryLedger>>;

/// Create a service backed by a manual oracle at height 0 and an empty
/// in-memory ledger. Returns handles to both so tests can drive them.
pub fn create_test_service(
    owner: Principal,
    policy: TargetPolicy,
    initial_balance: Amount,
) -> (TestService, Arc<ManualHeightOracle>, Arc<InMemoryLedger>) {
    let oracle = Arc::new(ManualHeightOracle::new(0));
    let ledger = Arc::new(InMemoryLedger::new());
    let service = HeightTriggerService::new(
        owner,
        policy,
        initial_balance,
        Arc::clone(&oracle),
        Arc::clone(&ledger),
    );
    (service, oracle, ledger)
}
