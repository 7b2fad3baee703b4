//! # Height Trigger Metrics
//!
//! Prometheus metrics for monitoring the trigger.
//!
//! ## Usage
//!
//! Enable with the `metrics` feature:
//! ```toml
//! qc-18-height-trigger = { path = "...", features = ["metrics"] }
//! ```
//!
//! ## Metrics Exported
//!
//! - `height_trigger_calls_total` - Counter of executed calls (by operation)
//! - `height_trigger_rejections_total` - Counter of rejected calls (by error code)
//! - `height_trigger_fired_total` - Counter of successful triggers
//! - `height_trigger_withdrawn_total` - Counter of units withdrawn
//! - `height_trigger_phase` - Gauge of the lifecycle phase (0=Unset, 1=Armed, 2=Triggered)
//! - `height_trigger_balance` - Gauge of the custody balance

use crate::domain::entities::TriggerPhase;
use crate::domain::value_objects::Amount;

#[cfg(feature = "metrics")]
use lazy_static::lazy_static;

#[cfg(feature = "metrics")]
use prometheus::{
    register_counter, register_gauge, register_int_counter, register_int_counter_vec, Counter,
    Gauge, IntCounter, IntCounterVec,
};

#[cfg(feature = "metrics")]
lazy_static! {
    /// Executed calls, labeled by operation
    pub static ref CALLS: IntCounterVec = register_int_counter_vec!(
        "height_trigger_calls_total",
        "Total number of calls executed",
        &["operation"]
    )
    .expect("Failed to create CALLS metric");

    /// Rejected calls, labeled by error code
    pub static ref REJECTIONS: IntCounterVec = register_int_counter_vec!(
        "height_trigger_rejections_total",
        "Total number of calls rejected",
        &["code"]
    )
    .expect("Failed to create REJECTIONS metric");

    /// Successful triggers
    pub static ref FIRED: IntCounter = register_int_counter!(
        "height_trigger_fired_total",
        "Total number of successful triggers"
    )
    .expect("Failed to create FIRED metric");

    /// Units withdrawn from custody
    pub static ref WITHDRAWN: Counter = register_counter!(
        "height_trigger_withdrawn_total",
        "Total units withdrawn from custody"
    )
    .expect("Failed to create WITHDRAWN metric");

    /// Lifecycle phase (0=Unset, 1=Armed, 2=Triggered)
    pub static ref PHASE: Gauge = register_gauge!(
        "height_trigger_phase",
        "Current lifecycle phase (0=Unset, 1=Armed, 2=Triggered)"
    )
    .expect("Failed to create PHASE metric");

    /// Custody balance
    pub static ref BALANCE: Gauge = register_gauge!(
        "height_trigger_balance",
        "Current custody balance"
    )
    .expect("Failed to create BALANCE metric");
}

// =============================================================================
// METRIC RECORDING FUNCTIONS
// =============================================================================

/// Record an executed call
#[cfg(feature = "metrics")]
pub fn record_call(operation: &str) {
    CALLS.with_label_values(&[operation]).inc();
}

/// Record a rejected call with its error code
#[cfg(feature = "metrics")]
pub fn record_rejection(code: u32) {
    REJECTIONS.with_label_values(&[&code.to_string()]).inc();
}

/// Record a successful trigger
#[cfg(feature = "metrics")]
pub fn record_trigger() {
    FIRED.inc();
}

/// Record a withdrawal
#[cfg(feature = "metrics")]
pub fn record_withdrawal(amount: Amount) {
    WITHDRAWN.inc_by(amount as f64);
}

/// Update phase and balance gauges
#[cfg(feature = "metrics")]
pub fn set_state(phase: TriggerPhase, balance: Amount) {
    PHASE.set(phase.as_gauge() as f64);
    BALANCE.set(balance as f64);
}

// =============================================================================
// NO-OP IMPLEMENTATIONS (when metrics feature is disabled)
// =============================================================================

/// Record an executed call (no-op)
#[cfg(not(feature = "metrics"))]
pub fn record_call(_operation: &str) {}

/// Record a rejected call (no-op)
#[cfg(not(feature = "metrics"))]
pub fn record_rejection(_code: u32) {}

/// Record a successful trigger (no-op)
#[cfg(not(feature = "metrics"))]
pub fn record_trigger() {}

/// Record a withdrawal (no-op)
#[cfg(not(feature = "metrics"))]
pub fn record_withdrawal(_amount: Amount) {}

/// Update phase and balance gauges (no-op)
#[cfg(not(feature = "metrics"))]
pub fn set_state(_phase: TriggerPhase, _balance: Amount) {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_functions_dont_panic() {
        record_call("set-target-height");
        record_rejection(100);
        record_trigger();
        record_withdrawal(1_000);
        set_state(TriggerPhase::Armed, 1_000);
    }
}
