//! # Adapters Layer (Outer Hexagon)
//!
//! Adapters connect the height trigger to its host.
//!
//! - Oracle adapters implement `HeightOracle`
//! - The in-memory ledger implements `FundsTransfer`
//! - The event handler drives `HeightTriggerApi` from call envelopes

pub mod event_handler;
pub mod ledger;
pub mod oracle;

pub use event_handler::*;
pub use ledger::*;
pub use oracle::*;
