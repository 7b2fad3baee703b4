//! # Ports Layer (Middle Hexagon)
//!
//! Trait definitions for the height trigger.
//!
//! - **Driving Port (Inbound)**: `HeightTriggerApi`
//! - **Driven Ports (Outbound)**: `HeightOracle`, `FundsTransfer`
//! - No concrete implementations in this module

pub mod inbound;
pub mod outbound;

pub use inbound::*;
pub use outbound::*;
