//! # Domain Layer (Inner Hexagon)
//!
//! Pure business logic for the height trigger.
//! NO I/O, NO async, NO oracle reads.
//!
//! - `access` - owner-only authorization
//! - `machine` - the trigger state machine owning `ContractState`
//! - `treasury` - custodied balance, gated on the trigger flag
//! - `invariants` - rules checked after every operation

pub mod access;
pub mod entities;
pub mod invariants;
pub mod machine;
pub mod treasury;
pub mod value_objects;

pub use access::*;
pub use entities::*;
pub use invariants::*;
pub use machine::*;
pub use treasury::*;
pub use value_objects::*;
