//! # Access Control
//!
//! Single-owner authorization. A stateless equality check between the call's
//! sender and the owner recorded at deployment.

use super::entities::ContractState;
use super::value_objects::Principal;
use crate::errors::TriggerError;

/// Returns true if `caller` is the recorded owner.
#[must_use]
pub fn is_owner(caller: Principal, state: &ContractState) -> bool {
    caller == state.owner
}

/// Rejects any caller other than the owner with `OwnerOnly`.
///
/// # Errors
///
/// * `OwnerOnly` - `caller` is not the owner
pub fn require_owner(caller: Principal, state: &ContractState) -> Result<(), TriggerError> {
    if is_owner(caller, state) {
        Ok(())
    } else {
        Err(TriggerError::OwnerOnly { caller })
    }
}
