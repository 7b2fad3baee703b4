//! # Height Trigger Configuration
//!
//! Deployment parameters for one contract instance plus the dev node's
//! simulation knobs. Environment variables override the defaults:
//!
//! | Variable | Field |
//! |----------|-------|
//! | `QC_TRIGGER_OWNER` | `owner` (40 hex chars, optional `0x`) |
//! | `QC_TRIGGER_INITIAL_BALANCE` | `initial_balance` |
//! | `QC_TRIGGER_POLICY` | `policy` (`rearmable` or `set-once`) |
//! | `QC_TRIGGER_INITIAL_HEIGHT` | `initial_height` |
//! | `QC_TRIGGER_TARGET_HEIGHT` | `target_height` |
//! | `QC_TRIGGER_BLOCK_INTERVAL_MS` | `block_interval_ms` |
//! | `QC_TRIGGER_KEEPER` | `keeper_enabled` (`true`/`false`) |

use crate::domain::entities::TargetPolicy;
use crate::domain::value_objects::{Amount, BlockHeight, Principal};
use crate::errors::ConfigError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::{info, warn};

/// Owner used by the dev node when none is configured.
pub const DEV_OWNER: Principal = Principal::new([
    0x1a, 0x2b, 0x3c, 0x4d, 0x5e, 0x6f, 0x70, 0x81, 0x92, 0xa3, 0xb4, 0xc5, 0xd6, 0xe7, 0xf8,
    0x09, 0x1a, 0x2b, 0x3c, 0x4d,
]);

/// Height trigger configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerConfig {
    /// Owner recorded at deployment.
    pub owner: Principal,

    /// Balance held in custody at deployment.
    pub initial_balance: Amount,

    /// Arming policy.
    pub policy: TargetPolicy,

    /// Burn height the simulated oracle starts at.
    pub initial_height: BlockHeight,

    /// Target the dev node arms at startup, if any.
    pub target_height: Option<BlockHeight>,

    /// Simulated block time for the dev node.
    pub block_interval_ms: u64,

    /// Run the keeper loop in the dev node.
    pub keeper_enabled: bool,
}

impl Default for TriggerConfig {
    fn default() -> Self {
        Self {
            owner: DEV_OWNER,
            initial_balance: 1_000_000,
            policy: TargetPolicy::Rearmable,
            initial_height: 0,
            target_height: None,
            block_interval_ms: 1_000,
            keeper_enabled: true,
        }
    }
}

impl TriggerConfig {
    /// Create a config for testing (fast blocks, no keeper).
    pub fn for_testing() -> Self {
        Self {
            initial_balance: 1_000,
            block_interval_ms: 10,
            keeper_enabled: false,
            ..Self::default()
        }
    }

    /// Defaults overridden by `QC_TRIGGER_*` environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for each variable.
    ///
    /// Values that fail to parse are logged and ignored.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(owner) = parse_var(&lookup, "QC_TRIGGER_OWNER") {
            config.owner = owner;
            info!(owner = %config.owner, "Loaded owner from environment");
        }
        if let Some(balance) = parse_var(&lookup, "QC_TRIGGER_INITIAL_BALANCE") {
            config.initial_balance = balance;
        }
        if let Some(policy) = parse_var(&lookup, "QC_TRIGGER_POLICY") {
            config.policy = policy;
        }
        if let Some(height) = parse_var(&lookup, "QC_TRIGGER_INITIAL_HEIGHT") {
            config.initial_height = height;
        }
        if let Some(target) = parse_var(&lookup, "QC_TRIGGER_TARGET_HEIGHT") {
            config.target_height = Some(target);
        }
        if let Some(interval) = parse_var(&lookup, "QC_TRIGGER_BLOCK_INTERVAL_MS") {
            config.block_interval_ms = interval;
        }
        if let Some(keeper) = parse_var(&lookup, "QC_TRIGGER_KEEPER") {
            config.keeper_enabled = keeper;
        }

        config
    }

    /// Reject configurations the service cannot run with.
    ///
    /// # Errors
    ///
    /// * `MissingOwner` - owner is the zero principal
    /// * `ZeroBlockInterval` - block interval is zero
    /// * `ZeroTargetHeight` - a startup target of zero is configured
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.owner.is_zero() {
            return Err(ConfigError::MissingOwner);
        }
        if self.target_height == Some(0) {
            return Err(ConfigError::ZeroTargetHeight);
        }
        if self.block_interval_ms == 0 {
            return Err(ConfigError::ZeroBlockInterval);
        }
        Ok(())
    }
}

impl FromStr for TargetPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rearmable" | "reset" => Ok(Self::Rearmable),
            "set-once" | "setonce" | "once" => Ok(Self::SetOnce),
            other => Err(ConfigError::UnknownPolicy(other.to_string())),
        }
    }
}

fn parse_var<F, T>(lookup: &F, key: &str) -> Option<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(key, value = %raw, error = %e, "Ignoring invalid configuration value");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = TriggerConfig::default();
        assert_eq!(config.owner, DEV_OWNER);
        assert_eq!(config.policy, TargetPolicy::Rearmable);
        assert!(config.keeper_enabled);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_testing_config() {
        let config = TriggerConfig::for_testing();
        assert_eq!(config.block_interval_ms, 10);
        assert!(!config.keeper_enabled);
    }

    #[test]
    fn test_env_overrides() {
        let config = TriggerConfig::from_lookup(lookup(&[
            ("QC_TRIGGER_OWNER", "0x0202020202020202020202020202020202020202"),
            ("QC_TRIGGER_INITIAL_BALANCE", "5000"),
            ("QC_TRIGGER_POLICY", "set-once"),
            ("QC_TRIGGER_INITIAL_HEIGHT", "840000"),
            ("QC_TRIGGER_TARGET_HEIGHT", "840010"),
            ("QC_TRIGGER_KEEPER", "false"),
        ]));
        assert_eq!(config.owner, Principal::new([2u8; 20]));
        assert_eq!(config.initial_balance, 5_000);
        assert_eq!(config.policy, TargetPolicy::SetOnce);
        assert_eq!(config.initial_height, 840_000);
        assert_eq!(config.target_height, Some(840_010));
        assert!(!config.keeper_enabled);
    }

    #[test]
    fn test_invalid_values_ignored() {
        let config = TriggerConfig::from_lookup(lookup(&[
            ("QC_TRIGGER_OWNER", "not-hex"),
            ("QC_TRIGGER_POLICY", "sometimes"),
            ("QC_TRIGGER_BLOCK_INTERVAL_MS", "-5"),
        ]));
        assert_eq!(config, TriggerConfig::default());
    }

    #[test]
    fn test_validate_rejects_zero_owner() {
        let config = TriggerConfig {
            owner: Principal::ZERO,
            ..TriggerConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::MissingOwner));
    }

    #[test]
    fn test_validate_rejects_zero_interval() {
        let config = TriggerConfig {
            block_interval_ms: 0,
            ..TriggerConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::ZeroBlockInterval));
    }

    #[test]
    fn test_validate_rejects_zero_target() {
        let config = TriggerConfig {
            target_height: Some(0),
            ..TriggerConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::ZeroTargetHeight));
    }

    #[test]
    fn test_policy_parse() {
        assert_eq!("Rearmable".parse(), Ok(TargetPolicy::Rearmable));
        assert_eq!("set-once".parse(), Ok(TargetPolicy::SetOnce));
        assert!("never".parse::<TargetPolicy>().is_err());
    }
}
