//! # Height Oracle Adapters
//!
//! `ManualHeightOracle` is a host-advanced counter for tests and the dev node.
//! `FnHeightOracle` wraps any closure, e.g. a reader over a node's tip.

use crate::domain::value_objects::BlockHeight;
use crate::errors::OracleError;
use crate::ports::outbound::HeightOracle;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

/// Externally advanced burn height.
///
/// Moving the height backwards is rejected, so the monotonic contract of
/// [`HeightOracle`] holds for every reader.
#[derive(Debug, Default)]
pub struct ManualHeightOracle {
    height: AtomicU64,
}

impl ManualHeightOracle {
    /// Oracle starting at `height`.
    #[must_use]
    pub fn new(height: BlockHeight) -> Self {
        Self {
            height: AtomicU64::new(height),
        }
    }

    /// Mine `blocks` blocks. Returns the new height.
    ///
    /// # Errors
    ///
    /// * `Overflow` - the height would exceed `u64::MAX`
    pub fn advance(&self, blocks: u64) -> Result<BlockHeight, OracleError> {
        let previous = self
            .height
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |h| h.checked_add(blocks))
            .map_err(|_| OracleError::Overflow)?;
        let height = previous + blocks;
        debug!(height, blocks, "[qc-18] burn height advanced");
        Ok(height)
    }

    /// Jump to `height`. Staying at the current height is allowed.
    ///
    /// # Errors
    ///
    /// * `Regression` - `height` is below the current height
    pub fn set(&self, height: BlockHeight) -> Result<(), OracleError> {
        self.height
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |current| {
                (height >= current).then_some(height)
            })
            .map(|_| ())
            .map_err(|current| OracleError::Regression {
                current,
                requested: height,
            })
    }
}

impl HeightOracle for ManualHeightOracle {
    fn current(&self) -> BlockHeight {
        self.height.load(Ordering::SeqCst)
    }
}

/// Oracle backed by a closure.
pub struct FnHeightOracle<F> {
    read: F,
}

impl<F> FnHeightOracle<F>
where
    F: Fn() -> BlockHeight + Send + Sync,
{
    /// Wrap `read`. The closure must itself be monotonic.
    pub fn new(read: F) -> Self {
        Self { read }
    }
}

impl<F> HeightOracle for FnHeightOracle<F>
where
    F: Fn() -> BlockHeight + Send + Sync,
{
    fn current(&self) -> BlockHeight {
        (self.read)()
    }
}

impl<F> fmt::Debug for FnHeightOracle<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnHeightOracle").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_manual_oracle_advance() {
        let oracle = ManualHeightOracle::new(5);
        assert_eq!(oracle.current(), 5);
        assert_eq!(oracle.advance(10), Ok(15));
        assert_eq!(oracle.current(), 15);
    }

    #[test]
    fn test_manual_oracle_rejects_regression() {
        let oracle = ManualHeightOracle::new(10);
        assert_eq!(
            oracle.set(9),
            Err(OracleError::Regression {
                current: 10,
                requested: 9
            })
        );
        assert_eq!(oracle.current(), 10);
        assert!(oracle.set(10).is_ok());
        assert!(oracle.set(11).is_ok());
        assert_eq!(oracle.current(), 11);
    }

    #[test]
    fn test_manual_oracle_overflow() {
        let oracle = ManualHeightOracle::new(u64::MAX);
        assert_eq!(oracle.advance(1), Err(OracleError::Overflow));
        assert_eq!(oracle.current(), u64::MAX);
    }

    #[test]
    fn test_fn_oracle() {
        let tip = Arc::new(ManualHeightOracle::new(42));
        let reader = Arc::clone(&tip);
        let oracle = FnHeightOracle::new(move || reader.current());
        assert_eq!(oracle.current(), 42);
        tip.advance(1).unwrap();
        assert_eq!(oracle.current(), 43);
    }

    #[test]
    fn test_shared_oracle_via_arc() {
        let oracle = Arc::new(ManualHeightOracle::new(3));
        let shared: Arc<dyn HeightOracle> = oracle.clone();
        oracle.advance(2).unwrap();
        assert_eq!(shared.current(), 5);
    }
}
