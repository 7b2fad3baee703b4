//! # QC-18 Height Trigger Dev Node
//!
//! Runs one height trigger against a simulated burn chain.
//!
//! ## Startup Sequence
//!
//! 1. Initialize logging (`RUST_LOG`, default `info`)
//! 2. Load configuration from `QC_TRIGGER_*` environment variables
//! 3. Deploy the contract and arm the configured target, if any
//! 4. Start the block producer (one block per `block_interval_ms`)
//! 5. Start the keeper, if enabled
//! 6. Run until Ctrl+C

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::sync::watch;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use qc_18_height_trigger::prelude::*;

/// Principal the keeper signs trigger calls with.
const KEEPER: Principal = Principal::new([0xee; 20]);

type DevService = HeightTriggerService<Arc<ManualHeightOracle>, Arc<InMemoryLedger>>;

/// Advance the simulated burn height once per tick.
async fn produce_blocks(
    oracle: Arc<ManualHeightOracle>,
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(period);
    // The first tick completes immediately.
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = ticker.tick() => match oracle.advance(1) {
                Ok(height) => debug!(height, "[qc-18] New burn block"),
                Err(e) => {
                    error!(error = %e, "[qc-18] Block producer stopped");
                    break;
                }
            },
            _ = shutdown.changed() => break,
        }
    }
}

/// One keeper pass. Returns true once the action has fired and custody is empty.
///
/// The keeper triggers as itself but withdraws as the owner's agent: the dev
/// node holds the owner identity, so the payout goes through the same
/// owner-only check as any other withdrawal.
fn keeper_step(service: &DevService, owner: Principal) -> bool {
    match service.trigger_action_if_height_reached(KEEPER) {
        Ok(_) => info!(keeper = %KEEPER, "[qc-18] Keeper fired the action"),
        Err(TriggerError::AlreadyTriggered) => {}
        Err(e) if e.is_retryable() => {
            debug!(remaining = ?service.blocks_remaining(), "[qc-18] Keeper waiting");
            return false;
        }
        Err(TriggerError::TargetNotSet) => return false,
        Err(e) => {
            warn!(error = %e, "[qc-18] Keeper trigger failed");
            return false;
        }
    }

    let balance = service.get_balance();
    if balance == 0 {
        return true;
    }
    match service.withdraw(owner, balance) {
        Ok(_) => {
            info!(%owner, amount = balance, "[qc-18] Keeper released custody to owner");
            true
        }
        Err(e) => {
            warn!(error = %e, "[qc-18] Keeper withdrawal failed, retrying next block");
            false
        }
    }
}

/// Poll the contract once per block until the action has fired and been paid out.
async fn run_keeper(
    service: Arc<DevService>,
    owner: Principal,
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(period);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if keeper_step(&service, owner) {
                    info!("[qc-18] Keeper finished");
                    break;
                }
            }
            _ = shutdown.changed() => break,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(true)
        .with_thread_ids(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("===========================================");
    info!("  QC-18 Height Trigger Dev Node v{}", qc_18_height_trigger::VERSION);
    info!("===========================================");

    // Load configuration
    let config = TriggerConfig::from_env();
    let period = Duration::from_millis(config.block_interval_ms);

    let oracle = Arc::new(ManualHeightOracle::new(config.initial_height));
    let ledger = Arc::new(InMemoryLedger::new());
    let service = Arc::new(
        HeightTriggerService::from_config(&config, Arc::clone(&oracle), Arc::clone(&ledger))
            .context("invalid height trigger configuration")?,
    );

    if let Some(target) = config.target_height {
        service
            .set_target_height(config.owner, target)
            .context("failed to arm target height")?;
    }

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let producer = tokio::spawn(produce_blocks(
        Arc::clone(&oracle),
        period,
        shutdown_rx.clone(),
    ));
    let keeper = config.keeper_enabled.then(|| {
        tokio::spawn(run_keeper(
            Arc::clone(&service),
            config.owner,
            period,
            shutdown_rx.clone(),
        ))
    });

    info!(
        owner = %config.owner,
        policy = %config.policy,
        height = oracle.current(),
        target = ?config.target_height,
        keeper = config.keeper_enabled,
        "Dev node is running. Press Ctrl+C to stop."
    );
    tokio::signal::ctrl_c().await?;

    // Graceful shutdown
    info!("Initiating graceful shutdown...");
    if let Err(e) = shutdown_tx.send(true) {
        error!("Failed to send shutdown signal: {}", e);
    }
    producer.await.context("block producer task failed")?;
    if let Some(keeper) = keeper {
        keeper.await.context("keeper task failed")?;
    }

    let stats = service.stats();
    info!(
        height = oracle.current(),
        phase = ?service.phase(),
        calls = stats.calls_executed,
        rejected = stats.calls_rejected,
        paid_out = ledger.balance_of(config.owner),
        "Shutdown complete"
    );

    Ok(())
}
