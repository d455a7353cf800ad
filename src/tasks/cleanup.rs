//! Expiry Sweep Task
//!
//! Background task that periodically removes expired values from the
//! in-memory store. Reads already ignore expired values; the sweep only
//! bounds memory held by counters and snapshots nobody asks for again.

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::store::MemoryStore;

/// Spawns a background task that periodically sweeps expired values.
///
/// # Arguments
/// * `store` - The in-memory store to sweep
/// * `cleanup_interval_secs` - Interval in seconds between sweeps
///
/// # Returns
/// A JoinHandle for the spawned task, which can be used to abort the task
/// during graceful shutdown.
pub fn spawn_cleanup_task(store: MemoryStore, cleanup_interval_secs: u64) -> JoinHandle<()> {
    let interval = Duration::from_secs(cleanup_interval_secs.max(1));

    tokio::spawn(async move {
        info!(
            "Starting expiry sweep task with interval of {} seconds",
            interval.as_secs()
        );

        loop {
            tokio::time::sleep(interval).await;

            let removed = store.cleanup_expired().await;

            if removed > 0 {
                info!("Expiry sweep: removed {} expired values", removed);
            } else {
                debug!("Expiry sweep: no expired values found");
            }
        }
    })
}
