//! Sweep Task
//!
//! Background task that periodically removes expired unreferenced records.

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use crate::cache::RecordStore;

/// Spawns a background task that periodically sweeps expired records.
///
/// Each tick locks the store and removes unreachable records whose grace
/// period or maximum age has elapsed. Referenced records are never touched.
///
/// The task runs until `shutdown` flips to true or its sender is dropped.
/// It does not wait for anything in flight when it stops.
///
/// # Arguments
/// * `store` - Shared record store
/// * `interval` - Time between sweeps, must be non-zero
/// * `shutdown` - Shutdown signal
///
/// # Returns
/// A JoinHandle for the spawned task.
///
/// # Example
/// ```ignore
/// let (shutdown, shutdown_rx) = watch::channel(false);
/// let handle = spawn_sweep_task(store.clone(), Duration::from_secs(1), shutdown_rx);
/// // Later:
/// shutdown.send_replace(true);
/// ```
pub(crate) fn spawn_sweep_task<V: Send + Sync + 'static>(
    store: Arc<Mutex<RecordStore<V>>>,
    interval: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(?interval, "Starting sweep loop");

        let start = tokio::time::Instant::now() + interval;
        let mut ticker = tokio::time::interval_at(start, interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
                _ = ticker.tick() => {
                    let removed = store.lock().sweep(Instant::now());

                    if removed > 0 {
                        info!("Sweep: removed {} expired records", removed);
                    } else {
                        debug!("Sweep: no expired records found");
                    }
                }
            }
        }

        info!("Sweep loop stopped");
    })
}
