//! Background Expiry Sweeper
//!
//! This module implements a background task that periodically removes expired
//! keys from the store. This is "active expiry", as opposed to the "lazy
//! expiry" every store operation does on the keys it touches.
//!
//! Without it, a key that expires and is never touched again would stay in
//! memory forever.
//!
//! The sweeper runs as a Tokio task that sleeps for the store's sweep
//! interval, then takes the store lock and drops every expired entry. It
//! holds the lock only while sweeping, never while sleeping.

use crate::storage::Db;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info};

/// A handle to the running expiry sweeper.
///
/// When this handle is dropped, the sweeper task will be stopped.
#[derive(Debug)]
pub struct ExpirySweeper {
    /// Sender to signal shutdown
    shutdown_tx: watch::Sender<bool>,
}

impl ExpirySweeper {
    /// Starts the sweeper as a background task, using the store's configured
    /// interval.
    ///
    /// Must be called from within a Tokio runtime.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use microkv::storage::{Db, ExpirySweeper, Store};
    /// use std::time::Duration;
    ///
    /// # #[tokio::main]
    /// # async fn main() {
    /// let db = Db::new(Store::with_sweep_interval(Duration::from_millis(500)));
    /// let sweeper = ExpirySweeper::start(db.clone());
    ///
    /// // Sweeper runs in the background...
    ///
    /// // Dropping the sweeper will stop it
    /// drop(sweeper);
    /// # }
    /// ```
    pub fn start(db: Db) -> Self {
        let interval = db.sweep_interval();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        tokio::spawn(sweeper_loop(db, interval, shutdown_rx));

        info!(
            interval_ms = interval.as_millis() as u64,
            "Background expiry sweeper started"
        );

        Self { shutdown_tx }
    }

    /// Stops the expiry sweeper.
    ///
    /// This is called automatically when the handle is dropped.
    pub fn stop(&self) {
        if self.shutdown_tx.send_replace(true) {
            return;
        }
        info!("Background expiry sweeper stopped");
    }
}

impl Drop for ExpirySweeper {
    fn drop(&mut self) {
        self.stop();
    }
}

/// The main sweeper loop.
async fn sweeper_loop(db: Db, interval: Duration, mut shutdown_rx: watch::Receiver<bool>) {
    loop {
        // Wait for the interval or shutdown signal
        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            result = shutdown_rx.changed() => {
                if result.is_err() || *shutdown_rx.borrow() {
                    debug!("Expiry sweeper received shutdown signal");
                    return;
                }
            }
        }

        let (expired, remaining) = {
            let mut store = db.lock();
            let expired = store.sweep_expired();
            (expired, store.len())
        };

        if expired > 0 {
            debug!(
                expired = expired,
                keys_remaining = remaining,
                "Expired keys cleaned up"
            );
        }
    }
}
