//! Background expiry sweeper.
//!
//! A named thread wakes every interval and calls
//! `EmergencyAccessMonitor::sweep_expired`. Dropping or stopping the handle
//! closes the stop channel, which wakes the thread immediately and ends it.

use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, error, info};

use warden_contracts::error::{WardenError, WardenResult};

use crate::monitor::EmergencyAccessMonitor;

pub struct SweeperHandle {
    stop: Option<Sender<()>>,
    thread: Option<JoinHandle<()>>,
}

impl SweeperHandle {
    /// Stop the sweeper and wait for its thread to exit.
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        drop(self.stop.take());
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                error!("expiry sweeper thread panicked");
            }
        }
    }
}

impl Drop for SweeperHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}

pub fn spawn_sweeper(monitor: Arc<EmergencyAccessMonitor>, interval: Duration) -> WardenResult<SweeperHandle> {
    let (stop_tx, stop_rx) = mpsc::channel::<()>();

    let thread = thread::Builder::new()
        .name("warden-expiry-sweeper".to_string())
        .spawn(move || {
            info!(interval_secs = interval.as_secs(), "expiry sweeper started");
            loop {
                match stop_rx.recv_timeout(interval) {
                    Err(RecvTimeoutError::Timeout) => match monitor.sweep_expired() {
                        Ok(0) => {}
                        Ok(n) => debug!(retired = n, "sweeper retired expired sessions"),
                        Err(e) => error!(error = %e, "expiry sweep failed"),
                    },
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }
            }
            info!("expiry sweeper stopped");
        })
        .map_err(|e| WardenError::ConfigError {
            reason: format!("failed to start expiry sweeper: {e}"),
        })?;

    Ok(SweeperHandle { stop: Some(stop_tx), thread: Some(thread) })
}
