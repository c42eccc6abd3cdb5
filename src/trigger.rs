//! Periodic calibration advance.
//!
//! Runs a background thread that calls [`QualityEngine::advance`] at a
//! fixed period until stopped.

use crate::evaluation::QualityEngine;
use std::io;
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Handle to the advance thread. Dropping it stops the thread.
#[derive(Debug)]
pub struct AdvanceTrigger {
    stop: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl AdvanceTrigger {
    /// Starts advancing `engine` every `period`. The first advance
    /// happens one period after the call.
    pub fn spawn(engine: QualityEngine, period: Duration) -> io::Result<Self> {
        let (stop, stopped) = mpsc::channel::<()>();

        let handle = thread::Builder::new()
            .name("advance-trigger".into())
            .spawn(move || loop {
                match stopped.recv_timeout(period) {
                    Err(RecvTimeoutError::Timeout) => {
                        engine.advance();
                    }
                    Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                }
            })?;

        tracing::debug!(period_ms = period.as_millis() as u64, "Advance trigger started");

        Ok(Self {
            stop: Some(stop),
            handle: Some(handle),
        })
    }

    /// Stops the thread and waits for it to exit.
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        if let Some(stop) = self.stop.take() {
            // The thread may already be gone; nothing to do then.
            let _ = stop.send(());
        }
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::warn!("Advance trigger thread panicked");
            }
        }
    }
}

impl Drop for AdvanceTrigger {
    fn drop(&mut self) {
        self.shutdown();
    }
}
