//! I/O manager subsystem.
//!
//! # Responsibilities
//! - Own the Tokio runtime that drives the runtime's network I/O
//! - Build it on start, shut it down (bounded) on stop
//! - Hand out runtime handles while running
//!
//! # Design Decisions
//! - The runtime is created per start/stop cycle, not kept across cycles
//! - The runtime is shut down on a dedicated thread that `stop` joins, so
//!   stopping from inside an async context neither panics nor returns early

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::Duration;

use tokio::runtime::{Builder, Handle, Runtime};

use crate::config::IoConfig;
use crate::lifecycle::{Subsystem, SubsystemError};

/// Owns the background I/O runtime.
#[derive(Debug)]
pub struct IoManager {
    config: IoConfig,
    runtime: Mutex<Option<Runtime>>,
}

impl IoManager {
    pub fn new(config: IoConfig) -> Self {
        Self {
            config,
            runtime: Mutex::new(None),
        }
    }

    fn slot(&self) -> MutexGuard<'_, Option<Runtime>> {
        self.runtime.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Handle to the running I/O runtime, or `None` when stopped.
    pub fn handle(&self) -> Option<Handle> {
        self.slot().as_ref().map(|rt| rt.handle().clone())
    }

    pub fn is_running(&self) -> bool {
        self.slot().is_some()
    }
}

impl Subsystem for IoManager {
    fn name(&self) -> &'static str {
        "io"
    }

    fn start(&self) -> Result<(), SubsystemError> {
        let mut slot = self.slot();
        if slot.is_some() {
            return Ok(());
        }

        let runtime = Builder::new_multi_thread()
            .worker_threads(self.config.worker_threads)
            .thread_name(self.config.thread_name.clone())
            .enable_all()
            .build()
            .map_err(|e| SubsystemError::with_source("failed to build I/O runtime", e))?;

        tracing::debug!(
            worker_threads = self.config.worker_threads,
            thread_name = %self.config.thread_name,
            "I/O runtime started"
        );
        *slot = Some(runtime);
        Ok(())
    }

    fn stop(&self) {
        let Some(runtime) = self.slot().take() else {
            return;
        };
        let timeout = Duration::from_millis(self.config.shutdown_timeout_ms);
        let stopper = thread::Builder::new()
            .name(format!("{}-stop", self.config.thread_name))
            .spawn(move || runtime.shutdown_timeout(timeout));
        match stopper.map(|handle| handle.join()) {
            Ok(Ok(())) => tracing::debug!("I/O runtime stopped"),
            Ok(Err(_)) => tracing::error!("I/O runtime shutdown panicked"),
            Err(e) => tracing::error!(error = %e, "Failed to spawn I/O shutdown thread"),
        }
    }
}
