//! In-process statistics subsystem.
//!
//! Counters are only recorded between `start()` and `stop()`; a new start
//! resets them.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use serde::Serialize;

use crate::credentials::CredentialKind;
use crate::lifecycle::{Subsystem, SubsystemError};

/// Counters for credential and handle activity.
#[derive(Debug, Default)]
pub struct StatsCollector {
    running: AtomicBool,
    created: [AtomicU64; CredentialKind::COUNT],
    handles_wrapped: AtomicU64,
    handles_released: AtomicU64,
}

/// Point-in-time copy of the collector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    pub running: bool,
    pub credentials_created: BTreeMap<&'static str, u64>,
    pub handles_wrapped: u64,
    pub handles_released: u64,
}

impl StatsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    pub fn record_credential_created(&self, kind: CredentialKind) {
        if self.is_running() {
            self.created[kind.index()].fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_handle_wrapped(&self) {
        if self.is_running() {
            self.handles_wrapped.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_handle_released(&self) {
        if self.is_running() {
            self.handles_released.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        let credentials_created = CredentialKind::ALL
            .iter()
            .map(|kind| (kind.as_str(), self.created[kind.index()].load(Ordering::Relaxed)))
            .collect();

        StatsSnapshot {
            running: self.is_running(),
            credentials_created,
            handles_wrapped: self.handles_wrapped.load(Ordering::Relaxed),
            handles_released: self.handles_released.load(Ordering::Relaxed),
        }
    }

    fn reset(&self) {
        for counter in &self.created {
            counter.store(0, Ordering::Relaxed);
        }
        self.handles_wrapped.store(0, Ordering::Relaxed);
        self.handles_released.store(0, Ordering::Relaxed);
    }
}

impl Subsystem for StatsCollector {
    fn name(&self) -> &'static str {
        "stats"
    }

    fn start(&self) -> Result<(), SubsystemError> {
        self.reset();
        self.running.store(true, Ordering::Release);
        Ok(())
    }

    fn stop(&self) {
        self.running.store(false, Ordering::Release);
        let snapshot = self.snapshot();
        tracing::debug!(
            handles_wrapped = snapshot.handles_wrapped,
            handles_released = snapshot.handles_released,
            "Stats collector stopped"
        );
    }
}
