//! Reference-counted acquire/release over the subsystem registry.

use std::sync::{Mutex, MutexGuard, OnceLock, PoisonError};

use crate::lifecycle::{LifecycleError, LifecycleResult, SubsystemRegistry};
use crate::observability::metrics;

/// Coordinates shared ownership of the runtime's background subsystems.
///
/// Any number of callers may `acquire()`; the subsystems start on the 0→1
/// transition of the count and stop on the 1→0 transition. Every `acquire()`
/// must be paired with exactly one `release()`.
///
/// The count mutex itself is allocated lazily by the first `acquire()`
/// through a `OnceLock`, which is the single-execution guard for one-time
/// setup. It is independent of the count lock, so racing first callers agree
/// on one mutex before either of them touches the count.
#[derive(Debug)]
pub struct ProcessLifecycle {
    registry: SubsystemRegistry,
    count: OnceLock<Mutex<usize>>,
}

impl ProcessLifecycle {
    /// Create a lifecycle manager over the given subsystems.
    pub fn new(registry: SubsystemRegistry) -> Self {
        Self {
            registry,
            count: OnceLock::new(),
        }
    }

    fn count_lock(&self) -> &Mutex<usize> {
        self.count.get_or_init(|| {
            tracing::debug!(subsystems = ?self.registry.names(), "Lifecycle state initialized");
            Mutex::new(0)
        })
    }

    /// The count stays consistent even if a subsystem panicked while the lock
    /// was held: it is only written after start succeeds or before stop runs.
    fn lock(lock: &Mutex<usize>) -> MutexGuard<'_, usize> {
        lock.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Take one reference on the runtime, starting the subsystems if this is
    /// the first outstanding reference.
    ///
    /// Returns only after every subsystem has started. If one fails, the
    /// subsystems started before it are stopped again and the count is left
    /// unchanged.
    pub fn acquire(&self) -> LifecycleResult<()> {
        let mut count = Self::lock(self.count_lock());

        if *count == 0 {
            self.registry
                .start_all()
                .map_err(|(name, source)| LifecycleError::SubsystemStart { name, source })?;
            tracing::info!(subsystems = self.registry.len(), "Runtime subsystems started");
            metrics::record_lifecycle_transition("start");
        }

        *count += 1;
        tracing::trace!(count = *count, "Runtime acquired");
        Ok(())
    }

    /// Drop one reference, stopping the subsystems if it was the last one.
    ///
    /// Returns [`LifecycleError::Imbalance`] instead of decrementing below zero.
    pub fn try_release(&self) -> LifecycleResult<()> {
        let Some(lock) = self.count.get() else {
            return Err(LifecycleError::Imbalance);
        };
        let mut count = Self::lock(lock);

        if *count == 0 {
            return Err(LifecycleError::Imbalance);
        }

        *count -= 1;
        tracing::trace!(count = *count, "Runtime released");

        if *count == 0 {
            self.registry.stop_all();
            tracing::info!(subsystems = self.registry.len(), "Runtime subsystems stopped");
            metrics::record_lifecycle_transition("stop");
        }
        Ok(())
    }

    /// Drop one reference.
    ///
    /// # Panics
    /// Panics on a release without a matching acquire.
    pub fn release(&self) {
        if let Err(e) = self.try_release() {
            tracing::error!(error = %e, "Fatal lifecycle misuse");
            panic!("{e}");
        }
    }

    /// Number of outstanding acquisitions.
    pub fn count(&self) -> usize {
        self.count
            .get()
            .map(|lock| *Self::lock(lock))
            .unwrap_or(0)
    }

    /// Whether one-time setup has run.
    pub fn setup_completed(&self) -> bool {
        self.count.get().is_some()
    }

    pub fn is_running(&self) -> bool {
        self.count() > 0
    }

    pub fn registry(&self) -> &SubsystemRegistry {
        &self.registry
    }
}
