//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! acquire() (manager.rs):
//!     one-time setup guard → count lock → 0→1? → start subsystems in order
//!
//! release() (manager.rs):
//!     count lock → 1→0? → stop subsystems in reverse order
//!
//! Subsystems (subsystem.rs, io.rs):
//!     TraceFlags → IoManager → StatsCollector
//! ```
//!
//! # Design Decisions
//! - The manager is an ordinary value; the process-wide instance lives in
//!   `boundary::runtime`
//! - Ordered startup, reverse-ordered shutdown
//! - Over-release is fatal, not an error to recover from
//! - A failed start rolls back the subsystems that already started

pub mod io;
pub mod manager;
pub mod subsystem;

use thiserror::Error;

pub use io::IoManager;
pub use manager::ProcessLifecycle;
pub use subsystem::{Subsystem, SubsystemError, SubsystemRegistry};

/// Errors that can occur while acquiring or releasing the runtime.
#[derive(Debug, Error)]
pub enum LifecycleError {
    /// `release()` was called without an outstanding `acquire()`.
    #[error("lifecycle imbalance: release without a matching acquire")]
    Imbalance,

    /// A subsystem failed to start; every subsystem started before it was stopped again.
    #[error("subsystem '{name}' failed to start: {source}")]
    SubsystemStart {
        name: &'static str,
        #[source]
        source: SubsystemError,
    },
}

/// Result type for lifecycle operations.
pub type LifecycleResult<T> = Result<T, LifecycleError>;
