//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Lifecycle, factory and boundary produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (counters and gauges through the `metrics` facade)
//!     → stats.rs (in-process counters, live between start and stop)
//!     → trace_flags.rs (per-area verbose tracing switches)
//! ```
//!
//! # Design Decisions
//! - `stats` and `trace_flags` are lifecycle subsystems; they start and stop
//!   with the runtime
//! - The metrics facade is a no-op until a recorder is installed
//! - `Telemetry` bundles both so components take one handle

pub mod logging;
pub mod metrics;
pub mod stats;
pub mod trace_flags;

use std::sync::Arc;

use crate::credentials::CredentialKind;

pub use stats::{StatsCollector, StatsSnapshot};
pub use trace_flags::{TraceFlag, TraceFlags};

/// Shared observability handles passed to the factory and the boundary.
#[derive(Debug, Clone)]
pub struct Telemetry {
    pub stats: Arc<StatsCollector>,
    pub trace: Arc<TraceFlags>,
}

impl Telemetry {
    pub fn new(stats: Arc<StatsCollector>, trace: Arc<TraceFlags>) -> Self {
        Self { stats, trace }
    }

    /// Telemetry whose subsystems are never started; recording is a no-op.
    pub fn detached() -> Self {
        Self {
            stats: Arc::new(StatsCollector::new()),
            trace: Arc::new(TraceFlags::new(Vec::new())),
        }
    }

    pub fn credential_created(&self, kind: CredentialKind) {
        self.stats.record_credential_created(kind);
        metrics::record_credential_created(kind.as_str());
    }

    pub fn handle_wrapped(&self, live: usize) {
        self.stats.record_handle_wrapped();
        metrics::record_live_handles(live);
    }

    pub fn handle_released(&self, live: usize) {
        self.stats.record_handle_released();
        metrics::record_live_handles(live);
    }

    pub fn argument_rejected(&self, reason: &'static str) {
        metrics::record_rejected_argument(reason);
    }

    pub fn traces(&self, flag: TraceFlag) -> bool {
        self.trace.is_enabled(flag)
    }
}

impl Default for Telemetry {
    fn default() -> Self {
        Self::detached()
    }
}
