//! Metrics collection and exposition.
//!
//! # Metrics
//! - `rpc_embed_credentials_created_total` (counter): credentials built, by kind
//! - `rpc_embed_live_handles` (gauge): boundary handles not yet released
//! - `rpc_embed_lifecycle_transitions_total` (counter): subsystem start/stop cycles
//! - `rpc_embed_rejected_arguments_total` (counter): boundary calls refused, by error
//!
//! # Design Decisions
//! - Recording goes through the `metrics` facade; without a recorder it costs nothing
//! - The Prometheus recorder is opt-in (CLI `--metrics`, or the embedder)

use metrics::{counter, gauge};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};

pub fn record_credential_created(kind: &'static str) {
    counter!("rpc_embed_credentials_created_total", "kind" => kind).increment(1);
}

pub fn record_live_handles(live: usize) {
    gauge!("rpc_embed_live_handles").set(live as f64);
}

pub fn record_lifecycle_transition(direction: &'static str) {
    counter!("rpc_embed_lifecycle_transitions_total", "direction" => direction).increment(1);
}

pub fn record_rejected_argument(reason: &'static str) {
    counter!("rpc_embed_rejected_arguments_total", "error" => reason).increment(1);
}

/// Install a Prometheus recorder as the global `metrics` recorder.
///
/// The returned handle renders the exposition text on demand; no HTTP
/// listener is started.
pub fn install_prometheus() -> Result<PrometheusHandle, BuildError> {
    let handle = PrometheusBuilder::new().install_recorder()?;
    tracing::info!("Prometheus recorder installed");
    Ok(handle)
}
