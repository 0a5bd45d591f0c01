//! Embeddable RPC runtime core.
//!
//! Process lifecycle, security credentials and the handle boundary through
//! which a foreign host drives both.
//!
//! ```text
//! host ──init/shutdown──▶ boundary::runtime ──▶ lifecycle (trace_flags, io, stats)
//! host ──credentials.*──▶ boundary::wrapper ──▶ credentials::factory ──▶ backend
//!                                │
//!                                └── handle table (tagged, nonce-checked)
//! ```

pub mod boundary;
pub mod config;
pub mod credentials;
pub mod lifecycle;
pub mod observability;

pub use boundary::{BoundaryError, BoundaryHandle, BoundaryValue, CredentialsWrapper, Runtime};
pub use config::RuntimeConfig;
pub use credentials::{Credential, CredentialKind};
pub use lifecycle::{LifecycleError, LifecycleResult};

/// Take one reference on the process-wide runtime.
pub fn init() -> LifecycleResult<()> {
    boundary::global().init()
}

/// Give back one reference on the process-wide runtime.
///
/// # Panics
/// When called more often than [`init`] succeeded.
pub fn shutdown() {
    boundary::global().shutdown()
}

/// The `credentials` namespace of the process-wide runtime.
pub fn credentials() -> &'static CredentialsWrapper {
    boundary::global().credentials()
}
