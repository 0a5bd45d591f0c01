//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the runtime.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the embeddable runtime.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Logging and metrics settings.
    pub observability: ObservabilityConfig,

    /// I/O manager runtime settings.
    pub io: IoConfig,

    /// Verbose per-area tracing.
    pub trace: TraceConfig,

    /// Defaults for transport-security credentials.
    pub transport_security: TransportSecurityConfig,

    /// Named credentials built at provisioning time.
    pub credentials: Vec<CredentialConfig>,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Emit JSON log lines instead of the pretty format.
    pub json_logs: bool,

    /// Install a Prometheus recorder.
    pub metrics_enabled: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
            metrics_enabled: false,
        }
    }
}

/// I/O manager configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct IoConfig {
    /// Worker threads for the I/O runtime.
    pub worker_threads: usize,

    /// Name given to I/O runtime threads.
    pub thread_name: String,

    /// Bound on waiting for in-flight I/O tasks at shutdown, in milliseconds.
    pub shutdown_timeout_ms: u64,
}

impl Default for IoConfig {
    fn default() -> Self {
        Self {
            worker_threads: 2,
            thread_name: "rpc-embed-io".to_string(),
            shutdown_timeout_ms: 1000,
        }
    }
}

/// Trace flag configuration. Merged with `RPC_EMBED_TRACE` at start.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct TraceConfig {
    /// Flag names: `lifecycle`, `credentials`, `handles` or `all`.
    pub flags: Vec<String>,
}

/// Transport-security defaults.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct TransportSecurityConfig {
    /// PEM bundle used when a credential is created without root certificates.
    pub default_roots_path: Option<String>,
}

/// A named credential definition.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct CredentialConfig {
    /// Unique name; composites refer to earlier entries by it.
    pub name: String,

    #[serde(flatten)]
    pub source: CredentialSource,
}

/// How a named credential is built.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CredentialSource {
    Default,
    Ssl {
        #[serde(default)]
        root_certs_path: Option<String>,
        #[serde(default)]
        private_key_path: Option<String>,
        #[serde(default)]
        cert_chain_path: Option<String>,
    },
    Composite {
        first: String,
        second: String,
    },
    Gce,
    Fake,
    Iam {
        token: String,
        selector: String,
    },
}

impl CredentialSource {
    pub fn kind_name(&self) -> &'static str {
        match self {
            CredentialSource::Default => "default",
            CredentialSource::Ssl { .. } => "ssl",
            CredentialSource::Composite { .. } => "composite",
            CredentialSource::Gce => "gce",
            CredentialSource::Fake => "fake",
            CredentialSource::Iam { .. } => "iam",
        }
    }
}
