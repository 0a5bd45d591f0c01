//! Runtime configuration.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → RuntimeConfig (validated, immutable)
//!     → Runtime::from_config (subsystems, backend, catalog)
//! ```
//!
//! # Design Decisions
//! - A runtime is built from a config once; there is no reload
//! - Every section is optional; an empty file yields a working runtime
//! - serde rejects malformed input, `validate_config` collects every
//!   semantic problem instead of stopping at the first

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{
    CredentialConfig, CredentialSource, IoConfig, ObservabilityConfig, RuntimeConfig, TraceConfig,
    TransportSecurityConfig,
};
pub use validation::{validate_config, ValidationError};
