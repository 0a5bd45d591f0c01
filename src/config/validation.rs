//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check that composites reference credentials defined before them
//! - Apply the same argument rules the credential factory enforces
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: RuntimeConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;

use thiserror::Error;

use crate::config::schema::{CredentialSource, RuntimeConfig};
use crate::observability::trace_flags::is_known_flag;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("io.worker_threads must be at least 1")]
    NoWorkerThreads,

    #[error("unknown trace flag '{0}'")]
    UnknownTraceFlag(String),

    #[error("unknown log level '{0}'")]
    UnknownLogLevel(String),

    #[error("credential name must not be empty")]
    EmptyCredentialName,

    #[error("credential '{0}' is defined more than once")]
    DuplicateCredential(String),

    #[error("credential '{0}': private_key_path and cert_chain_path must be set together")]
    UnpairedKeyMaterial(String),

    #[error("credential '{name}': {field} must not be empty")]
    EmptyTokenField { name: String, field: &'static str },

    #[error("credential '{name}' references '{reference}', which is not defined before it")]
    UnknownReference { name: String, reference: String },
}

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Validate a parsed configuration, collecting every problem found.
pub fn validate_config(config: &RuntimeConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.io.worker_threads == 0 {
        errors.push(ValidationError::NoWorkerThreads);
    }

    if !LOG_LEVELS.contains(&config.observability.log_level.as_str()) {
        errors.push(ValidationError::UnknownLogLevel(
            config.observability.log_level.clone(),
        ));
    }

    for flag in &config.trace.flags {
        if !is_known_flag(flag) {
            errors.push(ValidationError::UnknownTraceFlag(flag.clone()));
        }
    }

    let mut defined: HashSet<&str> = HashSet::new();
    for credential in &config.credentials {
        let name = credential.name.as_str();
        if name.is_empty() {
            errors.push(ValidationError::EmptyCredentialName);
        }

        match &credential.source {
            CredentialSource::Ssl {
                private_key_path,
                cert_chain_path,
                ..
            } => {
                if private_key_path.is_some() != cert_chain_path.is_some() {
                    errors.push(ValidationError::UnpairedKeyMaterial(name.to_string()));
                }
            }
            CredentialSource::Iam { token, selector } => {
                if token.is_empty() {
                    errors.push(ValidationError::EmptyTokenField {
                        name: name.to_string(),
                        field: "token",
                    });
                }
                if selector.is_empty() {
                    errors.push(ValidationError::EmptyTokenField {
                        name: name.to_string(),
                        field: "selector",
                    });
                }
            }
            CredentialSource::Composite { first, second } => {
                for reference in [first, second] {
                    if !defined.contains(reference.as_str()) {
                        errors.push(ValidationError::UnknownReference {
                            name: name.to_string(),
                            reference: reference.clone(),
                        });
                    }
                }
            }
            CredentialSource::Default | CredentialSource::Gce | CredentialSource::Fake => {}
        }

        if !defined.insert(name) {
            errors.push(ValidationError::DuplicateCredential(name.to_string()));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
