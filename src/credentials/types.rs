//! Credential kinds, creation options and error definitions.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// The closed set of authentication mechanisms a credential can describe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialKind {
    /// Application default credentials.
    Default,
    /// Certificate-based transport security.
    TransportSecurity,
    /// Two credentials applied together.
    Composite,
    /// Compute Engine instance identity.
    ComputeEngineIdentity,
    /// Insecure stand-in for transport security, for tests.
    FakeTransportSecurity,
    /// IAM-style bearer token plus authority selector.
    CallToken,
}

impl CredentialKind {
    pub const COUNT: usize = 6;

    pub const ALL: [CredentialKind; Self::COUNT] = [
        CredentialKind::Default,
        CredentialKind::TransportSecurity,
        CredentialKind::Composite,
        CredentialKind::ComputeEngineIdentity,
        CredentialKind::FakeTransportSecurity,
        CredentialKind::CallToken,
    ];

    /// Dense index into per-kind tables, matching the order of [`Self::ALL`].
    pub fn index(self) -> usize {
        match self {
            CredentialKind::Default => 0,
            CredentialKind::TransportSecurity => 1,
            CredentialKind::Composite => 2,
            CredentialKind::ComputeEngineIdentity => 3,
            CredentialKind::FakeTransportSecurity => 4,
            CredentialKind::CallToken => 5,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CredentialKind::Default => "default",
            CredentialKind::TransportSecurity => "transport_security",
            CredentialKind::Composite => "composite",
            CredentialKind::ComputeEngineIdentity => "compute_engine_identity",
            CredentialKind::FakeTransportSecurity => "fake_transport_security",
            CredentialKind::CallToken => "call_token",
        }
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }
}

impl fmt::Display for CredentialKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A private key with its certificate chain, both PEM encoded.
#[derive(Clone, PartialEq, Eq)]
pub struct KeyCertPair {
    pub private_key: Vec<u8>,
    pub cert_chain: Vec<u8>,
}

impl fmt::Debug for KeyCertPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyCertPair")
            .field("private_key", &"<redacted>")
            .field("cert_chain_len", &self.cert_chain.len())
            .finish()
    }
}

/// Inputs for a transport-security credential.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransportSecurityOptions {
    /// PEM root certificate bundle; `None` defers to the backend's default roots.
    pub root_certs: Option<Vec<u8>>,
    /// Client identity; absent for server-authenticated-only connections.
    pub key_cert_pair: Option<KeyCertPair>,
}

/// Inputs for a call-token credential.
#[derive(Clone, PartialEq, Eq)]
pub struct CallTokenOptions {
    pub auth_token: String,
    pub auth_selector: String,
}

impl fmt::Debug for CallTokenOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallTokenOptions")
            .field("auth_token", &"<redacted>")
            .field("auth_selector", &self.auth_selector)
            .finish()
    }
}

/// Errors reported by a credential backend.
#[derive(Debug, Error)]
pub enum BackendError {
    /// Input decoded, but held no section of the expected type.
    #[error("no {expected} found in PEM input")]
    MissingPem { expected: &'static str },

    /// Input could not be decoded as PEM.
    #[error("malformed PEM input: {0}")]
    Pem(#[from] std::io::Error),

    /// The configured default root bundle could not be read.
    #[error("failed to read default roots from {path}: {source}")]
    DefaultRoots {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The backend does not support this kind.
    #[error("{0} credentials are not supported by this backend")]
    Unsupported(CredentialKind),
}

/// Errors that can occur while creating a credential.
#[derive(Debug, Error)]
pub enum CredentialError {
    /// An argument has the right type but violates a constraint.
    #[error("invalid argument: {0}")]
    InvalidArgumentValue(String),

    /// The backend refused to build the mechanism.
    #[error("backend failed to create {kind} credential: {source}")]
    Backend {
        kind: CredentialKind,
        #[source]
        source: BackendError,
    },
}

/// Result type for credential operations.
pub type CredentialResult<T> = Result<T, CredentialError>;
