//! Transport/security backend seam.
//!
//! The factory validates arguments and then hands a [`BackendRequest`] to a
//! [`CredentialBackend`], which returns the mechanism object it built. The
//! credential owns that object from then on and drops it exactly once.

use std::fmt;

use crate::config::TransportSecurityConfig;
use crate::credentials::tls::TlsMaterial;
use crate::credentials::types::{
    BackendError, CallTokenOptions, CredentialKind, TransportSecurityOptions,
};

/// Metadata key carrying an IAM authorization token.
pub const IAM_TOKEN_METADATA_KEY: &str = "x-goog-iam-authorization-token";
/// Metadata key carrying an IAM authority selector.
pub const IAM_SELECTOR_METADATA_KEY: &str = "x-goog-iam-authority-selector";

/// A validated request to build one leaf mechanism.
#[derive(Debug, Clone, Copy)]
pub enum BackendRequest<'a> {
    Default,
    TransportSecurity(&'a TransportSecurityOptions),
    ComputeEngineIdentity,
    FakeTransportSecurity,
    CallToken(&'a CallTokenOptions),
}

impl BackendRequest<'_> {
    pub fn kind(&self) -> CredentialKind {
        match self {
            BackendRequest::Default => CredentialKind::Default,
            BackendRequest::TransportSecurity(_) => CredentialKind::TransportSecurity,
            BackendRequest::ComputeEngineIdentity => CredentialKind::ComputeEngineIdentity,
            BackendRequest::FakeTransportSecurity => CredentialKind::FakeTransportSecurity,
            BackendRequest::CallToken(_) => CredentialKind::CallToken,
        }
    }
}

/// An authentication mechanism built by a backend.
pub trait SecurityMechanism: Send + Sync + fmt::Debug {
    fn kind(&self) -> CredentialKind;

    /// Static per-call metadata this mechanism attaches to requests.
    fn request_metadata(&self) -> Vec<(String, String)> {
        Vec::new()
    }

    fn describe(&self) -> String {
        self.kind().to_string()
    }
}

/// Builds mechanism objects for validated requests.
pub trait CredentialBackend: Send + Sync {
    fn create(&self, request: BackendRequest<'_>) -> Result<Box<dyn SecurityMechanism>, BackendError>;
}

/// Mechanism whose token is fetched lazily by the transport (default and
/// Compute Engine credentials).
#[derive(Debug)]
pub struct DeferredTokenSource {
    kind: CredentialKind,
}

impl SecurityMechanism for DeferredTokenSource {
    fn kind(&self) -> CredentialKind {
        self.kind
    }

    fn describe(&self) -> String {
        format!("{} (token deferred)", self.kind)
    }
}

/// Insecure transport stand-in.
#[derive(Debug)]
pub struct FakeTransport;

impl SecurityMechanism for FakeTransport {
    fn kind(&self) -> CredentialKind {
        CredentialKind::FakeTransportSecurity
    }
}

/// Static IAM authorization metadata.
pub struct IamAuthorization {
    token: String,
    selector: String,
}

impl fmt::Debug for IamAuthorization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IamAuthorization")
            .field("token", &"<redacted>")
            .field("selector", &self.selector)
            .finish()
    }
}

impl SecurityMechanism for IamAuthorization {
    fn kind(&self) -> CredentialKind {
        CredentialKind::CallToken
    }

    fn request_metadata(&self) -> Vec<(String, String)> {
        vec![
            (IAM_TOKEN_METADATA_KEY.to_string(), self.token.clone()),
            (IAM_SELECTOR_METADATA_KEY.to_string(), self.selector.clone()),
        ]
    }
}

/// Backend used by the process-wide runtime.
#[derive(Debug, Clone, Default)]
pub struct DefaultBackend {
    config: TransportSecurityConfig,
}

impl DefaultBackend {
    pub fn new(config: TransportSecurityConfig) -> Self {
        Self { config }
    }

    fn default_roots(&self) -> Result<Option<Vec<u8>>, BackendError> {
        match &self.config.default_roots_path {
            Some(path) => std::fs::read(path)
                .map(Some)
                .map_err(|source| BackendError::DefaultRoots {
                    path: path.clone(),
                    source,
                }),
            None => Ok(None),
        }
    }
}

impl CredentialBackend for DefaultBackend {
    fn create(&self, request: BackendRequest<'_>) -> Result<Box<dyn SecurityMechanism>, BackendError> {
        let mechanism: Box<dyn SecurityMechanism> = match request {
            BackendRequest::Default => Box::new(DeferredTokenSource {
                kind: CredentialKind::Default,
            }),
            BackendRequest::ComputeEngineIdentity => Box::new(DeferredTokenSource {
                kind: CredentialKind::ComputeEngineIdentity,
            }),
            BackendRequest::FakeTransportSecurity => Box::new(FakeTransport),
            BackendRequest::TransportSecurity(opts) => {
                let fallback = match opts.root_certs {
                    Some(_) => None,
                    None => self.default_roots()?,
                };
                let roots = opts.root_certs.as_deref().or(fallback.as_deref());
                Box::new(TlsMaterial::decode(roots, opts.key_cert_pair.as_ref())?)
            }
            BackendRequest::CallToken(opts) => Box::new(IamAuthorization {
                token: opts.auth_token.clone(),
                selector: opts.auth_selector.clone(),
            }),
        };
        Ok(mechanism)
    }
}
