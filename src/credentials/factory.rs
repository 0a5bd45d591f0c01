//! Validated credential constructors.
//!
//! # Responsibilities
//! - Enforce per-kind argument constraints before any backend work
//! - Delegate leaf construction to the backend
//! - Compose credentials by shared reference
//!
//! # Design Decisions
//! - All-or-nothing: a rejected call builds nothing
//! - Empty call-token values are rejected even though the backend would accept them

use std::sync::Arc;

use crate::credentials::backend::CredentialBackend;
use crate::credentials::credential::{Credential, CredentialSpec};
use crate::credentials::types::{
    CallTokenOptions, CredentialError, CredentialResult, KeyCertPair, TransportSecurityOptions,
};
use crate::observability::{Telemetry, TraceFlag};

/// Builds credentials through a backend.
#[derive(Clone)]
pub struct CredentialFactory {
    backend: Arc<dyn CredentialBackend>,
    telemetry: Telemetry,
}

impl CredentialFactory {
    pub fn new(backend: Arc<dyn CredentialBackend>) -> Self {
        Self {
            backend,
            telemetry: Telemetry::detached(),
        }
    }

    pub fn with_telemetry(mut self, telemetry: Telemetry) -> Self {
        self.telemetry = telemetry;
        self
    }

    /// Application default credentials.
    pub fn create_default(&self) -> CredentialResult<Credential> {
        self.build(CredentialSpec::Default)
    }

    /// Transport security from PEM inputs.
    ///
    /// `private_key` and `cert_chain` must be given together or not at all.
    pub fn create_transport_security(
        &self,
        root_certs: Option<Vec<u8>>,
        private_key: Option<Vec<u8>>,
        cert_chain: Option<Vec<u8>>,
    ) -> CredentialResult<Credential> {
        let key_cert_pair = match (private_key, cert_chain) {
            (Some(private_key), Some(cert_chain)) => Some(KeyCertPair {
                private_key,
                cert_chain,
            }),
            (None, None) => None,
            (Some(_), None) | (None, Some(_)) => {
                return Err(CredentialError::InvalidArgumentValue(
                    "private key and certificate chain must be provided together".to_string(),
                ));
            }
        };

        self.build(CredentialSpec::TransportSecurity(TransportSecurityOptions {
            root_certs,
            key_cert_pair,
        }))
    }

    /// Combine two credentials. Each child gains one holder; nothing is copied.
    pub fn create_composite(&self, first: &Credential, second: &Credential) -> Credential {
        let credential = Credential::composite(first.clone(), second.clone());
        self.created(&credential);
        credential
    }

    /// Compute Engine instance identity.
    pub fn create_compute_engine_identity(&self) -> CredentialResult<Credential> {
        self.build(CredentialSpec::ComputeEngineIdentity)
    }

    /// Insecure transport stand-in for tests.
    pub fn create_fake_transport_security(&self) -> CredentialResult<Credential> {
        self.build(CredentialSpec::FakeTransportSecurity)
    }

    /// IAM-style token credential. Both values must be non-empty.
    pub fn create_call_token(
        &self,
        auth_token: impl Into<String>,
        auth_selector: impl Into<String>,
    ) -> CredentialResult<Credential> {
        let auth_token = auth_token.into();
        let auth_selector = auth_selector.into();

        if auth_token.is_empty() {
            return Err(CredentialError::InvalidArgumentValue(
                "auth token must not be empty".to_string(),
            ));
        }
        if auth_selector.is_empty() {
            return Err(CredentialError::InvalidArgumentValue(
                "auth selector must not be empty".to_string(),
            ));
        }

        self.build(CredentialSpec::CallToken(CallTokenOptions {
            auth_token,
            auth_selector,
        }))
    }

    fn build(&self, spec: CredentialSpec) -> CredentialResult<Credential> {
        let kind = spec.kind();
        let Some(request) = spec.backend_request() else {
            unreachable!("composite credentials are assembled by create_composite");
        };

        let mechanism = self
            .backend
            .create(request)
            .map_err(|source| CredentialError::Backend { kind, source })?;
        debug_assert_eq!(mechanism.kind(), kind, "backend returned a mechanism of the wrong kind");

        let credential = Credential::leaf(spec, mechanism);
        self.created(&credential);
        Ok(credential)
    }

    fn created(&self, credential: &Credential) {
        self.telemetry.credential_created(credential.kind());
        if self.telemetry.traces(TraceFlag::Credentials) {
            tracing::debug!(
                credential_id = %credential.id(),
                kind = %credential.kind(),
                description = %credential.describe(),
                "Credential created"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::backend::{BackendRequest, SecurityMechanism};
    use crate::credentials::types::{BackendError, CredentialKind};
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug)]
    struct Tracked {
        kind: CredentialKind,
        drops: Arc<AtomicUsize>,
    }

    impl SecurityMechanism for Tracked {
        fn kind(&self) -> CredentialKind {
            self.kind
        }
    }

    impl Drop for Tracked {
        fn drop(&mut self) {
            self.drops.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[derive(Default)]
    struct TrackingBackend {
        calls: AtomicUsize,
        drops: Arc<AtomicUsize>,
    }

    impl CredentialBackend for TrackingBackend {
        fn create(
            &self,
            request: BackendRequest<'_>,
        ) -> Result<Box<dyn SecurityMechanism>, BackendError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(Tracked {
                kind: request.kind(),
                drops: self.drops.clone(),
            }))
        }
    }

    struct RefusingBackend;

    impl CredentialBackend for RefusingBackend {
        fn create(
            &self,
            request: BackendRequest<'_>,
        ) -> Result<Box<dyn SecurityMechanism>, BackendError> {
            Err(BackendError::Unsupported(request.kind()))
        }
    }

    fn factory() -> (CredentialFactory, Arc<TrackingBackend>) {
        let backend = Arc::new(TrackingBackend::default());
        (CredentialFactory::new(backend.clone()), backend)
    }

    #[test]
    fn test_fresh_credential_has_one_holder() {
        let (factory, _) = factory();
        for credential in [
            factory.create_default().unwrap(),
            factory.create_compute_engine_identity().unwrap(),
            factory.create_fake_transport_security().unwrap(),
            factory.create_call_token("tok", "sel").unwrap(),
            factory.create_transport_security(None, None, None).unwrap(),
        ] {
            assert_eq!(credential.holders(), 1);
        }
    }

    #[test]
    fn test_transport_security_pairing() {
        let (factory, backend) = factory();
        let pk = Some(b"key".to_vec());
        let chain = Some(b"chain".to_vec());

        let err = factory
            .create_transport_security(None, pk.clone(), None)
            .unwrap_err();
        assert!(matches!(err, CredentialError::InvalidArgumentValue(_)));

        let err = factory
            .create_transport_security(Some(b"roots".to_vec()), None, chain.clone())
            .unwrap_err();
        assert!(matches!(err, CredentialError::InvalidArgumentValue(_)));
        assert_eq!(backend.calls.load(Ordering::SeqCst), 0);

        let both = factory.create_transport_security(None, pk, chain).unwrap();
        let opts = both.transport_security().unwrap();
        assert_eq!(opts.key_cert_pair.as_ref().unwrap().private_key, b"key");
        assert!(opts.root_certs.is_none());

        let neither = factory
            .create_transport_security(Some(b"roots".to_vec()), None, None)
            .unwrap();
        assert!(neither.transport_security().unwrap().key_cert_pair.is_none());
        assert_eq!(backend.calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_call_token_rejects_empty_values() {
        let (factory, backend) = factory();
        assert!(matches!(
            factory.create_call_token("", "sel"),
            Err(CredentialError::InvalidArgumentValue(_))
        ));
        assert!(matches!(
            factory.create_call_token("tok", ""),
            Err(CredentialError::InvalidArgumentValue(_))
        ));
        assert_eq!(backend.calls.load(Ordering::SeqCst), 0);

        let credential = factory.create_call_token("tok", "sel").unwrap();
        let opts = credential.call_token().unwrap();
        assert_eq!(opts.auth_token, "tok");
        assert_eq!(opts.auth_selector, "sel");
    }

    #[test]
    fn test_composite_does_not_call_backend() {
        let (factory, backend) = factory();
        let a = factory.create_fake_transport_security().unwrap();
        let b = factory.create_call_token("tok", "sel").unwrap();
        assert_eq!(backend.calls.load(Ordering::SeqCst), 2);

        let both = factory.create_composite(&a, &b);
        assert_eq!(backend.calls.load(Ordering::SeqCst), 2);
        assert_eq!(both.holders(), 1);
        assert_eq!(a.holders(), 2);
    }

    #[test]
    fn test_shared_child_released_once() {
        let (factory, backend) = factory();
        let shared = factory.create_call_token("tok", "sel").unwrap();
        let tls = factory.create_fake_transport_security().unwrap();

        let left = factory.create_composite(&tls, &shared);
        let right = factory.create_composite(&shared, &tls);
        let top = factory.create_composite(&left, &right);
        drop((shared, tls, left, right));
        assert_eq!(backend.drops.load(Ordering::SeqCst), 0);

        drop(top);
        assert_eq!(backend.drops.load(Ordering::SeqCst), 2);
    }

    #[test]
    #[should_panic(expected = "assembled by create_composite")]
    fn test_build_is_leaf_only() {
        let (factory, _) = factory();
        let a = factory.create_fake_transport_security().unwrap();
        let b = factory.create_default().unwrap();
        let _ = factory.build(CredentialSpec::Composite { first: a, second: b });
    }

    #[test]
    fn test_backend_failure_is_reported() {
        let factory = CredentialFactory::new(Arc::new(RefusingBackend));
        let err = factory.create_compute_engine_identity().unwrap_err();
        assert!(matches!(
            err,
            CredentialError::Backend {
                kind: CredentialKind::ComputeEngineIdentity,
                ..
            }
        ));
    }
}
