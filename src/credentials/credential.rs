//! The shared, immutable credential value.

use std::fmt;
use std::mem;
use std::sync::Arc;

use uuid::Uuid;

use crate::credentials::backend::{BackendRequest, SecurityMechanism};
use crate::credentials::types::{CallTokenOptions, CredentialKind, TransportSecurityOptions};

/// What a credential was built from.
#[derive(Debug)]
pub enum CredentialSpec {
    Default,
    TransportSecurity(TransportSecurityOptions),
    Composite { first: Credential, second: Credential },
    ComputeEngineIdentity,
    FakeTransportSecurity,
    CallToken(CallTokenOptions),
}

impl CredentialSpec {
    pub fn kind(&self) -> CredentialKind {
        match self {
            CredentialSpec::Default => CredentialKind::Default,
            CredentialSpec::TransportSecurity(_) => CredentialKind::TransportSecurity,
            CredentialSpec::Composite { .. } => CredentialKind::Composite,
            CredentialSpec::ComputeEngineIdentity => CredentialKind::ComputeEngineIdentity,
            CredentialSpec::FakeTransportSecurity => CredentialKind::FakeTransportSecurity,
            CredentialSpec::CallToken(_) => CredentialKind::CallToken,
        }
    }

    /// The backend request for a leaf spec; composites are not built by the backend.
    pub(crate) fn backend_request(&self) -> Option<BackendRequest<'_>> {
        match self {
            CredentialSpec::Default => Some(BackendRequest::Default),
            CredentialSpec::TransportSecurity(opts) => Some(BackendRequest::TransportSecurity(opts)),
            CredentialSpec::Composite { .. } => None,
            CredentialSpec::ComputeEngineIdentity => Some(BackendRequest::ComputeEngineIdentity),
            CredentialSpec::FakeTransportSecurity => Some(BackendRequest::FakeTransportSecurity),
            CredentialSpec::CallToken(opts) => Some(BackendRequest::CallToken(opts)),
        }
    }
}

struct CredentialInner {
    id: Uuid,
    kind: CredentialKind,
    spec: CredentialSpec,
    /// Backend resource; `None` only for composites, whose resources are their children's.
    mechanism: Option<Box<dyn SecurityMechanism>>,
}

impl CredentialInner {
    /// Move a composite's children into `pending`, leaving a leaf-shaped spec behind.
    fn take_children(&mut self, pending: &mut Vec<Credential>) {
        if !matches!(self.spec, CredentialSpec::Composite { .. }) {
            return;
        }
        if let CredentialSpec::Composite { first, second } = mem::replace(&mut self.spec, CredentialSpec::Default) {
            pending.push(first);
            pending.push(second);
        }
    }
}

/// Composite chains can be arbitrarily deep, so children are released from a
/// worklist instead of through nested drops.
impl Drop for CredentialInner {
    fn drop(&mut self) {
        tracing::trace!(credential_id = %self.id, kind = %self.kind, "Credential released");

        let mut pending = Vec::new();
        self.take_children(&mut pending);
        while let Some(credential) = pending.pop() {
            if let Ok(mut inner) = Arc::try_unwrap(credential.inner) {
                inner.take_children(&mut pending);
            }
        }
    }
}

/// A reference-counted description of an authentication mechanism.
///
/// Cloning takes another shared reference. The backend mechanism is dropped
/// exactly once, when the last reference goes away; a composite keeps one
/// reference to each child for as long as it lives.
#[derive(Clone)]
pub struct Credential {
    inner: Arc<CredentialInner>,
}

impl Credential {
    pub(crate) fn leaf(spec: CredentialSpec, mechanism: Box<dyn SecurityMechanism>) -> Self {
        Self::from_parts(spec, Some(mechanism))
    }

    pub(crate) fn composite(first: Credential, second: Credential) -> Self {
        Self::from_parts(CredentialSpec::Composite { first, second }, None)
    }

    fn from_parts(spec: CredentialSpec, mechanism: Option<Box<dyn SecurityMechanism>>) -> Self {
        Self {
            inner: Arc::new(CredentialInner {
                id: Uuid::new_v4(),
                kind: spec.kind(),
                spec,
                mechanism,
            }),
        }
    }

    /// Identifier used in logs.
    pub fn id(&self) -> Uuid {
        self.inner.id
    }

    pub fn kind(&self) -> CredentialKind {
        self.inner.kind
    }

    pub fn spec(&self) -> &CredentialSpec {
        &self.inner.spec
    }

    pub fn mechanism(&self) -> Option<&dyn SecurityMechanism> {
        self.inner.mechanism.as_deref()
    }

    /// Number of live references to this credential (handles, composites, clones).
    pub fn holders(&self) -> usize {
        Arc::strong_count(&self.inner)
    }

    /// Whether both values refer to the same underlying credential.
    pub fn ptr_eq(a: &Credential, b: &Credential) -> bool {
        Arc::ptr_eq(&a.inner, &b.inner)
    }

    pub fn children(&self) -> Option<(&Credential, &Credential)> {
        match &self.inner.spec {
            CredentialSpec::Composite { first, second } => Some((first, second)),
            _ => None,
        }
    }

    pub fn call_token(&self) -> Option<&CallTokenOptions> {
        match &self.inner.spec {
            CredentialSpec::CallToken(opts) => Some(opts),
            _ => None,
        }
    }

    pub fn transport_security(&self) -> Option<&TransportSecurityOptions> {
        match &self.inner.spec {
            CredentialSpec::TransportSecurity(opts) => Some(opts),
            _ => None,
        }
    }

    /// Leaf credentials in composition order, first child before second.
    pub fn leaves(&self) -> Vec<&Credential> {
        let mut leaves = Vec::new();
        let mut stack = vec![self];
        while let Some(credential) = stack.pop() {
            match credential.children() {
                Some((first, second)) => {
                    stack.push(second);
                    stack.push(first);
                }
                None => leaves.push(credential),
            }
        }
        leaves
    }

    /// Whether this credential, or any credential it is composed of, secures the transport.
    pub fn secures_transport(&self) -> bool {
        self.leaves().into_iter().any(|leaf| {
            matches!(
                leaf.kind(),
                CredentialKind::TransportSecurity | CredentialKind::FakeTransportSecurity
            )
        })
    }

    /// Per-call metadata contributed by this credential.
    ///
    /// Composites yield the first child's entries followed by the second's.
    pub fn request_metadata(&self) -> Vec<(String, String)> {
        self.leaves()
            .into_iter()
            .filter_map(Credential::mechanism)
            .flat_map(|mechanism| mechanism.request_metadata())
            .collect()
    }

    /// One-line human description, e.g. `composite(call_token, fake_transport_security)`.
    pub fn describe(&self) -> String {
        enum Step<'a> {
            Visit(&'a Credential),
            Text(&'static str),
        }

        let mut out = String::new();
        let mut steps = vec![Step::Visit(self)];
        while let Some(step) = steps.pop() {
            match step {
                Step::Text(text) => out.push_str(text),
                Step::Visit(credential) => match credential.children() {
                    Some((first, second)) => {
                        out.push_str("composite(");
                        steps.extend([
                            Step::Text(")"),
                            Step::Visit(second),
                            Step::Text(", "),
                            Step::Visit(first),
                        ]);
                    }
                    None => match credential.mechanism() {
                        Some(mechanism) => out.push_str(&mechanism.describe()),
                        None => out.push_str(credential.kind().as_str()),
                    },
                },
            }
        }
        out
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("id", &self.inner.id)
            .field("kind", &self.kind())
            .field("holders", &self.holders())
            .finish()
    }
}
