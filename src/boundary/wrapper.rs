//! Credentials exposed to the foreign caller as tagged handles.
//!
//! # Responsibilities
//! - Convert caller arguments and delegate to the factory
//! - Own one reference per live handle
//! - Reject wrong-shaped arguments before anything is built

use std::fmt;

use crate::boundary::error::{BoundaryError, BoundaryResult};
use crate::boundary::handle::{BoundaryHandle, HandleTable, TypeTag};
use crate::boundary::value::BoundaryValue;
use crate::credentials::{Credential, CredentialFactory};
use crate::observability::{Telemetry, TraceFlag};

/// Tag carried by every credential handle ("CRED").
pub const CREDENTIAL_TYPE_TAG: TypeTag = TypeTag::new(0x4352_4544);

/// The `credentials` namespace of the boundary.
pub struct CredentialsWrapper {
    factory: CredentialFactory,
    table: HandleTable<Credential>,
    telemetry: Telemetry,
}

impl CredentialsWrapper {
    pub fn new(factory: CredentialFactory, telemetry: Telemetry) -> Self {
        Self {
            factory,
            table: HandleTable::new(CREDENTIAL_TYPE_TAG, "Credential"),
            telemetry,
        }
    }

    pub fn type_tag(&self) -> TypeTag {
        self.table.tag()
    }

    pub fn factory(&self) -> &CredentialFactory {
        &self.factory
    }

    /// Hand `credential` to the caller. `None` becomes the null handle.
    ///
    /// The handle takes over the passed reference; clone first to keep one.
    pub fn wrap(&self, credential: Option<Credential>) -> BoundaryHandle {
        let Some(credential) = credential else {
            return self.table.null_handle();
        };
        let credential_id = credential.id();
        let handle = self.table.insert(credential);
        let live = self.table.len();
        self.telemetry.handle_wrapped(live);
        if self.telemetry.traces(TraceFlag::Handles) {
            tracing::trace!(%credential_id, live, "Credential wrapped");
        }
        handle
    }

    /// Resolve `handle` to the credential it holds. The handle keeps its
    /// reference; the returned value is an additional one.
    pub fn unwrap(&self, handle: &BoundaryHandle) -> BoundaryResult<Option<Credential>> {
        Ok(self.table.get(handle)?)
    }

    /// Drop the reference taken at wrap time. Releasing the null handle is a no-op.
    pub fn release(&self, handle: &BoundaryHandle) -> BoundaryResult<()> {
        let Some(credential) = self.table.remove(handle)? else {
            return Ok(());
        };
        let live = self.table.len();
        self.telemetry.handle_released(live);
        if self.telemetry.traces(TraceFlag::Handles) {
            tracing::trace!(
                credential_id = %credential.id(),
                remaining_holders = credential.holders() - 1,
                live,
                "Credential handle released"
            );
        }
        Ok(())
    }

    pub fn live_handles(&self) -> usize {
        self.table.len()
    }

    pub fn create_default(&self) -> BoundaryResult<BoundaryHandle> {
        self.finish("create_default", self.factory.create_default().map_err(Into::into))
    }

    /// `create_ssl(root_certs?, private_key?, cert_chain?)`
    pub fn create_ssl(
        &self,
        root_certs: &BoundaryValue,
        private_key: &BoundaryValue,
        cert_chain: &BoundaryValue,
    ) -> BoundaryResult<BoundaryHandle> {
        const FUNCTION: &str = "create_ssl";
        let result = (|| -> BoundaryResult<Credential> {
            let root_certs = root_certs.optional_bytes(FUNCTION, "first")?;
            let private_key = private_key.optional_bytes(FUNCTION, "second")?;
            let cert_chain = cert_chain.optional_bytes(FUNCTION, "third")?;
            Ok(self
                .factory
                .create_transport_security(root_certs, private_key, cert_chain)?)
        })();
        self.finish(FUNCTION, result)
    }

    /// `create_composite(first, second)`; both must be live credential handles.
    pub fn create_composite(&self, first: &BoundaryValue, second: &BoundaryValue) -> BoundaryResult<BoundaryHandle> {
        const FUNCTION: &str = "create_composite";
        let result = (|| -> BoundaryResult<Credential> {
            let first = self.credential_argument(FUNCTION, "first", first)?;
            let second = self.credential_argument(FUNCTION, "second", second)?;
            Ok(self.factory.create_composite(&first, &second))
        })();
        self.finish(FUNCTION, result)
    }

    pub fn create_gce(&self) -> BoundaryResult<BoundaryHandle> {
        self.finish(
            "create_gce",
            self.factory.create_compute_engine_identity().map_err(Into::into),
        )
    }

    pub fn create_fake(&self) -> BoundaryResult<BoundaryHandle> {
        self.finish(
            "create_fake",
            self.factory.create_fake_transport_security().map_err(Into::into),
        )
    }

    /// `create_iam(token, selector)`
    pub fn create_iam(&self, token: &BoundaryValue, selector: &BoundaryValue) -> BoundaryResult<BoundaryHandle> {
        const FUNCTION: &str = "create_iam";
        let result = (|| -> BoundaryResult<Credential> {
            let token = token.string(FUNCTION, "first")?;
            let selector = selector.string(FUNCTION, "second")?;
            Ok(self.factory.create_call_token(token, selector)?)
        })();
        self.finish(FUNCTION, result)
    }

    /// A composite argument that does not resolve to a live credential is
    /// an argument of the wrong type, whatever the reason.
    fn credential_argument(
        &self,
        function: &'static str,
        position: &'static str,
        value: &BoundaryValue,
    ) -> BoundaryResult<Credential> {
        let handle = value.handle(function, position)?;
        match self.table.get(&handle) {
            Ok(Some(credential)) => Ok(credential),
            Ok(None) | Err(_) => Err(BoundaryError::InvalidArgumentType {
                function,
                position,
                expected: "a credential handle",
            }),
        }
    }

    fn finish(&self, function: &'static str, result: BoundaryResult<Credential>) -> BoundaryResult<BoundaryHandle> {
        match result {
            Ok(credential) => Ok(self.wrap(Some(credential))),
            Err(err) => {
                let code = err.code();
                tracing::warn!(function, code = code.as_str(), error = %err, "Boundary call rejected");
                self.telemetry.argument_rejected(code.as_str());
                Err(err)
            }
        }
    }
}

impl fmt::Debug for CredentialsWrapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialsWrapper")
            .field("table", &self.table)
            .finish_non_exhaustive()
    }
}
