//! Credential subsystem.
//!
//! # Data Flow
//! ```text
//! create_*(args)
//!     → factory.rs (validate per kind)
//!     → backend.rs (build the mechanism: tls.rs for transport security)
//!     → credential.rs (Credential: Arc-shared, immutable)
//!
//! config [[credentials]]
//!     → catalog.rs (named credentials, composites by reference)
//! ```
//!
//! # Design Decisions
//! - Closed set of kinds, modelled as a sum type
//! - Composites own one reference to each child, never a copy
//! - The backend mechanism is dropped exactly once, with the last reference

pub mod backend;
pub mod catalog;
pub mod credential;
pub mod factory;
pub mod tls;
pub mod types;

pub use backend::{BackendRequest, CredentialBackend, DefaultBackend, SecurityMechanism};
pub use catalog::{CatalogError, CredentialCatalog};
pub use credential::{Credential, CredentialSpec};
pub use factory::CredentialFactory;
pub use types::{
    BackendError, CallTokenOptions, CredentialError, CredentialKind, CredentialResult, KeyCertPair,
    TransportSecurityOptions,
};
