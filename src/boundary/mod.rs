//! Boundary subsystem: what the embedding environment sees.
//!
//! # Data Flow
//! ```text
//! foreign caller (BoundaryValue args, or the C ABI in ffi.rs)
//!     → wrapper.rs (argument shape checks)
//!     → CredentialFactory (value checks, construction)
//!     → handle.rs (tagged handle owning one reference)
//!     → caller
//!
//! init / shutdown
//!     → runtime.rs (process-wide Runtime)
//!     → ProcessLifecycle
//! ```
//!
//! # Design Decisions
//! - Handles never carry pointers; they index a table and are checked by tag
//!   and nonce before anything is resolved
//! - Argument errors leave no partial state behind

pub mod error;
pub mod ffi;
pub mod handle;
pub mod runtime;
pub mod value;
pub mod wrapper;

pub use error::{BoundaryError, BoundaryResult, ErrorCode};
pub use handle::{BoundaryHandle, HandleError, HandleTable, TypeTag};
pub use runtime::{global, install_global, Runtime};
pub use value::BoundaryValue;
pub use wrapper::{CredentialsWrapper, CREDENTIAL_TYPE_TAG};
