//! Boundary error definitions.

use thiserror::Error;

use crate::boundary::handle::{HandleError, TypeTag};
use crate::credentials::CredentialError;
use crate::lifecycle::LifecycleError;

/// Errors surfaced to the foreign caller.
#[derive(Debug, Error)]
pub enum BoundaryError {
    /// A caller-supplied value has the wrong shape.
    #[error("{function}'s {position} argument must be {expected}")]
    InvalidArgumentType {
        function: &'static str,
        position: &'static str,
        expected: &'static str,
    },

    /// A value of the right shape violates a constraint.
    #[error("invalid argument: {0}")]
    InvalidArgumentValue(String),

    /// A handle's tag names a different type; its payload was not touched.
    #[error("type confusion: expected handle tagged {expected}, found {found}")]
    TypeConfusion { expected: TypeTag, found: TypeTag },

    /// The handle was already released, or never issued by this table.
    #[error("stale or unknown handle")]
    StaleHandle,

    /// The credential backend failed.
    #[error("{0}")]
    Backend(CredentialError),

    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),
}

impl From<CredentialError> for BoundaryError {
    fn from(err: CredentialError) -> Self {
        match err {
            CredentialError::InvalidArgumentValue(message) => BoundaryError::InvalidArgumentValue(message),
            err @ CredentialError::Backend { .. } => BoundaryError::Backend(err),
        }
    }
}

impl From<HandleError> for BoundaryError {
    fn from(err: HandleError) -> Self {
        match err {
            HandleError::TypeConfusion { expected, found } => BoundaryError::TypeConfusion { expected, found },
            HandleError::Stale => BoundaryError::StaleHandle,
        }
    }
}

impl BoundaryError {
    pub fn code(&self) -> ErrorCode {
        match self {
            BoundaryError::InvalidArgumentType { .. } => ErrorCode::InvalidArgumentType,
            BoundaryError::InvalidArgumentValue(_) => ErrorCode::InvalidArgumentValue,
            BoundaryError::TypeConfusion { .. } => ErrorCode::TypeConfusion,
            BoundaryError::StaleHandle => ErrorCode::StaleHandle,
            BoundaryError::Backend(_) => ErrorCode::Backend,
            BoundaryError::Lifecycle(LifecycleError::Imbalance) => ErrorCode::LifecycleImbalance,
            BoundaryError::Lifecycle(LifecycleError::SubsystemStart { .. }) => ErrorCode::SubsystemStart,
        }
    }
}

/// Result type for boundary operations.
pub type BoundaryResult<T> = Result<T, BoundaryError>;

/// Status codes returned through the C ABI.
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    Ok = 0,
    InvalidArgumentType = 1,
    InvalidArgumentValue = 2,
    TypeConfusion = 3,
    StaleHandle = 4,
    Backend = 5,
    LifecycleImbalance = 6,
    SubsystemStart = 7,
    NullPointer = 8,
    Internal = 9,
}

impl ErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::Ok => "ok",
            ErrorCode::InvalidArgumentType => "invalid_argument_type",
            ErrorCode::InvalidArgumentValue => "invalid_argument_value",
            ErrorCode::TypeConfusion => "type_confusion",
            ErrorCode::StaleHandle => "stale_handle",
            ErrorCode::Backend => "backend",
            ErrorCode::LifecycleImbalance => "lifecycle_imbalance",
            ErrorCode::SubsystemStart => "subsystem_start",
            ErrorCode::NullPointer => "null_pointer",
            ErrorCode::Internal => "internal",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::{BackendError, CredentialKind};

    #[test]
    fn test_credential_errors_map_to_taxonomy() {
        let err: BoundaryError =
            CredentialError::InvalidArgumentValue("auth token must not be empty".into()).into();
        assert_eq!(err.code(), ErrorCode::InvalidArgumentValue);
        assert_eq!(err.to_string(), "invalid argument: auth token must not be empty");

        let err: BoundaryError = CredentialError::Backend {
            kind: CredentialKind::Default,
            source: BackendError::Unsupported(CredentialKind::Default),
        }
        .into();
        assert_eq!(err.code(), ErrorCode::Backend);
    }

    #[test]
    fn test_argument_type_message() {
        let err = BoundaryError::InvalidArgumentType {
            function: "create_ssl",
            position: "first",
            expected: "bytes",
        };
        assert_eq!(err.to_string(), "create_ssl's first argument must be bytes");
        assert_eq!(err.code() as i32, 1);
    }

    #[test]
    fn test_lifecycle_codes() {
        let err = BoundaryError::from(LifecycleError::Imbalance);
        assert_eq!(err.code(), ErrorCode::LifecycleImbalance);
        assert_eq!(err.code().as_str(), "lifecycle_imbalance");
    }
}
