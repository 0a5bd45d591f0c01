//! Dynamically typed arguments supplied by the foreign caller.

use crate::boundary::error::{BoundaryError, BoundaryResult};
use crate::boundary::handle::BoundaryHandle;

/// One argument as the embedding environment hands it over.
#[derive(Debug, Clone, PartialEq)]
pub enum BoundaryValue {
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Bytes(Vec<u8>),
    Handle(BoundaryHandle),
}

impl BoundaryValue {
    pub fn type_name(&self) -> &'static str {
        match self {
            BoundaryValue::Undefined => "undefined",
            BoundaryValue::Null => "null",
            BoundaryValue::Bool(_) => "bool",
            BoundaryValue::Number(_) => "number",
            BoundaryValue::String(_) => "string",
            BoundaryValue::Bytes(_) => "bytes",
            BoundaryValue::Handle(_) => "handle",
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, BoundaryValue::Undefined | BoundaryValue::Null)
    }

    /// Bytes, or `None` when the argument was omitted.
    pub fn optional_bytes(&self, function: &'static str, position: &'static str) -> BoundaryResult<Option<Vec<u8>>> {
        match self {
            BoundaryValue::Bytes(bytes) => Ok(Some(bytes.clone())),
            value if value.is_absent() => Ok(None),
            _ => Err(BoundaryError::InvalidArgumentType {
                function,
                position,
                expected: "bytes or absent",
            }),
        }
    }

    pub fn string(&self, function: &'static str, position: &'static str) -> BoundaryResult<&str> {
        match self {
            BoundaryValue::String(value) => Ok(value),
            _ => Err(BoundaryError::InvalidArgumentType {
                function,
                position,
                expected: "a string",
            }),
        }
    }

    /// A non-null handle. Tag and liveness are checked by the table.
    pub fn handle(&self, function: &'static str, position: &'static str) -> BoundaryResult<BoundaryHandle> {
        match self {
            BoundaryValue::Handle(handle) if !handle.is_null() => Ok(*handle),
            _ => Err(BoundaryError::InvalidArgumentType {
                function,
                position,
                expected: "a credential handle",
            }),
        }
    }
}

impl From<&str> for BoundaryValue {
    fn from(value: &str) -> Self {
        BoundaryValue::String(value.to_string())
    }
}

impl From<String> for BoundaryValue {
    fn from(value: String) -> Self {
        BoundaryValue::String(value)
    }
}

impl From<Vec<u8>> for BoundaryValue {
    fn from(value: Vec<u8>) -> Self {
        BoundaryValue::Bytes(value)
    }
}

impl From<&[u8]> for BoundaryValue {
    fn from(value: &[u8]) -> Self {
        BoundaryValue::Bytes(value.to_vec())
    }
}

impl From<bool> for BoundaryValue {
    fn from(value: bool) -> Self {
        BoundaryValue::Bool(value)
    }
}

impl From<f64> for BoundaryValue {
    fn from(value: f64) -> Self {
        BoundaryValue::Number(value)
    }
}

impl From<BoundaryHandle> for BoundaryValue {
    fn from(value: BoundaryHandle) -> Self {
        BoundaryValue::Handle(value)
    }
}

impl<T: Into<BoundaryValue>> From<Option<T>> for BoundaryValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(BoundaryValue::Null, Into::into)
    }
}
