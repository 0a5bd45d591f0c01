//! C ABI entry points.
//!
//! Every function returns an [`ErrorCode`] as `i32` and is panic-safe: a
//! panic inside the runtime is reported as `Internal` instead of unwinding
//! into the caller. Handles travel as [`RawHandle`] values; optional byte
//! arguments as [`RawBytes`] with a null `data` pointer meaning "absent".

use std::panic::{catch_unwind, AssertUnwindSafe};

use crate::boundary::error::{BoundaryError, BoundaryResult, ErrorCode};
use crate::boundary::handle::BoundaryHandle;
use crate::boundary::runtime::{global, Runtime};
use crate::boundary::value::BoundaryValue;

/// A boundary handle as seen by C. `id == 0` is the null handle.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawHandle {
    pub type_tag: u32,
    pub id: u64,
    pub nonce: u64,
}

impl From<BoundaryHandle> for RawHandle {
    fn from(handle: BoundaryHandle) -> Self {
        let (type_tag, id, nonce) = handle.into_raw_parts();
        Self { type_tag, id, nonce }
    }
}

impl From<RawHandle> for BoundaryHandle {
    fn from(raw: RawHandle) -> Self {
        BoundaryHandle::from_raw_parts(raw.type_tag, raw.id, raw.nonce)
    }
}

/// Borrowed byte buffer. `data` may be null to mark the argument absent.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct RawBytes {
    pub data: *const u8,
    pub len: usize,
}

impl RawBytes {
    pub const fn absent() -> Self {
        Self {
            data: std::ptr::null(),
            len: 0,
        }
    }

    pub fn from_slice(bytes: &[u8]) -> Self {
        Self {
            data: bytes.as_ptr(),
            len: bytes.len(),
        }
    }

    /// # Safety
    /// `data` must be null or point to `len` readable bytes.
    unsafe fn to_value(self) -> BoundaryValue {
        if self.data.is_null() {
            return BoundaryValue::Null;
        }
        BoundaryValue::Bytes(std::slice::from_raw_parts(self.data, self.len).to_vec())
    }

    /// Strings are passed as UTF-8 bytes; anything else is a non-string.
    ///
    /// # Safety
    /// Same as [`RawBytes::to_value`].
    unsafe fn to_string_value(self) -> BoundaryValue {
        match self.to_value() {
            BoundaryValue::Bytes(bytes) => match String::from_utf8(bytes) {
                Ok(text) => BoundaryValue::String(text),
                Err(err) => BoundaryValue::Bytes(err.into_bytes()),
            },
            other => other,
        }
    }
}

fn guarded(f: impl FnOnce() -> ErrorCode) -> i32 {
    match catch_unwind(AssertUnwindSafe(f)) {
        Ok(code) => code as i32,
        Err(_) => {
            tracing::error!("Panic caught at the C boundary");
            ErrorCode::Internal as i32
        }
    }
}

/// # Safety
/// `out` must be null or valid for a write of one `RawHandle`.
unsafe fn emit(result: BoundaryResult<BoundaryHandle>, out: *mut RawHandle) -> ErrorCode {
    match result {
        Err(err) => err.code(),
        Ok(handle) if out.is_null() => {
            // Nobody could release it.
            let _ = runtime().credentials().release(&handle);
            ErrorCode::NullPointer
        }
        Ok(handle) => {
            out.write(handle.into());
            ErrorCode::Ok
        }
    }
}

fn runtime() -> &'static Runtime {
    global()
}

/// Take one reference on the process lifecycle, starting the runtime on
/// the first call.
#[no_mangle]
pub extern "C" fn rpc_embed_init() -> i32 {
    guarded(|| match runtime().init() {
        Ok(()) => ErrorCode::Ok,
        Err(err) => BoundaryError::from(err).code(),
    })
}

/// Give back one reference. Releasing more than was acquired aborts the
/// process.
#[no_mangle]
pub extern "C" fn rpc_embed_shutdown() -> i32 {
    guarded(|| match runtime().try_shutdown() {
        Ok(()) => ErrorCode::Ok,
        Err(err) => {
            tracing::error!(error = %err, "Aborting");
            std::process::abort()
        }
    })
}

/// # Safety
/// `out` must be valid for a write of one `RawHandle`.
#[no_mangle]
pub unsafe extern "C" fn rpc_embed_credentials_create_default(out: *mut RawHandle) -> i32 {
    guarded(|| emit(runtime().credentials().create_default(), out))
}

/// # Safety
/// Each `RawBytes` must have a null `data` or point to `len` readable bytes.
/// `out` must be valid for a write of one `RawHandle`.
#[no_mangle]
pub unsafe extern "C" fn rpc_embed_credentials_create_ssl(
    root_certs: RawBytes,
    private_key: RawBytes,
    cert_chain: RawBytes,
    out: *mut RawHandle,
) -> i32 {
    guarded(|| {
        let result = runtime().credentials().create_ssl(
            &root_certs.to_value(),
            &private_key.to_value(),
            &cert_chain.to_value(),
        );
        emit(result, out)
    })
}

/// # Safety
/// `out` must be valid for a write of one `RawHandle`.
#[no_mangle]
pub unsafe extern "C" fn rpc_embed_credentials_create_composite(
    first: RawHandle,
    second: RawHandle,
    out: *mut RawHandle,
) -> i32 {
    guarded(|| {
        let first = BoundaryValue::Handle(first.into());
        let second = BoundaryValue::Handle(second.into());
        emit(runtime().credentials().create_composite(&first, &second), out)
    })
}

/// # Safety
/// `out` must be valid for a write of one `RawHandle`.
#[no_mangle]
pub unsafe extern "C" fn rpc_embed_credentials_create_gce(out: *mut RawHandle) -> i32 {
    guarded(|| emit(runtime().credentials().create_gce(), out))
}

/// # Safety
/// `out` must be valid for a write of one `RawHandle`.
#[no_mangle]
pub unsafe extern "C" fn rpc_embed_credentials_create_fake(out: *mut RawHandle) -> i32 {
    guarded(|| emit(runtime().credentials().create_fake(), out))
}

/// `token` and `selector` are UTF-8 strings.
///
/// # Safety
/// Each `RawBytes` must have a null `data` or point to `len` readable bytes.
/// `out` must be valid for a write of one `RawHandle`.
#[no_mangle]
pub unsafe extern "C" fn rpc_embed_credentials_create_iam(
    token: RawBytes,
    selector: RawBytes,
    out: *mut RawHandle,
) -> i32 {
    guarded(|| {
        let token = token.to_string_value();
        let selector = selector.to_string_value();
        emit(runtime().credentials().create_iam(&token, &selector), out)
    })
}

/// Drop the reference held by `handle`. The null handle is accepted.
#[no_mangle]
pub extern "C" fn rpc_embed_credentials_release(handle: RawHandle) -> i32 {
    guarded(|| match runtime().credentials().release(&handle.into()) {
        Ok(()) => ErrorCode::Ok,
        Err(err) => err.code(),
    })
}

/// Write the credential kind index of `handle` to `out_kind`, or `-1` for
/// the null handle.
///
/// # Safety
/// `out_kind` must be valid for a write of one `i32`.
#[no_mangle]
pub unsafe extern "C" fn rpc_embed_credentials_kind(handle: RawHandle, out_kind: *mut i32) -> i32 {
    guarded(|| {
        if out_kind.is_null() {
            return ErrorCode::NullPointer;
        }
        match runtime().credentials().unwrap(&handle.into()) {
            Ok(credential) => {
                let kind = credential.map_or(-1, |c| c.kind().index() as i32);
                out_kind.write(kind);
                ErrorCode::Ok
            }
            Err(err) => err.code(),
        }
    })
}
