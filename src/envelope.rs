//! # Result Envelope
//!
//! Every boundary call returns an [`Envelope`]: a [`ResultCode`] plus an
//! [`OwnedBytes`] payload.
//!
//! | Code | Payload |
//! |------|---------|
//! | [`ResultCode::Ok`] | JSON success value, or empty for unit operations |
//! | [`ResultCode::InvalidArgument`] | JSON [`ErrorPayload`] |
//! | [`ResultCode::RuntimeError`] | JSON [`ErrorPayload`] |
//!
//! Internally everything stays `Result<T, DocError>`; flattening happens
//! only here.
//!
//! ## Ownership
//!
//! The payload is a boxed byte slice whose ownership moves to the receiver.
//! It is released by value through [`OwnedBytes::release`] (or
//! `docfs_owned_bytes_free` across the C boundary), exactly once.

use std::ptr;

use serde::Serialize;

use crate::{DocError, ErrorPayload};

/// Boundary result code.
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResultCode {
    /// Success.
    Ok = 0,
    /// Malformed input, detected before any I/O.
    InvalidArgument = 1,
    /// Any failure past argument validation.
    RuntimeError = 2,
}

/// Heap buffer whose ownership is transferred to the receiver.
///
/// An empty buffer is `{ptr: null, len: 0}` and owns nothing.
#[repr(C)]
#[derive(Debug)]
pub struct OwnedBytes {
    /// Start of the buffer, null when empty.
    pub ptr: *mut u8,
    /// Length in bytes.
    pub len: usize,
}

impl OwnedBytes {
    /// A buffer that owns nothing.
    pub const fn empty() -> Self {
        Self {
            ptr: ptr::null_mut(),
            len: 0,
        }
    }

    /// Take ownership of `bytes`.
    pub fn from_vec(bytes: Vec<u8>) -> Self {
        if bytes.is_empty() {
            return Self::empty();
        }
        let boxed = bytes.into_boxed_slice();
        let len = boxed.len();
        let ptr = Box::into_raw(boxed).cast::<u8>();
        Self { ptr, len }
    }

    /// Returns `true` if the buffer owns nothing.
    pub fn is_empty(&self) -> bool {
        self.ptr.is_null() || self.len == 0
    }

    /// View the bytes.
    ///
    /// # Safety
    ///
    /// `self` must have been produced by [`OwnedBytes::from_vec`] and not yet
    /// released.
    pub unsafe fn as_slice(&self) -> &[u8] {
        if self.is_empty() {
            return &[];
        }
        // SAFETY: the caller guarantees ptr/len describe a live allocation
        // from `from_vec`.
        unsafe { std::slice::from_raw_parts(self.ptr, self.len) }
    }

    /// Take the bytes back as a `Vec`.
    ///
    /// # Safety
    ///
    /// `self` must have been produced by [`OwnedBytes::from_vec`] and not yet
    /// released. Copies of the struct must not be released afterwards.
    pub unsafe fn into_vec(self) -> Vec<u8> {
        if self.is_empty() {
            return Vec::new();
        }
        // SAFETY: ptr/len came from `Box::<[u8]>::into_raw` in `from_vec`
        // and ownership is consumed here.
        let boxed = unsafe { Box::from_raw(ptr::slice_from_raw_parts_mut(self.ptr, self.len)) };
        boxed.into_vec()
    }

    /// Free the buffer. Empty buffers are a no-op.
    ///
    /// # Safety
    ///
    /// Same contract as [`OwnedBytes::into_vec`].
    pub unsafe fn release(self) {
        // SAFETY: forwarded caller contract.
        drop(unsafe { self.into_vec() });
    }
}

/// Outcome of one boundary call.
#[repr(C)]
#[derive(Debug)]
pub struct Envelope {
    /// Result code.
    pub code: ResultCode,
    /// Success value or structured error, owned by the receiver.
    pub payload: OwnedBytes,
}

impl Envelope {
    /// Success with an empty payload.
    pub fn ok_empty() -> Self {
        Self {
            code: ResultCode::Ok,
            payload: OwnedBytes::empty(),
        }
    }

    /// Success or failure of an operation returning a value.
    pub fn from_result<T: Serialize>(operation: &str, result: Result<T, DocError>) -> Self {
        match result.and_then(|value| serialize(&value)) {
            Ok(bytes) => Self {
                code: ResultCode::Ok,
                payload: OwnedBytes::from_vec(bytes),
            },
            Err(err) => Self::from_error(operation, &err),
        }
    }

    /// Success or failure of an operation with no return value.
    pub fn from_unit(operation: &str, result: Result<(), DocError>) -> Self {
        match result {
            Ok(()) => Self::ok_empty(),
            Err(err) => Self::from_error(operation, &err),
        }
    }

    /// Structured error payload for `err`.
    pub fn from_error(operation: &str, err: &DocError) -> Self {
        let payload = err.to_payload(operation);
        Self {
            code: err.code(),
            payload: OwnedBytes::from_vec(error_bytes(&payload)),
        }
    }
}

fn serialize<T: Serialize>(value: &T) -> Result<Vec<u8>, DocError> {
    serde_json::to_vec(value)
        .map_err(|err| DocError::Internal(format!("failed to serialize payload: {err}")))
}

fn error_bytes(payload: &ErrorPayload) -> Vec<u8> {
    serde_json::to_vec(payload).unwrap_or_else(|_| {
        br#"{"kind":"internal","message":"failed to serialize error","operation":""}"#.to_vec()
    })
}
