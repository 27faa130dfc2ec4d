//! # C Boundary
//!
//! `extern "C"` entry points over [`Runtime`]. Declarations live in
//! `include/docfs_runtime.h`.
//!
//! Conventions:
//!
//! - Every function returns an [`Envelope`]; its payload must be released
//!   exactly once with [`docfs_owned_bytes_free`].
//! - Input strings are UTF-8, NUL-terminated and borrowed for the call only.
//!   URI and root arguments are trimmed; document content is taken verbatim.
//! - `expected_fingerprint` may be null; null or blank means no precondition.
//! - A panic never crosses the boundary: it is reported as
//!   `RuntimeError` with kind `internal`.
//! - The handle returned by [`docfs_runtime_new`] is released with
//!   [`docfs_runtime_free`]. Freeing while another thread is still inside a
//!   call on the same handle is undefined behavior; callers must join
//!   in-flight operations first.

use std::ffi::{CStr, c_char};
use std::panic::{AssertUnwindSafe, catch_unwind};

use tracing::error;

use crate::runtime::ops;
use crate::{DocError, Envelope, OwnedBytes, Runtime, RuntimeConfig};

const NEW: &str = "runtime.new";
const NEW_WITH_CONFIG: &str = "runtime.new_with_config";

fn guard(operation: &'static str, call: impl FnOnce() -> Envelope) -> Envelope {
    catch_unwind(AssertUnwindSafe(call)).unwrap_or_else(|_| {
        error!(operation, "panic contained at the C boundary");
        Envelope::from_error(
            operation,
            &DocError::Internal(format!("{operation} aborted unexpectedly")),
        )
    })
}

/// # Safety
///
/// `ptr` must be null or a NUL-terminated string valid for `'a`.
unsafe fn borrowed<'a>(ptr: *const c_char, field: &'static str) -> Result<&'a str, DocError> {
    if ptr.is_null() {
        return Err(DocError::InvalidArgument {
            field,
            reason: "must not be null".into(),
        });
    }
    // SAFETY: non-null and NUL-terminated per the caller contract.
    let raw = unsafe { CStr::from_ptr(ptr) };
    raw.to_str().map_err(|_| DocError::InvalidArgument {
        field,
        reason: "must be valid UTF-8".into(),
    })
}

/// # Safety
///
/// Same contract as [`borrowed`].
unsafe fn required<'a>(ptr: *const c_char, field: &'static str) -> Result<&'a str, DocError> {
    // SAFETY: forwarded caller contract.
    let value = unsafe { borrowed(ptr, field) }?.trim();
    if value.is_empty() {
        return Err(DocError::InvalidArgument {
            field,
            reason: "must be non-empty".into(),
        });
    }
    Ok(value)
}

/// # Safety
///
/// Same contract as [`borrowed`].
unsafe fn optional<'a>(
    ptr: *const c_char,
    field: &'static str,
) -> Result<Option<&'a str>, DocError> {
    if ptr.is_null() {
        return Ok(None);
    }
    // SAFETY: forwarded caller contract.
    let value = unsafe { borrowed(ptr, field) }?.trim();
    Ok((!value.is_empty()).then_some(value))
}

/// # Safety
///
/// `handle` must be null or a live pointer from [`docfs_runtime_new`].
unsafe fn runtime<'a>(handle: *const Runtime) -> Result<&'a Runtime, DocError> {
    // SAFETY: live or null per the caller contract.
    unsafe { handle.as_ref() }.ok_or_else(|| DocError::InvalidArgument {
        field: "handle",
        reason: "must not be null".into(),
    })
}

/// # Safety
///
/// Contracts of [`runtime`] and [`borrowed`].
unsafe fn runtime_and_uri<'a>(
    handle: *const Runtime,
    uri: *const c_char,
) -> Result<(&'a Runtime, &'a str), DocError> {
    // SAFETY: forwarded caller contract.
    unsafe { Ok((runtime(handle)?, required(uri, "uri")?)) }
}

/// # Safety
///
/// `out` must be non-null and point to writable storage for one pointer.
unsafe fn publish(
    operation: &'static str,
    out: *mut *mut Runtime,
    built: Result<Runtime, DocError>,
) -> Envelope {
    match built {
        Ok(runtime) => {
            // SAFETY: forwarded caller contract.
            unsafe { *out = Box::into_raw(Box::new(runtime)) };
            Envelope::ok_empty()
        }
        Err(err) => Envelope::from_error(operation, &err),
    }
}

fn null_out(operation: &'static str) -> Envelope {
    Envelope::from_error(
        operation,
        &DocError::InvalidArgument {
            field: "out",
            reason: "must not be null".into(),
        },
    )
}

/// Create a runtime bound to `root` with default settings. Performs no I/O.
///
/// On success `*out` receives the handle and the payload is empty.
///
/// # Safety
///
/// `root` must be null or a NUL-terminated string; `out` must be null or
/// point to writable storage for one pointer.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn docfs_runtime_new(
    root: *const c_char,
    out: *mut *mut Runtime,
) -> Envelope {
    guard(NEW, || {
        if out.is_null() {
            return null_out(NEW);
        }
        // SAFETY: caller contract.
        let built = unsafe { required(root, "root") }.and_then(Runtime::new);
        // SAFETY: `out` is non-null.
        unsafe { publish(NEW, out, built) }
    })
}

/// Create a runtime from a JSON [`RuntimeConfig`]. Performs no I/O.
///
/// # Safety
///
/// Same contract as [`docfs_runtime_new`].
#[unsafe(no_mangle)]
pub unsafe extern "C" fn docfs_runtime_new_with_config(
    config_json: *const c_char,
    out: *mut *mut Runtime,
) -> Envelope {
    guard(NEW_WITH_CONFIG, || {
        if out.is_null() {
            return null_out(NEW_WITH_CONFIG);
        }
        // SAFETY: caller contract.
        let built = unsafe { required(config_json, "config") }
            .and_then(RuntimeConfig::from_json)
            .and_then(Runtime::with_config);
        // SAFETY: `out` is non-null.
        unsafe { publish(NEW_WITH_CONFIG, out, built) }
    })
}

/// Set up the backend. Idempotent once ready; terminal on failure.
///
/// # Safety
///
/// `handle` must be null or a live handle.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn docfs_runtime_initialize(handle: *const Runtime) -> Envelope {
    guard(ops::INITIALIZE, || {
        // SAFETY: caller contract.
        let result = unsafe { runtime(handle) }.and_then(Runtime::initialize);
        Envelope::from_unit(ops::INITIALIZE, result)
    })
}

/// Backend status snapshot as JSON.
///
/// # Safety
///
/// `handle` must be null or a live handle.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn docfs_runtime_backend_status_json(handle: *const Runtime) -> Envelope {
    guard(ops::BACKEND_STATUS, || {
        // SAFETY: caller contract.
        let result = unsafe { runtime(handle) }.and_then(Runtime::backend_status);
        Envelope::from_result(ops::BACKEND_STATUS, result)
    })
}

/// Create a directory and its missing ancestors.
///
/// # Safety
///
/// `handle` must be null or a live handle; `uri` must be null or a
/// NUL-terminated string.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn docfs_runtime_mkdir(
    handle: *const Runtime,
    uri: *const c_char,
) -> Envelope {
    guard(ops::MKDIR, || {
        // SAFETY: caller contract.
        let result =
            unsafe { runtime_and_uri(handle, uri) }.and_then(|(rt, uri)| rt.mkdir(uri));
        Envelope::from_unit(ops::MKDIR, result)
    })
}

/// Directory listing as a JSON array of `{name, kind, uri, size}`.
///
/// # Safety
///
/// Same contract as [`docfs_runtime_mkdir`].
#[unsafe(no_mangle)]
pub unsafe extern "C" fn docfs_runtime_ls_json(
    handle: *const Runtime,
    uri: *const c_char,
    recursive: bool,
) -> Envelope {
    guard(ops::LS, || {
        // SAFETY: caller contract.
        let result =
            unsafe { runtime_and_uri(handle, uri) }.and_then(|(rt, uri)| rt.ls(uri, recursive));
        Envelope::from_result(ops::LS, result)
    })
}

/// Remove a file or directory.
///
/// # Safety
///
/// Same contract as [`docfs_runtime_mkdir`].
#[unsafe(no_mangle)]
pub unsafe extern "C" fn docfs_runtime_rm(
    handle: *const Runtime,
    uri: *const c_char,
    recursive: bool,
) -> Envelope {
    guard(ops::RM, || {
        // SAFETY: caller contract.
        let result =
            unsafe { runtime_and_uri(handle, uri) }.and_then(|(rt, uri)| rt.rm(uri, recursive));
        Envelope::from_unit(ops::RM, result)
    })
}

/// Markdown document as JSON `{uri, content, fingerprint, size}`.
///
/// # Safety
///
/// Same contract as [`docfs_runtime_mkdir`].
#[unsafe(no_mangle)]
pub unsafe extern "C" fn docfs_runtime_load_markdown_json(
    handle: *const Runtime,
    uri: *const c_char,
) -> Envelope {
    guard(ops::LOAD_MARKDOWN, || {
        // SAFETY: caller contract.
        let result =
            unsafe { runtime_and_uri(handle, uri) }.and_then(|(rt, uri)| rt.load_markdown(uri));
        Envelope::from_result(ops::LOAD_MARKDOWN, result)
    })
}

/// Write a markdown document; returns JSON `{uri, fingerprint, size}`.
///
/// # Safety
///
/// `handle` must be null or a live handle; `uri`, `content` and
/// `expected_fingerprint` must each be null or a NUL-terminated string.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn docfs_runtime_save_markdown_json(
    handle: *const Runtime,
    uri: *const c_char,
    content: *const c_char,
    expected_fingerprint: *const c_char,
) -> Envelope {
    guard(ops::SAVE_MARKDOWN, || {
        // SAFETY: caller contract.
        let args = unsafe {
            runtime(handle).and_then(|rt| {
                Ok((
                    rt,
                    required(uri, "uri")?,
                    borrowed(content, "content")?,
                    optional(expected_fingerprint, "expected_fingerprint")?,
                ))
            })
        };
        let result =
            args.and_then(|(rt, uri, content, expected)| rt.save_markdown(uri, content, expected));
        Envelope::from_result(ops::SAVE_MARKDOWN, result)
    })
}

/// Release a runtime handle. Null is a no-op.
///
/// # Safety
///
/// `handle` must be null or a handle from [`docfs_runtime_new`] that has not
/// been freed, and no other call on it may be in flight.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn docfs_runtime_free(handle: *mut Runtime) {
    if handle.is_null() {
        return;
    }
    // SAFETY: produced by `Box::into_raw` in `publish`, released once.
    let runtime = unsafe { Box::from_raw(handle) };
    let _ = catch_unwind(AssertUnwindSafe(move || drop(runtime)));
}

/// Release an envelope payload. Empty buffers are a no-op.
///
/// # Safety
///
/// `bytes` must be a payload returned by this library, released once.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn docfs_owned_bytes_free(bytes: OwnedBytes) {
    // SAFETY: caller contract.
    unsafe { bytes.release() };
}
