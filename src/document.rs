//! # Versioned Documents
//!
//! Markdown access with optimistic concurrency.
//!
//! A fingerprint is `hex(sha256(revision || 0x00 || content))`. `revision`
//! is the backend's per-write token from [`Metadata`](crate::Metadata), so two
//! reads of an untouched document agree, and any write (even one storing
//! identical bytes) produces a new fingerprint.
//!
//! Saves against the same URI are linearized through [`DocumentLocks`]: the
//! fingerprint comparison and the write happen under one per-URI lock.
//!
//! Payloads also carry `updated_at`, the backend modification time in
//! RFC 3339.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::SystemTime;

use chrono::{DateTime, SecondsFormat, Utc};
use sha2::{Digest, Sha256};
use tracing::{debug, warn};

use crate::{Backend, DocError, ResourceUri, RuntimeConfig, SavedDocument, VersionedDocument};

/// Compute the fingerprint for `content` stored under `revision`.
///
/// ```rust
/// use docfs_runtime::fingerprint;
///
/// let a = fingerprint("1", b"# Hi");
/// assert_eq!(a.len(), 64);
/// assert_eq!(a, fingerprint("1", b"# Hi"));
/// assert_ne!(a, fingerprint("2", b"# Hi"));
/// ```
pub fn fingerprint(revision: &str, content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(revision.as_bytes());
    hasher.update([0u8]);
    hasher.update(content);
    hex::encode(hasher.finalize())
}

/// RFC 3339 rendering of a backend modification time.
pub(crate) fn timestamp(modified: SystemTime) -> String {
    DateTime::<Utc>::from(modified).to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parse `raw` and check that it names a markdown document.
///
/// # Errors
///
/// - [`DocError::InvalidUri`] if `raw` does not normalize
/// - [`DocError::InvalidArgument`] if the URI is the root or its extension is
///   not one of `config.markdown_extensions`
pub(crate) fn markdown_target(
    raw: &str,
    config: &RuntimeConfig,
) -> Result<ResourceUri, DocError> {
    let uri = ResourceUri::parse(raw.trim())?;
    if uri.is_root() {
        return Err(DocError::InvalidArgument {
            field: "uri",
            reason: "a document cannot be the root".into(),
        });
    }
    match uri.extension() {
        Some(ext) if config.accepts_extension(&ext) => Ok(uri),
        _ => Err(DocError::InvalidArgument {
            field: "uri",
            reason: format!(
                "{uri} is not a markdown document (accepted: {})",
                config.markdown_extensions.join(", ")
            ),
        }),
    }
}

const PRUNE_THRESHOLD: usize = 64;

/// Per-URI mutual exclusion for document access.
#[derive(Debug, Default)]
pub(crate) struct DocumentLocks {
    slots: Mutex<HashMap<ResourceUri, Arc<Mutex<()>>>>,
}

impl DocumentLocks {
    /// The lock slot for `uri`. Slots nobody holds are pruned once the table
    /// grows past a small threshold.
    fn slot(&self, uri: &ResourceUri) -> Arc<Mutex<()>> {
        // Slots guard no data, so poisoning carries no meaning here.
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        if slots.len() >= PRUNE_THRESHOLD {
            slots.retain(|_, slot| Arc::strong_count(slot) > 1);
        }
        Arc::clone(slots.entry(uri.clone()).or_default())
    }

    /// Run `f` while holding the lock for `uri`.
    pub(crate) fn with<T>(&self, uri: &ResourceUri, f: impl FnOnce() -> T) -> T {
        let slot = self.slot(uri);
        let _guard = slot.lock().unwrap_or_else(PoisonError::into_inner);
        f()
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

struct Stored {
    fingerprint: String,
    bytes: Vec<u8>,
    modified: SystemTime,
}

/// What is stored at `uri`, `None` if nothing is.
fn current<B: Backend + ?Sized>(
    backend: &B,
    uri: &ResourceUri,
) -> Result<Option<Stored>, DocError> {
    let meta = match backend.metadata(uri) {
        Ok(meta) => meta,
        Err(DocError::NotFound { .. }) => return Ok(None),
        Err(err) => return Err(err),
    };
    if meta.is_dir() {
        return Err(DocError::NotAFile {
            uri: uri.to_string(),
        });
    }
    let bytes = backend.read(uri)?;
    Ok(Some(Stored {
        fingerprint: fingerprint(&meta.revision, &bytes),
        bytes,
        modified: meta.modified,
    }))
}

/// Read a document and its fingerprint.
///
/// # Errors
///
/// - [`DocError::NotFound`] if nothing is stored at `uri`
/// - [`DocError::NotAFile`] if `uri` is a directory
/// - [`DocError::InvalidData`] if the bytes are not UTF-8
pub(crate) fn load<B: Backend + ?Sized>(
    backend: &B,
    uri: &ResourceUri,
) -> Result<VersionedDocument, DocError> {
    let stored = current(backend, uri)?.ok_or_else(|| DocError::NotFound {
        uri: uri.to_string(),
    })?;
    let size = stored.bytes.len() as u64;
    let content = String::from_utf8(stored.bytes).map_err(|err| DocError::InvalidData {
        uri: uri.to_string(),
        details: err.utf8_error().to_string(),
    })?;
    Ok(VersionedDocument {
        uri: uri.clone(),
        content,
        fingerprint: stored.fingerprint,
        size,
        updated_at: timestamp(stored.modified),
    })
}

/// Write a document, optionally guarded by the fingerprint the caller last
/// observed. Missing parent directories are created.
///
/// The caller must hold the [`DocumentLocks`] slot for `uri`.
///
/// # Errors
///
/// - [`DocError::NotFound`] if `expected` is set and nothing is stored
/// - [`DocError::Conflict`] if `expected` differs from the stored fingerprint;
///   the stored content is left untouched
/// - [`DocError::NotAFile`] if `uri` is a directory
pub(crate) fn save<B: Backend + ?Sized>(
    backend: &B,
    uri: &ResourceUri,
    content: &str,
    expected: Option<&str>,
) -> Result<SavedDocument, DocError> {
    if let Some(expected) = expected {
        match current(backend, uri)? {
            None => {
                return Err(DocError::NotFound {
                    uri: uri.to_string(),
                });
            }
            Some(stored) if stored.fingerprint != expected => {
                let actual = stored.fingerprint;
                warn!(uri = %uri, expected, actual = %actual, "fingerprint conflict");
                return Err(DocError::Conflict {
                    uri: uri.to_string(),
                    expected: expected.to_string(),
                    actual,
                });
            }
            Some(_) => {}
        }
    }

    if let Some(parent) = uri.parent() {
        backend.create_dir_all(&parent)?;
    }
    backend.write(uri, content.as_bytes())?;
    let meta = backend.metadata(uri)?;
    let fingerprint = fingerprint(&meta.revision, content.as_bytes());
    debug!(
        uri = %uri,
        size = content.len(),
        conditional = expected.is_some(),
        "document saved"
    );
    Ok(SavedDocument {
        uri: uri.clone(),
        fingerprint,
        size: content.len() as u64,
        updated_at: timestamp(meta.modified),
    })
}
