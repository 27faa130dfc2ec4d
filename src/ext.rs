//! # Extension Traits
//!
//! Convenience methods available on every backend through a blanket
//! implementation.
//!
//! | Method | Description |
//! |--------|-------------|
//! | [`kind_of`](BackendExt::kind_of) | Entry kind, `None` when absent |
//! | [`is_file`](BackendExt::is_file) | Check if URI is a regular file |
//! | [`is_dir`](BackendExt::is_dir) | Check if URI is a directory |

use crate::{BackendRead, DocError, EntryKind, ResourceUri};

/// Extension methods for any backend.
///
/// # Example
///
/// ```rust
/// use docfs_runtime::{BackendDir, BackendExt, MemoryBackend, ResourceUri};
///
/// let backend = MemoryBackend::new("doc");
/// let notes = ResourceUri::parse("/notes").unwrap();
/// backend.create_dir_all(&notes).unwrap();
/// assert!(backend.is_dir(&notes).unwrap());
/// assert!(!backend.is_file(&notes).unwrap());
/// ```
pub trait BackendExt: BackendRead {
    /// Kind of the entry at `uri`.
    ///
    /// Returns `Ok(None)` if the URI doesn't exist (not an error).
    fn kind_of(&self, uri: &ResourceUri) -> Result<Option<EntryKind>, DocError> {
        match self.metadata(uri) {
            Ok(m) => Ok(Some(m.kind)),
            Err(DocError::NotFound { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Check if the URI points to a regular file.
    ///
    /// Returns `Ok(false)` if the URI doesn't exist.
    fn is_file(&self, uri: &ResourceUri) -> Result<bool, DocError> {
        Ok(self.kind_of(uri)? == Some(EntryKind::File))
    }

    /// Check if the URI points to a directory.
    ///
    /// Returns `Ok(false)` if the URI doesn't exist.
    fn is_dir(&self, uri: &ResourceUri) -> Result<bool, DocError> {
        Ok(self.kind_of(uri)? == Some(EntryKind::Directory))
    }
}

// Blanket implementation - any backend gets BackendExt for free
impl<B: BackendRead + ?Sized> BackendExt for B {}
