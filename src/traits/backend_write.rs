//! Write operations for storage backends.

use crate::{DocError, ResourceUri};

/// Write operations for a storage backend.
///
/// # Thread Safety
///
/// All implementations must be `Send + Sync`. Methods use `&self` to allow
/// concurrent access.
///
/// # Object Safety
///
/// This trait is object-safe and can be used as `dyn BackendWrite`.
pub trait BackendWrite: Send + Sync {
    /// Write data to a file (creates if not exists, replaces if exists).
    ///
    /// Parent directories must exist. Use
    /// [`BackendDir::create_dir_all`](super::BackendDir::create_dir_all) first.
    /// A successful write must change the entry's
    /// [`Metadata::revision`](crate::Metadata::revision).
    ///
    /// # Errors
    ///
    /// - [`DocError::NotFound`] if the parent directory does not exist
    /// - [`DocError::NotAFile`] if the URI is a directory
    fn write(&self, uri: &ResourceUri, data: &[u8]) -> Result<(), DocError>;

    /// Remove a file.
    ///
    /// # Errors
    ///
    /// - [`DocError::NotFound`] if the file does not exist
    /// - [`DocError::NotAFile`] if the URI is a directory
    fn remove_file(&self, uri: &ResourceUri) -> Result<(), DocError>;
}

impl<T: BackendWrite + ?Sized> BackendWrite for Box<T> {
    fn write(&self, uri: &ResourceUri, data: &[u8]) -> Result<(), DocError> {
        (**self).write(uri, data)
    }

    fn remove_file(&self, uri: &ResourceUri) -> Result<(), DocError> {
        (**self).remove_file(uri)
    }
}
