//! Directory operations for storage backends.

use crate::{DirEntry, DocError, ResourceUri};

/// Directory operations for a storage backend.
///
/// # Object Safety
///
/// This trait is object-safe and can be used as `dyn BackendDir`.
pub trait BackendDir: Send + Sync {
    /// List the immediate children of a directory, in backend order.
    ///
    /// # Errors
    ///
    /// - [`DocError::NotFound`] if the URI does not exist
    /// - [`DocError::NotADirectory`] if the URI is a file
    fn read_dir(&self, uri: &ResourceUri) -> Result<ReadDirIter, DocError>;

    /// Create a directory (parent must exist).
    ///
    /// # Errors
    ///
    /// - [`DocError::NotFound`] if the parent does not exist
    /// - [`DocError::AlreadyExists`] if the URI already exists
    fn create_dir(&self, uri: &ResourceUri) -> Result<(), DocError>;

    /// Create a directory and all missing ancestors.
    ///
    /// Idempotent: succeeds if the directory already exists.
    ///
    /// # Errors
    ///
    /// - [`DocError::AlreadyExists`] if the URI or an ancestor is a file
    fn create_dir_all(&self, uri: &ResourceUri) -> Result<(), DocError>;

    /// Remove an empty directory.
    ///
    /// # Errors
    ///
    /// - [`DocError::NotFound`] if the URI does not exist
    /// - [`DocError::NotADirectory`] if the URI is a file
    /// - [`DocError::DirectoryNotEmpty`] if the directory has children
    fn remove_dir(&self, uri: &ResourceUri) -> Result<(), DocError>;

    /// Remove a directory and all its descendants.
    ///
    /// Atomicity is whatever the backend itself provides; on failure part of
    /// the tree may already be gone.
    ///
    /// # Errors
    ///
    /// - [`DocError::NotFound`] if the URI does not exist
    /// - [`DocError::NotADirectory`] if the URI is a file
    fn remove_dir_all(&self, uri: &ResourceUri) -> Result<(), DocError>;
}

impl<T: BackendDir + ?Sized> BackendDir for Box<T> {
    fn read_dir(&self, uri: &ResourceUri) -> Result<ReadDirIter, DocError> {
        (**self).read_dir(uri)
    }

    fn create_dir(&self, uri: &ResourceUri) -> Result<(), DocError> {
        (**self).create_dir(uri)
    }

    fn create_dir_all(&self, uri: &ResourceUri) -> Result<(), DocError> {
        (**self).create_dir_all(uri)
    }

    fn remove_dir(&self, uri: &ResourceUri) -> Result<(), DocError> {
        (**self).remove_dir(uri)
    }

    fn remove_dir_all(&self, uri: &ResourceUri) -> Result<(), DocError> {
        (**self).remove_dir_all(uri)
    }
}

/// Iterator over directory entries.
///
/// - Outer `Result` (from [`BackendDir::read_dir`]) = "can I open this directory?"
/// - Inner `Result` (per item) = "can I read this entry?"
pub struct ReadDirIter(Box<dyn Iterator<Item = Result<DirEntry, DocError>> + Send + 'static>);

impl ReadDirIter {
    /// Create from any compatible iterator.
    pub fn new<I>(iter: I) -> Self
    where
        I: Iterator<Item = Result<DirEntry, DocError>> + Send + 'static,
    {
        Self(Box::new(iter))
    }

    /// Create from a pre-collected vector.
    pub fn from_vec(entries: Vec<Result<DirEntry, DocError>>) -> Self {
        Self(Box::new(entries.into_iter()))
    }

    /// Collect all entries, short-circuiting on first error.
    pub fn collect_all(self) -> Result<Vec<DirEntry>, DocError> {
        self.collect()
    }
}

impl Iterator for ReadDirIter {
    type Item = Result<DirEntry, DocError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.0.next()
    }
}
