//! Lifecycle and reachability for storage backends.

use crate::{BackendInfo, DocError};

/// Setup and health checks for a storage backend.
pub trait BackendProbe: Send + Sync {
    /// Variant and root identity. Never performs I/O.
    fn info(&self) -> BackendInfo;

    /// Prepare the backend for use (verify or create the root, connect).
    ///
    /// # Errors
    ///
    /// - [`DocError::BackendUnavailable`] if the root is unusable
    fn setup(&self, create_root: bool) -> Result<(), DocError>;

    /// Check reachability without mutating anything.
    ///
    /// # Errors
    ///
    /// - [`DocError::BackendUnavailable`] with the reason the probe failed
    fn probe(&self) -> Result<(), DocError>;
}

impl<T: BackendProbe + ?Sized> BackendProbe for Box<T> {
    fn info(&self) -> BackendInfo {
        (**self).info()
    }

    fn setup(&self, create_root: bool) -> Result<(), DocError> {
        (**self).setup(create_root)
    }

    fn probe(&self) -> Result<(), DocError> {
        (**self).probe()
    }
}
