//! Read operations for storage backends.

use crate::{DocError, Metadata, ResourceUri};

/// Read operations for a storage backend.
///
/// # Thread Safety
///
/// All implementations must be `Send + Sync`. Methods use `&self` to allow
/// concurrent access; backends use interior mutability (`RwLock`, `Mutex`)
/// for their own state.
///
/// # Object Safety
///
/// This trait is object-safe and can be used as `dyn BackendRead`.
pub trait BackendRead: Send + Sync {
    /// Read entire file contents as bytes.
    ///
    /// # Errors
    ///
    /// - [`DocError::NotFound`] if the URI does not exist
    /// - [`DocError::NotAFile`] if the URI is a directory
    fn read(&self, uri: &ResourceUri) -> Result<Vec<u8>, DocError>;

    /// Read file contents as UTF-8 text.
    ///
    /// # Errors
    ///
    /// - [`DocError::NotFound`] if the URI does not exist
    /// - [`DocError::NotAFile`] if the URI is a directory
    /// - [`DocError::InvalidData`] if the file contains invalid UTF-8
    fn read_to_string(&self, uri: &ResourceUri) -> Result<String, DocError> {
        let bytes = self.read(uri)?;
        String::from_utf8(bytes).map_err(|err| DocError::InvalidData {
            uri: uri.to_string(),
            details: format!("content is not valid UTF-8: {err}"),
        })
    }

    /// Check if a URI exists.
    ///
    /// Only returns an error for unexpected failures.
    fn exists(&self, uri: &ResourceUri) -> Result<bool, DocError>;

    /// Get metadata for a URI.
    ///
    /// # Errors
    ///
    /// - [`DocError::NotFound`] if the URI does not exist
    fn metadata(&self, uri: &ResourceUri) -> Result<Metadata, DocError>;
}

impl<T: BackendRead + ?Sized> BackendRead for Box<T> {
    fn read(&self, uri: &ResourceUri) -> Result<Vec<u8>, DocError> {
        (**self).read(uri)
    }

    fn read_to_string(&self, uri: &ResourceUri) -> Result<String, DocError> {
        (**self).read_to_string(uri)
    }

    fn exists(&self, uri: &ResourceUri) -> Result<bool, DocError> {
        (**self).exists(uri)
    }

    fn metadata(&self, uri: &ResourceUri) -> Result<Metadata, DocError> {
        (**self).metadata(uri)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct BytesOnly(Vec<u8>);

    impl BackendRead for BytesOnly {
        fn read(&self, _: &ResourceUri) -> Result<Vec<u8>, DocError> {
            Ok(self.0.clone())
        }

        fn exists(&self, _: &ResourceUri) -> Result<bool, DocError> {
            Ok(true)
        }

        fn metadata(&self, _: &ResourceUri) -> Result<Metadata, DocError> {
            Ok(Metadata::default())
        }
    }

    #[test]
    fn backend_read_is_object_safe() {
        fn _check(_: &dyn BackendRead) {}
    }

    #[test]
    fn read_to_string_rejects_invalid_utf8() {
        let backend = BytesOnly(vec![0xff, 0xfe]);
        let err = backend.read_to_string(&ResourceUri::root()).unwrap_err();
        assert!(matches!(err, DocError::InvalidData { .. }));
    }

    #[test]
    fn read_to_string_through_box() {
        let backend: Box<dyn BackendRead> = Box::new(BytesOnly(b"# Hi".to_vec()));
        assert_eq!(backend.read_to_string(&ResourceUri::root()).unwrap(), "# Hi");
    }
}
