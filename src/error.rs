//! Error types for the document runtime.

use serde::Serialize;

use crate::ResultCode;

/// Runtime error type with contextual variants.
///
/// Variants carry the URI (in normalized form where one was parsed) and the
/// operation that failed. Uses `#[non_exhaustive]` for forward compatibility.
///
/// # Examples
///
/// ```rust
/// use docfs_runtime::DocError;
///
/// let err = DocError::NotFound { uri: "/notes/a.md".into() };
/// assert_eq!(err.to_string(), "not found: /notes/a.md");
/// ```
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum DocError {
    // Argument errors (detected before any I/O)
    /// The caller-supplied URI could not be normalized.
    #[error("invalid uri {input:?}: {reason}")]
    InvalidUri {
        /// The raw input.
        input: String,
        /// Why it was rejected.
        reason: &'static str,
    },

    /// A required argument was missing or malformed.
    #[error("invalid argument {field}: {reason}")]
    InvalidArgument {
        /// The argument name.
        field: &'static str,
        /// Why it was rejected.
        reason: String,
    },

    // Resource errors
    /// Resource does not exist.
    #[error("not found: {uri}")]
    NotFound {
        /// The URI that was not found.
        uri: String,
    },

    /// The path is occupied by an entry of the wrong kind.
    #[error("{operation}: already exists: {uri}")]
    AlreadyExists {
        /// The occupied URI.
        uri: String,
        /// The operation that failed.
        operation: &'static str,
    },

    /// Expected a directory but found a file.
    #[error("not a directory: {uri}")]
    NotADirectory {
        /// The URI that is not a directory.
        uri: String,
    },

    /// Expected a file but found a directory.
    #[error("not a file: {uri}")]
    NotAFile {
        /// The URI that is not a file.
        uri: String,
    },

    /// Non-recursive removal of a directory with children.
    #[error("directory not empty: {uri}")]
    DirectoryNotEmpty {
        /// The non-empty directory.
        uri: String,
    },

    /// Stored bytes could not be decoded.
    #[error("invalid data: {uri} ({details})")]
    InvalidData {
        /// The URI holding the data.
        uri: String,
        /// Details about the decoding failure.
        details: String,
    },

    /// A resolved path escaped the backend root.
    #[error("access denied: {uri} ({reason})")]
    AccessDenied {
        /// The URI that was denied.
        uri: String,
        /// The reason for denial.
        reason: String,
    },

    // Concurrency
    /// Fingerprint precondition failed on save.
    #[error("conflict: {uri} (expected {expected}, found {actual})")]
    Conflict {
        /// The contended URI.
        uri: String,
        /// The fingerprint the caller expected.
        expected: String,
        /// The fingerprint currently stored.
        actual: String,
    },

    // Runtime/backend state
    /// The runtime has not been initialized yet.
    #[error("{operation}: runtime is not initialized")]
    NotReady {
        /// The operation that was attempted.
        operation: &'static str,
    },

    /// The backend cannot be reached or failed to initialize.
    #[error("backend unavailable: {reason}")]
    BackendUnavailable {
        /// Description of the failure.
        reason: String,
    },

    /// I/O error with context.
    #[error("{operation} failed for {uri}: {source}")]
    Io {
        /// The operation that failed.
        operation: &'static str,
        /// The URI involved in the operation.
        uri: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Unexpected internal fault (poisoned lock, serialization failure, panic).
    #[error("internal error: {0}")]
    Internal(String),
}

/// Serialized discriminator for [`DocError`], carried in error payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Malformed input.
    InvalidArgument,
    /// Resource absent.
    NotFound,
    /// Path occupied by another entry kind.
    AlreadyExists,
    /// Expected a directory.
    NotADirectory,
    /// Expected a file.
    NotAFile,
    /// Refused to cascade a removal.
    DirectoryNotEmpty,
    /// Undecodable content.
    InvalidData,
    /// Containment violation.
    AccessDenied,
    /// Fingerprint mismatch.
    Conflict,
    /// Runtime not initialized.
    NotReady,
    /// Backend unreachable or failed.
    BackendUnavailable,
    /// Generic I/O failure.
    Io,
    /// Internal fault.
    Internal,
}

impl DocError {
    /// The discriminator reported across the boundary.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidUri { .. } | Self::InvalidArgument { .. } => ErrorKind::InvalidArgument,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::AlreadyExists { .. } => ErrorKind::AlreadyExists,
            Self::NotADirectory { .. } => ErrorKind::NotADirectory,
            Self::NotAFile { .. } => ErrorKind::NotAFile,
            Self::DirectoryNotEmpty { .. } => ErrorKind::DirectoryNotEmpty,
            Self::InvalidData { .. } => ErrorKind::InvalidData,
            Self::AccessDenied { .. } => ErrorKind::AccessDenied,
            Self::Conflict { .. } => ErrorKind::Conflict,
            Self::NotReady { .. } => ErrorKind::NotReady,
            Self::BackendUnavailable { .. } => ErrorKind::BackendUnavailable,
            Self::Io { .. } => ErrorKind::Io,
            Self::Internal(_) => ErrorKind::Internal,
        }
    }

    /// The boundary result code for this error.
    pub fn code(&self) -> ResultCode {
        match self.kind() {
            ErrorKind::InvalidArgument => ResultCode::InvalidArgument,
            _ => ResultCode::RuntimeError,
        }
    }

    /// Build the structured payload sent to the caller.
    pub fn to_payload(&self, operation: &str) -> ErrorPayload {
        ErrorPayload {
            kind: self.kind(),
            message: self.to_string(),
            operation: operation.to_string(),
        }
    }

    /// Attach a URI and operation to an [`std::io::Error`].
    pub(crate) fn io(
        operation: &'static str,
        uri: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        let uri = uri.into();
        match source.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound { uri },
            std::io::ErrorKind::AlreadyExists => Self::AlreadyExists { uri, operation },
            std::io::ErrorKind::PermissionDenied => Self::AccessDenied {
                uri,
                reason: format!("{operation}: permission denied"),
            },
            _ => Self::Io {
                operation,
                uri,
                source,
            },
        }
    }

    pub(crate) fn poisoned(what: &str) -> Self {
        Self::Internal(format!("{what} lock poisoned"))
    }
}

impl From<std::io::Error> for DocError {
    fn from(error: std::io::Error) -> Self {
        Self::io("io", String::new(), error)
    }
}

/// Structured error object: `{kind, message, operation}`.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorPayload {
    /// Discriminator.
    pub kind: ErrorKind,
    /// Human-readable message.
    pub message: String,
    /// Boundary operation that produced the error.
    pub operation: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_display() {
        let err = DocError::NotFound {
            uri: "/missing".into(),
        };
        assert_eq!(err.to_string(), "not found: /missing");
    }

    #[test]
    fn already_exists_display() {
        let err = DocError::AlreadyExists {
            uri: "/notes".into(),
            operation: "mkdir",
        };
        assert_eq!(err.to_string(), "mkdir: already exists: /notes");
    }

    #[test]
    fn argument_errors_map_to_invalid_argument_code() {
        let err = DocError::InvalidUri {
            input: "../x".into(),
            reason: "escapes root",
        };
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        assert_eq!(err.code(), ResultCode::InvalidArgument);

        let err = DocError::InvalidArgument {
            field: "root",
            reason: "must be non-empty".into(),
        };
        assert_eq!(err.code(), ResultCode::InvalidArgument);
    }

    #[test]
    fn resource_errors_map_to_runtime_error_code() {
        let err = DocError::Conflict {
            uri: "/a.md".into(),
            expected: "x".into(),
            actual: "y".into(),
        };
        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert_eq!(err.code(), ResultCode::RuntimeError);
        assert_eq!(
            DocError::Internal("boom".into()).code(),
            ResultCode::RuntimeError
        );
    }

    #[test]
    fn payload_serializes_snake_case_kind() {
        let err = DocError::DirectoryNotEmpty { uri: "/d".into() };
        let json = serde_json::to_value(err.to_payload("runtime.rm")).unwrap();
        assert_eq!(json["kind"], "directory_not_empty");
        assert_eq!(json["operation"], "runtime.rm");
        assert_eq!(json["message"], "directory not empty: /d");
    }

    #[test]
    fn from_io_not_found() {
        let err = DocError::from(std::io::Error::new(std::io::ErrorKind::NotFound, "t"));
        assert!(matches!(err, DocError::NotFound { .. }));
    }

    #[test]
    fn from_io_already_exists() {
        let err = DocError::io(
            "mkdir",
            "/x",
            std::io::Error::new(std::io::ErrorKind::AlreadyExists, "t"),
        );
        assert!(matches!(
            err,
            DocError::AlreadyExists {
                operation: "mkdir",
                ..
            }
        ));
    }

    #[test]
    fn from_io_other() {
        let err = DocError::from(std::io::Error::other("t"));
        assert!(matches!(err, DocError::Io { .. }));
        assert_eq!(err.kind(), ErrorKind::Io);
    }
}
