//! # Storage Backends
//!
//! | Backend | Root form | Use |
//! |---------|-----------|-----|
//! | [`LocalBackend`] | `/path/to/dir`, `file:///path/to/dir` | Documents on local disk |
//! | [`MemoryBackend`] | `memory://name` | Ephemeral stores, tests, offline simulation |
//!
//! The variant is chosen when the runtime is constructed, from the root and
//! [`BackendSelector`].

mod local;
mod memory;

pub use local::{FILE_SCHEME, LocalBackend};
pub use memory::{MEMORY_SCHEME, MemoryBackend};

use serde::{Deserialize, Serialize};

use crate::{Backend, DocError};

/// Which backend variant to construct for a root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendSelector {
    /// `memory://` roots get [`MemoryBackend`], everything else [`LocalBackend`].
    #[default]
    Auto,
    /// Always [`LocalBackend`].
    Local,
    /// Always [`MemoryBackend`].
    Memory,
}

impl BackendSelector {
    /// Build the backend for `root`. Performs no I/O.
    ///
    /// # Errors
    ///
    /// - [`DocError::InvalidArgument`] if the root is empty or its scheme
    ///   contradicts the selector
    pub fn open(self, root: &str) -> Result<Box<dyn Backend>, DocError> {
        let root = root.trim();
        let invalid = |reason: &str| DocError::InvalidArgument {
            field: "root",
            reason: reason.to_string(),
        };
        if root.is_empty() {
            return Err(invalid("must be non-empty"));
        }
        if root.contains('\0') {
            return Err(invalid("must not contain NUL"));
        }

        let memory_name = root.strip_prefix(MEMORY_SCHEME);
        match (self, memory_name) {
            (Self::Local, Some(_)) => Err(invalid("memory:// root requires the memory backend")),
            (Self::Auto | Self::Memory, Some(name)) => {
                if name.is_empty() {
                    return Err(invalid("memory:// root must name a store"));
                }
                Ok(Box::new(MemoryBackend::new(name)))
            }
            (Self::Memory, None) => Ok(Box::new(MemoryBackend::new(root))),
            (Self::Auto | Self::Local, None) => {
                let path = root.strip_prefix(FILE_SCHEME).unwrap_or(root);
                if path.is_empty() {
                    return Err(invalid("file:// root must name a directory"));
                }
                Ok(Box::new(LocalBackend::new(path)))
            }
        }
    }
}
