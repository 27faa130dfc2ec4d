//! # Layer Trait
//!
//! Tower-style middleware composition for backends.
//!
//! ```text
//! Backend ──▶ Layer::layer() ──▶ Wrapped Backend
//! ```
//!
//! [`TracingLayer`] is the built-in middleware: it wraps any backend in
//! [`Traced`], which logs each backend call and its outcome at `trace` level.
//!
//! ```rust
//! use docfs_runtime::{BackendRead, LayerExt, MemoryBackend, ResourceUri, TracingLayer};
//!
//! let backend = MemoryBackend::new("doc").layer(TracingLayer);
//! assert!(backend.exists(&ResourceUri::root()).unwrap());
//! ```

use tracing::trace;

use crate::{
    Backend, BackendDir, BackendInfo, BackendProbe, BackendRead, BackendWrite, DocError,
    Metadata, ReadDirIter, ResourceUri,
};

/// A layer that wraps a backend to add functionality.
///
/// `layer(self, backend)` consumes both the layer and the backend.
pub trait Layer<B> {
    /// The resulting backend type after applying this layer.
    type Backend;

    /// Wrap the given backend with this layer's functionality.
    fn layer(self, backend: B) -> Self::Backend;
}

/// Extension trait for fluent layer composition.
pub trait LayerExt: Backend + Sized {
    /// Apply a layer to this backend.
    fn layer<L: Layer<Self>>(self, layer: L) -> L::Backend {
        layer.layer(self)
    }
}

impl<B: Backend> LayerExt for B {}

/// Layer producing [`Traced`] backends.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLayer;

impl<B: Backend> Layer<B> for TracingLayer {
    type Backend = Traced<B>;

    fn layer(self, backend: B) -> Self::Backend {
        Traced { inner: backend }
    }
}

/// Backend wrapper that logs every call at `trace` level.
#[derive(Debug)]
pub struct Traced<B> {
    inner: B,
}

impl<B> Traced<B> {
    /// The wrapped backend.
    pub fn inner(&self) -> &B {
        &self.inner
    }
}

fn traced<T>(
    call: &'static str,
    uri: &ResourceUri,
    result: Result<T, DocError>,
) -> Result<T, DocError> {
    traced_sized(call, uri, None, result)
}

/// One event per call; `bytes` is recorded for calls that carry a payload.
fn traced_sized<T>(
    call: &'static str,
    uri: &ResourceUri,
    bytes: Option<usize>,
    result: Result<T, DocError>,
) -> Result<T, DocError> {
    match &result {
        Ok(_) => trace!(call, uri = %uri, bytes, "backend call ok"),
        Err(err) => trace!(call, uri = %uri, bytes, error = %err, "backend call failed"),
    }
    result
}

impl<B: BackendRead> BackendRead for Traced<B> {
    fn read(&self, uri: &ResourceUri) -> Result<Vec<u8>, DocError> {
        traced("read", uri, self.inner.read(uri))
    }

    fn read_to_string(&self, uri: &ResourceUri) -> Result<String, DocError> {
        traced("read_to_string", uri, self.inner.read_to_string(uri))
    }

    fn exists(&self, uri: &ResourceUri) -> Result<bool, DocError> {
        traced("exists", uri, self.inner.exists(uri))
    }

    fn metadata(&self, uri: &ResourceUri) -> Result<Metadata, DocError> {
        traced("metadata", uri, self.inner.metadata(uri))
    }
}

impl<B: BackendWrite> BackendWrite for Traced<B> {
    fn write(&self, uri: &ResourceUri, data: &[u8]) -> Result<(), DocError> {
        traced_sized("write", uri, Some(data.len()), self.inner.write(uri, data))
    }

    fn remove_file(&self, uri: &ResourceUri) -> Result<(), DocError> {
        traced("remove_file", uri, self.inner.remove_file(uri))
    }
}

impl<B: BackendDir> BackendDir for Traced<B> {
    fn read_dir(&self, uri: &ResourceUri) -> Result<ReadDirIter, DocError> {
        traced("read_dir", uri, self.inner.read_dir(uri))
    }

    fn create_dir(&self, uri: &ResourceUri) -> Result<(), DocError> {
        traced("create_dir", uri, self.inner.create_dir(uri))
    }

    fn create_dir_all(&self, uri: &ResourceUri) -> Result<(), DocError> {
        traced("create_dir_all", uri, self.inner.create_dir_all(uri))
    }

    fn remove_dir(&self, uri: &ResourceUri) -> Result<(), DocError> {
        traced("remove_dir", uri, self.inner.remove_dir(uri))
    }

    fn remove_dir_all(&self, uri: &ResourceUri) -> Result<(), DocError> {
        traced("remove_dir_all", uri, self.inner.remove_dir_all(uri))
    }
}

impl<B: BackendProbe> BackendProbe for Traced<B> {
    fn info(&self) -> BackendInfo {
        self.inner.info()
    }

    fn setup(&self, create_root: bool) -> Result<(), DocError> {
        traced("setup", &ResourceUri::root(), self.inner.setup(create_root))
    }

    fn probe(&self) -> Result<(), DocError> {
        traced("probe", &ResourceUri::root(), self.inner.probe())
    }
}
