//! # docfs-runtime
//!
//! Document runtime for host applications, exposed through a **C ABI**.
//!
//! A [`Runtime`] is bound to a root (a local directory or a named in-memory
//! store). Callers address resources with slash-separated URIs and create
//! directories, list them, read and write markdown documents, and delete.
//! Document writes use **optimistic concurrency**: every load returns a
//! fingerprint, and a save can require the stored fingerprint to still match.
//!
//! ---
//!
//! ## Quick Start
//!
//! ```rust
//! use docfs_runtime::{DocError, Runtime};
//!
//! let runtime = Runtime::new("memory://notes")?;
//! runtime.initialize()?;
//!
//! runtime.mkdir("/notes")?;
//! let saved = runtime.save_markdown("/notes/a.md", "# Hi", None)?;
//!
//! let doc = runtime.load_markdown("/notes/a.md")?;
//! assert_eq!(doc.content, "# Hi");
//! assert_eq!(doc.fingerprint, saved.fingerprint);
//!
//! let entries = runtime.ls("/", true)?;
//! assert_eq!(entries[1].uri, "notes/a.md");
//! # Ok::<(), DocError>(())
//! ```
//!
//! ---
//!
//! ## Core Types
//!
//! | Type | Purpose |
//! |------|---------|
//! | [`Runtime`] | Owning handle: lifecycle, dispatch, document locks |
//! | [`RuntimeConfig`] | Root, backend selection, markdown extensions |
//! | [`ResourceUri`] | Normalized, backend-relative address |
//! | [`Backend`] | Storage capability interface |
//! | [`VersionedDocument`] | Content plus fingerprint |
//! | [`DirectoryEntry`] | One listing row, relative to the listed directory |
//! | [`BackendStatus`] | Reachability snapshot |
//! | [`DocError`] | Error type with context |
//! | [`Envelope`] | `(code, owned payload)` returned at the C boundary |
//!
//! ---
//!
//! ## Backend Traits
//!
//! ```text
//! BackendRead + BackendWrite + BackendDir + BackendProbe = Backend
//! ```
//!
//! [`Backend`] has a blanket implementation. [`LocalBackend`] and
//! [`MemoryBackend`] ship with the crate; any other provider can be plugged
//! in through [`Runtime::with_backend`]. Middleware composes with
//! [`LayerExt::layer`].
//!
//! ---
//!
//! ## Error Handling
//!
//! All operations return `Result<T, DocError>`. At the boundary every error
//! becomes a [`ResultCode`] and a JSON `{kind, message, operation}` payload:
//!
//! ```rust
//! use docfs_runtime::{DocError, ErrorKind, ResultCode};
//!
//! let err = DocError::NotFound { uri: "/missing.md".into() };
//! assert_eq!(err.kind(), ErrorKind::NotFound);
//! assert_eq!(err.code(), ResultCode::RuntimeError);
//! ```
//!
//! ---
//!
//! ## Thread Safety
//!
//! [`Runtime`] and every backend are `Send + Sync` and take `&self`.
//! Concurrent saves to the same URI are linearized, so two writers holding
//! the same fingerprint can never both succeed.
//!
//! ---
//!
//! ## Logging
//!
//! The crate emits [`tracing`](https://docs.rs/tracing) events and never
//! installs a subscriber. Lifecycle transitions log at `info`, operations at
//! `debug`, conflicts and failed initialization at `warn`. Enable
//! [`RuntimeConfig::trace_backend`] to log every backend call at `trace`.

// Private modules
mod backends;
mod config;
mod document;
mod envelope;
mod error;
mod ext;
mod layer;
mod listing;
mod runtime;
mod traits;
mod types;
mod uri;

// C boundary
pub mod ffi;

// Public re-exports - error types
pub use error::{DocError, ErrorKind, ErrorPayload};

// Public re-exports - core types
pub use types::{
    BackendInfo, BackendKind, BackendStatus, DirEntry, DirectoryEntry, EntryKind, Metadata,
    RuntimeState, SavedDocument, VersionedDocument,
};
pub use uri::ResourceUri;

// Public re-exports - backend traits
pub use traits::{Backend, BackendDir, BackendProbe, BackendRead, BackendWrite, ReadDirIter};

// Public re-exports - backends
pub use backends::{BackendSelector, FILE_SCHEME, LocalBackend, MEMORY_SCHEME, MemoryBackend};

// Public re-exports - infrastructure
pub use ext::BackendExt;
pub use layer::{Layer, LayerExt, Traced, TracingLayer};

// Public re-exports - runtime
pub use config::RuntimeConfig;
pub use document::fingerprint;
pub use envelope::{Envelope, OwnedBytes, ResultCode};
pub use runtime::{Runtime, ops};
