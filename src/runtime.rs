//! # Runtime
//!
//! The owning handle behind the C boundary: a backend, its lifecycle state
//! and the per-document lock table.
//!
//! ```text
//! Uninitialized ──initialize ok──▶ Ready
//!       │
//!       └──────initialize err───▶ Failed (terminal)
//! ```
//!
//! Document access (load, save, file removal) holds the edit gate shared
//! and the per-URI lock inside it. Directory removal holds the gate
//! exclusively, so it never lands between a save's fingerprint check and its
//! write.
//!
//! Every operation checks the state first. Before `initialize` they fail
//! with [`DocError::NotReady`]; once `Failed`, every call (including
//! `initialize`) fails with [`DocError::BackendUnavailable`] without touching
//! the backend.
//!
//! ```rust
//! use docfs_runtime::Runtime;
//!
//! let runtime = Runtime::new("memory://notes").unwrap();
//! runtime.initialize().unwrap();
//! runtime.mkdir("/notes").unwrap();
//!
//! let v1 = runtime.save_markdown("/notes/a.md", "# Hi", None).unwrap();
//! let v2 = runtime
//!     .save_markdown("/notes/a.md", "# Hi there", Some(&v1.fingerprint))
//!     .unwrap();
//! assert!(runtime.save_markdown("/notes/a.md", "# Stale", Some(&v1.fingerprint)).is_err());
//! assert_eq!(runtime.load_markdown("/notes/a.md").unwrap().fingerprint, v2.fingerprint);
//! ```

use std::sync::{Mutex, PoisonError, RwLock};

use tracing::{debug, info, warn};

use crate::document::{self, DocumentLocks};
use crate::listing::list_directory;
use crate::{
    Backend, BackendExt, BackendStatus, DirectoryEntry, DocError, EntryKind, LayerExt,
    ResourceUri, RuntimeConfig, RuntimeState, SavedDocument, TracingLayer, VersionedDocument,
};

/// Boundary operation names, as reported in error payloads.
pub mod ops {
    /// `initialize`
    pub const INITIALIZE: &str = "runtime.initialize";
    /// `backend_status`
    pub const BACKEND_STATUS: &str = "runtime.backend_status";
    /// `mkdir`
    pub const MKDIR: &str = "runtime.mkdir";
    /// `ls`
    pub const LS: &str = "runtime.ls";
    /// `rm`
    pub const RM: &str = "runtime.rm";
    /// `load_markdown`
    pub const LOAD_MARKDOWN: &str = "runtime.load_markdown";
    /// `save_markdown`
    pub const SAVE_MARKDOWN: &str = "runtime.save_markdown";
}

#[derive(Debug, Clone, Default)]
enum Lifecycle {
    #[default]
    Uninitialized,
    Ready,
    Failed(String),
}

impl Lifecycle {
    fn state(&self) -> RuntimeState {
        match self {
            Self::Uninitialized => RuntimeState::Uninitialized,
            Self::Ready => RuntimeState::Ready,
            Self::Failed(_) => RuntimeState::Failed,
        }
    }
}

/// Document runtime bound to one root.
///
/// `Runtime` is `Send + Sync`; every method takes `&self`.
pub struct Runtime {
    config: RuntimeConfig,
    backend: Box<dyn Backend>,
    lifecycle: RwLock<Lifecycle>,
    init: Mutex<()>,
    edit_gate: RwLock<()>,
    locks: DocumentLocks,
}

impl std::fmt::Debug for Runtime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runtime")
            .field("root", &self.config.root)
            .field("backend", &self.backend.info())
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl Runtime {
    /// Bind a runtime to `root` with default settings. Performs no I/O.
    ///
    /// # Errors
    ///
    /// - [`DocError::InvalidArgument`] if `root` is empty or malformed
    pub fn new(root: &str) -> Result<Self, DocError> {
        Self::with_config(RuntimeConfig::new(root))
    }

    /// Bind a runtime from a full configuration. Performs no I/O.
    ///
    /// # Errors
    ///
    /// - [`DocError::InvalidArgument`] if the root is empty, malformed or
    ///   contradicts `config.backend`
    pub fn with_config(mut config: RuntimeConfig) -> Result<Self, DocError> {
        config.root = config.root.trim().to_string();
        let backend = config.backend.open(&config.root)?;
        Ok(Self::with_backend(config, backend))
    }

    /// Bind a runtime to a caller-supplied backend.
    pub fn with_backend(config: RuntimeConfig, backend: Box<dyn Backend>) -> Self {
        let backend: Box<dyn Backend> = if config.trace_backend {
            Box::new(backend.layer(TracingLayer))
        } else {
            backend
        };
        let info = backend.info();
        debug!(kind = ?info.kind, root = %info.root, "runtime created");
        Self {
            config,
            backend,
            lifecycle: RwLock::new(Lifecycle::Uninitialized),
            init: Mutex::new(()),
            edit_gate: RwLock::new(()),
            locks: DocumentLocks::default(),
        }
    }

    /// The configuration this runtime was built from.
    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Current lifecycle state.
    pub fn state(&self) -> RuntimeState {
        self.lifecycle
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .state()
    }

    /// Set up the backend.
    ///
    /// Idempotent once `Ready`. A failure is terminal: the runtime moves to
    /// `Failed` and never retries.
    ///
    /// # Errors
    ///
    /// - [`DocError::BackendUnavailable`] if setup fails now or failed before
    pub fn initialize(&self) -> Result<(), DocError> {
        let _init = self
            .init
            .lock()
            .map_err(|_| DocError::poisoned("initialize"))?;
        match self.lifecycle() {
            Lifecycle::Ready => return Ok(()),
            Lifecycle::Failed(reason) => return Err(DocError::BackendUnavailable { reason }),
            Lifecycle::Uninitialized => {}
        }

        let info = self.backend.info();
        let next = match self.backend.setup(self.config.create_root) {
            Ok(()) => {
                info!(kind = ?info.kind, root = %info.root, "runtime ready");
                Lifecycle::Ready
            }
            Err(err) => {
                warn!(
                    kind = ?info.kind,
                    root = %info.root,
                    error = %err,
                    "runtime initialization failed"
                );
                Lifecycle::Failed(err.to_string())
            }
        };
        *self
            .lifecycle
            .write()
            .map_err(|_| DocError::poisoned("lifecycle"))? = next.clone();
        match next {
            Lifecycle::Failed(reason) => Err(DocError::BackendUnavailable { reason }),
            _ => Ok(()),
        }
    }

    /// Snapshot of backend identity and reachability.
    ///
    /// # Errors
    ///
    /// - [`DocError::NotReady`] / [`DocError::BackendUnavailable`] unless
    ///   `Ready`
    pub fn backend_status(&self) -> Result<BackendStatus, DocError> {
        self.ready(ops::BACKEND_STATUS)?;
        let info = self.backend.info();
        let probe = self.backend.probe();
        debug!(kind = ?info.kind, reachable = probe.is_ok(), "backend status");
        Ok(BackendStatus {
            kind: info.kind,
            root: info.root,
            reachable: probe.is_ok(),
            state: self.state(),
            detail: probe.err().map(|err| err.to_string()),
        })
    }

    /// Create the directory at `uri` and any missing ancestors.
    ///
    /// Succeeds if the directory already exists.
    ///
    /// # Errors
    ///
    /// - [`DocError::AlreadyExists`] if a file occupies the path or an
    ///   ancestor
    pub fn mkdir(&self, uri: &str) -> Result<(), DocError> {
        self.ready(ops::MKDIR)?;
        let uri = parse(uri)?;
        self.backend.create_dir_all(&uri)?;
        debug!(uri = %uri, "mkdir");
        Ok(())
    }

    /// List the directory at `uri`.
    ///
    /// Entries are sorted by their URI relative to `uri`.
    ///
    /// # Errors
    ///
    /// - [`DocError::NotFound`] if `uri` is not an existing directory
    pub fn ls(&self, uri: &str, recursive: bool) -> Result<Vec<DirectoryEntry>, DocError> {
        self.ready(ops::LS)?;
        let uri = parse(uri)?;
        let entries = list_directory(&*self.backend, &uri, recursive)?;
        debug!(uri = %uri, recursive, count = entries.len(), "ls");
        Ok(entries)
    }

    /// Remove the resource at `uri`.
    ///
    /// Recursive removal passes through the backend's own atomicity; on
    /// failure the first error is reported and nothing is rolled back.
    ///
    /// # Errors
    ///
    /// - [`DocError::InvalidArgument`] if `uri` is the root
    /// - [`DocError::NotFound`] if nothing is stored at `uri`
    /// - [`DocError::DirectoryNotEmpty`] if `uri` is a non-empty directory and
    ///   `recursive` is false
    pub fn rm(&self, uri: &str, recursive: bool) -> Result<(), DocError> {
        self.ready(ops::RM)?;
        let uri = parse(uri)?;
        if uri.is_root() {
            return Err(DocError::InvalidArgument {
                field: "uri",
                reason: "the root cannot be removed".into(),
            });
        }

        match self.backend.kind_of(&uri)? {
            None => {
                return Err(DocError::NotFound {
                    uri: uri.to_string(),
                });
            }
            Some(EntryKind::File) => {
                let _gate = self.edit_gate.read().unwrap_or_else(PoisonError::into_inner);
                self.locks.with(&uri, || self.backend.remove_file(&uri))?;
            }
            Some(EntryKind::Directory) => {
                let _gate = self.edit_gate.write().unwrap_or_else(PoisonError::into_inner);
                if recursive {
                    self.backend.remove_dir_all(&uri)?;
                } else {
                    self.backend.remove_dir(&uri)?;
                }
            }
        }
        debug!(uri = %uri, recursive, "rm");
        Ok(())
    }

    /// Read a markdown document with its fingerprint.
    ///
    /// # Errors
    ///
    /// - [`DocError::InvalidArgument`] if `uri` is not a markdown path
    /// - [`DocError::NotFound`] if the document does not exist
    /// - [`DocError::InvalidData`] if the content is not UTF-8
    pub fn load_markdown(&self, uri: &str) -> Result<VersionedDocument, DocError> {
        self.ready(ops::LOAD_MARKDOWN)?;
        let uri = document::markdown_target(uri, &self.config)?;
        let _gate = self.edit_gate.read().unwrap_or_else(PoisonError::into_inner);
        let doc = self.locks.with(&uri, || document::load(&*self.backend, &uri))?;
        debug!(uri = %uri, size = doc.size, "load_markdown");
        Ok(doc)
    }

    /// Write a markdown document.
    ///
    /// With `expected_fingerprint` set, the write happens only if it equals
    /// the stored fingerprint; concurrent saves to one URI are linearized so
    /// at most one of several writers holding the same fingerprint wins.
    /// An empty or blank fingerprint means no precondition.
    ///
    /// # Errors
    ///
    /// - [`DocError::InvalidArgument`] if `uri` is not a markdown path
    /// - [`DocError::NotFound`] if a fingerprint is given and the document
    ///   does not exist
    /// - [`DocError::Conflict`] if the fingerprint is stale
    pub fn save_markdown(
        &self,
        uri: &str,
        content: &str,
        expected_fingerprint: Option<&str>,
    ) -> Result<SavedDocument, DocError> {
        self.ready(ops::SAVE_MARKDOWN)?;
        let uri = document::markdown_target(uri, &self.config)?;
        let expected = expected_fingerprint
            .map(str::trim)
            .filter(|fp| !fp.is_empty());
        let _gate = self.edit_gate.read().unwrap_or_else(PoisonError::into_inner);
        self.locks
            .with(&uri, || document::save(&*self.backend, &uri, content, expected))
    }

    fn lifecycle(&self) -> Lifecycle {
        self.lifecycle
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn ready(&self, operation: &'static str) -> Result<(), DocError> {
        match self.lifecycle() {
            Lifecycle::Ready => Ok(()),
            Lifecycle::Uninitialized => Err(DocError::NotReady { operation }),
            Lifecycle::Failed(reason) => Err(DocError::BackendUnavailable { reason }),
        }
    }
}

fn parse(raw: &str) -> Result<ResourceUri, DocError> {
    ResourceUri::parse(raw.trim())
}
