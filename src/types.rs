//! Core types for the document runtime.

use std::time::SystemTime;

use serde::{Deserialize, Serialize};

use crate::ResourceUri;

/// Kind of a stored entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    /// Regular file.
    File,
    /// Directory.
    Directory,
}

/// Metadata reported by a backend for a stored entry.
#[derive(Debug, Clone)]
pub struct Metadata {
    /// File or directory.
    pub kind: EntryKind,
    /// Size in bytes (0 for directories).
    pub size: u64,
    /// Last modification time.
    pub modified: SystemTime,
    /// Backend-defined token that changes on every successful write.
    pub revision: String,
}

impl Metadata {
    /// Returns `true` if this is a regular file.
    #[inline]
    pub fn is_file(&self) -> bool {
        self.kind == EntryKind::File
    }

    /// Returns `true` if this is a directory.
    #[inline]
    pub fn is_dir(&self) -> bool {
        self.kind == EntryKind::Directory
    }
}

impl Default for Metadata {
    fn default() -> Self {
        Self {
            kind: EntryKind::File,
            size: 0,
            modified: SystemTime::UNIX_EPOCH,
            revision: String::new(),
        }
    }
}

/// A single child returned by [`BackendDir::read_dir`](crate::BackendDir::read_dir).
#[derive(Debug, Clone)]
pub struct DirEntry {
    /// Name of the entry (final segment only).
    pub name: String,
    /// Full URI of the entry.
    pub uri: ResourceUri,
    /// File or directory.
    pub kind: EntryKind,
    /// Size in bytes (0 for directories).
    pub size: u64,
}

/// One row of a directory listing, addressed relative to the listed directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DirectoryEntry {
    /// Final segment.
    pub name: String,
    /// File or directory.
    pub kind: EntryKind,
    /// Normalized URI relative to the listed directory (`sub/a.md`).
    pub uri: String,
    /// Size in bytes (0 for directories).
    pub size: u64,
}

/// Markdown content together with its fingerprint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VersionedDocument {
    /// Normalized URI of the document.
    pub uri: ResourceUri,
    /// UTF-8 content.
    pub content: String,
    /// Opaque version token.
    pub fingerprint: String,
    /// Size in bytes.
    pub size: u64,
    /// Last modification time, RFC 3339 in UTC.
    pub updated_at: String,
}

/// Result of a successful save.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SavedDocument {
    /// Normalized URI of the document.
    pub uri: ResourceUri,
    /// Fingerprint of the content just written.
    pub fingerprint: String,
    /// Size in bytes.
    pub size: u64,
    /// Modification time of the write, RFC 3339 in UTC.
    pub updated_at: String,
}

/// Storage provider variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    /// Local disk rooted at a directory.
    Local,
    /// In-process memory.
    Memory,
}

/// Identity of a backend instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendInfo {
    /// Variant.
    pub kind: BackendKind,
    /// Root identity (canonical directory or `memory://name`).
    pub root: String,
}

/// Lifecycle state of a [`Runtime`](crate::Runtime).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RuntimeState {
    /// Constructed, `initialize` not yet called.
    #[default]
    Uninitialized,
    /// Backend set up successfully.
    Ready,
    /// Backend setup failed; every operation fails fast.
    Failed,
}

/// Point-in-time backend snapshot, assembled per call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BackendStatus {
    /// Variant.
    pub kind: BackendKind,
    /// Root identity.
    pub root: String,
    /// Whether the probe succeeded.
    pub reachable: bool,
    /// Runtime lifecycle state.
    pub state: RuntimeState,
    /// Probe failure message when unreachable.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}
