//! In-process backend.
//!
//! Clones share the same store, so a host (or a test) can keep a handle to a
//! backend it has given to a [`Runtime`](crate::Runtime). Availability can be
//! toggled to simulate an unreachable remote provider.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::SystemTime;

use crate::{
    BackendDir, BackendInfo, BackendKind, BackendProbe, BackendRead, BackendWrite, DirEntry,
    DocError, EntryKind, Metadata, ReadDirIter, ResourceUri,
};

/// Scheme prefix identifying memory roots.
pub const MEMORY_SCHEME: &str = "memory://";

/// In-memory backend keyed by normalized URI.
///
/// ## Thread Safety
///
/// Files and directories live behind a single `RwLock`, so every operation
/// observes a consistent tree. Revisions come from an atomic counter.
#[derive(Debug, Clone)]
pub struct MemoryBackend {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    name: String,
    tree: RwLock<Tree>,
    next_revision: AtomicU64,
    available: AtomicBool,
}

#[derive(Debug, Default)]
struct Tree {
    files: HashMap<ResourceUri, StoredFile>,
    dirs: HashSet<ResourceUri>,
}

#[derive(Debug)]
struct StoredFile {
    data: Vec<u8>,
    revision: u64,
    modified: SystemTime,
}

impl Tree {
    fn kind_of(&self, uri: &ResourceUri) -> Option<EntryKind> {
        if self.dirs.contains(uri) {
            Some(EntryKind::Directory)
        } else if self.files.contains_key(uri) {
            Some(EntryKind::File)
        } else {
            None
        }
    }

    fn has_children(&self, uri: &ResourceUri) -> bool {
        let is_child = |candidate: &ResourceUri| candidate.parent().as_ref() == Some(uri);
        self.dirs.iter().any(is_child) || self.files.keys().any(is_child)
    }

    fn require_parent_dir(&self, uri: &ResourceUri) -> Result<(), DocError> {
        let Some(parent) = uri.parent() else {
            return Ok(());
        };
        match self.kind_of(&parent) {
            Some(EntryKind::Directory) => Ok(()),
            Some(EntryKind::File) => Err(DocError::NotADirectory {
                uri: parent.to_string(),
            }),
            None => Err(DocError::NotFound {
                uri: parent.to_string(),
            }),
        }
    }
}

impl MemoryBackend {
    /// Create an empty store. The root directory exists immediately.
    pub fn new(name: impl Into<String>) -> Self {
        let mut tree = Tree::default();
        tree.dirs.insert(ResourceUri::root());
        Self {
            inner: Arc::new(Inner {
                name: name.into(),
                tree: RwLock::new(tree),
                next_revision: AtomicU64::new(1),
                available: AtomicBool::new(true),
            }),
        }
    }

    /// Store name (the part after `memory://`).
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Mark the store reachable or unreachable. While unreachable every
    /// operation fails with [`DocError::BackendUnavailable`].
    pub fn set_available(&self, available: bool) {
        self.inner.available.store(available, Ordering::SeqCst);
    }

    fn ensure_available(&self) -> Result<(), DocError> {
        if self.inner.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(DocError::BackendUnavailable {
                reason: format!("{MEMORY_SCHEME}{} is offline", self.inner.name),
            })
        }
    }

    fn read_tree(&self) -> Result<RwLockReadGuard<'_, Tree>, DocError> {
        self.ensure_available()?;
        self.inner
            .tree
            .read()
            .map_err(|_| DocError::poisoned("memory backend"))
    }

    fn write_tree(&self) -> Result<RwLockWriteGuard<'_, Tree>, DocError> {
        self.ensure_available()?;
        self.inner
            .tree
            .write()
            .map_err(|_| DocError::poisoned("memory backend"))
    }
}

impl BackendRead for MemoryBackend {
    fn read(&self, uri: &ResourceUri) -> Result<Vec<u8>, DocError> {
        let tree = self.read_tree()?;
        if let Some(file) = tree.files.get(uri) {
            return Ok(file.data.clone());
        }
        if tree.dirs.contains(uri) {
            return Err(DocError::NotAFile {
                uri: uri.to_string(),
            });
        }
        Err(DocError::NotFound {
            uri: uri.to_string(),
        })
    }

    fn exists(&self, uri: &ResourceUri) -> Result<bool, DocError> {
        Ok(self.read_tree()?.kind_of(uri).is_some())
    }

    fn metadata(&self, uri: &ResourceUri) -> Result<Metadata, DocError> {
        let tree = self.read_tree()?;
        if let Some(file) = tree.files.get(uri) {
            return Ok(Metadata {
                kind: EntryKind::File,
                size: file.data.len() as u64,
                modified: file.modified,
                revision: file.revision.to_string(),
            });
        }
        if tree.dirs.contains(uri) {
            return Ok(Metadata {
                kind: EntryKind::Directory,
                ..Metadata::default()
            });
        }
        Err(DocError::NotFound {
            uri: uri.to_string(),
        })
    }
}

impl BackendWrite for MemoryBackend {
    fn write(&self, uri: &ResourceUri, data: &[u8]) -> Result<(), DocError> {
        let mut tree = self.write_tree()?;
        if tree.dirs.contains(uri) {
            return Err(DocError::NotAFile {
                uri: uri.to_string(),
            });
        }
        tree.require_parent_dir(uri)?;

        let revision = self.inner.next_revision.fetch_add(1, Ordering::SeqCst);
        tree.files.insert(
            uri.clone(),
            StoredFile {
                data: data.to_vec(),
                revision,
                modified: SystemTime::now(),
            },
        );
        Ok(())
    }

    fn remove_file(&self, uri: &ResourceUri) -> Result<(), DocError> {
        let mut tree = self.write_tree()?;
        if tree.files.remove(uri).is_some() {
            return Ok(());
        }
        if tree.dirs.contains(uri) {
            return Err(DocError::NotAFile {
                uri: uri.to_string(),
            });
        }
        Err(DocError::NotFound {
            uri: uri.to_string(),
        })
    }
}

impl BackendDir for MemoryBackend {
    fn read_dir(&self, uri: &ResourceUri) -> Result<ReadDirIter, DocError> {
        let tree = self.read_tree()?;
        match tree.kind_of(uri) {
            Some(EntryKind::Directory) => {}
            Some(EntryKind::File) => {
                return Err(DocError::NotADirectory {
                    uri: uri.to_string(),
                });
            }
            None => {
                return Err(DocError::NotFound {
                    uri: uri.to_string(),
                });
            }
        }

        let is_child = |candidate: &ResourceUri| candidate.parent().as_ref() == Some(uri);
        let dirs = tree
            .dirs
            .iter()
            .filter(|d| is_child(*d))
            .map(|d| (d, EntryKind::Directory, 0));
        let files = tree
            .files
            .iter()
            .filter(|(f, _)| is_child(*f))
            .map(|(f, stored)| (f, EntryKind::File, stored.data.len() as u64));

        let entries = dirs
            .chain(files)
            .map(|(child, kind, size)| {
                Ok(DirEntry {
                    name: child.name().unwrap_or_default().to_string(),
                    uri: child.clone(),
                    kind,
                    size,
                })
            })
            .collect();
        Ok(ReadDirIter::from_vec(entries))
    }

    fn create_dir(&self, uri: &ResourceUri) -> Result<(), DocError> {
        let mut tree = self.write_tree()?;
        if tree.kind_of(uri).is_some() {
            return Err(DocError::AlreadyExists {
                uri: uri.to_string(),
                operation: "create_dir",
            });
        }
        tree.require_parent_dir(uri)?;
        tree.dirs.insert(uri.clone());
        Ok(())
    }

    fn create_dir_all(&self, uri: &ResourceUri) -> Result<(), DocError> {
        let mut tree = self.write_tree()?;

        // Validate the whole chain before inserting anything.
        let mut chain = Vec::new();
        let mut current = Some(uri.clone());
        while let Some(dir) = current {
            match tree.kind_of(&dir) {
                Some(EntryKind::Directory) => break,
                Some(EntryKind::File) => {
                    return Err(DocError::AlreadyExists {
                        uri: dir.to_string(),
                        operation: "create_dir_all",
                    });
                }
                None => {
                    current = dir.parent();
                    chain.push(dir);
                }
            }
        }
        tree.dirs.extend(chain);
        Ok(())
    }

    fn remove_dir(&self, uri: &ResourceUri) -> Result<(), DocError> {
        let mut tree = self.write_tree()?;
        match tree.kind_of(uri) {
            Some(EntryKind::Directory) => {}
            Some(EntryKind::File) => {
                return Err(DocError::NotADirectory {
                    uri: uri.to_string(),
                });
            }
            None => {
                return Err(DocError::NotFound {
                    uri: uri.to_string(),
                });
            }
        }
        if tree.has_children(uri) {
            return Err(DocError::DirectoryNotEmpty {
                uri: uri.to_string(),
            });
        }
        tree.dirs.remove(uri);
        Ok(())
    }

    fn remove_dir_all(&self, uri: &ResourceUri) -> Result<(), DocError> {
        let mut tree = self.write_tree()?;
        match tree.kind_of(uri) {
            Some(EntryKind::Directory) => {}
            Some(EntryKind::File) => {
                return Err(DocError::NotADirectory {
                    uri: uri.to_string(),
                });
            }
            None => {
                return Err(DocError::NotFound {
                    uri: uri.to_string(),
                });
            }
        }
        tree.files.retain(|f, _| !f.starts_with(uri));
        tree.dirs.retain(|d| !d.starts_with(uri));
        if uri.is_root() {
            tree.dirs.insert(ResourceUri::root());
        }
        Ok(())
    }
}

impl BackendProbe for MemoryBackend {
    fn info(&self) -> BackendInfo {
        BackendInfo {
            kind: BackendKind::Memory,
            root: format!("{MEMORY_SCHEME}{}", self.inner.name),
        }
    }

    fn setup(&self, _create_root: bool) -> Result<(), DocError> {
        self.ensure_available()
    }

    fn probe(&self) -> Result<(), DocError> {
        self.ensure_available()
    }
}
