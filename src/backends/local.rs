//! Local disk backend rooted at a directory.
//!
//! Writes go to a temporary file in the target's directory and are renamed
//! over the target, so readers never observe a half-written document. Every
//! resolved path must stay under the canonical root.
//!
//! Listings hide leftover temp files and symlinks, along with names a URI
//! cannot express (non-UTF-8 or whitespace-padded). `remove_dir` clears the
//! first two kinds; the last kind keeps a directory non-empty.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tracing::{debug, warn};

use crate::{
    BackendDir, BackendInfo, BackendKind, BackendProbe, BackendRead, BackendWrite, DirEntry,
    DocError, EntryKind, Metadata, ReadDirIter, ResourceUri,
};

/// Scheme prefix accepted (and stripped) for local roots.
pub const FILE_SCHEME: &str = "file://";

const TEMP_PREFIX: &str = ".docfs-";
const TEMP_SUFFIX: &str = ".tmp";

/// Backend storing documents as plain files under `root`.
#[derive(Debug)]
pub struct LocalBackend {
    root: PathBuf,
    canonical_root: OnceLock<PathBuf>,
}

impl LocalBackend {
    /// Bind to `root`. Performs no I/O.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            canonical_root: OnceLock::new(),
        }
    }

    /// The root as supplied by the caller.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn canonical_root(&self) -> Result<PathBuf, DocError> {
        if let Some(root) = self.canonical_root.get() {
            return Ok(root.clone());
        }
        let root = self
            .root
            .canonicalize()
            .map_err(|err| DocError::BackendUnavailable {
                reason: format!("root {} is not accessible: {err}", self.root.display()),
            })?;
        let _ = self.canonical_root.set(root.clone());
        Ok(root)
    }

    /// Map a URI to a path under the root, rejecting symlink escapes.
    fn resolve(&self, uri: &ResourceUri) -> Result<PathBuf, DocError> {
        let root = self.canonical_root()?;
        let path = uri
            .segments()
            .iter()
            .fold(root.clone(), |path, segment| path.join(segment));

        // Canonicalize the deepest existing ancestor; the rest is lexical.
        let mut probe = path.as_path();
        loop {
            if fs::symlink_metadata(probe).is_ok() {
                let resolved = probe
                    .canonicalize()
                    .map_err(|err| DocError::io("resolve", uri.to_string(), err))?;
                if !resolved.starts_with(&root) {
                    return Err(DocError::AccessDenied {
                        uri: uri.to_string(),
                        reason: "path escapes the backend root".into(),
                    });
                }
                break;
            }
            match probe.parent() {
                Some(parent) if parent.starts_with(&root) => probe = parent,
                _ => break,
            }
        }
        Ok(path)
    }

    fn stat(&self, uri: &ResourceUri, path: &Path) -> Result<Metadata, DocError> {
        let meta =
            fs::metadata(path).map_err(|err| DocError::io("metadata", uri.to_string(), err))?;
        Ok(metadata_from_fs(&meta))
    }
}

fn metadata_from_fs(meta: &fs::Metadata) -> Metadata {
    let kind = if meta.is_dir() {
        EntryKind::Directory
    } else {
        EntryKind::File
    };
    let modified = meta.modified().unwrap_or(UNIX_EPOCH);
    let size = if meta.is_dir() { 0 } else { meta.len() };
    Metadata {
        kind,
        size,
        modified,
        revision: revision_token(meta, modified),
    }
}

#[cfg(unix)]
fn revision_token(meta: &fs::Metadata, modified: SystemTime) -> String {
    use std::os::unix::fs::MetadataExt;
    format!("{:x}-{:x}-{:x}", nanos_since_epoch(modified), meta.len(), meta.ino())
}

#[cfg(not(unix))]
fn revision_token(meta: &fs::Metadata, modified: SystemTime) -> String {
    format!("{:x}-{:x}", nanos_since_epoch(modified), meta.len())
}

fn nanos_since_epoch(time: SystemTime) -> u128 {
    time.duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO)
        .as_nanos()
}

/// Modification time for a new write: now, or just after the previous one
/// when the clock has not advanced past it.
fn next_modified(previous: Option<SystemTime>) -> SystemTime {
    let now = SystemTime::now();
    match previous {
        Some(previous) if previous >= now => previous + Duration::from_micros(1),
        _ => now,
    }
}

fn is_temp_name(name: &str) -> bool {
    name.starts_with(TEMP_PREFIX) && name.ends_with(TEMP_SUFFIX)
}

/// How a raw directory item surfaces through the backend.
enum Child {
    /// Listed under `name` at `uri`.
    Visible { name: String, uri: ResourceUri },
    /// Temp file or symlink, dropped together with its directory.
    Housekeeping,
    /// Name no URI can address.
    Unaddressable(String),
}

fn classify(parent: &ResourceUri, item: &fs::DirEntry) -> Child {
    let name = match item.file_name().into_string() {
        Ok(name) => name,
        Err(raw) => return Child::Unaddressable(raw.to_string_lossy().into_owned()),
    };
    if is_temp_name(&name) || item.file_type().is_ok_and(|kind| kind.is_symlink()) {
        return Child::Housekeeping;
    }
    match parent.join(&name) {
        Ok(uri) => Child::Visible { name, uri },
        Err(_) => Child::Unaddressable(name),
    }
}

impl BackendRead for LocalBackend {
    fn read(&self, uri: &ResourceUri) -> Result<Vec<u8>, DocError> {
        let path = self.resolve(uri)?;
        if path.is_dir() {
            return Err(DocError::NotAFile {
                uri: uri.to_string(),
            });
        }
        fs::read(&path).map_err(|err| DocError::io("read", uri.to_string(), err))
    }

    fn exists(&self, uri: &ResourceUri) -> Result<bool, DocError> {
        let path = self.resolve(uri)?;
        path.try_exists()
            .map_err(|err| DocError::io("exists", uri.to_string(), err))
    }

    fn metadata(&self, uri: &ResourceUri) -> Result<Metadata, DocError> {
        let path = self.resolve(uri)?;
        self.stat(uri, &path)
    }
}

impl BackendWrite for LocalBackend {
    fn write(&self, uri: &ResourceUri, data: &[u8]) -> Result<(), DocError> {
        let path = self.resolve(uri)?;
        let previous = match fs::metadata(&path) {
            Ok(meta) if meta.is_dir() => {
                return Err(DocError::NotAFile {
                    uri: uri.to_string(),
                });
            }
            Ok(meta) => meta.modified().ok(),
            Err(_) => None,
        };
        let parent = path.parent().ok_or_else(|| DocError::InvalidArgument {
            field: "uri",
            reason: format!("{uri} has no parent directory"),
        })?;
        match fs::metadata(parent) {
            Ok(meta) if meta.is_dir() => {}
            Ok(_) => {
                return Err(DocError::NotADirectory {
                    uri: uri.parent().unwrap_or_default().to_string(),
                });
            }
            Err(err) => {
                return Err(DocError::io(
                    "write",
                    uri.parent().unwrap_or_default().to_string(),
                    err,
                ));
            }
        }

        let io_err = |err| DocError::io("write", uri.to_string(), err);
        let mut tmp = tempfile::Builder::new()
            .prefix(TEMP_PREFIX)
            .suffix(TEMP_SUFFIX)
            .tempfile_in(parent)
            .map_err(io_err)?;
        tmp.write_all(data).map_err(io_err)?;
        tmp.as_file()
            .set_modified(next_modified(previous))
            .map_err(io_err)?;
        tmp.as_file().sync_all().map_err(io_err)?;
        tmp.persist(&path).map_err(|err| io_err(err.error))?;

        if let Err(err) = fs::File::open(parent).and_then(|dir| dir.sync_all()) {
            debug!(uri = %uri, error = %err, "parent directory sync skipped");
        }
        Ok(())
    }

    fn remove_file(&self, uri: &ResourceUri) -> Result<(), DocError> {
        let path = self.resolve(uri)?;
        if path.is_dir() {
            return Err(DocError::NotAFile {
                uri: uri.to_string(),
            });
        }
        fs::remove_file(&path).map_err(|err| DocError::io("remove_file", uri.to_string(), err))
    }
}

impl BackendDir for LocalBackend {
    fn read_dir(&self, uri: &ResourceUri) -> Result<ReadDirIter, DocError> {
        let path = self.resolve(uri)?;
        let meta = self.stat(uri, &path)?;
        if !meta.is_dir() {
            return Err(DocError::NotADirectory {
                uri: uri.to_string(),
            });
        }

        let reader =
            fs::read_dir(&path).map_err(|err| DocError::io("read_dir", uri.to_string(), err))?;
        let mut entries = Vec::new();
        for item in reader {
            let item = match item {
                Ok(item) => item,
                Err(err) => {
                    entries.push(Err(DocError::io("read_dir", uri.to_string(), err)));
                    continue;
                }
            };
            let (name, child) = match classify(uri, &item) {
                Child::Visible { name, uri } => (name, uri),
                Child::Housekeeping => continue,
                Child::Unaddressable(name) => {
                    warn!(uri = %uri, name = %name, "skipping entry with unaddressable name");
                    continue;
                }
            };
            let entry = fs::metadata(item.path())
                .map(|meta| {
                    let meta = metadata_from_fs(&meta);
                    DirEntry {
                        name,
                        uri: child.clone(),
                        kind: meta.kind,
                        size: meta.size,
                    }
                })
                .map_err(|err| DocError::io("read_dir", child.to_string(), err));
            entries.push(entry);
        }
        Ok(ReadDirIter::from_vec(entries))
    }

    fn create_dir(&self, uri: &ResourceUri) -> Result<(), DocError> {
        let path = self.resolve(uri)?;
        fs::create_dir(&path).map_err(|err| DocError::io("create_dir", uri.to_string(), err))
    }

    fn create_dir_all(&self, uri: &ResourceUri) -> Result<(), DocError> {
        let path = self.resolve(uri)?;

        // A file anywhere in the chain means the path is occupied.
        let mut current = Some(uri.clone());
        while let Some(dir) = current {
            let candidate = self.resolve(&dir)?;
            match fs::metadata(&candidate) {
                Ok(meta) if meta.is_dir() => break,
                Ok(_) => {
                    return Err(DocError::AlreadyExists {
                        uri: dir.to_string(),
                        operation: "create_dir_all",
                    });
                }
                Err(_) => current = dir.parent(),
            }
        }

        fs::create_dir_all(&path)
            .map_err(|err| DocError::io("create_dir_all", uri.to_string(), err))
    }

    fn remove_dir(&self, uri: &ResourceUri) -> Result<(), DocError> {
        let path = self.resolve(uri)?;
        if !self.stat(uri, &path)?.is_dir() {
            return Err(DocError::NotADirectory {
                uri: uri.to_string(),
            });
        }
        let io_err = |err| DocError::io("remove_dir", uri.to_string(), err);
        let mut housekeeping = Vec::new();
        for item in fs::read_dir(&path).map_err(io_err)? {
            let item = item.map_err(io_err)?;
            match classify(uri, &item) {
                Child::Housekeeping => housekeeping.push(item.path()),
                Child::Visible { .. } | Child::Unaddressable(_) => {
                    return Err(DocError::DirectoryNotEmpty {
                        uri: uri.to_string(),
                    });
                }
            }
        }
        for entry in housekeeping {
            fs::remove_file(&entry).map_err(io_err)?;
        }
        fs::remove_dir(&path).map_err(io_err)
    }

    fn remove_dir_all(&self, uri: &ResourceUri) -> Result<(), DocError> {
        let path = self.resolve(uri)?;
        if !self.stat(uri, &path)?.is_dir() {
            return Err(DocError::NotADirectory {
                uri: uri.to_string(),
            });
        }
        fs::remove_dir_all(&path)
            .map_err(|err| DocError::io("remove_dir_all", uri.to_string(), err))
    }
}

impl BackendProbe for LocalBackend {
    fn info(&self) -> BackendInfo {
        let root = self.canonical_root.get().unwrap_or(&self.root);
        BackendInfo {
            kind: BackendKind::Local,
            root: root.display().to_string(),
        }
    }

    fn setup(&self, create_root: bool) -> Result<(), DocError> {
        match fs::metadata(&self.root) {
            Ok(meta) if !meta.is_dir() => {
                return Err(DocError::BackendUnavailable {
                    reason: format!("root {} is not a directory", self.root.display()),
                });
            }
            Ok(meta) if meta.permissions().readonly() => {
                return Err(DocError::BackendUnavailable {
                    reason: format!("root {} is read-only", self.root.display()),
                });
            }
            Ok(_) => {}
            Err(_) if create_root => {
                fs::create_dir_all(&self.root).map_err(|err| DocError::BackendUnavailable {
                    reason: format!("cannot create root {}: {err}", self.root.display()),
                })?;
            }
            Err(err) => {
                return Err(DocError::BackendUnavailable {
                    reason: format!("root {} is not accessible: {err}", self.root.display()),
                });
            }
        }
        self.canonical_root().map(|_| ())
    }

    fn probe(&self) -> Result<(), DocError> {
        let root = self.canonical_root()?;
        match fs::metadata(&root) {
            Ok(meta) if meta.is_dir() => Ok(()),
            Ok(_) => Err(DocError::BackendUnavailable {
                reason: format!("root {} is not a directory", root.display()),
            }),
            Err(err) => Err(DocError::BackendUnavailable {
                reason: format!("root {} is not accessible: {err}", root.display()),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::BackendExt;

    fn uri(raw: &str) -> ResourceUri {
        ResourceUri::parse(raw).unwrap()
    }

    fn backend() -> (tempfile::TempDir, LocalBackend) {
        let dir = tempfile::tempdir().unwrap();
        let backend = LocalBackend::new(dir.path());
        backend.setup(false).unwrap();
        (dir, backend)
    }

    #[test]
    fn setup_creates_missing_root_when_allowed() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("nested/root");
        let backend = LocalBackend::new(&root);
        assert!(backend.setup(false).is_err());
        backend.setup(true).unwrap();
        assert!(root.is_dir());
    }

    #[test]
    fn setup_rejects_file_root() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("f");
        fs::write(&file, b"x").unwrap();
        let err = LocalBackend::new(&file).setup(true).unwrap_err();
        assert!(matches!(err, DocError::BackendUnavailable { .. }));
    }

    #[test]
    fn write_is_atomic_and_leaves_no_temp_files() {
        let (dir, backend) = backend();
        backend.write(&uri("/a.md"), b"one").unwrap();
        backend.write(&uri("/a.md"), b"two").unwrap();
        assert_eq!(fs::read(dir.path().join("a.md")).unwrap(), b"two");
        let names: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(names, ["a.md"]);
    }

    #[test]
    fn rewrite_with_same_content_changes_revision() {
        let (_dir, backend) = backend();
        backend.write(&uri("/a.md"), b"same").unwrap();
        let first = backend.metadata(&uri("/a.md")).unwrap().revision;
        backend.write(&uri("/a.md"), b"same").unwrap();
        let second = backend.metadata(&uri("/a.md")).unwrap().revision;
        assert_ne!(first, second);
    }

    #[test]
    fn write_requires_parent() {
        let (_dir, backend) = backend();
        let err = backend.write(&uri("/missing/a.md"), b"x").unwrap_err();
        assert!(matches!(err, DocError::NotFound { .. }));
    }

    #[test]
    fn create_dir_all_detects_file_in_chain() {
        let (_dir, backend) = backend();
        backend.write(&uri("/a"), b"x").unwrap();
        let err = backend.create_dir_all(&uri("/a/b")).unwrap_err();
        assert!(matches!(err, DocError::AlreadyExists { .. }));
    }

    #[test]
    fn remove_dir_refuses_non_empty() {
        let (_dir, backend) = backend();
        backend.create_dir_all(&uri("/d")).unwrap();
        backend.write(&uri("/d/x.md"), b"x").unwrap();
        assert!(matches!(
            backend.remove_dir(&uri("/d")),
            Err(DocError::DirectoryNotEmpty { .. })
        ));
        assert!(backend.is_file(&uri("/d/x.md")).unwrap());
    }

    #[test]
    fn read_dir_reports_kinds_and_sizes() {
        let (_dir, backend) = backend();
        backend.create_dir_all(&uri("/d/sub")).unwrap();
        backend.write(&uri("/d/a.md"), b"abc").unwrap();
        let mut entries = backend.read_dir(&uri("/d")).unwrap().collect_all().unwrap();
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        assert_eq!(entries[0].name, "a.md");
        assert_eq!(entries[0].size, 3);
        assert_eq!(entries[1].kind, EntryKind::Directory);
        assert_eq!(entries[1].uri, uri("/d/sub"));
    }

    #[cfg(unix)]
    #[test]
    fn symlink_escape_is_denied() {
        let (dir, backend) = backend();
        let outside = tempfile::tempdir().unwrap();
        fs::write(outside.path().join("secret.md"), b"s").unwrap();
        std::os::unix::fs::symlink(outside.path(), dir.path().join("link")).unwrap();
        let err = backend.read(&uri("/link/secret.md")).unwrap_err();
        assert!(matches!(err, DocError::AccessDenied { .. }));
        assert_eq!(backend.read_dir(&uri("/")).unwrap().count(), 0);
    }

    #[cfg(unix)]
    #[test]
    fn remove_dir_clears_entries_hidden_from_listings() {
        let (dir, backend) = backend();
        let outside = tempfile::tempdir().unwrap();
        backend.create_dir_all(&uri("/d")).unwrap();
        std::os::unix::fs::symlink(outside.path(), dir.path().join("d/link")).unwrap();
        fs::write(dir.path().join("d/.docfs-stale.tmp"), b"partial").unwrap();
        assert_eq!(backend.read_dir(&uri("/d")).unwrap().count(), 0);

        backend.remove_dir(&uri("/d")).unwrap();
        assert!(!dir.path().join("d").exists());
        assert!(outside.path().is_dir());
    }

    #[cfg(unix)]
    #[test]
    fn unaddressable_names_are_hidden_but_kept() {
        let (dir, backend) = backend();
        backend.create_dir_all(&uri("/d")).unwrap();
        fs::write(dir.path().join("d/padded "), b"x").unwrap();
        assert_eq!(backend.read_dir(&uri("/d")).unwrap().count(), 0);
        assert!(matches!(
            backend.remove_dir(&uri("/d")),
            Err(DocError::DirectoryNotEmpty { .. })
        ));
        assert!(dir.path().join("d/padded ").is_file());
    }

    #[test]
    fn next_modified_is_strictly_increasing() {
        let future = SystemTime::now() + Duration::from_secs(60);
        assert!(next_modified(Some(future)) > future);
        let past = UNIX_EPOCH;
        assert!(next_modified(Some(past)) > past);
    }
}
