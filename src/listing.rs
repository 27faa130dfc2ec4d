//! Directory listings.
//!
//! Listings are built from [`BackendDir::read_dir`](crate::BackendDir::read_dir)
//! and sorted by relative URI, so output order never depends on how the
//! backend enumerates.

use crate::{Backend, DirectoryEntry, DocError, EntryKind, ResourceUri};

/// List `base`, immediate children only or every descendant.
///
/// Entry URIs are relative to `base` (`sub/a.md`).
///
/// # Errors
///
/// - [`DocError::NotFound`] if `base` is not an existing directory
pub(crate) fn list_directory<B: Backend + ?Sized>(
    backend: &B,
    base: &ResourceUri,
    recursive: bool,
) -> Result<Vec<DirectoryEntry>, DocError> {
    let mut entries = Vec::new();
    let mut pending = vec![base.clone()];

    while let Some(dir) = pending.pop() {
        let children = match backend.read_dir(&dir) {
            Err(DocError::NotADirectory { uri }) if dir == *base => {
                return Err(DocError::NotFound { uri });
            }
            other => other?,
        };
        for child in children {
            let child = child?;
            let relative = child.uri.relative_to(base).ok_or_else(|| {
                DocError::Internal(format!("{} listed outside {base}", child.uri))
            })?;
            if recursive && child.kind == EntryKind::Directory {
                pending.push(child.uri);
            }
            entries.push(DirectoryEntry {
                name: child.name,
                kind: child.kind,
                uri: relative,
                size: child.size,
            });
        }
    }

    entries.sort_unstable_by(|a, b| a.uri.cmp(&b.uri));
    Ok(entries)
}
