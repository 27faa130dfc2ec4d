//! # Resource URIs
//!
//! Normalized, backend-relative addresses.
//!
//! ## Normalization rules
//!
//! - Leading/trailing and repeated `/` are collapsed (`a//b/` → `/a/b`)
//! - `.` segments are dropped
//! - `..` pops the previous segment; popping past the root is rejected
//! - Empty input, `\`, NUL and other control characters are rejected
//! - A segment may not begin or end with whitespace
//!
//! The canonical form always starts with `/`; the root is `/`. Parsing the
//! canonical form of a URI yields the same URI, so normalization is
//! idempotent.

use std::fmt;

use serde::{Serialize, Serializer};

use crate::DocError;

/// A normalized resource address relative to the backend root.
///
/// # Example
///
/// ```rust
/// use docfs_runtime::ResourceUri;
///
/// let uri = ResourceUri::parse("notes//./drafts/../a.md").unwrap();
/// assert_eq!(uri.to_string(), "/notes/a.md");
/// assert_eq!(ResourceUri::parse(&uri.to_string()).unwrap(), uri);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct ResourceUri {
    segments: Vec<String>,
}

impl ResourceUri {
    /// The root URI (`/`).
    pub const fn root() -> Self {
        Self {
            segments: Vec::new(),
        }
    }

    /// Parse and normalize a caller-supplied string.
    ///
    /// # Errors
    ///
    /// - [`DocError::InvalidUri`] if the input is empty, contains a
    ///   forbidden character, has a whitespace-padded segment, or traverses
    ///   above the root
    pub fn parse(input: &str) -> Result<Self, DocError> {
        let invalid = |reason| DocError::InvalidUri {
            input: input.to_string(),
            reason,
        };

        if input.trim().is_empty() {
            return Err(invalid("must be non-empty"));
        }
        if input.contains('\\') {
            return Err(invalid("backslash is not a path separator"));
        }
        if input.chars().any(char::is_control) {
            return Err(invalid("control characters are not allowed"));
        }

        let mut segments: Vec<String> = Vec::new();
        for segment in input.split('/') {
            match segment {
                "" | "." => continue,
                ".." => {
                    if segments.pop().is_none() {
                        return Err(invalid("traverses outside the root"));
                    }
                }
                name if padded(name) => {
                    return Err(invalid("segments must not start or end with whitespace"));
                }
                name => segments.push(name.to_string()),
            }
        }
        Ok(Self { segments })
    }

    /// Normalized path segments.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Returns `true` for `/`.
    #[inline]
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Final segment, `None` for the root.
    pub fn name(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    /// Lowercased extension of the final segment.
    pub fn extension(&self) -> Option<String> {
        let name = self.name()?;
        let (stem, ext) = name.rsplit_once('.')?;
        if stem.is_empty() || ext.is_empty() {
            return None;
        }
        Some(ext.to_ascii_lowercase())
    }

    /// Parent URI, `None` for the root.
    pub fn parent(&self) -> Option<Self> {
        let (_, parent) = self.segments.split_last()?;
        Some(Self {
            segments: parent.to_vec(),
        })
    }

    /// Append a single child name.
    ///
    /// # Errors
    ///
    /// - [`DocError::InvalidUri`] if `name` is not exactly one plain segment
    pub fn join(&self, name: &str) -> Result<Self, DocError> {
        if name.is_empty()
            || name == "."
            || name == ".."
            || name.contains('/')
            || name.contains('\\')
            || name.chars().any(char::is_control)
            || padded(name)
        {
            return Err(DocError::InvalidUri {
                input: name.to_string(),
                reason: "child name must be a single segment",
            });
        }
        let mut segments = self.segments.clone();
        segments.push(name.to_string());
        Ok(Self { segments })
    }

    /// Returns `true` if `self` equals `base` or lies beneath it.
    pub fn starts_with(&self, base: &Self) -> bool {
        self.segments.len() >= base.segments.len()
            && self.segments.iter().zip(&base.segments).all(|(a, b)| a == b)
    }

    /// Path of `self` relative to `base` (`sub/a.md`), `None` if `self` is not
    /// strictly beneath `base`.
    pub fn relative_to(&self, base: &Self) -> Option<String> {
        if !self.starts_with(base) || self.segments.len() == base.segments.len() {
            return None;
        }
        Some(self.segments[base.segments.len()..].join("/"))
    }
}

fn padded(segment: &str) -> bool {
    segment.trim() != segment
}

impl fmt::Display for ResourceUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return f.write_str("/");
        }
        for segment in &self.segments {
            write!(f, "/{segment}")?;
        }
        Ok(())
    }
}

impl std::str::FromStr for ResourceUri {
    type Err = DocError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for ResourceUri {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
