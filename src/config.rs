//! Runtime configuration.

use serde::{Deserialize, Serialize};

use crate::{BackendSelector, DocError};

/// Settings applied when a [`Runtime`](crate::Runtime) is constructed.
///
/// Every field except `root` has a default, so the JSON form can be as small
/// as `{"root": "memory://notes"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RuntimeConfig {
    /// Location identifier: a directory, `file://…` or `memory://name`.
    pub root: String,
    /// Backend variant selection.
    pub backend: BackendSelector,
    /// Allow `initialize` to create a missing local root.
    pub create_root: bool,
    /// Extensions (lowercase, without dot) accepted as markdown documents.
    pub markdown_extensions: Vec<String>,
    /// Log every backend call at `trace` level.
    pub trace_backend: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            root: String::new(),
            backend: BackendSelector::Auto,
            create_root: true,
            markdown_extensions: vec!["md".into(), "markdown".into()],
            trace_backend: false,
        }
    }
}

impl RuntimeConfig {
    /// Defaults bound to `root`.
    pub fn new(root: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            ..Self::default()
        }
    }

    /// Parse the JSON form.
    ///
    /// # Errors
    ///
    /// - [`DocError::InvalidArgument`] if the JSON is malformed or a field
    ///   is unknown
    pub fn from_json(raw: &str) -> Result<Self, DocError> {
        serde_json::from_str(raw).map_err(|err| DocError::InvalidArgument {
            field: "config",
            reason: err.to_string(),
        })
    }

    pub(crate) fn accepts_extension(&self, ext: &str) -> bool {
        self.markdown_extensions
            .iter()
            .any(|allowed| allowed.trim_start_matches('.').eq_ignore_ascii_case(ext))
    }
}
