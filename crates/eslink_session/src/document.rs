//! Editor surface.
//!
//! The session never talks to an editor directly; hosts implement these
//! traits for their buffers and notification area.

use std::path::{Path, PathBuf};

use eslink_core::Position;

/// An open text document.
pub trait Document: Send + Sync {
    /// Path on disk. `None` for documents that were never saved.
    fn path(&self) -> Option<PathBuf>;

    /// Current buffer contents.
    fn text(&self) -> String;

    /// Whether the buffer has unsaved changes.
    fn is_modified(&self) -> bool;

    fn cursor_position(&self) -> Position;

    fn set_cursor_position(&self, position: Position);

    /// Scope descriptors at the cursor, e.g. `source.js`.
    fn cursor_scopes(&self) -> Vec<String>;
}

/// User-visible notifications.
pub trait Notifier: Send + Sync {
    fn success(&self, message: &str);

    fn info(&self, title: &str, detail: &str);

    fn warning(&self, message: &str);

    fn error(&self, message: &str);
}

/// Finds the project a file belongs to.
pub trait ProjectLocator: Send + Sync {
    fn project_path(&self, file: &Path) -> Option<PathBuf>;
}

/// Fixed list of project roots. The deepest root containing a file wins.
#[derive(Debug, Clone, Default)]
pub struct ProjectRoots {
    roots: Vec<PathBuf>,
}

impl ProjectRoots {
    pub fn new(roots: impl IntoIterator<Item = PathBuf>) -> Self {
        Self {
            roots: roots.into_iter().collect(),
        }
    }
}

impl ProjectLocator for ProjectRoots {
    fn project_path(&self, file: &Path) -> Option<PathBuf> {
        self.roots
            .iter()
            .filter(|root| file.starts_with(root))
            .max_by_key(|root| root.components().count())
            .cloned()
    }
}
