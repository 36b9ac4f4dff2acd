//! Files on disk as session documents.

use std::fs;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use tracing::{info, warn};

use eslink_core::Position;
use eslink_session::{Document, Notifier};

/// A saved file. Its text is read once; it is never modified.
pub struct FileDocument {
    path: PathBuf,
    text: String,
    cursor: Mutex<Position>,
    scopes: Vec<String>,
}

impl FileDocument {
    pub fn open(path: &Path) -> std::io::Result<Self> {
        let text = fs::read_to_string(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            text,
            cursor: Mutex::new(Position::default()),
            scopes: scopes_for(path),
        })
    }
}

/// Scope descriptor guessed from the file extension.
fn scopes_for(path: &Path) -> Vec<String> {
    let scope = match path.extension().and_then(|e| e.to_str()) {
        Some("jsx") => "source.js.jsx",
        Some("html" | "htm") => "source.js.embedded.html",
        _ => "source.js",
    };
    vec![scope.to_string()]
}

impl Document for FileDocument {
    fn path(&self) -> Option<PathBuf> {
        Some(self.path.clone())
    }

    fn text(&self) -> String {
        self.text.clone()
    }

    fn is_modified(&self) -> bool {
        false
    }

    fn cursor_position(&self) -> Position {
        *self.cursor.lock()
    }

    fn set_cursor_position(&self, position: Position) {
        *self.cursor.lock() = position;
    }

    fn cursor_scopes(&self) -> Vec<String> {
        self.scopes.clone()
    }
}

/// Prints notifications: messages meant for the user on stdout, problems
/// through the log.
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn success(&self, message: &str) {
        println!("{}", message);
    }

    fn info(&self, title: &str, detail: &str) {
        info!("{}", title);
        println!("{}", detail);
    }

    fn warning(&self, message: &str) {
        warn!("{}", message);
    }

    fn error(&self, message: &str) {
        tracing::error!("{}", message);
    }
}
