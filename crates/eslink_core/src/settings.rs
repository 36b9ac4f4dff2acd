//! User settings.
//!
//! A [`Settings`] value is the snapshot attached to every job. It is a plain
//! value: once cloned into a job, later settings changes never reach it.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::JobError;

/// Scope added to [`Settings::effective_scopes`] when `lintHtmlFiles` is on.
pub const EMBEDDED_HTML_SCOPE: &str = "source.js.embedded.html";

/// How the file path handed to ESLint is computed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PathResolution {
    /// Relative to the `.eslintignore` directory or the project root.
    #[default]
    ProjectRelative,
    /// The absolute path, unchanged.
    Absolute,
}

/// All user-configurable options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// Editor scopes this linter applies to.
    pub scopes: Vec<String>,

    /// Lint JavaScript embedded in HTML files.
    pub lint_html_files: bool,

    /// Run a fix job whenever a matching document is saved.
    pub fix_on_save: bool,

    /// Append the rule id to each message.
    pub show_rule_id_in_message: bool,

    /// Skip linting when no project configuration exists.
    pub disable_when_no_eslint_config: bool,

    /// Rules turned off while the buffer has unsaved changes.
    pub rules_to_silence_while_typing: Vec<String>,

    /// Rules turned off while fixing.
    pub rules_to_disable_while_fixing: Vec<String>,

    /// Do not trust cached filesystem lookups.
    #[serde(rename = "disableFSCache")]
    pub disable_fs_cache: bool,

    /// Ignore `.eslintignore` files.
    pub disable_eslint_ignore: bool,

    /// How file paths are reported to ESLint.
    pub path_resolution: PathResolution,

    /// Configuration file used when no project configuration is found.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eslintrc_path: Option<String>,

    /// Additional rule directories.
    pub eslint_rules_dirs: Vec<String>,

    /// Use the globally installed ESLint.
    pub use_global_eslint: bool,

    /// Prefix of the global node installation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub global_node_path: Option<String>,

    /// Explicit `node_modules` directory to load ESLint from.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub advanced_local_node_modules: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            scopes: default_scopes(),
            lint_html_files: false,
            fix_on_save: false,
            show_rule_id_in_message: true,
            disable_when_no_eslint_config: true,
            rules_to_silence_while_typing: Vec::new(),
            rules_to_disable_while_fixing: Vec::new(),
            disable_fs_cache: false,
            disable_eslint_ignore: false,
            path_resolution: PathResolution::default(),
            eslintrc_path: None,
            eslint_rules_dirs: Vec::new(),
            use_global_eslint: false,
            global_node_path: None,
            advanced_local_node_modules: None,
        }
    }
}

fn default_scopes() -> Vec<String> {
    [
        "source.js",
        "source.jsx",
        "source.js.jsx",
        "source.babel",
        "source.js-semantic",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

impl Settings {
    /// Loads settings from a JSON file. Missing keys take their defaults.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, JobError> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_json(&content)
    }

    /// Parses settings from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, JobError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Configured scopes plus the embedded HTML scope when enabled.
    pub fn effective_scopes(&self) -> Vec<String> {
        let mut scopes = self.scopes.clone();
        if self.lint_html_files && !scopes.iter().any(|s| s == EMBEDDED_HTML_SCOPE) {
            scopes.push(EMBEDDED_HTML_SCOPE.to_string());
        }
        scopes
    }
}
