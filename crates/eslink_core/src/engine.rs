//! Engine abstraction.
//!
//! The [`Engine`] trait is the seam between job execution and whatever
//! actually runs ESLint. The production implementation drives the ESLint
//! command line ([`crate::eslint::EslintCli`]); tests plug in scripted
//! engines.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::resolver::ConfigResolver;
use crate::{JobError, RuleOverrides, Settings};

/// Options controlling one engine run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EngineOptions {
    /// Rule severities that override the file's configuration.
    pub rules: RuleOverrides,
    /// Honor ignore files.
    pub ignore: bool,
    /// Explicit ignore file.
    pub ignore_path: Option<PathBuf>,
    /// Write fixes back to disk.
    pub fix: bool,
    /// Additional rule directories.
    pub rule_paths: Vec<PathBuf>,
    /// Configuration file to use instead of the cascade.
    pub config_file: Option<PathBuf>,
}

/// One engine invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineRequest {
    /// Working directory of the run.
    pub cwd: PathBuf,
    /// Path used for configuration and ignore matching.
    pub file_path: PathBuf,
    /// In-memory contents. When absent the engine reads `file_path` from disk.
    pub text: Option<String>,
    /// Run options.
    pub options: EngineOptions,
}

impl EngineRequest {
    /// Absolute location of the file on disk.
    pub fn absolute_path(&self) -> PathBuf {
        if self.file_path.is_absolute() {
            self.file_path.clone()
        } else {
            self.cwd.join(&self.file_path)
        }
    }
}

/// Replacement suggested by ESLint, as UTF-16 offsets into the source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineFix {
    pub range: [usize; 2],
    pub text: String,
}

/// A raw message as reported by ESLint. Lines and columns are 1-indexed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineMessage {
    #[serde(default)]
    pub rule_id: Option<String>,
    pub severity: u8,
    pub message: String,
    #[serde(default)]
    pub line: Option<u32>,
    #[serde(default)]
    pub column: Option<u32>,
    #[serde(default)]
    pub end_line: Option<u32>,
    #[serde(default)]
    pub end_column: Option<u32>,
    #[serde(default)]
    pub fix: Option<EngineFix>,
    #[serde(default)]
    pub fatal: bool,
}

impl EngineMessage {
    /// A message without location, as used for file-level notices.
    pub fn notice(severity: u8, message: impl Into<String>) -> Self {
        Self {
            rule_id: None,
            severity,
            message: message.into(),
            line: None,
            column: None,
            end_line: None,
            end_column: None,
            fix: None,
            fatal: false,
        }
    }
}

/// Per-file section of a report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileReport {
    pub file_path: PathBuf,
    #[serde(default)]
    pub messages: Vec<EngineMessage>,
    /// Fixed source, present when fixes were applied.
    #[serde(default)]
    pub output: Option<String>,
}

/// Result of one engine run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineReport {
    pub results: Vec<FileReport>,
}

impl EngineReport {
    /// Messages of the first (and only) file in the report.
    pub fn first_messages(&self) -> &[EngineMessage] {
        self.results
            .first()
            .map(|r| r.messages.as_slice())
            .unwrap_or_default()
    }
}

/// Runs the analysis.
pub trait Engine: Send + Sync {
    /// Executes one run. With `options.fix` set the engine writes the fixed
    /// file itself and reports the messages that remain.
    fn execute(&self, request: &EngineRequest) -> Result<EngineReport, JobError>;
}

/// Builds the engine appropriate for a file location.
pub trait EngineFactory: Send + Sync {
    /// Fails with [`JobError::EngineInit`] when no usable engine exists.
    fn create(
        &self,
        resolver: &ConfigResolver,
        file_dir: &Path,
        settings: &Settings,
        project_path: Option<&Path>,
    ) -> Result<Box<dyn Engine>, JobError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_eslint_json_report() {
        let json = r#"[{
            "filePath": "/p/bad.js",
            "messages": [
                { "ruleId": "no-undef", "severity": 2, "message": "'foo' is not defined.",
                  "line": 1, "column": 1, "endLine": 1, "endColumn": 4, "nodeType": "Identifier" },
                { "ruleId": null, "fatal": true, "severity": 2, "message": "Parsing error",
                  "line": 3, "column": 2 }
            ],
            "errorCount": 2,
            "warningCount": 0
        }]"#;

        let results: Vec<FileReport> = serde_json::from_str(json).unwrap();
        let report = EngineReport { results };
        let messages = report.first_messages();

        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].rule_id.as_deref(), Some("no-undef"));
        assert_eq!(messages[0].end_column, Some(4));
        assert!(messages[1].fatal);
        assert_eq!(messages[1].rule_id, None);
    }

    #[test]
    fn test_absolute_path() {
        let request = EngineRequest {
            cwd: PathBuf::from("/p"),
            file_path: PathBuf::from("src/a.js"),
            text: None,
            options: EngineOptions::default(),
        };
        assert_eq!(request.absolute_path(), PathBuf::from("/p/src/a.js"));
    }

    #[test]
    fn test_empty_report_has_no_messages() {
        assert!(EngineReport::default().first_messages().is_empty());
    }
}
