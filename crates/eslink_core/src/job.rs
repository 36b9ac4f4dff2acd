//! Jobs sent to the worker and the responses they produce.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::{Diagnostic, Settings};

/// What a job asks the worker to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobKind {
    /// Report diagnostics.
    Lint,
    /// Apply autofixes to the file on disk.
    Fix,
    /// Describe the engine installation that would be used.
    Debug,
}

/// Severity forced onto a rule for one job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleSeverity {
    Off,
    Warn,
    Error,
}

/// Rule id to forced severity. Overrides win over file-declared severities.
pub type RuleOverrides = BTreeMap<String, RuleSeverity>;

/// Builds an override set turning every listed rule off.
pub fn disabled_rules<I, S>(ids: I) -> RuleOverrides
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    ids.into_iter()
        .map(|id| (id.into(), RuleSeverity::Off))
        .collect()
}

/// One unit of work for the worker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    /// Job type.
    pub kind: JobKind,

    /// In-memory contents to lint. When absent the file is read from disk.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    /// Absolute path of the file.
    pub file_path: PathBuf,

    /// Root of the project containing the file, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_path: Option<PathBuf>,

    /// Settings snapshot taken when the job was built.
    pub config: Settings,

    /// Rule overrides for this job.
    #[serde(default)]
    pub rules: RuleOverrides,
}

impl Job {
    /// Creates a job without text or rule overrides.
    pub fn new(kind: JobKind, file_path: impl Into<PathBuf>, config: Settings) -> Self {
        Self {
            kind,
            text: None,
            file_path: file_path.into(),
            project_path: None,
            config,
            rules: RuleOverrides::new(),
        }
    }

    /// Sets the in-memory contents.
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Sets the project root.
    pub fn with_project_path(mut self, project_path: Option<PathBuf>) -> Self {
        self.project_path = project_path;
        self
    }

    /// Sets the rule overrides.
    pub fn with_rules(mut self, rules: RuleOverrides) -> Self {
        self.rules = rules;
        self
    }
}

/// Where the engine used for a file comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum InstallationKind {
    /// `node_modules/eslint` found above the file.
    LocalProject,
    /// The `advancedLocalNodeModules` directory.
    AdvancedSpecified,
    /// The global node installation.
    Global,
    /// Whatever `eslint` resolves to on `PATH`.
    SystemPath,
}

impl std::fmt::Display for InstallationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            InstallationKind::LocalProject => "local project",
            InstallationKind::AdvancedSpecified => "advanced specified",
            InstallationKind::Global => "global",
            InstallationKind::SystemPath => "system path",
        };
        f.write_str(label)
    }
}

/// Result of a debug job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DebugInfo {
    /// Directory of the ESLint package, or the executable for `SystemPath`.
    pub engine_path: Option<PathBuf>,
    /// How the installation was found.
    pub engine_kind: InstallationKind,
    /// Version from the package manifest, when readable.
    pub engine_version: Option<String>,
    /// Project configuration that applies to the file.
    pub config_path: Option<PathBuf>,
    /// Operating system of the worker.
    pub platform: String,
}

/// Exactly one response per job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "payload", rename_all = "lowercase")]
pub enum JobResponse {
    /// Diagnostics in engine emission order.
    Lint(Vec<Diagnostic>),
    /// Human-readable status of a fix. Empty when the fix was skipped.
    Fix(String),
    /// Installation details.
    Debug(DebugInfo),
}
