//! Session Controller.
//!
//! Turns editor events into jobs. Every job goes through one gate, so the
//! [`Dispatcher`] never sees two at once. Lint results are checked against
//! the text they were computed for and dropped when the document changed
//! in the meantime.

use std::collections::HashMap;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tracing::{debug, info, warn};

use eslink_core::{
    ConfigResolver, DebugInfo, Job, JobKind, JobResponse, LineIndex, RuleOverrides, Settings,
};

use crate::dispatcher::Dispatcher;
use crate::document::{Document, Notifier, ProjectLocator};
use crate::error::{DispatchError, SessionError};
use crate::message::LintMessage;
use crate::state::SettingsState;

/// Warning shown when a fix is requested on a document that is not saved.
pub const PLEASE_SAVE: &str = "Linter-ESLint: Please save before fixing";

/// Title of the debug notification.
pub const DEBUG_TITLE: &str = "linter-eslint debugging information";

/// Debug detail shown when no project configuration enables linting.
pub const DEBUG_DISABLED: &str =
    "Linting is disabled for this file: no project ESLint configuration was found.";

/// Lint progress of one document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum LintState {
    #[default]
    Idle,
    /// A lint job is in flight.
    Linting,
    /// The result arrived for text that has since changed and was dropped.
    StaleDiscard,
}

/// What happened to a fix request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FixOutcome {
    /// The document has no path or unsaved changes; no job was sent.
    Refused,
    /// Linting is disabled for the file; no job was sent.
    Skipped,
    /// The worker fixed the file. Holds its status message.
    Completed(String),
    /// The job failed. Holds the message shown to the user.
    Failed(String),
}

type StateObserver = Box<dyn Fn(&Path, LintState) + Send + Sync>;

/// Drives lint, fix and debug jobs for an editor.
pub struct SessionController {
    dispatcher: Dispatcher,
    resolver: ConfigResolver,
    settings: RwLock<SettingsState>,
    notifier: Arc<dyn Notifier>,
    projects: Box<dyn ProjectLocator>,
    gate: tokio::sync::Mutex<()>,
    states: Mutex<HashMap<PathBuf, LintState>>,
    observer: Option<StateObserver>,
}

impl SessionController {
    pub fn new(
        dispatcher: Dispatcher,
        settings: Settings,
        notifier: Arc<dyn Notifier>,
        projects: impl ProjectLocator + 'static,
    ) -> Self {
        Self {
            dispatcher,
            resolver: ConfigResolver::new(),
            settings: RwLock::new(SettingsState::new(settings)),
            notifier,
            projects: Box::new(projects),
            gate: tokio::sync::Mutex::new(()),
            states: Mutex::new(HashMap::new()),
            observer: None,
        }
    }

    /// Replaces the resolver used for the fix-time disablement check.
    pub fn with_resolver(mut self, resolver: ConfigResolver) -> Self {
        self.resolver = resolver;
        self
    }

    /// Calls `observer` on every lint state transition.
    pub fn with_state_observer(
        mut self,
        observer: impl Fn(&Path, LintState) + Send + Sync + 'static,
    ) -> Self {
        self.observer = Some(Box::new(observer));
        self
    }

    /// Lint state of the document at `path`.
    pub fn lint_state(&self, path: &Path) -> LintState {
        self.states.lock().get(path).copied().unwrap_or_default()
    }

    /// Scopes the linter currently applies to.
    pub fn scopes(&self) -> Vec<String> {
        self.settings.read().scopes().to_vec()
    }

    /// Applies new settings to jobs built from now on.
    pub fn update_settings(&self, settings: Settings) {
        self.settings.write().update(settings);
        debug!("Settings updated");
    }

    /// Lints `doc`.
    ///
    /// Returns `Ok(None)` when the document changed while the job ran; the
    /// result was computed for old text and is dropped.
    pub async fn lint(&self, doc: &dyn Document) -> Result<Option<Vec<LintMessage>>, SessionError> {
        let text = doc.text();
        if text.is_empty() {
            return Ok(Some(Vec::new()));
        }
        let Some(path) = doc.path() else {
            debug!("Skipping lint of a document without a path");
            return Ok(Some(Vec::new()));
        };

        let (settings, rules) = {
            let state = self.settings.read();
            let rules = if doc.is_modified() {
                state.silenced_while_typing().clone()
            } else {
                RuleOverrides::new()
            };
            (state.settings().clone(), rules)
        };
        let job = Job::new(JobKind::Lint, &path, settings)
            .with_text(text.clone())
            .with_project_path(self.projects.project_path(&path))
            .with_rules(rules);

        self.set_state(&path, LintState::Linting);
        let linting = LintingGuard {
            session: self,
            path: &path,
        };
        let response = self.dispatch(job).await?;

        if doc.text() != text {
            info!("Discarding stale lint result for {}", path.display());
            self.set_state(&path, LintState::StaleDiscard);
            return Ok(None);
        }
        drop(linting);

        let diagnostics = match response {
            JobResponse::Lint(diagnostics) => diagnostics,
            other => return Err(SessionError::unexpected(&other)),
        };
        let show_rule_id = self.settings.read().settings().show_rule_id_in_message;
        let index = LineIndex::new(&text);
        Ok(Some(
            diagnostics
                .into_iter()
                .map(|d| LintMessage::from_diagnostic(d, &path, &index, show_rule_id))
                .collect(),
        ))
    }

    /// Runs the fix-on-save hook. Returns `None` when no fix was attempted.
    pub async fn on_did_save(&self, doc: &dyn Document) -> Option<FixOutcome> {
        let applies = {
            let state = self.settings.read();
            state.settings().fix_on_save
                && doc
                    .cursor_scopes()
                    .iter()
                    .any(|scope| state.scopes().contains(scope))
        };
        if !applies {
            return None;
        }
        Some(self.fix_job(doc, true).await)
    }

    /// Fixes the saved file behind `doc`.
    ///
    /// Refuses with a warning when the document is unsaved. Failures become
    /// a warning notification; success is announced unless `is_save`.
    pub async fn fix_job(&self, doc: &dyn Document, is_save: bool) -> FixOutcome {
        let path = match doc.path() {
            Some(path) if !doc.is_modified() => path,
            _ => {
                self.notifier.warning(PLEASE_SAVE);
                return FixOutcome::Refused;
            }
        };

        let (settings, rules) = {
            let state = self.settings.read();
            (
                state.settings().clone(),
                state.disabled_while_fixing().clone(),
            )
        };

        if settings.disable_fs_cache {
            self.resolver.clear_cache();
        }
        let file_dir = path.parent().unwrap_or_else(|| Path::new(""));
        let config = self.resolver.resolve_config_path(file_dir);
        if settings.disable_when_no_eslint_config && !self.resolver.has_project_config(&config) {
            debug!("No project ESLint config for {}, not fixing", path.display());
            return FixOutcome::Skipped;
        }

        let cursor = doc.cursor_position();
        let job = Job::new(JobKind::Fix, &path, settings)
            .with_project_path(self.projects.project_path(&path))
            .with_rules(rules);

        match self.dispatch(job).await {
            Ok(JobResponse::Fix(status)) => {
                if !is_save {
                    self.notifier.success(&status);
                }
                doc.set_cursor_position(cursor);
                FixOutcome::Completed(status)
            }
            Ok(other) => {
                let message = SessionError::unexpected(&other).to_string();
                self.notifier.warning(&message);
                FixOutcome::Failed(message)
            }
            Err(e) => {
                let message = e.to_string();
                warn!("Fix of {} failed: {}", path.display(), message);
                self.notifier.warning(&message);
                FixOutcome::Failed(message)
            }
        }
    }

    /// Collects installation details for `doc` and shows them.
    ///
    /// Returns `Ok(None)` when linting is disabled for the file; the worker
    /// answers such jobs with an empty lint result.
    pub async fn debug(&self, doc: &dyn Document) -> Result<Option<DebugInfo>, SessionError> {
        let Some(path) = doc.path() else {
            self.notifier.error("Linter-ESLint: Debug requires a saved file");
            return Err(SessionError::MissingPath);
        };
        let settings = self.settings.read().settings().clone();
        let job = Job::new(JobKind::Debug, &path, settings.clone())
            .with_project_path(self.projects.project_path(&path));

        let info = match self.dispatch(job).await {
            Ok(JobResponse::Debug(info)) => info,
            Ok(JobResponse::Lint(diagnostics)) if diagnostics.is_empty() => {
                self.notifier.info(DEBUG_TITLE, DEBUG_DISABLED);
                return Ok(None);
            }
            Ok(other) => return Err(SessionError::unexpected(&other)),
            Err(e) => {
                self.notifier.error(&e.to_string());
                return Err(e.into());
            }
        };

        let detail = debug_report(&info, &self.scopes(), &settings);
        self.notifier.info(DEBUG_TITLE, &detail);
        Ok(Some(info))
    }

    /// Terminates the worker. Later jobs fail with
    /// [`DispatchError::WorkerUnavailable`].
    pub async fn shutdown(&self) {
        self.dispatcher.terminate().await;
    }

    async fn dispatch(&self, job: Job) -> Result<JobResponse, DispatchError> {
        let _gate = self.gate.lock().await;
        self.dispatcher.send(job).await
    }

    fn set_state(&self, path: &Path, state: LintState) {
        self.states.lock().insert(path.to_path_buf(), state);
        if let Some(observer) = &self.observer {
            observer(path, state);
        }
    }
}

/// Returns a document to [`LintState::Idle`] however its lint ends,
/// including when the lint future is dropped mid-flight.
struct LintingGuard<'a> {
    session: &'a SessionController,
    path: &'a Path,
}

impl Drop for LintingGuard<'_> {
    fn drop(&mut self) {
        self.session.set_state(self.path, LintState::Idle);
    }
}

fn debug_report(info: &DebugInfo, scopes: &[String], settings: &Settings) -> String {
    let display = |path: &Option<PathBuf>| {
        path.as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "none".to_string())
    };

    let mut report = String::new();
    let _ = writeln!(report, "eslink version: {}", env!("CARGO_PKG_VERSION"));
    let _ = writeln!(
        report,
        "ESLint version: {}",
        info.engine_version.as_deref().unwrap_or("unknown")
    );
    let _ = writeln!(report, "ESLint path: {}", display(&info.engine_path));
    let _ = writeln!(report, "ESLint source: {}", info.engine_kind);
    let _ = writeln!(report, "Config file: {}", display(&info.config_path));
    let _ = writeln!(report, "Platform: {}", info.platform);
    let _ = writeln!(report, "Current scopes: {}", scopes.join(", "));
    let settings = serde_json::to_string_pretty(settings).unwrap_or_default();
    let _ = write!(report, "linter-eslint configuration: {}", settings);
    report
}
