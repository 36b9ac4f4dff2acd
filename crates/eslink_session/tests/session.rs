//! Session behavior against a real worker loop running a scripted engine.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use tempfile::{TempDir, tempdir};

use eslink_core::executor::{FIX_COMPLETE, FIX_INCOMPLETE};
use eslink_core::protocol::FailureKind;
use eslink_core::test_utils::{FakeEslint, write_tree};
use eslink_core::{
    ConfigResolver, InstallationKind, JobExecutor, Position, Range, Settings, Severity,
};
use eslink_session::{
    DEBUG_DISABLED, DEBUG_TITLE, DispatchError, Dispatcher, Document, FixOutcome, LintState,
    Notifier, PLEASE_SAVE, ProjectRoots, SessionController, SessionError,
};
use eslink_worker::Worker;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Note {
    Success(String),
    Info(String, String),
    Warning(String),
    Error(String),
}

#[derive(Default)]
struct RecordingNotifier {
    notes: Mutex<Vec<Note>>,
}

impl RecordingNotifier {
    fn notes(&self) -> Vec<Note> {
        self.notes.lock().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn success(&self, message: &str) {
        self.notes.lock().push(Note::Success(message.to_string()));
    }

    fn info(&self, title: &str, detail: &str) {
        self.notes
            .lock()
            .push(Note::Info(title.to_string(), detail.to_string()));
    }

    fn warning(&self, message: &str) {
        self.notes.lock().push(Note::Warning(message.to_string()));
    }

    fn error(&self, message: &str) {
        self.notes.lock().push(Note::Error(message.to_string()));
    }
}

struct TestDoc {
    path: Option<PathBuf>,
    text: Mutex<String>,
    modified: AtomicBool,
    cursor: Mutex<Position>,
    cursor_restores: AtomicUsize,
    scopes: Vec<String>,
}

impl TestDoc {
    fn saved(path: &Path) -> Self {
        let text = fs::read_to_string(path).unwrap_or_default();
        Self {
            path: Some(path.to_path_buf()),
            text: Mutex::new(text),
            modified: AtomicBool::new(false),
            cursor: Mutex::new(Position::new(0, 0)),
            cursor_restores: AtomicUsize::new(0),
            scopes: vec!["source.js".to_string()],
        }
    }

    fn edit(&self, text: &str) {
        *self.text.lock() = text.to_string();
        self.modified.store(true, Ordering::SeqCst);
    }
}

impl Document for TestDoc {
    fn path(&self) -> Option<PathBuf> {
        self.path.clone()
    }

    fn text(&self) -> String {
        self.text.lock().clone()
    }

    fn is_modified(&self) -> bool {
        self.modified.load(Ordering::SeqCst)
    }

    fn cursor_position(&self) -> Position {
        *self.cursor.lock()
    }

    fn set_cursor_position(&self, position: Position) {
        *self.cursor.lock() = position;
        self.cursor_restores.fetch_add(1, Ordering::SeqCst);
    }

    fn cursor_scopes(&self) -> Vec<String> {
        self.scopes.clone()
    }
}

struct Harness {
    session: Arc<SessionController>,
    engine: FakeEslint,
    notifier: Arc<RecordingNotifier>,
    transitions: Arc<Mutex<Vec<LintState>>>,
}

fn start(engine: FakeEslint, settings: Settings, project: &Path, home: Option<PathBuf>) -> Harness {
    let (client, server) = tokio::io::duplex(64 * 1024);
    let (server_read, server_write) = tokio::io::split(server);
    let worker = Worker::new(JobExecutor::with_resolver(
        ConfigResolver::with_home(home.clone()),
        engine.clone(),
    ));
    tokio::spawn(async move {
        let _ = worker.serve(server_read, server_write).await;
    });

    let (client_read, client_write) = tokio::io::split(client);
    let notifier = Arc::new(RecordingNotifier::default());
    let transitions = Arc::new(Mutex::new(Vec::new()));
    let observed = Arc::clone(&transitions);
    let session = SessionController::new(
        Dispatcher::connect(client_read, client_write),
        settings,
        notifier.clone(),
        ProjectRoots::new([project.to_path_buf()]),
    )
    .with_resolver(ConfigResolver::with_home(home))
    .with_state_observer(move |_, state| observed.lock().push(state));

    Harness {
        session: Arc::new(session),
        engine,
        notifier,
        transitions,
    }
}

fn project(files: &[(&str, &str)]) -> TempDir {
    let dir = tempdir().unwrap();
    write_tree(dir.path(), files);
    dir
}

#[tokio::test]
async fn test_lint_reports_undefined_name_and_extra_semicolon() {
    let dir = project(&[(".eslintrc.json", "{}"), ("bad.js", "foo = 42;;\n")]);
    let h = start(FakeEslint::new(), Settings::default(), dir.path(), None);
    let doc = TestDoc::saved(&dir.path().join("bad.js"));

    let messages = h.session.lint(&doc).await.unwrap().unwrap();

    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].rule_id.as_deref(), Some("no-undef"));
    assert_eq!(messages[0].message, "'foo' is not defined. (no-undef)");
    assert_eq!(messages[0].severity, Severity::Error);
    assert_eq!(messages[0].range, Range::from_tuples((0, 0), (0, 3)));
    assert_eq!(messages[0].fix, None);

    assert_eq!(messages[1].rule_id.as_deref(), Some("semi"));
    assert_eq!(messages[1].range, Range::from_tuples((0, 8), (0, 9)));
    let fix = messages[1].fix.as_ref().unwrap();
    assert_eq!(fix.range, Range::from_tuples((0, 6), (0, 9)));
    assert_eq!(fix.text, "42");
    assert_eq!(messages[1].file_path, dir.path().join("bad.js"));

    assert_eq!(h.session.lint_state(&dir.path().join("bad.js")), LintState::Idle);
    assert_eq!(
        *h.transitions.lock(),
        vec![LintState::Linting, LintState::Idle]
    );
}

#[tokio::test]
async fn test_empty_document_sends_no_job() {
    let dir = project(&[(".eslintrc.json", "{}"), ("empty.js", "")]);
    let h = start(FakeEslint::new(), Settings::default(), dir.path(), None);
    let doc = TestDoc::saved(&dir.path().join("empty.js"));

    assert_eq!(h.session.lint(&doc).await.unwrap(), Some(Vec::new()));
    assert_eq!(h.engine.calls(), 0);
    assert!(h.transitions.lock().is_empty());
}

#[tokio::test]
async fn test_fix_is_idempotent_and_restores_cursor() {
    let dir = project(&[(".eslintrc.json", "{}"), ("a.js", "var a = \"x\";;\n")]);
    let file = dir.path().join("a.js");
    let h = start(FakeEslint::new(), Settings::default(), dir.path(), None);
    let doc = TestDoc::saved(&file);
    *doc.cursor.lock() = Position::new(0, 5);

    let first = h.session.fix_job(&doc, false).await;
    assert_eq!(first, FixOutcome::Completed(FIX_COMPLETE.to_string()));
    let once = fs::read_to_string(&file).unwrap();
    assert_eq!(once, "var a = 'x';\n");

    let second = h.session.fix_job(&doc, false).await;
    assert_eq!(second, FixOutcome::Completed(FIX_COMPLETE.to_string()));
    assert_eq!(fs::read_to_string(&file).unwrap(), once);

    let relinted = h.session.lint(&TestDoc::saved(&file)).await.unwrap();
    assert_eq!(relinted, Some(Vec::new()));

    assert_eq!(doc.cursor_restores.load(Ordering::SeqCst), 2);
    assert_eq!(doc.cursor_position(), Position::new(0, 5));
    assert_eq!(
        h.notifier.notes(),
        vec![
            Note::Success(FIX_COMPLETE.to_string()),
            Note::Success(FIX_COMPLETE.to_string()),
        ]
    );
}

#[tokio::test]
async fn test_fix_with_remaining_errors() {
    let dir = project(&[(".eslintrc.json", "{}"), ("a.js", "foo = 1;;\n")]);
    let file = dir.path().join("a.js");
    let h = start(FakeEslint::new(), Settings::default(), dir.path(), None);

    let outcome = h.session.fix_job(&TestDoc::saved(&file), false).await;
    assert_eq!(outcome, FixOutcome::Completed(FIX_INCOMPLETE.to_string()));
    assert_eq!(fs::read_to_string(&file).unwrap(), "foo = 1;\n");
}

#[tokio::test]
async fn test_silenced_rules_apply_only_to_modified_documents() {
    let dir = project(&[(".eslintrc.json", "{}"), ("bad.js", "foo = 42;;\n")]);
    let settings = Settings {
        rules_to_silence_while_typing: vec!["semi".to_string()],
        ..Settings::default()
    };
    let h = start(FakeEslint::new(), settings, dir.path(), None);
    let doc = TestDoc::saved(&dir.path().join("bad.js"));

    let saved = h.session.lint(&doc).await.unwrap().unwrap();
    assert_eq!(saved.len(), 2);

    doc.edit("foo = 42;;\n");
    let typing = h.session.lint(&doc).await.unwrap().unwrap();
    let rules: Vec<_> = typing.iter().map(|m| m.rule_id.as_deref()).collect();
    assert_eq!(rules, vec![Some("no-undef")]);
}

#[tokio::test]
async fn test_rules_disabled_while_fixing_are_left_alone() {
    let dir = project(&[(".eslintrc.json", "{}"), ("a.js", "var a = \"x\";;\n")]);
    let file = dir.path().join("a.js");
    let settings = Settings {
        rules_to_disable_while_fixing: vec!["semi".to_string()],
        ..Settings::default()
    };
    let h = start(FakeEslint::new(), settings, dir.path(), None);

    let outcome = h.session.fix_job(&TestDoc::saved(&file), true).await;
    assert_eq!(outcome, FixOutcome::Completed(FIX_COMPLETE.to_string()));
    assert_eq!(fs::read_to_string(&file).unwrap(), "var a = 'x';;\n");
    assert!(h.notifier.notes().is_empty());
}

#[tokio::test]
async fn test_result_for_changed_text_is_discarded() {
    let dir = project(&[(".eslintrc.json", "{}"), ("bad.js", "foo = 42;;\n")]);
    let file = dir.path().join("bad.js");
    let engine = FakeEslint::new().with_delay(Duration::from_millis(300));
    let h = start(engine, Settings::default(), dir.path(), None);
    let doc = Arc::new(TestDoc::saved(&file));

    let pending = {
        let session = Arc::clone(&h.session);
        let doc = Arc::clone(&doc);
        tokio::spawn(async move { session.lint(doc.as_ref()).await })
    };
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(h.session.lint_state(&file), LintState::Linting);

    doc.edit("var foo = 42;\n");
    assert_eq!(pending.await.unwrap().unwrap(), None);
    assert_eq!(h.session.lint_state(&file), LintState::Idle);
    assert_eq!(
        *h.transitions.lock(),
        vec![LintState::Linting, LintState::StaleDiscard, LintState::Idle]
    );

    let fresh = h.session.lint(doc.as_ref()).await.unwrap().unwrap();
    assert!(fresh.is_empty());
}

#[tokio::test]
async fn test_cancelled_lint_returns_to_idle() {
    let dir = project(&[(".eslintrc.json", "{}"), ("bad.js", "foo = 42;;\n")]);
    let file = dir.path().join("bad.js");
    let engine = FakeEslint::new().with_delay(Duration::from_millis(300));
    let h = start(engine, Settings::default(), dir.path(), None);
    let doc = Arc::new(TestDoc::saved(&file));

    let pending = {
        let session = Arc::clone(&h.session);
        let doc = Arc::clone(&doc);
        tokio::spawn(async move { session.lint(doc.as_ref()).await })
    };
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(h.session.lint_state(&file), LintState::Linting);

    pending.abort();
    assert!(pending.await.unwrap_err().is_cancelled());
    assert_eq!(h.session.lint_state(&file), LintState::Idle);
    assert_eq!(
        *h.transitions.lock(),
        vec![LintState::Linting, LintState::Idle]
    );

    let messages = h.session.lint(doc.as_ref()).await.unwrap().unwrap();
    assert_eq!(messages.len(), 2);
}

#[tokio::test]
async fn test_ignored_file_has_no_diagnostics() {
    let dir = project(&[
        (".eslintrc.json", "{}"),
        (".eslintignore", "ignored.js\n"),
        ("ignored.js", "foo = 42;;\n"),
    ]);
    let h = start(FakeEslint::new(), Settings::default(), dir.path(), None);
    let doc = TestDoc::saved(&dir.path().join("ignored.js"));

    assert_eq!(h.session.lint(&doc).await.unwrap(), Some(Vec::new()));

    let file = dir.path().join("ignored.js");
    let before = fs::read(&file).unwrap();
    assert_eq!(
        h.session.fix_job(&doc, true).await,
        FixOutcome::Completed(FIX_COMPLETE.to_string())
    );
    assert_eq!(fs::read(&file).unwrap(), before);

    h.session.update_settings(Settings {
        disable_eslint_ignore: true,
        ..Settings::default()
    });
    let messages = h.session.lint(&doc).await.unwrap().unwrap();
    assert_eq!(messages.len(), 2);
}

#[tokio::test]
async fn test_no_project_config_disables_lint_and_fix() {
    let dir = project(&[("src/a.js", "foo = 42;;\n")]);
    let file = dir.path().join("src/a.js");
    let h = start(FakeEslint::new(), Settings::default(), dir.path(), None);
    let doc = TestDoc::saved(&file);

    assert_eq!(h.session.lint(&doc).await.unwrap(), Some(Vec::new()));
    assert_eq!(h.session.fix_job(&doc, false).await, FixOutcome::Skipped);
    assert_eq!(h.engine.calls(), 0);
    assert_eq!(fs::read_to_string(&file).unwrap(), "foo = 42;;\n");
}

#[tokio::test]
async fn test_config_at_home_root_counts_as_none() {
    let home = project(&[(".eslintrc.json", "{}"), ("proj/a.js", "foo = 42;;\n")]);
    let proj = home.path().join("proj");
    let h = start(
        FakeEslint::new(),
        Settings::default(),
        &proj,
        Some(home.path().to_path_buf()),
    );
    let doc = TestDoc::saved(&proj.join("a.js"));

    assert_eq!(h.session.lint(&doc).await.unwrap(), Some(Vec::new()));
    assert_eq!(h.session.fix_job(&doc, false).await, FixOutcome::Skipped);
    assert_eq!(h.engine.calls(), 0);
}

#[tokio::test]
async fn test_missing_config_is_reported_when_linting_stays_enabled() {
    let dir = project(&[("a.js", "foo;\n")]);
    let settings = Settings {
        disable_when_no_eslint_config: false,
        ..Settings::default()
    };
    let h = start(FakeEslint::new(), settings, dir.path(), None);
    let doc = TestDoc::saved(&dir.path().join("a.js"));

    match h.session.lint(&doc).await {
        Err(SessionError::Dispatch(DispatchError::Rejected(failure))) => {
            assert_eq!(failure.kind, FailureKind::ConfigNotFound);
        }
        other => panic!("unexpected {:?}", other),
    }
    assert_eq!(h.session.lint_state(&dir.path().join("a.js")), LintState::Idle);
}

#[tokio::test]
async fn test_unsaved_fix_is_refused_without_a_job() {
    let dir = project(&[(".eslintrc.json", "{}"), ("a.js", "var a;;\n")]);
    let file = dir.path().join("a.js");
    let h = start(FakeEslint::new(), Settings::default(), dir.path(), None);

    let doc = TestDoc::saved(&file);
    doc.edit("var a;;\nvar b;\n");
    assert_eq!(h.session.fix_job(&doc, false).await, FixOutcome::Refused);

    let untitled = TestDoc {
        path: None,
        ..TestDoc::saved(&file)
    };
    assert_eq!(h.session.fix_job(&untitled, false).await, FixOutcome::Refused);

    assert_eq!(h.engine.calls(), 0);
    assert_eq!(fs::read_to_string(&file).unwrap(), "var a;;\n");
    assert_eq!(
        h.notifier.notes(),
        vec![
            Note::Warning(PLEASE_SAVE.to_string()),
            Note::Warning(PLEASE_SAVE.to_string()),
        ]
    );
}

#[tokio::test]
async fn test_fix_on_save_follows_scopes() {
    let dir = project(&[(".eslintrc.json", "{}"), ("a.js", "var a;;\n")]);
    let file = dir.path().join("a.js");
    let settings = Settings {
        fix_on_save: true,
        ..Settings::default()
    };
    let h = start(FakeEslint::new(), settings, dir.path(), None);

    let markdown = TestDoc {
        scopes: vec!["text.md".to_string()],
        ..TestDoc::saved(&file)
    };
    assert_eq!(h.session.on_did_save(&markdown).await, None);

    let doc = TestDoc::saved(&file);
    assert_eq!(
        h.session.on_did_save(&doc).await,
        Some(FixOutcome::Completed(FIX_COMPLETE.to_string()))
    );
    assert_eq!(fs::read_to_string(&file).unwrap(), "var a;\n");
    assert!(h.notifier.notes().is_empty());

    h.session.update_settings(Settings::default());
    assert_eq!(h.session.on_did_save(&doc).await, None);
}

#[tokio::test]
async fn test_failed_fix_becomes_warning() {
    let dir = project(&[(".eslintrc.json", "{}"), ("a.js", "var a;;\n")]);
    let engine = FakeEslint::new().panicking_on("a.js");
    let h = start(engine, Settings::default(), dir.path(), None);
    let doc = TestDoc::saved(&dir.path().join("a.js"));

    let FixOutcome::Failed(message) = h.session.fix_job(&doc, false).await else {
        panic!("fix should fail");
    };
    assert!(message.contains("worker job crashed"));
    assert_eq!(h.notifier.notes(), vec![Note::Warning(message)]);
    assert_eq!(doc.cursor_restores.load(Ordering::SeqCst), 0);

    let lint = h.session.lint(&doc).await;
    assert!(matches!(
        lint,
        Err(SessionError::Dispatch(DispatchError::Rejected(_)))
    ));
}

#[tokio::test]
async fn test_rule_id_setting_applies_after_update() {
    let dir = project(&[(".eslintrc.json", "{}"), ("bad.js", "foo;\n")]);
    let h = start(FakeEslint::new(), Settings::default(), dir.path(), None);
    let doc = TestDoc::saved(&dir.path().join("bad.js"));

    h.session.update_settings(Settings {
        show_rule_id_in_message: false,
        ..Settings::default()
    });
    let messages = h.session.lint(&doc).await.unwrap().unwrap();
    assert_eq!(messages[0].message, "'foo' is not defined.");
}

#[tokio::test]
async fn test_debug_shows_installation() {
    let dir = project(&[
        (".eslintrc.json", "{}"),
        ("node_modules/eslint/package.json", r#"{"version": "3.19.0"}"#),
        ("a.js", "var a;\n"),
    ]);
    let h = start(FakeEslint::new(), Settings::default(), dir.path(), None);
    let doc = TestDoc::saved(&dir.path().join("a.js"));

    let info = h.session.debug(&doc).await.unwrap().unwrap();
    assert_eq!(info.engine_kind, InstallationKind::LocalProject);
    assert_eq!(info.engine_version.as_deref(), Some("3.19.0"));
    assert_eq!(info.config_path, Some(dir.path().join(".eslintrc.json")));
    assert_eq!(h.engine.calls(), 0);

    let notes = h.notifier.notes();
    assert_eq!(notes.len(), 1);
    match &notes[0] {
        Note::Info(title, detail) => {
            assert_eq!(title, DEBUG_TITLE);
            assert!(detail.contains("ESLint version: 3.19.0"));
            assert!(detail.contains("Current scopes: source.js"));
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[tokio::test]
async fn test_debug_without_project_config_is_a_no_op() {
    let dir = project(&[("a.js", "var a;\n")]);
    let h = start(FakeEslint::new(), Settings::default(), dir.path(), None);
    let doc = TestDoc::saved(&dir.path().join("a.js"));

    assert_eq!(h.session.debug(&doc).await.unwrap(), None);
    assert_eq!(h.engine.calls(), 0);
    assert_eq!(
        h.notifier.notes(),
        vec![Note::Info(DEBUG_TITLE.to_string(), DEBUG_DISABLED.to_string())]
    );
}

#[tokio::test]
async fn test_shutdown_rejects_later_jobs() {
    let dir = project(&[(".eslintrc.json", "{}"), ("a.js", "foo;\n")]);
    let h = start(FakeEslint::new(), Settings::default(), dir.path(), None);
    let doc = TestDoc::saved(&dir.path().join("a.js"));

    h.session.shutdown().await;
    assert!(matches!(
        h.session.lint(&doc).await,
        Err(SessionError::Dispatch(DispatchError::WorkerUnavailable))
    ));
    assert_eq!(h.engine.calls(), 0);
}
