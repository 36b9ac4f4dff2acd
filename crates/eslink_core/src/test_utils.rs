//! In-process stand-in for ESLint, for tests.
//!
//! [`FakeEslint`] implements three rules over ASCII sources:
//!
//! - `no-undef`: a line starting with `foo`
//! - `semi`: `;;`, fixable by dropping the first semicolon
//! - `quotes`: a double-quoted string, fixable by switching to single quotes
//!
//! It honors rule overrides, ignore files (one path per line, relative to the
//! ignore file's directory), fix mode (writes the file like ESLint does) and
//! reports a missing configuration the way ESLint does.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::engine::{
    Engine, EngineFactory, EngineFix, EngineMessage, EngineReport, EngineRequest, FileReport,
};
use crate::executor::IGNORED_MESSAGES;
use crate::resolver::{ConfigResolver, IGNORE_FILE_NAME};
use crate::{JobError, RuleSeverity, Settings};

const MAX_FIX_PASSES: usize = 10;

/// Fake engine and factory. Clones share the invocation counter.
#[derive(Debug, Clone, Default)]
pub struct FakeEslint {
    calls: Arc<AtomicUsize>,
    delay: Option<Duration>,
    panic_on: Option<String>,
    config_missing: bool,
}

impl FakeEslint {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sleeps this long before answering each run.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Panics when asked to lint a file with this name.
    pub fn panicking_on(mut self, file_name: impl Into<String>) -> Self {
        self.panic_on = Some(file_name.into());
        self
    }

    /// Number of engine runs so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn severity_for(&self, request: &EngineRequest, rule: &str) -> Option<u8> {
        match request.options.rules.get(rule) {
            Some(RuleSeverity::Off) => None,
            Some(RuleSeverity::Warn) => Some(1),
            Some(RuleSeverity::Error) | None => Some(2),
        }
    }

    fn is_ignored(&self, request: &EngineRequest) -> bool {
        if !request.options.ignore {
            return false;
        }
        let ignore_file = request
            .options
            .ignore_path
            .clone()
            .unwrap_or_else(|| request.cwd.join(IGNORE_FILE_NAME));
        let Ok(patterns) = fs::read_to_string(&ignore_file) else {
            return false;
        };
        let base = ignore_file.parent().unwrap_or_else(|| Path::new(""));
        let absolute = request.absolute_path();
        let Some(relative) = pathdiff::diff_paths(&absolute, base) else {
            return false;
        };
        let relative = relative.to_string_lossy().replace('\\', "/");
        patterns
            .lines()
            .map(str::trim)
            .any(|pattern| !pattern.is_empty() && pattern == relative)
    }

    fn check(&self, request: &EngineRequest, source: &str) -> Vec<EngineMessage> {
        let mut messages = Vec::new();
        let mut offset = 0usize;

        for (line_no, line) in source.split_inclusive('\n').enumerate() {
            let line_no = line_no as u32 + 1;
            let content = line.trim_end_matches(['\n', '\r']);

            if content.starts_with("foo")
                && let Some(severity) = self.severity_for(request, "no-undef")
            {
                messages.push(located(
                    "no-undef",
                    severity,
                    "'foo' is not defined.",
                    line_no,
                    0,
                    3,
                    None,
                ));
            }

            if let Some(severity) = self.severity_for(request, "quotes")
                && let Some(open) = content.find('"')
                && let Some(len) = content[open + 1..].find('"')
            {
                let close = open + 1 + len;
                let inner = &content[open + 1..close];
                messages.push(located(
                    "quotes",
                    severity,
                    "Strings must use singlequote.",
                    line_no,
                    open,
                    close + 1,
                    Some(EngineFix {
                        range: [offset + open, offset + close + 1],
                        text: format!("'{}'", inner),
                    }),
                ));
            }

            if let Some(severity) = self.severity_for(request, "semi")
                && let Some(first) = content.find(";;")
            {
                let token_start = content[..first]
                    .rfind(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
                    .map(|i| i + 1)
                    .unwrap_or(0);
                messages.push(located(
                    "semi",
                    severity,
                    "Extra semicolon.",
                    line_no,
                    first,
                    first + 1,
                    Some(EngineFix {
                        range: [offset + token_start, offset + first + 1],
                        text: content[token_start..first].to_string(),
                    }),
                ));
            }

            offset += line.len();
        }
        messages
    }
}

fn located(
    rule: &str,
    severity: u8,
    message: &str,
    line: u32,
    start: usize,
    end: usize,
    fix: Option<EngineFix>,
) -> EngineMessage {
    EngineMessage {
        rule_id: Some(rule.to_string()),
        line: Some(line),
        column: Some(start as u32 + 1),
        end_line: Some(line),
        end_column: Some(end as u32 + 1),
        fix,
        ..EngineMessage::notice(severity, message)
    }
}

/// Applies non-overlapping fixes in offset order.
fn apply_fixes(source: &str, messages: &[EngineMessage]) -> Option<String> {
    let mut fixes: Vec<&EngineFix> = messages.iter().filter_map(|m| m.fix.as_ref()).collect();
    if fixes.is_empty() {
        return None;
    }
    fixes.sort_by_key(|f| f.range[0]);

    let mut out = String::with_capacity(source.len());
    let mut cursor = 0usize;
    for fix in fixes {
        if fix.range[0] < cursor {
            continue;
        }
        out.push_str(&source[cursor..fix.range[0]]);
        out.push_str(&fix.text);
        cursor = fix.range[1];
    }
    out.push_str(&source[cursor..]);
    Some(out)
}

impl Engine for FakeEslint {
    fn execute(&self, request: &EngineRequest) -> Result<EngineReport, JobError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }
        if let Some(name) = &self.panic_on
            && request.file_path.file_name().is_some_and(|f| f == name.as_str())
        {
            panic!("fake engine crashed on {}", name);
        }
        if self.config_missing {
            return Err(JobError::ConfigNotFound(request.cwd.clone()));
        }

        let report = |messages: Vec<EngineMessage>, output: Option<String>| EngineReport {
            results: vec![FileReport {
                file_path: request.absolute_path(),
                messages,
                output,
            }],
        };

        if self.is_ignored(request) {
            return Ok(report(
                vec![EngineMessage::notice(1, IGNORED_MESSAGES[2])],
                None,
            ));
        }

        let path = request.absolute_path();
        let mut source = match &request.text {
            Some(text) => text.clone(),
            None => fs::read_to_string(&path)?,
        };
        let mut messages = self.check(request, &source);

        if !request.options.fix {
            return Ok(report(messages, None));
        }

        let mut fixed = false;
        for _ in 0..MAX_FIX_PASSES {
            match apply_fixes(&source, &messages) {
                Some(next) if next != source => {
                    source = next;
                    messages = self.check(request, &source);
                    fixed = true;
                }
                _ => break,
            }
        }
        if fixed {
            fs::write(&path, &source)?;
        }
        let remaining = messages.into_iter().filter(|m| m.fix.is_none()).collect();
        Ok(report(remaining, fixed.then_some(source)))
    }
}

impl EngineFactory for FakeEslint {
    fn create(
        &self,
        resolver: &ConfigResolver,
        file_dir: &Path,
        settings: &Settings,
        _project_path: Option<&Path>,
    ) -> Result<Box<dyn Engine>, JobError> {
        let mut engine = self.clone();
        engine.config_missing =
            !resolver.resolve_config_path(file_dir).is_found() && settings.eslintrc_path.is_none();
        Ok(Box::new(engine))
    }
}

/// Writes `files` (relative path, contents) under `root`, creating parents.
pub fn write_tree(root: &Path, files: &[(&str, &str)]) -> Vec<PathBuf> {
    files
        .iter()
        .map(|(relative, contents)| {
            let path = root.join(relative);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).expect("create fixture directory");
            }
            fs::write(&path, contents).expect("write fixture file");
            path
        })
        .collect()
}
