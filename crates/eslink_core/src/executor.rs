//! Job execution.
//!
//! [`JobExecutor::execute`] is what the worker runs for every job: resolve
//! the configuration for the file, decide whether linting is disabled,
//! build the engine and translate its report into a [`JobResponse`].

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::diagnostic::{Fix, LineIndex, Position, Range, Severity};
use crate::engine::{Engine, EngineFactory, EngineMessage, EngineOptions, EngineRequest};
use crate::installation::Installation;
use crate::resolver::{ConfigResolver, RelativePath, ResolvedConfigLocation};
use crate::{Diagnostic, Job, JobError, JobKind, JobResponse};

/// Pseudo-diagnostics ESLint emits for files matching an ignore pattern.
pub const IGNORED_MESSAGES: &[&str] = &[
    "File ignored because of your .eslintignore file. Use --no-ignore to override.",
    "File ignored because of a matching ignore pattern. Use --no-ignore to override.",
    "File ignored because of a matching ignore pattern. Use \"--no-ignore\" to override.",
    "File ignored by default.  Use a negated ignore pattern (like \"--ignore-pattern '!<relative/path/to/filename>'\") to override.",
    "File ignored by default. Use \"--ignore-pattern '!node_modules/*'\" to override.",
    "File ignored by default. Use \"--ignore-pattern '!bower_components/*'\" to override.",
];

/// Status of a fix that left nothing to report.
pub const FIX_COMPLETE: &str = "Linter-ESLint: Fix complete.";

/// Status of a fix that left reportable messages behind.
pub const FIX_INCOMPLETE: &str = "Linter-ESLint: Fix attempt complete, but linting errors remain.";

/// Whether a raw message should reach the caller.
pub fn should_be_reported(message: &EngineMessage) -> bool {
    !IGNORED_MESSAGES.contains(&message.message.as_str())
}

/// Resolves configuration and runs the engine for jobs.
pub struct JobExecutor {
    resolver: ConfigResolver,
    factory: Box<dyn EngineFactory>,
}

impl JobExecutor {
    /// Creates an executor with a resolver for the current user.
    pub fn new(factory: impl EngineFactory + 'static) -> Self {
        Self::with_resolver(ConfigResolver::new(), factory)
    }

    /// Creates an executor with an explicit resolver.
    pub fn with_resolver(resolver: ConfigResolver, factory: impl EngineFactory + 'static) -> Self {
        Self {
            resolver,
            factory: Box::new(factory),
        }
    }

    /// The resolver whose cache is shared by every job.
    pub fn resolver(&self) -> &ConfigResolver {
        &self.resolver
    }

    /// Runs one job to completion.
    pub fn execute(&self, job: &Job) -> Result<JobResponse, JobError> {
        if job.config.disable_fs_cache {
            self.resolver.clear_cache();
        }

        let file_dir = job.file_path.parent().unwrap_or_else(|| Path::new(""));
        let project_path = job.project_path.as_deref();
        let config = self.resolver.resolve_config_path(file_dir);

        if job.config.disable_when_no_eslint_config && !self.resolver.has_project_config(&config)
        {
            info!(
                "No project ESLint config for {}, skipping",
                job.file_path.display()
            );
            return Ok(match job.kind {
                JobKind::Fix => JobResponse::Fix(String::new()),
                _ => JobResponse::Lint(Vec::new()),
            });
        }

        if job.kind == JobKind::Debug {
            let installation =
                Installation::locate(&self.resolver, file_dir, &job.config, project_path);
            return Ok(JobResponse::Debug(installation.debug_info(&config)));
        }

        let engine = self
            .factory
            .create(&self.resolver, file_dir, &job.config, project_path)?;
        let relative =
            self.resolver
                .relativize_path(file_dir, &job.file_path, &job.config, project_path);
        let options = self.engine_options(job, file_dir, &config);

        match job.kind {
            JobKind::Fix => self.fix(engine.as_ref(), relative, options),
            _ => self.lint(engine.as_ref(), job, relative, options),
        }
    }

    fn lint(
        &self,
        engine: &dyn Engine,
        job: &Job,
        relative: RelativePath,
        options: EngineOptions,
    ) -> Result<JobResponse, JobError> {
        let request = EngineRequest {
            cwd: relative.cwd,
            file_path: relative.path,
            text: job.text.clone(),
            options,
        };
        let report = engine.execute(&request)?;

        let messages: Vec<&EngineMessage> = report
            .first_messages()
            .iter()
            .filter(|m| should_be_reported(m))
            .collect();
        debug!(
            "{} reportable message(s) for {}",
            messages.len(),
            job.file_path.display()
        );
        if messages.is_empty() {
            return Ok(JobResponse::Lint(Vec::new()));
        }

        let source = match &job.text {
            Some(text) => text.clone(),
            None => fs::read_to_string(&job.file_path)?,
        };
        let index = LineIndex::new(&source);
        let diagnostics = messages
            .into_iter()
            .map(|m| to_diagnostic(m, &index))
            .collect();
        Ok(JobResponse::Lint(diagnostics))
    }

    fn fix(
        &self,
        engine: &dyn Engine,
        relative: RelativePath,
        options: EngineOptions,
    ) -> Result<JobResponse, JobError> {
        let request = EngineRequest {
            cwd: relative.cwd,
            file_path: relative.path,
            text: None,
            options,
        };
        let report = engine.execute(&request)?;

        let remaining = report
            .first_messages()
            .iter()
            .filter(|m| should_be_reported(m))
            .count();
        let status = if remaining == 0 {
            FIX_COMPLETE
        } else {
            FIX_INCOMPLETE
        };
        Ok(JobResponse::Fix(status.to_string()))
    }

    fn engine_options(
        &self,
        job: &Job,
        file_dir: &Path,
        config: &ResolvedConfigLocation,
    ) -> EngineOptions {
        let settings = &job.config;
        let rule_paths = settings
            .eslint_rules_dirs
            .iter()
            .filter_map(|dir| {
                let dir = self.expand_home(dir);
                if dir.is_absolute() {
                    Some(dir)
                } else {
                    self.resolver
                        .find_cached(file_dir, &[dir.to_string_lossy().as_ref()])
                }
            })
            .collect();

        let config_file = match (&config.path, &settings.eslintrc_path) {
            (None, Some(fallback)) => Some(self.expand_home(fallback)),
            _ => None,
        };

        EngineOptions {
            rules: job.rules.clone(),
            ignore: !settings.disable_eslint_ignore,
            ignore_path: self.resolver.find_ignore_file(file_dir, settings),
            fix: job.kind == JobKind::Fix,
            rule_paths,
            config_file,
        }
    }

    fn expand_home(&self, path: &str) -> PathBuf {
        match (path.strip_prefix("~/"), self.resolver.home()) {
            (Some(rest), Some(home)) => home.join(rest),
            _ => PathBuf::from(path),
        }
    }
}

/// Converts a raw message into a diagnostic whose ranges fit `index`.
pub fn to_diagnostic(message: &EngineMessage, index: &LineIndex) -> Diagnostic {
    let range = match (message.line, message.column) {
        (Some(line), Some(column)) => {
            let start = index.clamp(Position::new(
                line.saturating_sub(1),
                column.saturating_sub(1),
            ));
            match (message.end_line, message.end_column) {
                (Some(end_line), Some(end_column)) => Range::new(
                    start,
                    index.clamp(Position::new(
                        end_line.saturating_sub(1),
                        end_column.saturating_sub(1),
                    )),
                ),
                _ => index.token_range(start),
            }
        }
        (Some(line), None) => index.line_range(line.saturating_sub(1)),
        _ => index.line_range(0),
    };

    let mut diagnostic = Diagnostic::new(message.rule_id.clone(), message.message.clone(), range)
        .with_severity(Severity::from_eslint(message.severity));
    if let Some(fix) = &message.fix {
        let fix_range = Range::new(
            index.position_at(fix.range[0]),
            index.position_at(fix.range[1]),
        );
        diagnostic = diagnostic.with_fix(Fix::new(fix_range, fix.text.clone()));
    }
    diagnostic
}
