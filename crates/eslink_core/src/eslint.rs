//! ESLint command-line engine.

use std::ffi::OsString;
use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};

use tracing::{debug, warn};

use crate::engine::{Engine, EngineFactory, EngineReport, EngineRequest, FileReport};
use crate::installation::{EngineCommand, Installation};
use crate::resolver::ConfigResolver;
use crate::{JobError, RuleSeverity, Settings};

/// Markers in ESLint's fatal output that point at configuration problems.
const CONFIG_NOT_FOUND_MARKERS: &[&str] = &["No ESLint configuration found"];
const INIT_FAILURE_MARKERS: &[&str] = &[
    "Cannot read config file",
    "Failed to load config",
    "Failed to load plugin",
    "ESLint couldn't find the config",
    "ESLint couldn't find the plugin",
];

/// Runs ESLint through its command line with `--format json`.
#[derive(Debug, Clone)]
pub struct EslintCli {
    command: EngineCommand,
}

impl EslintCli {
    pub fn new(command: EngineCommand) -> Self {
        Self { command }
    }

    /// Command-line arguments for `request`, after the program's own prefix.
    pub fn build_args(request: &EngineRequest) -> Vec<OsString> {
        let options = &request.options;
        let mut args: Vec<OsString> = vec!["--format".into(), "json".into()];

        if options.fix {
            args.push("--fix".into());
        }
        if !options.ignore {
            args.push("--no-ignore".into());
        } else if let Some(ignore_path) = &options.ignore_path {
            args.push("--ignore-path".into());
            args.push(ignore_path.clone().into_os_string());
        }
        for dir in &options.rule_paths {
            args.push("--rulesdir".into());
            args.push(dir.clone().into_os_string());
        }
        if let Some(config) = &options.config_file {
            args.push("--config".into());
            args.push(config.clone().into_os_string());
        }
        for (rule, severity) in &options.rules {
            let level = match severity {
                RuleSeverity::Off => "off",
                RuleSeverity::Warn => "warn",
                RuleSeverity::Error => "error",
            };
            args.push("--rule".into());
            args.push(format!("{}: {}", rule, level).into());
        }

        if request.text.is_some() {
            args.push("--stdin".into());
            args.push("--stdin-filename".into());
            args.push(request.file_path.clone().into_os_string());
        } else {
            args.push(request.file_path.clone().into_os_string());
        }
        args
    }
}

impl Engine for EslintCli {
    fn execute(&self, request: &EngineRequest) -> Result<EngineReport, JobError> {
        let mut command = Command::new(&self.command.program);
        command
            .args(&self.command.args)
            .args(Self::build_args(request))
            .current_dir(&request.cwd)
            .stdin(if request.text.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        debug!("Running ESLint in {}", request.cwd.display());
        let mut child = command.spawn().map_err(|e| {
            JobError::engine_init(format!(
                "failed to start {}: {}",
                self.command.program.display(),
                e
            ))
        })?;

        if let Some(text) = &request.text
            && let Some(mut stdin) = child.stdin.take()
        {
            // ESLint may exit before reading all of stdin; its exit status
            // and stderr still say why.
            if let Err(e) = stdin.write_all(text.as_bytes()) {
                warn!("Could not write the document to ESLint: {}", e);
            }
        }

        let output = child.wait_with_output()?;
        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);

        match output.status.code() {
            // 0: clean, 1: lint errors reported
            Some(0) | Some(1) => {
                let results: Vec<FileReport> = serde_json::from_str(&stdout).map_err(|e| {
                    JobError::engine_runtime(format!("unreadable ESLint report: {}", e))
                })?;
                Ok(EngineReport { results })
            }
            code => {
                warn!("ESLint exited with {:?}", code);
                Err(classify_failure(&request.cwd, &stdout, &stderr))
            }
        }
    }
}

/// Maps ESLint's fatal output onto the job error taxonomy.
pub fn classify_failure(cwd: &Path, stdout: &str, stderr: &str) -> JobError {
    let combined = format!("{}\n{}", stderr, stdout);
    let has = |markers: &[&str]| markers.iter().any(|m| combined.contains(m));

    if has(CONFIG_NOT_FOUND_MARKERS) {
        return JobError::ConfigNotFound(cwd.to_path_buf());
    }

    let detail = combined
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with("Oops!"))
        .take(3)
        .collect::<Vec<_>>()
        .join(" ");

    if has(INIT_FAILURE_MARKERS) {
        JobError::engine_init(detail)
    } else {
        JobError::engine_runtime(detail)
    }
}

/// Builds [`EslintCli`] engines from the installation found for each file.
#[derive(Debug, Clone, Copy, Default)]
pub struct EslintFactory;

impl EngineFactory for EslintFactory {
    fn create(
        &self,
        resolver: &ConfigResolver,
        file_dir: &Path,
        settings: &Settings,
        project_path: Option<&Path>,
    ) -> Result<Box<dyn Engine>, JobError> {
        let installation = Installation::locate(resolver, file_dir, settings, project_path);
        let command = installation.command()?;
        Ok(Box::new(EslintCli::new(command)))
    }
}
