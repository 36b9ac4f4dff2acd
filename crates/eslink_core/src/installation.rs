//! Locating the ESLint installation used for a file.

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::resolver::{ConfigResolver, normalize};
use crate::{DebugInfo, InstallationKind, JobError, ResolvedConfigLocation, Settings};

const LOCAL_PACKAGE: &str = "node_modules/eslint";
const PACKAGE_ENTRY: &str = "bin/eslint.js";

/// An ESLint installation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Installation {
    /// How the installation was found.
    pub kind: InstallationKind,
    /// Package directory, or the executable for [`InstallationKind::SystemPath`].
    pub path: Option<PathBuf>,
}

/// A program plus leading arguments that starts ESLint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineCommand {
    pub program: PathBuf,
    pub args: Vec<OsString>,
}

impl Installation {
    /// Finds the installation for files in `file_dir`.
    ///
    /// Order: the global install when `useGlobalEslint` is set, then the
    /// `advancedLocalNodeModules` directory, then the nearest
    /// `node_modules/eslint` above the file, then `eslint` on `PATH`.
    pub fn locate(
        resolver: &ConfigResolver,
        file_dir: &Path,
        settings: &Settings,
        project_path: Option<&Path>,
    ) -> Self {
        if settings.use_global_eslint {
            let prefix = settings
                .global_node_path
                .as_ref()
                .map(PathBuf::from)
                .or_else(node_prefix);
            return Self {
                kind: InstallationKind::Global,
                path: prefix.map(|p| global_modules_dir(&p).join("eslint")),
            };
        }

        if let Some(modules) = settings.advanced_local_node_modules.as_deref() {
            let modules = Path::new(modules);
            let modules = match project_path {
                Some(root) if modules.is_relative() => root.join(modules),
                _ => modules.to_path_buf(),
            };
            return Self {
                kind: InstallationKind::AdvancedSpecified,
                path: Some(normalize(&modules.join("eslint"))),
            };
        }

        if let Some(local) = resolver.find_cached(file_dir, &[LOCAL_PACKAGE]) {
            return Self {
                kind: InstallationKind::LocalProject,
                path: Some(local),
            };
        }

        Self {
            kind: InstallationKind::SystemPath,
            path: which::which("eslint").ok(),
        }
    }

    /// Version recorded in the package manifest.
    pub fn version(&self) -> Option<String> {
        if self.kind == InstallationKind::SystemPath {
            return None;
        }
        let manifest = self.path.as_ref()?.join("package.json");
        let content = fs::read_to_string(manifest).ok()?;
        let value: serde_json::Value = serde_json::from_str(&content).ok()?;
        value
            .get("version")
            .and_then(|v| v.as_str())
            .map(String::from)
    }

    /// How to start this installation.
    pub fn command(&self) -> Result<EngineCommand, JobError> {
        let path = self.path.as_ref().ok_or_else(|| {
            JobError::engine_init(format!("no ESLint installation found ({})", self.kind))
        })?;

        if self.kind == InstallationKind::SystemPath {
            return Ok(EngineCommand {
                program: path.clone(),
                args: Vec::new(),
            });
        }

        let entry = path.join(PACKAGE_ENTRY);
        if !entry.is_file() {
            return Err(JobError::engine_init(format!(
                "{} is not an ESLint package",
                path.display()
            )));
        }
        let node = which::which("node")
            .map_err(|e| JobError::engine_init(format!("node executable not found: {}", e)))?;
        debug!("Using ESLint from {}", path.display());
        Ok(EngineCommand {
            program: node,
            args: vec![entry.into_os_string()],
        })
    }

    /// Debug bundle for this installation.
    pub fn debug_info(&self, config: &ResolvedConfigLocation) -> DebugInfo {
        DebugInfo {
            engine_path: self.path.clone(),
            engine_kind: self.kind,
            engine_version: self.version(),
            config_path: config.path.clone(),
            platform: std::env::consts::OS.to_string(),
        }
    }
}

/// Prefix of the node installation on `PATH` (the parent of its `bin`).
fn node_prefix() -> Option<PathBuf> {
    let node = which::which("node").ok()?;
    let bin = node.parent()?;
    if cfg!(windows) {
        Some(bin.to_path_buf())
    } else {
        bin.parent().map(Path::to_path_buf)
    }
}

fn global_modules_dir(prefix: &Path) -> PathBuf {
    if cfg!(windows) {
        prefix.join("node_modules")
    } else {
        prefix.join("lib").join("node_modules")
    }
}
