//! Configuration resolution.
//!
//! Everything here is an ancestor-directory search: starting at a file's
//! directory, walk towards the filesystem root and stop at the first
//! directory holding one of the wanted names. Lookups are memoized in a
//! cache shared by every job of the process; callers clear it when the
//! filesystem cache must not be trusted.

use std::collections::HashMap;
use std::fs;
use std::path::{Component, Path, PathBuf};

use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::{PathResolution, Settings};

/// Recognized configuration file names, in lookup order. `package.json`
/// only counts when it embeds an `eslintConfig` key.
pub const CONFIG_FILE_NAMES: &[&str] = &[
    ".eslintrc.js",
    ".eslintrc.yaml",
    ".eslintrc.yml",
    ".eslintrc.json",
    ".eslintrc",
    PACKAGE_MANIFEST,
];

/// Name of the ignore file.
pub const IGNORE_FILE_NAME: &str = ".eslintignore";

const PACKAGE_MANIFEST: &str = "package.json";
const EMBEDDED_CONFIG_KEY: &str = "eslintConfig";

/// Result of the configuration search.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedConfigLocation {
    /// The configuration file, `None` if nothing was found up to the root.
    pub path: Option<PathBuf>,
}

impl ResolvedConfigLocation {
    /// Whether a configuration file was found.
    pub fn is_found(&self) -> bool {
        self.path.is_some()
    }
}

/// Working directory and path to hand to the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelativePath {
    /// Directory the engine runs in.
    pub cwd: PathBuf,
    /// File path as the engine should see it (relative to `cwd`, or absolute).
    pub path: PathBuf,
}

/// Memo table for ancestor searches.
#[derive(Debug, Default)]
pub struct FindCache {
    entries: Mutex<HashMap<(PathBuf, String), Option<PathBuf>>>,
}

impl FindCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Drops every cached lookup.
    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    /// Number of cached lookups.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Returns true if nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    fn get(&self, key: &(PathBuf, String)) -> Option<Option<PathBuf>> {
        self.entries.lock().get(key).cloned()
    }

    fn insert(&self, key: (PathBuf, String), value: Option<PathBuf>) {
        self.entries.lock().insert(key, value);
    }
}

/// Locates configuration and ignore files for arbitrary file locations.
#[derive(Debug)]
pub struct ConfigResolver {
    cache: FindCache,
    home: Option<PathBuf>,
}

impl Default for ConfigResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigResolver {
    /// Creates a resolver using the current user's home directory.
    pub fn new() -> Self {
        Self::with_home(dirs::home_dir())
    }

    /// Creates a resolver with an explicit home directory.
    pub fn with_home(home: Option<PathBuf>) -> Self {
        Self {
            cache: FindCache::new(),
            home: home.map(|h| normalize(&h)),
        }
    }

    /// The home directory used for home-root detection.
    pub fn home(&self) -> Option<&Path> {
        self.home.as_deref()
    }

    /// The shared lookup cache.
    pub fn cache(&self) -> &FindCache {
        &self.cache
    }

    /// Invalidates cached lookups so on-disk changes are observed.
    pub fn clear_cache(&self) {
        debug!("Clearing filesystem lookup cache");
        self.cache.clear();
    }

    /// Finds the nearest ancestor of `dir` (inclusive) containing one of
    /// `names`, checking the names in order within each directory.
    pub fn find_cached(&self, dir: &Path, names: &[&str]) -> Option<PathBuf> {
        let dir = normalize(dir);
        let key = (dir.clone(), names.join("\0"));
        if let Some(hit) = self.cache.get(&key) {
            trace!("find cache hit for {}", dir.display());
            return hit;
        }

        let found = dir.ancestors().find_map(|ancestor| {
            names
                .iter()
                .map(|name| ancestor.join(name))
                .find(|candidate| candidate.exists())
        });

        self.cache.insert(key, found.clone());
        found
    }

    /// Finds the configuration that applies to files in `start_dir`.
    pub fn resolve_config_path(&self, start_dir: &Path) -> ResolvedConfigLocation {
        let mut dir = normalize(start_dir);
        loop {
            let Some(found) = self.find_cached(&dir, CONFIG_FILE_NAMES) else {
                return ResolvedConfigLocation::default();
            };

            let is_manifest = found
                .file_name()
                .is_some_and(|name| name == PACKAGE_MANIFEST);
            if !is_manifest || has_embedded_config(&found) {
                debug!("Resolved ESLint config: {}", found.display());
                return ResolvedConfigLocation { path: Some(found) };
            }

            // A manifest without embedded config is only reached when the
            // directory has no other config file, so keep looking above it.
            match found.parent().and_then(Path::parent) {
                Some(parent) => dir = parent.to_path_buf(),
                None => return ResolvedConfigLocation::default(),
            }
        }
    }

    /// Whether `config_path` sits directly in the user's home directory.
    pub fn is_at_home_root(&self, config_path: &Path) -> bool {
        match (&self.home, config_path.parent()) {
            (Some(home), Some(dir)) => normalize(dir) == *home,
            _ => false,
        }
    }

    /// Whether `location` represents a real per-project configuration.
    pub fn has_project_config(&self, location: &ResolvedConfigLocation) -> bool {
        location
            .path
            .as_deref()
            .is_some_and(|path| !self.is_at_home_root(path))
    }

    /// Finds the `.eslintignore` for files in `dir`, unless ignore files are
    /// disabled in `settings`.
    pub fn find_ignore_file(&self, dir: &Path, settings: &Settings) -> Option<PathBuf> {
        if settings.disable_eslint_ignore {
            return None;
        }
        self.find_cached(dir, &[IGNORE_FILE_NAME])
    }

    /// Computes the working directory and the path the engine matches
    /// ignore patterns and overrides against.
    pub fn relativize_path(
        &self,
        file_dir: &Path,
        file_path: &Path,
        settings: &Settings,
        project_path: Option<&Path>,
    ) -> RelativePath {
        let file_dir = normalize(file_dir);
        let file_path = normalize(file_path);

        if settings.path_resolution == PathResolution::Absolute {
            return RelativePath {
                cwd: file_dir,
                path: file_path,
            };
        }

        let ignore_dir = self
            .find_ignore_file(&file_dir, settings)
            .and_then(|ignore| ignore.parent().map(Path::to_path_buf));
        let root = ignore_dir.or_else(|| project_path.map(normalize));

        if let Some(root) = root
            && file_path.starts_with(&root)
            && let Some(relative) = pathdiff::diff_paths(&file_path, &root)
        {
            return RelativePath {
                cwd: root,
                path: relative,
            };
        }

        let name = file_path
            .file_name()
            .map(PathBuf::from)
            .unwrap_or_else(|| file_path.clone());
        RelativePath {
            cwd: file_dir,
            path: name,
        }
    }
}

fn has_embedded_config(manifest: &Path) -> bool {
    let parsed = fs::read_to_string(manifest)
        .ok()
        .and_then(|content| serde_json::from_str::<serde_json::Value>(&content).ok());
    match parsed {
        Some(value) => value.get(EMBEDDED_CONFIG_KEY).is_some(),
        None => {
            debug!("Unreadable package manifest: {}", manifest.display());
            false
        }
    }
}

/// Lexically normalizes a path: drops `.` components, resolves `..` and
/// strips trailing separators.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push(component);
                }
            }
            other => out.push(other),
        }
    }
    out
}
