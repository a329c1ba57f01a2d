//! Engine Executable Locator
//!
//! Best-effort lookup of the engine binary relative to the running console:
//!
//! 1. the configured file names directly in the base directory;
//! 2. a walk up from the base directory, probing the conventional build
//!    output sub-paths at each level and then searching that level
//!    recursively for the primary file name.
//!
//! The first existing regular file wins. Filesystem errors while probing
//! are logged and treated as "no match here"; the walk carries on.

use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::config::LocatorConfig;

/// Finds the engine executable on disk
#[derive(Debug, Clone)]
pub struct ExecutableLocator {
    config: LocatorConfig,
}

impl ExecutableLocator {
    pub fn new(config: LocatorConfig) -> Self {
        Self { config }
    }

    /// Start searching from `dir` instead of the executable's directory
    pub fn with_base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.base_dir = Some(dir.into());
        self
    }

    pub fn config(&self) -> &LocatorConfig {
        &self.config
    }

    /// Directory the search starts from
    pub fn base_dir(&self) -> Option<PathBuf> {
        if let Some(dir) = &self.config.base_dir {
            return Some(dir.clone());
        }
        match std::env::current_exe() {
            Ok(exe) => exe.parent().map(Path::to_path_buf),
            Err(e) => {
                debug!(error = %e, "Cannot resolve current executable");
                None
            }
        }
    }

    /// Locate the engine; `None` when the search is exhausted
    pub fn locate(&self) -> Option<PathBuf> {
        let base = self.base_dir()?;
        let found = self.locate_from(&base);
        match &found {
            Some(path) => info!(path = %path.display(), "Located engine executable"),
            None => debug!(base = %base.display(), "Engine executable not found"),
        }
        found
    }

    /// Run the search strategy rooted at `base`
    pub fn locate_from(&self, base: &Path) -> Option<PathBuf> {
        for name in &self.config.file_names {
            if let Some(found) = probe(&base.join(name)) {
                return Some(found);
            }
        }

        let name = self.config.primary_name()?;
        let mut level = Some(base);
        for _ in 0..self.config.max_parent_levels {
            let Some(dir) = level else { break };

            for sub_dir in &self.config.sub_dirs {
                if let Some(found) = probe(&dir.join(sub_dir).join(name)) {
                    return Some(found);
                }
            }

            if let Some(found) = search_tree(dir, name) {
                return Some(found);
            }

            level = dir.parent();
        }
        None
    }
}

impl Default for ExecutableLocator {
    fn default() -> Self {
        Self::new(LocatorConfig::default())
    }
}

/// `path`, made absolute, when it names an existing regular file
fn probe(path: &Path) -> Option<PathBuf> {
    match fs::metadata(path) {
        Ok(meta) if meta.is_file() => absolutize(path),
        Ok(_) => None,
        Err(e) => {
            if e.kind() != std::io::ErrorKind::NotFound {
                debug!(path = %path.display(), error = %e, "Skipping unreadable candidate");
            }
            None
        }
    }
}

/// Recursive search below `root` for a regular file called `name`
///
/// Unreadable directories are skipped. No depth limit is applied.
fn search_tree(root: &Path, name: &str) -> Option<PathBuf> {
    for entry in WalkDir::new(root).min_depth(1) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                debug!(root = %root.display(), error = %e, "Skipping unreadable entry");
                continue;
            }
        };
        if entry.file_type().is_file() && entry.file_name() == name {
            return absolutize(entry.path());
        }
    }
    None
}

fn absolutize(path: &Path) -> Option<PathBuf> {
    if path.is_absolute() {
        return Some(path.to_path_buf());
    }
    match std::path::absolute(path) {
        Ok(abs) => Some(abs),
        Err(e) => {
            debug!(path = %path.display(), error = %e, "Cannot make path absolute");
            None
        }
    }
}
