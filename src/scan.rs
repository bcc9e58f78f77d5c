// src/scan.rs

//! Include/exclude directory scanning
//!
//! Patterns are matched against paths relative to the scan base using `/` as
//! separator: `*` stays within one path component, `**` spans any number of
//! them, and a pattern ending in `/` matches everything below that directory.
//! Besides the matched files the scanner reports whether the scan saw the
//! whole tree, i.e. no file was left out by the includes and nothing was
//! excluded.

use crate::error::{Error, Result};
use glob::{MatchOptions, Pattern};
use std::cell::Cell;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Version control metadata and editor leftovers skipped unless disabled
pub const DEFAULT_EXCLUDES: &[&str] = &[
    "**/*~",
    "**/#*#",
    "**/.#*",
    "**/%*%",
    "**/._*",
    "**/CVS",
    "**/CVS/**",
    "**/.cvsignore",
    "**/SCCS",
    "**/SCCS/**",
    "**/vssver.scc",
    "**/.svn",
    "**/.svn/**",
    "**/.DS_Store",
    "**/.git",
    "**/.git/**",
    "**/.gitattributes",
    "**/.gitignore",
    "**/.gitmodules",
    "**/.hg",
    "**/.hg/**",
    "**/.hgignore",
    "**/.hgsub",
    "**/.hgsubstate",
    "**/.hgtags",
    "**/.bzr",
    "**/.bzr/**",
    "**/.bzrignore",
];

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// Outcome of a scan
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanResult {
    /// Included files (and symlinks), sorted, relative with `/` separators
    pub files: Vec<String>,
    /// Included directories below the base, sorted, relative with `/` separators
    pub directories: Vec<String>,
    /// True when every file in the tree was included and nothing was excluded
    pub everything_included: bool,
}

/// Scans a directory tree with include/exclude globs
#[derive(Debug, Clone)]
pub struct DirectoryScanner {
    base: PathBuf,
    includes: Vec<Pattern>,
    excludes: Vec<Pattern>,
}

impl DirectoryScanner {
    pub fn new(base: &Path) -> Self {
        Self {
            base: base.to_path_buf(),
            includes: Vec::new(),
            excludes: Vec::new(),
        }
    }

    /// Restrict the scan to paths matching one of the glob patterns
    pub fn with_includes<S: AsRef<str>>(mut self, patterns: &[S]) -> Result<Self> {
        for pattern in patterns {
            self.includes.push(compile(pattern.as_ref())?);
        }
        Ok(self)
    }

    /// Restrict the scan to exactly the given relative paths
    pub fn with_literal_includes<S: AsRef<str>>(mut self, names: &[S]) -> Result<Self> {
        for name in names {
            let literal = name.as_ref().replace('\\', "/");
            self.includes.push(compile(&Pattern::escape(&literal))?);
        }
        Ok(self)
    }

    /// Skip paths matching one of the glob patterns
    pub fn with_excludes<S: AsRef<str>>(mut self, patterns: &[S]) -> Result<Self> {
        for pattern in patterns {
            self.excludes.push(compile(pattern.as_ref())?);
        }
        Ok(self)
    }

    /// Add [`DEFAULT_EXCLUDES`]
    pub fn with_default_excludes(self) -> Result<Self> {
        self.with_excludes(DEFAULT_EXCLUDES)
    }

    fn is_included(&self, rel: &str) -> bool {
        self.includes.is_empty() || self.includes.iter().any(|p| p.matches_with(rel, MATCH_OPTIONS))
    }

    fn is_excluded(&self, rel: &str) -> bool {
        self.excludes.iter().any(|p| p.matches_with(rel, MATCH_OPTIONS))
    }

    /// Walk the tree below the base directory
    ///
    /// A missing base yields an empty result.
    pub fn scan(&self) -> Result<ScanResult> {
        if !self.base.is_dir() {
            return Ok(ScanResult {
                everything_included: true,
                ..Default::default()
            });
        }

        let pruned = Cell::new(false);
        let mut everything_included = true;
        let mut files = Vec::new();
        let mut candidate_dirs = Vec::new();

        let walker = WalkDir::new(&self.base)
            .min_depth(1)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| {
                if !entry.file_type().is_dir() {
                    return true;
                }
                let excluded = self.is_excluded(&relative(&self.base, entry.path()));
                if excluded {
                    pruned.set(true);
                }
                !excluded
            });

        for entry in walker {
            let entry = entry.map_err(|e| {
                let path = e.path().unwrap_or(&self.base).to_path_buf();
                Error::io(path, e.into())
            })?;
            let rel = relative(&self.base, entry.path());

            if entry.file_type().is_dir() {
                candidate_dirs.push(rel);
                continue;
            }

            if self.is_excluded(&rel) || !self.is_included(&rel) {
                everything_included = false;
                continue;
            }
            files.push(rel);
        }

        let directories = candidate_dirs
            .into_iter()
            .filter(|dir| {
                self.is_included(dir) || {
                    let prefix = format!("{}/", dir);
                    files.iter().any(|f| f.starts_with(&prefix))
                }
            })
            .collect();

        Ok(ScanResult {
            files,
            directories,
            everything_included: everything_included && !pruned.get(),
        })
    }
}

fn compile(pattern: &str) -> Result<Pattern> {
    let mut normalized = pattern.replace('\\', "/");
    if normalized.ends_with('/') {
        normalized.push_str("**");
    }
    Pattern::new(&normalized)
        .map_err(|e| Error::ConfigError(format!("Invalid pattern '{}': {}", pattern, e)))
}

/// Path of `path` below `base` with `/` separators
pub fn relative(base: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(base).unwrap_or(path);
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
