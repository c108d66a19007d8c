//! Recursive file-name search.
//!
//! [`SearchWalk`] is a lazy depth-first, pre-order walk over `walkdir`.
//! Entries are visited in the order the OS lists them. Symlinked directories
//! are never descended; symlinks to files are matched like files.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use regex::{Regex, RegexBuilder};
use serde::Serialize;
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

use super::path::PathKind;
use super::SkippedEntry;
use crate::errors::FileError;

/// File-name pattern where `*` matches any run of characters.
///
/// Matching is case-insensitive and unanchored: `*.txt` also matches
/// `notes.txt.bak`, and `report` matches `q3-report.pdf`.
#[derive(Debug, Clone)]
pub struct GlobPattern {
    source: String,
    regex: Regex,
}

impl GlobPattern {
    pub fn new(pattern: &str) -> Result<Self, FileError> {
        if pattern.is_empty() {
            return Err(FileError::InvalidArgument("search pattern is empty".into()));
        }
        let translated = regex::escape(pattern).replace(r"\*", ".*");
        let regex = RegexBuilder::new(&translated)
            .case_insensitive(true)
            .build()
            .map_err(|e| FileError::InvalidArgument(format!("bad pattern {pattern:?}: {e}")))?;
        Ok(Self {
            source: pattern.to_string(),
            regex,
        })
    }

    pub fn matches(&self, name: &str) -> bool {
        self.regex.is_match(name)
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }
}

/// Lazy stream of matching file paths under a root directory.
///
/// Not restartable; start a new walk with [`SearchWalk::new`].
pub struct SearchWalk {
    pattern: GlobPattern,
    entries: walkdir::IntoIter,
    root: PathBuf,
    skipped: Vec<SkippedEntry>,
}

impl SearchWalk {
    /// Open `root` for searching. The root must be an existing, readable directory.
    pub fn new(root: &Path, pattern: &str, recursive: bool) -> Result<Self, FileError> {
        match PathKind::probe(root)? {
            PathKind::NotFound => return Err(FileError::NotFound(root.display().to_string())),
            PathKind::File => return Err(FileError::wrong_type(root, "directory")),
            PathKind::Directory => {}
        }
        let pattern = GlobPattern::new(pattern)?;
        // An unreadable root fails the search instead of becoming a skipped entry.
        fs::read_dir(root).map_err(|e| FileError::from_io(e, root))?;

        debug!(root = %root.display(), pattern = pattern.as_str(), recursive, "Starting search");
        let entries = WalkDir::new(root)
            .min_depth(1)
            .max_depth(if recursive { usize::MAX } else { 1 })
            .follow_links(false)
            .into_iter();
        Ok(Self {
            pattern,
            entries,
            root: root.to_path_buf(),
            skipped: Vec::new(),
        })
    }

    /// Entries that could not be probed and directories that could not be
    /// read so far.
    pub fn skipped(&self) -> &[SkippedEntry] {
        &self.skipped
    }

    fn skip(&mut self, path: &Path, reason: String) {
        warn!(path = %path.display(), reason = %reason, "Skipping entry during search");
        self.skipped.push(SkippedEntry {
            name: path.display().to_string(),
            reason,
        });
    }

    /// Whether `entry` is a file, or a symlink resolving to one.
    fn is_file_like(&mut self, entry: &DirEntry) -> Option<bool> {
        let file_type = entry.file_type();
        if !file_type.is_symlink() {
            return Some(file_type.is_file());
        }
        match fs::metadata(entry.path()) {
            Ok(meta) => Some(meta.is_file()),
            Err(e) => {
                let reason = FileError::from_io(e, entry.path()).to_string();
                self.skip(entry.path(), reason);
                None
            }
        }
    }
}

impl Iterator for SearchWalk {
    type Item = PathBuf;

    fn next(&mut self) -> Option<PathBuf> {
        loop {
            let entry = match self.entries.next()? {
                Ok(entry) => entry,
                Err(e) => {
                    let path = e
                        .path()
                        .map(Path::to_path_buf)
                        .unwrap_or_else(|| self.root.clone());
                    let reason = FileError::from_walk(e, &self.root).to_string();
                    self.skip(&path, reason);
                    continue;
                }
            };

            if self.is_file_like(&entry) == Some(true)
                && self.pattern.matches(&entry.file_name().to_string_lossy())
            {
                return Some(entry.into_path());
            }
        }
    }
}

/// A completed search: every match plus the entries that were skipped.
#[derive(Debug, Clone, Serialize)]
pub struct SearchOutcome {
    pub root: PathBuf,
    pub pattern: String,
    pub recursive: bool,
    pub matches: Vec<PathBuf>,
    pub skipped: Vec<SkippedEntry>,
}

impl fmt::Display for SearchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Search results (pattern: {}, directory: {}):",
            self.pattern,
            self.root.display()
        )?;
        writeln!(f)?;
        if self.matches.is_empty() {
            writeln!(f, "No matching files found")?;
        }
        for m in &self.matches {
            writeln!(f, "{}", m.display())?;
        }
        if !self.skipped.is_empty() {
            writeln!(f)?;
            writeln!(f, "Skipped ({}):", self.skipped.len())?;
            for s in &self.skipped {
                writeln!(f, "[skipped] {}", s)?;
            }
        }
        Ok(())
    }
}

/// Run a search to completion.
pub fn search_files(root: &Path, pattern: &str, recursive: bool) -> Result<SearchOutcome, FileError> {
    let mut walk = SearchWalk::new(root, pattern, recursive)?;
    let matches: Vec<PathBuf> = walk.by_ref().collect();
    Ok(SearchOutcome {
        root: root.to_path_buf(),
        pattern: pattern.to_string(),
        recursive,
        matches,
        skipped: walk.skipped().to_vec(),
    })
}
