//! Directory listing with a shell-command fallback.
//!
//! Names are enumerated by a primary [`EntrySource`] (a direct directory
//! read). When that fails, typically on a permission error, a fallback source
//! that shells out to the platform listing command is tried, and the listing
//! is flagged so callers can tell which source answered. Each enumerated name
//! is then probed on its own; a failed probe moves the name to the skipped
//! list instead of failing the listing.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use chrono::{DateTime, Local, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use super::path::PathKind;
use super::{DirectoryEntry, EntryKind, SkippedEntry};
use crate::errors::FileError;

/// Reason attached to entries whose metadata could not be read.
pub const SKIP_REASON: &str = "insufficient permission";

/// A way of enumerating the names in a directory.
pub trait EntrySource: Send + Sync {
    /// Short label for logs and advisory notes.
    fn label(&self) -> &'static str;

    /// Names of the entries in `dir`, in enumeration order.
    fn enumerate(&self, dir: &Path) -> Result<Vec<String>, FileError>;
}

/// Reads the directory through the OS directly.
pub struct ReadDirSource;

impl EntrySource for ReadDirSource {
    fn label(&self) -> &'static str {
        "directory read"
    }

    fn enumerate(&self, dir: &Path) -> Result<Vec<String>, FileError> {
        let entries = fs::read_dir(dir).map_err(|e| FileError::from_io(e, dir))?;
        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| FileError::from_io(e, dir))?;
            names.push(entry.file_name().to_string_lossy().to_string());
        }
        Ok(names)
    }
}

/// Runs the platform listing command and reads one name per output line.
pub struct ShellListSource;

impl ShellListSource {
    #[cfg(windows)]
    fn command(dir: &Path) -> Command {
        let script = format!(
            "Get-ChildItem -LiteralPath '{}' -Force -Name -ErrorAction SilentlyContinue",
            dir.display().to_string().replace('\'', "''")
        );
        let mut cmd = Command::new("powershell");
        cmd.args(["-NoProfile", "-NonInteractive", "-Command", &script]);
        cmd
    }

    #[cfg(not(windows))]
    fn command(dir: &Path) -> Command {
        let mut cmd = Command::new("ls");
        cmd.arg("-1A").arg(dir);
        cmd
    }
}

impl EntrySource for ShellListSource {
    fn label(&self) -> &'static str {
        "shell listing"
    }

    fn enumerate(&self, dir: &Path) -> Result<Vec<String>, FileError> {
        let output = Self::command(dir)
            .output()
            .map_err(|e| FileError::OperationFailed(format!("cannot run listing command: {e}")))?;
        if !output.status.success() {
            return Err(FileError::OperationFailed(format!(
                "listing command exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        Ok(parse_listing(&String::from_utf8_lossy(&output.stdout)))
    }
}

/// One name per line, blank lines dropped. Only line terminators are
/// stripped; spaces belong to the name.
pub fn parse_listing(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .map(|line| line.trim_end_matches('\r'))
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Result of listing one directory.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryListing {
    pub path: PathBuf,
    pub detailed: bool,
    pub entries: Vec<DirectoryEntry>,
    pub skipped: Vec<SkippedEntry>,
    pub used_fallback: bool,
}

impl fmt::Display for DirectoryListing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Directory contents ({}):", self.path.display())?;
        writeln!(f)?;
        if self.used_fallback {
            writeln!(
                f,
                "Note: contents were read with the shell listing command (direct read was denied)"
            )?;
            writeln!(f)?;
        }
        for entry in &self.entries {
            let tag = match entry.kind {
                EntryKind::File => "[file]",
                EntryKind::Directory => "[dir]",
            };
            if !self.detailed {
                writeln!(f, "{tag} {}", entry.name)?;
                continue;
            }
            write!(f, "{tag} {}", entry.name)?;
            if let Some(size) = entry.size {
                write!(f, " {size} bytes")?;
            }
            if let Some(modified) = entry.modified {
                write!(
                    f,
                    " (modified: {})",
                    modified.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S")
                )?;
            }
            writeln!(f)?;
        }
        if !self.skipped.is_empty() {
            writeln!(f)?;
            writeln!(f, "Skipped entries ({}):", SKIP_REASON)?;
            for s in &self.skipped {
                writeln!(f, "[skipped] {s}")?;
            }
        }
        Ok(())
    }
}

/// Two-source directory lister.
pub struct DirectoryLister {
    primary: Box<dyn EntrySource>,
    fallback: Box<dyn EntrySource>,
}

impl Default for DirectoryLister {
    fn default() -> Self {
        Self::new(Box::new(ReadDirSource), Box::new(ShellListSource))
    }
}

impl DirectoryLister {
    pub fn new(primary: Box<dyn EntrySource>, fallback: Box<dyn EntrySource>) -> Self {
        Self { primary, fallback }
    }

    pub fn list(&self, dir: &Path, detailed: bool) -> Result<DirectoryListing, FileError> {
        match PathKind::probe(dir)? {
            PathKind::NotFound => return Err(FileError::NotFound(dir.display().to_string())),
            PathKind::File => return Err(FileError::wrong_type(dir, "directory")),
            PathKind::Directory => {}
        }

        let (names, used_fallback) = self.enumerate(dir)?;

        let mut entries = Vec::with_capacity(names.len());
        let mut skipped = Vec::new();
        for name in names {
            match probe_entry(dir, &name, detailed) {
                Ok(entry) => entries.push(entry),
                Err(e) => {
                    debug!(entry = %name, error = %e, "Cannot probe entry, skipping");
                    skipped.push(SkippedEntry {
                        name,
                        reason: SKIP_REASON.to_string(),
                    });
                }
            }
        }

        debug!(
            path = %dir.display(),
            entries = entries.len(),
            skipped = skipped.len(),
            used_fallback,
            "Listed directory"
        );
        Ok(DirectoryListing {
            path: dir.to_path_buf(),
            detailed,
            entries,
            skipped,
            used_fallback,
        })
    }

    fn enumerate(&self, dir: &Path) -> Result<(Vec<String>, bool), FileError> {
        let primary_err = match self.primary.enumerate(dir) {
            Ok(names) => return Ok((names, false)),
            Err(e) => e,
        };

        warn!(
            path = %dir.display(),
            error = %primary_err,
            "{} failed, trying {}",
            self.primary.label(),
            self.fallback.label()
        );

        match self.fallback.enumerate(dir) {
            Ok(names) => {
                info!(path = %dir.display(), count = names.len(), "Listed directory via fallback");
                Ok((names, true))
            }
            Err(fallback_err) => Err(FileError::ListingFailed {
                path: dir.display().to_string(),
                primary: primary_err.to_string(),
                fallback: fallback_err.to_string(),
            }),
        }
    }
}

/// Probe one name in `dir`. Symlinks are followed.
fn probe_entry(dir: &Path, name: &str, detailed: bool) -> Result<DirectoryEntry, FileError> {
    let path = dir.join(name);
    let meta = fs::metadata(&path).map_err(|e| FileError::from_io(e, &path))?;
    let kind = if meta.is_dir() {
        EntryKind::Directory
    } else {
        EntryKind::File
    };

    let (size, modified) = if detailed {
        let size = meta.is_file().then(|| meta.len());
        let modified = meta.modified().ok().map(DateTime::<Utc>::from);
        (size, modified)
    } else {
        (None, None)
    };

    Ok(DirectoryEntry {
        name: name.to_string(),
        kind,
        size,
        modified,
    })
}
