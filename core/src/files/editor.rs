//! Content edits: overwrite, append, prepend or splice at a line.

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info};

use super::encoding::Encoding;
use super::local;
use super::path::PathKind;
use crate::errors::FileError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", content = "line", rename_all = "snake_case")]
pub enum EditMode {
    Overwrite,
    Append,
    Prepend,
    /// Insert before the 0-based line index; past the end appends.
    InsertAtLine(usize),
}

impl EditMode {
    /// Build a mode from its wire name and optional line position.
    pub fn from_parts(mode: &str, position: Option<usize>) -> Result<Self, FileError> {
        match mode {
            "overwrite" => Ok(EditMode::Overwrite),
            "append" => Ok(EditMode::Append),
            "prepend" => Ok(EditMode::Prepend),
            "insert" => position.map(EditMode::InsertAtLine).ok_or_else(|| {
                FileError::InvalidArgument("insert mode requires a position".into())
            }),
            other => Err(FileError::InvalidArgument(format!(
                "unknown edit mode {other:?} (expected overwrite, append, prepend or insert)"
            ))),
        }
    }

    fn label(&self) -> String {
        match self {
            EditMode::Overwrite => "overwrite".into(),
            EditMode::Append => "append".into(),
            EditMode::Prepend => "prepend".into(),
            EditMode::InsertAtLine(n) => format!("insert at line {n}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditPlan {
    pub mode: EditMode,
    pub encoding: Encoding,
    pub backup: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct EditOutcome {
    pub path: PathBuf,
    pub mode: EditMode,
    pub bytes_written: usize,
    pub backup: Option<PathBuf>,
}

impl fmt::Display for EditOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Edited {} (mode: {}, {} bytes written)",
            self.path.display(),
            self.mode.label(),
            self.bytes_written
        )?;
        if let Some(backup) = &self.backup {
            write!(f, "\nBackup saved to {}", backup.display())?;
        }
        Ok(())
    }
}

/// Compute the new file content for `mode`.
pub fn apply(existing: &str, content: &str, mode: EditMode) -> String {
    match mode {
        EditMode::Overwrite => content.to_string(),
        EditMode::Append => format!("{existing}{content}"),
        EditMode::Prepend => format!("{content}{existing}"),
        EditMode::InsertAtLine(n) => {
            let mut lines: Vec<&str> = existing.split('\n').collect();
            let at = n.min(lines.len());
            lines.splice(at..at, content.split('\n'));
            lines.join("\n")
        }
    }
}

/// Sibling path used for the pre-edit snapshot of `path`.
fn backup_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(format!(".backup.{}", Utc::now().timestamp_millis()));
    path.with_file_name(name)
}

/// Edit `path` according to `plan`.
///
/// A missing target is created with exactly `content`, whatever the mode.
pub fn edit(path: &Path, content: &str, plan: EditPlan) -> Result<EditOutcome, FileError> {
    let exists = match PathKind::probe(path)? {
        PathKind::Directory => return Err(FileError::wrong_type(path, "file")),
        PathKind::File => true,
        PathKind::NotFound => false,
    };

    let backup = if plan.backup && exists {
        let target = backup_path(path);
        local::copy_path(path, &target)?;
        info!(path = %path.display(), backup = %target.display(), "Backed up file before edit");
        Some(target)
    } else {
        None
    };

    let updated = if exists && plan.mode != EditMode::Overwrite {
        let current = local::read_text(path, plan.encoding)?;
        apply(&current, content, plan.mode)
    } else {
        content.to_string()
    };

    let bytes_written = local::write_text(path, &updated, plan.encoding)?;
    debug!(path = %path.display(), mode = %plan.mode.label(), bytes_written, "Edited file");

    Ok(EditOutcome {
        path: path.to_path_buf(),
        mode: plan.mode,
        bytes_written,
        backup,
    })
}
