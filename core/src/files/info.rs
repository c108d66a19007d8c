//! Metadata for a single file or directory.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use chrono::{DateTime, Local, Utc};
use serde::Serialize;

use super::EntryKind;
use crate::errors::FileError;

#[derive(Debug, Clone, Serialize)]
pub struct FileInfo {
    pub path: PathBuf,
    pub name: String,
    pub kind: EntryKind,
    pub size: u64,
    pub created: Option<DateTime<Utc>>,
    pub modified: Option<DateTime<Utc>>,
    pub accessed: Option<DateTime<Utc>>,
    /// Octal mode bits on Unix, `None` elsewhere.
    pub mode: Option<u32>,
    /// `rwxrwxrwx` on Unix, `read-only`/`read-write` elsewhere.
    pub permissions: String,
}

fn timestamp(t: std::io::Result<SystemTime>) -> Option<DateTime<Utc>> {
    t.ok().map(DateTime::<Utc>::from)
}

/// Stat `path`, following symlinks.
pub fn file_info(path: &Path) -> Result<FileInfo, FileError> {
    let meta = fs::metadata(path).map_err(|e| FileError::from_io(e, path))?;

    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string());

    let (mode, permissions) = permission_bits(&meta);

    Ok(FileInfo {
        path: path.to_path_buf(),
        name,
        kind: if meta.is_dir() {
            EntryKind::Directory
        } else {
            EntryKind::File
        },
        size: meta.len(),
        created: timestamp(meta.created()),
        modified: timestamp(meta.modified()),
        accessed: timestamp(meta.accessed()),
        mode,
        permissions,
    })
}

#[cfg(unix)]
fn permission_bits(meta: &fs::Metadata) -> (Option<u32>, String) {
    use std::os::unix::fs::PermissionsExt;
    let mode = meta.permissions().mode();
    (Some(mode & 0o7777), format_permissions(mode))
}

#[cfg(not(unix))]
fn permission_bits(meta: &fs::Metadata) -> (Option<u32>, String) {
    let flag = if meta.permissions().readonly() {
        "read-only"
    } else {
        "read-write"
    };
    (None, flag.to_string())
}

/// Render the low nine mode bits as `rwxr-xr-x`.
pub fn format_permissions(mode: u32) -> String {
    const FLAGS: [(u32, char); 9] = [
        (0o400, 'r'),
        (0o200, 'w'),
        (0o100, 'x'),
        (0o040, 'r'),
        (0o020, 'w'),
        (0o010, 'x'),
        (0o004, 'r'),
        (0o002, 'w'),
        (0o001, 'x'),
    ];
    FLAGS
        .iter()
        .map(|&(bit, c)| if mode & bit != 0 { c } else { '-' })
        .collect()
}

fn local_time(t: &Option<DateTime<Utc>>) -> String {
    match t {
        Some(t) => t
            .with_timezone(&Local)
            .format("%Y-%m-%d %H:%M:%S")
            .to_string(),
        None => "unavailable".to_string(),
    }
}

impl fmt::Display for FileInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.kind {
            EntryKind::File => "file",
            EntryKind::Directory => "directory",
        };
        writeln!(f, "File information:")?;
        writeln!(f, "Path: {}", self.path.display())?;
        writeln!(f, "Name: {}", self.name)?;
        writeln!(f, "Type: {kind}")?;
        writeln!(f, "Size: {} bytes", self.size)?;
        writeln!(f, "Created: {}", local_time(&self.created))?;
        writeln!(f, "Modified: {}", local_time(&self.modified))?;
        writeln!(f, "Accessed: {}", local_time(&self.accessed))?;
        match self.mode {
            Some(mode) => writeln!(f, "Permissions: {mode:o} ({})", self.permissions),
            None => writeln!(f, "Permissions: {}", self.permissions),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_permissions_renders_rwx() {
        assert_eq!(format_permissions(0o755), "rwxr-xr-x");
        assert_eq!(format_permissions(0o100644), "rw-r--r--");
        assert_eq!(format_permissions(0), "---------");
    }

    #[test]
    fn info_for_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stat_test.txt");
        std::fs::write(&path, "hello").unwrap();

        let info = file_info(&path).unwrap();
        assert_eq!(info.name, "stat_test.txt");
        assert_eq!(info.kind, EntryKind::File);
        assert_eq!(info.size, 5);
        assert!(info.modified.is_some());
        #[cfg(unix)]
        assert!(info.mode.is_some());

        let text = info.to_string();
        assert!(text.contains("Name: stat_test.txt"));
        assert!(text.contains("Size: 5 bytes"));
    }

    #[test]
    fn info_for_directory() {
        let dir = tempfile::tempdir().unwrap();
        let info = file_info(dir.path()).unwrap();
        assert_eq!(info.kind, EntryKind::Directory);
    }

    #[test]
    fn info_for_missing_path() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            file_info(&dir.path().join("nope")),
            Err(FileError::NotFound(_))
        ));
    }
}
