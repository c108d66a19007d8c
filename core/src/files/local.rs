//! Single-item filesystem primitives on the local host.
//!
//! The batch, structure and editor modules build on these. Each function
//! reports failures as [`FileError`] carrying the offending path.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::WalkDir;

use super::encoding::Encoding;
use super::path::normalize;
use crate::errors::FileError;

/// Create `dir` and every missing ancestor. Succeeds if it already exists.
pub fn ensure_dir(dir: &Path) -> Result<(), FileError> {
    fs::create_dir_all(dir).map_err(|e| FileError::from_io(e, dir))
}

/// Create the parent chain of `path`.
pub fn ensure_parent(path: &Path) -> Result<(), FileError> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => ensure_dir(parent),
        _ => Ok(()),
    }
}

/// Write `content` in `encoding`, creating parents and overwriting any file.
///
/// Returns the number of bytes written.
pub fn write_text(path: &Path, content: &str, encoding: Encoding) -> Result<usize, FileError> {
    let bytes = encoding.encode(content)?;
    ensure_parent(path)?;
    fs::write(path, &bytes).map_err(|e| FileError::from_io(e, path))?;
    debug!(path = %path.display(), bytes = bytes.len(), "Wrote file");
    Ok(bytes.len())
}

/// Read a regular file as text.
pub fn read_text(path: &Path, encoding: Encoding) -> Result<String, FileError> {
    let meta = fs::metadata(path).map_err(|e| FileError::from_io(e, path))?;
    if meta.is_dir() {
        return Err(FileError::wrong_type(path, "file"));
    }
    let bytes = fs::read(path).map_err(|e| FileError::from_io(e, path))?;
    Ok(encoding.decode(&bytes))
}

/// Copy a file or a whole directory tree, overwriting existing files.
///
/// Symlinks inside a tree are recreated as links, not followed. Copying a
/// path onto itself or a directory into its own subtree is rejected.
pub fn copy_path(from: &Path, to: &Path) -> Result<(), FileError> {
    let meta = fs::metadata(from).map_err(|e| FileError::from_io(e, from))?;
    let source = comparable(from);
    let target = comparable(to);
    if source == target {
        return Err(FileError::OperationFailed(format!(
            "source and destination are the same: {}",
            from.display()
        )));
    }

    if meta.is_dir() {
        if target.starts_with(&source) {
            return Err(FileError::OperationFailed(format!(
                "cannot copy {} into its own subdirectory {}",
                from.display(),
                to.display()
            )));
        }
        copy_tree(from, to)
    } else {
        ensure_parent(to)?;
        fs::copy(from, to).map_err(|e| FileError::from_io(e, from))?;
        Ok(())
    }
}

/// `path` with symlinks and `..` resolved as far as the filesystem allows,
/// so two spellings of one location compare equal. Components that do not
/// exist yet are appended to the deepest existing ancestor.
fn comparable(path: &Path) -> PathBuf {
    let path = normalize(path);
    let mut existing = path.as_path();
    let mut missing = Vec::new();
    loop {
        if let Ok(real) = fs::canonicalize(existing) {
            return missing.iter().rev().fold(real, |acc, name| acc.join(name));
        }
        match (existing.parent(), existing.file_name()) {
            (Some(parent), Some(name)) => {
                missing.push(name.to_os_string());
                existing = parent;
            }
            _ => return path.clone(),
        }
    }
}

fn copy_tree(from: &Path, to: &Path) -> Result<(), FileError> {
    // Pre-order: every directory is created before its contents.
    for entry in WalkDir::new(from).follow_links(false) {
        let entry = entry.map_err(|e| FileError::from_walk(e, from))?;
        let relative = entry.path().strip_prefix(from).map_err(|_| {
            FileError::OperationFailed(format!(
                "{} is outside {}",
                entry.path().display(),
                from.display()
            ))
        })?;
        let target = to.join(relative);

        let file_type = entry.file_type();
        if file_type.is_dir() {
            ensure_dir(&target)?;
        } else if file_type.is_symlink() {
            copy_symlink(entry.path(), &target)?;
        } else {
            fs::copy(entry.path(), &target).map_err(|e| FileError::from_io(e, entry.path()))?;
        }
    }
    Ok(())
}

/// Recreate the link at `src` as `dst`, replacing whatever `dst` was.
fn copy_symlink(src: &Path, dst: &Path) -> Result<(), FileError> {
    let link = fs::read_link(src).map_err(|e| FileError::from_io(e, src))?;
    if fs::symlink_metadata(dst).is_ok() {
        remove_path(dst)?;
    }
    make_symlink(src, &link, dst).map_err(|e| FileError::from_io(e, dst))
}

#[cfg(unix)]
fn make_symlink(_src: &Path, link: &Path, dst: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(link, dst)
}

#[cfg(windows)]
fn make_symlink(src: &Path, link: &Path, dst: &Path) -> io::Result<()> {
    if fs::metadata(src).map(|m| m.is_dir()).unwrap_or(false) {
        std::os::windows::fs::symlink_dir(link, dst)
    } else {
        std::os::windows::fs::symlink_file(link, dst)
    }
}

#[cfg(not(any(unix, windows)))]
fn make_symlink(src: &Path, _link: &Path, dst: &Path) -> io::Result<()> {
    fs::copy(src, dst).map(|_| ())
}

/// Whether a rename failed only because source and target are on different devices.
fn crosses_devices(e: &io::Error) -> bool {
    // EXDEV on Unix, ERROR_NOT_SAME_DEVICE on Windows
    #[cfg(unix)]
    const CROSS_DEVICE: i32 = 18;
    #[cfg(windows)]
    const CROSS_DEVICE: i32 = 17;
    #[cfg(not(any(unix, windows)))]
    const CROSS_DEVICE: i32 = -1;

    e.raw_os_error() == Some(CROSS_DEVICE)
}

/// Move a file or directory. Refuses to replace an existing destination.
///
/// Falls back to copy-then-remove only when the rename crosses devices;
/// every other rename error is returned unchanged.
pub fn move_path(from: &Path, to: &Path) -> Result<(), FileError> {
    if fs::symlink_metadata(to).is_ok() {
        return Err(FileError::OperationFailed(format!(
            "destination already exists: {}",
            to.display()
        )));
    }
    ensure_parent(to)?;

    match fs::rename(from, to) {
        Ok(()) => Ok(()),
        Err(rename_err) if crosses_devices(&rename_err) => {
            debug!(
                from = %from.display(),
                to = %to.display(),
                "Rename crosses devices, copying instead"
            );
            copy_path(from, to)?;
            remove_path(from)
        }
        Err(rename_err) => Err(FileError::from_io(rename_err, from)),
    }
}

/// Remove a file, a symlink, or a whole directory tree.
pub fn remove_path(path: &Path) -> Result<(), FileError> {
    let meta = fs::symlink_metadata(path).map_err(|e| FileError::from_io(e, path))?;
    if meta.is_dir() {
        fs::remove_dir_all(path).map_err(|e| FileError::from_io(e, path))
    } else {
        fs::remove_file(path).map_err(|e| FileError::from_io(e, path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn write_creates_parent_chain() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("a/b/c.txt");
        let n = write_text(&target, "hello", Encoding::Utf8).unwrap();
        assert_eq!(n, 5);
        assert_eq!(fs::read_to_string(&target).unwrap(), "hello");
    }

    #[test]
    fn read_directory_is_wrong_type() {
        let dir = TempDir::new().unwrap();
        let err = read_text(dir.path(), Encoding::Utf8).unwrap_err();
        assert!(matches!(err, FileError::WrongType { expected: "file", .. }));
    }

    #[test]
    fn read_missing_is_not_found() {
        let dir = TempDir::new().unwrap();
        let err = read_text(&dir.path().join("nope"), Encoding::Utf8).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn copy_tree_recursively() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("src");
        fs::create_dir_all(src.join("nested/deeper")).unwrap();
        fs::write(src.join("top.txt"), "1").unwrap();
        fs::write(src.join("nested/deeper/leaf.txt"), "2").unwrap();

        let dst = dir.path().join("dst");
        copy_path(&src, &dst).unwrap();
        assert_eq!(fs::read_to_string(dst.join("top.txt")).unwrap(), "1");
        assert_eq!(
            fs::read_to_string(dst.join("nested/deeper/leaf.txt")).unwrap(),
            "2"
        );
        assert!(src.join("top.txt").exists());
    }

    #[test]
    fn copy_into_itself_is_rejected() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("src");
        fs::create_dir(&src).unwrap();
        let err = copy_path(&src, &src.join("inner")).unwrap_err();
        assert!(err.to_string().contains("own subdirectory"));
    }

    #[test]
    fn move_refuses_existing_destination() {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("a.txt");
        let b = dir.path().join("b.txt");
        fs::write(&a, "a").unwrap();
        fs::write(&b, "b").unwrap();

        let err = move_path(&a, &b).unwrap_err();
        assert!(err.to_string().contains("already exists"));
        assert_eq!(fs::read_to_string(&b).unwrap(), "b");
    }

    #[test]
    fn move_into_new_subdirectory() {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("a.txt");
        fs::write(&a, "a").unwrap();
        let target = dir.path().join("x/y/a.txt");

        move_path(&a, &target).unwrap();
        assert!(!a.exists());
        assert_eq!(fs::read_to_string(&target).unwrap(), "a");
    }

    #[test]
    fn remove_file_and_tree() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("f.txt");
        fs::write(&file, "x").unwrap();
        let tree = dir.path().join("tree");
        fs::create_dir_all(tree.join("inner")).unwrap();
        fs::write(tree.join("inner/g.txt"), "y").unwrap();

        remove_path(&file).unwrap();
        remove_path(&tree).unwrap();
        assert!(!file.exists());
        assert!(!tree.exists());
        assert!(remove_path(&file).unwrap_err().is_not_found());
    }

    #[test]
    fn copy_file_onto_itself_keeps_content() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("keep.txt");
        fs::write(&file, "precious data").unwrap();

        let err = copy_path(&file, &file).unwrap_err();
        assert!(err.to_string().contains("source and destination are the same"));

        let other_spelling = dir.path().join("sub/../keep.txt");
        assert!(copy_path(&file, &other_spelling).is_err());
        assert_eq!(fs::read_to_string(&file).unwrap(), "precious data");
    }

    #[cfg(unix)]
    #[test]
    fn copy_onto_symlink_to_source_is_rejected() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("data.txt");
        fs::write(&file, "payload").unwrap();
        let link = dir.path().join("alias.txt");
        std::os::unix::fs::symlink(&file, &link).unwrap();

        assert!(copy_path(&file, &link).is_err());
        assert_eq!(fs::read_to_string(&file).unwrap(), "payload");
    }

    #[cfg(unix)]
    #[test]
    fn copy_tree_recreates_symlinks() {
        let dir = TempDir::new().unwrap();
        let proj = dir.path().join("proj");
        fs::create_dir_all(proj.join("lib")).unwrap();
        fs::write(proj.join("lib/a.txt"), "a").unwrap();
        std::os::unix::fs::symlink("lib", proj.join("lib-link")).unwrap();
        std::os::unix::fs::symlink("nowhere", proj.join("dangling")).unwrap();

        let copy = dir.path().join("copy");
        copy_path(&proj, &copy).unwrap();

        assert_eq!(fs::read_to_string(copy.join("lib/a.txt")).unwrap(), "a");
        assert!(fs::symlink_metadata(copy.join("lib-link"))
            .unwrap()
            .file_type()
            .is_symlink());
        assert_eq!(fs::read_link(copy.join("lib-link")).unwrap(), Path::new("lib"));
        assert_eq!(fs::read_to_string(copy.join("lib-link/a.txt")).unwrap(), "a");
        assert_eq!(fs::read_link(copy.join("dangling")).unwrap(), Path::new("nowhere"));
    }

    #[test]
    fn only_cross_device_errors_fall_back_to_copy() {
        #[cfg(unix)]
        assert!(crosses_devices(&io::Error::from_raw_os_error(18)));
        assert!(!crosses_devices(&io::Error::from(io::ErrorKind::PermissionDenied)));
        assert!(!crosses_devices(&io::Error::from(io::ErrorKind::NotFound)));
    }

    #[test]
    fn failed_move_leaves_no_copy_behind() {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("tree");
        fs::create_dir_all(src.join("inner")).unwrap();
        fs::write(src.join("inner/f.txt"), "f").unwrap();
        let target = src.join("inner/moved");

        assert!(move_path(&src, &target).is_err());
        assert!(!target.exists());
        assert_eq!(fs::read_to_string(src.join("inner/f.txt")).unwrap(), "f");
    }
}
