//! Path resolution and existence probes.
//!
//! Resolution is purely lexical: `.` and `..` are folded and relative paths
//! are anchored at the process working directory. Nothing here touches the
//! filesystem except [`PathKind::probe`].

use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use serde::Serialize;

use crate::errors::FileError;

/// What a path points at, after following symlinks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PathKind {
    File,
    Directory,
    NotFound,
}

impl PathKind {
    /// Probe `path` once. A missing path is `Ok(NotFound)`, not an error.
    pub fn probe(path: &Path) -> Result<Self, FileError> {
        match fs::metadata(path) {
            Ok(meta) if meta.is_dir() => Ok(PathKind::Directory),
            Ok(_) => Ok(PathKind::File),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(PathKind::NotFound),
            Err(e) => Err(FileError::from_io(e, path)),
        }
    }
}

/// Resolve `raw` against the current working directory.
///
/// Falls back to resolving against `/` when the working directory itself is
/// gone, so resolution never fails.
pub fn resolve(raw: &str) -> PathBuf {
    let base = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("/"));
    resolve_from(&base, raw)
}

/// Resolve `raw` against an explicit base directory.
pub fn resolve_from(base: &Path, raw: &str) -> PathBuf {
    let raw = Path::new(raw);
    if raw.is_absolute() {
        normalize(raw)
    } else {
        normalize(&base.join(raw))
    }
}

/// Fold `.` and `..` components without consulting the filesystem.
///
/// `..` never climbs above the root.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Prefix(p) => out.push(p.as_os_str()),
            Component::RootDir => out.push(Component::RootDir.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() && !out.has_root() {
                    out.push("..");
                }
            }
            Component::Normal(name) => out.push(name),
        }
    }
    if out.as_os_str().is_empty() {
        out.push(".");
    }
    out
}

/// Lexical relative path from `base` to `target`, both already absolute.
///
/// Emits `..` components when `target` lies outside `base`.
pub fn relative_to(base: &Path, target: &Path) -> PathBuf {
    let base: Vec<Component> = base.components().collect();
    let target: Vec<Component> = target.components().collect();

    let common = base
        .iter()
        .zip(target.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut rel = PathBuf::new();
    for _ in common..base.len() {
        rel.push("..");
    }
    for part in &target[common..] {
        rel.push(part.as_os_str());
    }
    rel
}

/// Join `name` under `base`, treating a leading root in `name` as relative.
pub fn join_relative(base: &Path, name: &str) -> PathBuf {
    let tail: PathBuf = Path::new(name)
        .components()
        .filter(|c| matches!(c, Component::Normal(_) | Component::CurDir | Component::ParentDir))
        .collect();
    normalize(&base.join(tail))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_relative_against_base() {
        let base = Path::new("/home/user/project");
        assert_eq!(
            resolve_from(base, "src/main.rs"),
            PathBuf::from("/home/user/project/src/main.rs")
        );
        assert_eq!(
            resolve_from(base, "./a/../b"),
            PathBuf::from("/home/user/project/b")
        );
        assert_eq!(resolve_from(base, "../../.."), PathBuf::from("/"));
        assert_eq!(resolve_from(base, "../../../.."), PathBuf::from("/"));
    }

    #[test]
    fn resolve_absolute_ignores_base() {
        let base = Path::new("/home/user");
        assert_eq!(resolve_from(base, "/etc/./hosts"), PathBuf::from("/etc/hosts"));
    }

    #[test]
    fn resolve_uses_working_directory() {
        let cwd = std::env::current_dir().unwrap();
        assert_eq!(resolve("x.txt"), cwd.join("x.txt"));
    }

    #[test]
    fn relative_to_inside_and_outside() {
        assert_eq!(
            relative_to(Path::new("/work"), Path::new("/work/a/b.txt")),
            PathBuf::from("a/b.txt")
        );
        assert_eq!(
            relative_to(Path::new("/work/sub"), Path::new("/other/c.txt")),
            PathBuf::from("../../other/c.txt")
        );
        assert_eq!(
            relative_to(Path::new("/work"), Path::new("/work")),
            PathBuf::new()
        );
    }

    #[test]
    fn join_relative_strips_root() {
        let base = Path::new("/proj");
        assert_eq!(join_relative(base, "/src/index.js"), PathBuf::from("/proj/src/index.js"));
        assert_eq!(join_relative(base, "docs/a.md"), PathBuf::from("/proj/docs/a.md"));
    }

    #[test]
    fn probe_reports_kind() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("f.txt");
        std::fs::write(&file, "x").unwrap();

        assert_eq!(PathKind::probe(dir.path()).unwrap(), PathKind::Directory);
        assert_eq!(PathKind::probe(&file).unwrap(), PathKind::File);
        assert_eq!(
            PathKind::probe(&dir.path().join("missing")).unwrap(),
            PathKind::NotFound
        );
    }
}
