//! Local filesystem backend for the agent host.

use std::path::PathBuf;
use std::sync::Arc;

use filemanager_core::files::batch::{BatchEngine, BatchReport, FileContent, NewFile};
use filemanager_core::files::editor::{self, EditOutcome, EditPlan};
use filemanager_core::files::encoding::Encoding;
use filemanager_core::files::info::{self, FileInfo};
use filemanager_core::files::listing::{DirectoryListing, DirectoryLister};
use filemanager_core::files::local as fs_ops;
use filemanager_core::files::path::{self, PathKind};
use filemanager_core::files::search::{self, SearchOutcome};
use filemanager_core::files::structure::{self, StructureNode};

use super::{run_blocking, FileError};

/// File backend that operates on the agent host's filesystem.
///
/// Relative paths resolve against the process working directory, read
/// fresh on every call.
#[derive(Clone, Default)]
pub struct LocalFileBackend {
    lister: Arc<DirectoryLister>,
}

impl LocalFileBackend {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn with_lister(lister: DirectoryLister) -> Self {
        Self {
            lister: Arc::new(lister),
        }
    }

    pub async fn search(
        &self,
        directory: &str,
        pattern: &str,
        recursive: bool,
    ) -> Result<SearchOutcome, FileError> {
        let root = path::resolve(directory);
        let pattern = pattern.to_string();
        run_blocking(move || search::search_files(&root, &pattern, recursive)).await
    }

    pub async fn list(&self, dir: &str, detailed: bool) -> Result<DirectoryListing, FileError> {
        let dir = path::resolve(dir);
        let lister = Arc::clone(&self.lister);
        run_blocking(move || lister.list(&dir, detailed)).await
    }

    pub async fn info(&self, target: &str) -> Result<FileInfo, FileError> {
        let target = path::resolve(target);
        run_blocking(move || info::file_info(&target)).await
    }

    pub async fn read(&self, target: &str) -> Result<(PathBuf, String), FileError> {
        let target = path::resolve(target);
        run_blocking(move || {
            let content = fs_ops::read_text(&target, Encoding::Utf8)?;
            Ok((target, content))
        })
        .await
    }

    pub async fn write(&self, target: &str, content: &str) -> Result<(PathBuf, usize), FileError> {
        let target = path::resolve(target);
        let content = content.to_string();
        run_blocking(move || {
            if PathKind::probe(&target)? == PathKind::Directory {
                return Err(FileError::wrong_type(&target, "file"));
            }
            let written = fs_ops::write_text(&target, &content, Encoding::Utf8)?;
            Ok((target, written))
        })
        .await
    }

    pub async fn delete(&self, target: &str) -> Result<PathBuf, FileError> {
        let target = path::resolve(target);
        run_blocking(move || {
            if PathKind::probe(&target)? == PathKind::NotFound {
                return Err(FileError::NotFound(target.display().to_string()));
            }
            fs_ops::remove_path(&target)?;
            Ok(target)
        })
        .await
    }

    pub async fn copy(&self, source: &str, destination: &str) -> Result<PathBuf, FileError> {
        self.transfer(source, destination, false).await
    }

    pub async fn rename(&self, source: &str, destination: &str) -> Result<PathBuf, FileError> {
        self.transfer(source, destination, true).await
    }

    async fn transfer(
        &self,
        source: &str,
        destination: &str,
        remove_source: bool,
    ) -> Result<PathBuf, FileError> {
        let source = path::resolve(source);
        let destination = path::resolve(destination);
        run_blocking(move || {
            if PathKind::probe(&source)? == PathKind::NotFound {
                return Err(FileError::NotFound(source.display().to_string()));
            }
            fs_ops::ensure_parent(&destination)?;
            if remove_source {
                fs_ops::move_path(&source, &destination)?;
            } else {
                fs_ops::copy_path(&source, &destination)?;
            }
            Ok(destination)
        })
        .await
    }

    pub async fn create_dir(&self, target: &str) -> Result<PathBuf, FileError> {
        let target = path::resolve(target);
        run_blocking(move || {
            if PathKind::probe(&target)? == PathKind::File {
                return Err(FileError::wrong_type(&target, "directory"));
            }
            fs_ops::ensure_dir(&target)?;
            Ok(target)
        })
        .await
    }

    // ── Batch operations ────────────────────────────────────────────

    pub async fn batch_read(
        &self,
        paths: Vec<String>,
        encoding: Encoding,
    ) -> Result<BatchReport<FileContent>, FileError> {
        run_blocking(move || BatchEngine::current().read(&paths, encoding)).await
    }

    pub async fn batch_copy(
        &self,
        sources: Vec<String>,
        destination: String,
        preserve_structure: bool,
    ) -> Result<BatchReport<String>, FileError> {
        run_blocking(move || {
            BatchEngine::current().copy(&sources, &destination, preserve_structure)
        })
        .await
    }

    pub async fn batch_move(
        &self,
        sources: Vec<String>,
        destination: String,
        preserve_structure: bool,
    ) -> Result<BatchReport<String>, FileError> {
        run_blocking(move || {
            BatchEngine::current().move_files(&sources, &destination, preserve_structure)
        })
        .await
    }

    pub async fn batch_delete(
        &self,
        paths: Vec<String>,
        force: bool,
    ) -> Result<BatchReport<String>, FileError> {
        run_blocking(move || BatchEngine::current().delete(&paths, force)).await
    }

    pub async fn batch_create(&self, files: Vec<NewFile>) -> Result<BatchReport<String>, FileError> {
        run_blocking(move || BatchEngine::current().create(&files)).await
    }

    pub async fn scaffold(
        &self,
        base: &str,
        tree: Option<StructureNode>,
        template: Option<String>,
    ) -> Result<(PathBuf, BatchReport<String>), FileError> {
        if base.is_empty() {
            return Err(FileError::InvalidArgument("base_path must not be empty".into()));
        }
        let base = path::resolve(base);
        run_blocking(move || {
            let tree = structure::select_tree(tree, template.as_deref())?;
            let report = structure::materialize(&base, &tree);
            Ok((base, report))
        })
        .await
    }

    pub async fn edit(
        &self,
        target: &str,
        content: &str,
        plan: EditPlan,
    ) -> Result<EditOutcome, FileError> {
        let target = path::resolve(target);
        let content = content.to_string();
        run_blocking(move || editor::edit(&target, &content, plan)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use filemanager_core::files::editor::EditMode;
    use filemanager_core::files::listing::EntrySource;
    use std::path::Path;
    use tempfile::TempDir;

    fn p(path: &Path) -> String {
        path.display().to_string()
    }

    #[tokio::test]
    async fn write_then_read() {
        let dir = TempDir::new().unwrap();
        let backend = LocalFileBackend::new();
        let target = dir.path().join("nested/note.txt");

        let (_, written) = backend.write(&p(&target), "hello").await.unwrap();
        assert_eq!(written, 5);
        let (_, content) = backend.read(&p(&target)).await.unwrap();
        assert_eq!(content, "hello");
    }

    #[tokio::test]
    async fn write_replaces_existing_content() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("taken.txt");
        std::fs::write(&target, "old content").unwrap();

        LocalFileBackend::new().write(&p(&target), "new").await.unwrap();
        assert_eq!(std::fs::read_to_string(&target).unwrap(), "new");
    }

    #[tokio::test]
    async fn write_to_directory_is_wrong_type() {
        let dir = TempDir::new().unwrap();
        let err = LocalFileBackend::new()
            .write(&p(dir.path()), "x")
            .await
            .unwrap_err();
        assert!(matches!(err, FileError::WrongType { .. }));
    }

    #[tokio::test]
    async fn delete_missing_is_not_found() {
        let dir = TempDir::new().unwrap();
        let err = LocalFileBackend::new()
            .delete(&p(&dir.path().join("gone")))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn rename_moves_file() {
        let dir = TempDir::new().unwrap();
        let from = dir.path().join("a.txt");
        let to = dir.path().join("sub/b.txt");
        std::fs::write(&from, "data").unwrap();

        LocalFileBackend::new().rename(&p(&from), &p(&to)).await.unwrap();
        assert!(!from.exists());
        assert_eq!(std::fs::read_to_string(&to).unwrap(), "data");
    }

    #[tokio::test]
    async fn create_dir_over_file_is_wrong_type() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("f");
        std::fs::write(&file, "").unwrap();
        let err = LocalFileBackend::new().create_dir(&p(&file)).await.unwrap_err();
        assert!(matches!(err, FileError::WrongType { .. }));
    }

    #[tokio::test]
    async fn scaffold_rejects_unknown_template() {
        let dir = TempDir::new().unwrap();
        let err = LocalFileBackend::new()
            .scaffold(&p(dir.path()), None, Some("cobol".into()))
            .await
            .unwrap_err();
        assert!(matches!(err, FileError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn edit_appends() {
        let dir = TempDir::new().unwrap();
        let target = dir.path().join("log.txt");
        std::fs::write(&target, "one").unwrap();
        let plan = EditPlan {
            mode: EditMode::Append,
            encoding: Encoding::Utf8,
            backup: false,
        };
        LocalFileBackend::new()
            .edit(&p(&target), "two", plan)
            .await
            .unwrap();
        assert_eq!(std::fs::read_to_string(&target).unwrap(), "onetwo");
    }

    struct Refuses;

    impl EntrySource for Refuses {
        fn label(&self) -> &'static str {
            "refuses"
        }

        fn enumerate(&self, dir: &Path) -> Result<Vec<String>, FileError> {
            Err(FileError::PermissionDenied(dir.display().to_string()))
        }
    }

    struct Names;

    impl EntrySource for Names {
        fn label(&self) -> &'static str {
            "names"
        }

        fn enumerate(&self, _dir: &Path) -> Result<Vec<String>, FileError> {
            Ok(vec!["a.txt".into()])
        }
    }

    #[tokio::test]
    async fn list_uses_fallback_source() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("a.txt"), "a").unwrap();
        let backend =
            LocalFileBackend::with_lister(DirectoryLister::new(Box::new(Refuses), Box::new(Names)));

        let listing = backend.list(&p(dir.path()), false).await.unwrap();
        assert!(listing.used_fallback);
        assert_eq!(listing.entries.len(), 1);
    }
}
