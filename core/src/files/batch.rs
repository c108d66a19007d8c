//! Multi-item operations with per-item failure isolation.
//!
//! Every batch walks its input in order and records exactly one
//! [`ItemResult`] per input item. A failing item never stops the batch; only
//! a structurally invalid input (an empty path) is rejected up front.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::encoding::Encoding;
use super::local;
use super::path::{self, PathKind};
use crate::errors::FileError;

/// Which batch produced a report; used for summaries and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchOperation {
    Read,
    Copy,
    Move,
    Delete,
    Create,
    Scaffold,
}

impl BatchOperation {
    pub fn as_str(&self) -> &'static str {
        match self {
            BatchOperation::Read => "read",
            BatchOperation::Copy => "copy",
            BatchOperation::Move => "move",
            BatchOperation::Delete => "delete",
            BatchOperation::Create => "create",
            BatchOperation::Scaffold => "scaffold",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ItemOutcome<T> {
    Success { detail: T },
    Failure { reason: String },
}

/// Outcome of one input item, keyed by the item as the caller supplied it.
#[derive(Debug, Clone, Serialize)]
pub struct ItemResult<T> {
    pub item: String,
    #[serde(flatten)]
    pub outcome: ItemOutcome<T>,
}

impl<T> ItemResult<T> {
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, ItemOutcome::Success { .. })
    }
}

/// Ordered per-item results of one batch call. Immutable once built.
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport<T> {
    operation: BatchOperation,
    results: Vec<ItemResult<T>>,
    successes: usize,
    failures: usize,
}

impl<T> BatchReport<T> {
    pub fn operation(&self) -> BatchOperation {
        self.operation
    }

    pub fn results(&self) -> &[ItemResult<T>] {
        &self.results
    }

    pub fn successes(&self) -> usize {
        self.successes
    }

    pub fn failures(&self) -> usize {
        self.failures
    }
}

impl<T: fmt::Display> fmt::Display for BatchReport<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Batch {} results ({} items processed): {} succeeded, {} failed",
            self.operation.as_str(),
            self.results.len(),
            self.successes,
            self.failures
        )?;
        writeln!(f)?;
        for result in &self.results {
            match &result.outcome {
                ItemOutcome::Success { detail } => writeln!(f, "[ok] {detail}")?,
                ItemOutcome::Failure { reason } => {
                    writeln!(f, "[failed] {}: {reason}", result.item)?
                }
            }
        }
        Ok(())
    }
}

/// Accumulates item outcomes in input order.
pub struct BatchCollector<T> {
    operation: BatchOperation,
    results: Vec<ItemResult<T>>,
}

impl<T> BatchCollector<T> {
    pub fn new(operation: BatchOperation, capacity: usize) -> Self {
        Self {
            operation,
            results: Vec::with_capacity(capacity),
        }
    }

    pub fn record(&mut self, item: impl Into<String>, result: Result<T, FileError>) {
        let item = item.into();
        let outcome = match result {
            Ok(detail) => ItemOutcome::Success { detail },
            Err(e) => {
                warn!(operation = self.operation.as_str(), item = %item, error = %e, "Batch item failed");
                ItemOutcome::Failure {
                    reason: e.to_string(),
                }
            }
        };
        self.results.push(ItemResult { item, outcome });
    }

    /// Tally the outcomes and seal the report.
    pub fn finish(self) -> BatchReport<T> {
        let successes = self.results.iter().filter(|r| r.is_success()).count();
        let failures = self.results.len() - successes;
        debug!(
            operation = self.operation.as_str(),
            successes, failures, "Batch finished"
        );
        BatchReport {
            operation: self.operation,
            results: self.results,
            successes,
            failures,
        }
    }
}

/// Content of one file returned by [`BatchEngine::read`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileContent {
    pub path: PathBuf,
    pub size: u64,
    pub content: String,
}

impl fmt::Display for FileContent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- {} ({} bytes) ---", self.path.display(), self.size)?;
        writeln!(f, "{}", self.content)?;
        write!(f, "--- end of file ---")
    }
}

/// One file to create in [`BatchEngine::create`].
#[derive(Debug, Clone, Deserialize)]
pub struct NewFile {
    pub path: String,
    #[serde(default)]
    pub content: String,
}

/// Runs batch operations with paths resolved against a fixed working directory.
#[derive(Debug, Clone)]
pub struct BatchEngine {
    working_dir: PathBuf,
}

impl BatchEngine {
    /// Engine anchored at the process working directory.
    pub fn current() -> Self {
        let working_dir = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("/"));
        Self { working_dir }
    }

    pub fn with_working_dir(working_dir: impl Into<PathBuf>) -> Self {
        Self {
            working_dir: working_dir.into(),
        }
    }

    fn resolve(&self, raw: &str) -> PathBuf {
        path::resolve_from(&self.working_dir, raw)
    }

    pub fn read(
        &self,
        paths: &[String],
        encoding: Encoding,
    ) -> Result<BatchReport<FileContent>, FileError> {
        require_paths(paths.iter().map(String::as_str))?;
        let mut batch = BatchCollector::new(BatchOperation::Read, paths.len());

        for raw in paths {
            let target = self.resolve(raw);
            let result = local::read_text(&target, encoding).map(|content| FileContent {
                size: std::fs::metadata(&target).map(|m| m.len()).unwrap_or(0),
                path: target.clone(),
                content,
            });
            batch.record(raw.as_str(), result);
        }

        Ok(batch.finish())
    }

    pub fn copy(
        &self,
        sources: &[String],
        destination: &str,
        preserve_structure: bool,
    ) -> Result<BatchReport<String>, FileError> {
        self.transfer(BatchOperation::Copy, sources, destination, preserve_structure)
    }

    pub fn move_files(
        &self,
        sources: &[String],
        destination: &str,
        preserve_structure: bool,
    ) -> Result<BatchReport<String>, FileError> {
        self.transfer(BatchOperation::Move, sources, destination, preserve_structure)
    }

    fn transfer(
        &self,
        operation: BatchOperation,
        sources: &[String],
        destination: &str,
        preserve_structure: bool,
    ) -> Result<BatchReport<String>, FileError> {
        require_paths(sources.iter().map(String::as_str))?;
        require_paths(std::iter::once(destination))?;

        let dest_root = self.resolve(destination);
        local::ensure_dir(&dest_root)?;

        let mut batch = BatchCollector::new(operation, sources.len());
        for raw in sources {
            let source = self.resolve(raw);
            let result = self.transfer_one(operation, &source, &dest_root, preserve_structure);
            batch.record(raw.as_str(), result);
        }

        Ok(batch.finish())
    }

    fn transfer_one(
        &self,
        operation: BatchOperation,
        source: &Path,
        dest_root: &Path,
        preserve_structure: bool,
    ) -> Result<String, FileError> {
        if PathKind::probe(source)? == PathKind::NotFound {
            return Err(FileError::NotFound(source.display().to_string()));
        }

        let target = self.target_path(source, dest_root, preserve_structure)?;
        local::ensure_parent(&target)?;

        if operation == BatchOperation::Move {
            local::move_path(source, &target)?;
        } else {
            local::copy_path(source, &target)?;
        }
        Ok(format!("{} -> {}", source.display(), target.display()))
    }

    /// Where `source` lands under `dest_root`.
    ///
    /// With `preserve_structure` the source's path relative to the working
    /// directory is kept, so sources outside the working directory land
    /// outside `dest_root` and distinct sources may collide. Without it only
    /// the base name is kept and equal base names overwrite each other.
    pub fn target_path(
        &self,
        source: &Path,
        dest_root: &Path,
        preserve_structure: bool,
    ) -> Result<PathBuf, FileError> {
        if preserve_structure {
            let relative = path::relative_to(&self.working_dir, source);
            Ok(path::normalize(&dest_root.join(relative)))
        } else {
            let name = source.file_name().ok_or_else(|| {
                FileError::InvalidArgument(format!("{} has no file name", source.display()))
            })?;
            Ok(dest_root.join(name))
        }
    }

    /// Delete every path. With `force`, missing paths and delete errors are
    /// recorded as successes carrying a note instead of failures.
    pub fn delete(&self, paths: &[String], force: bool) -> Result<BatchReport<String>, FileError> {
        require_paths(paths.iter().map(String::as_str))?;
        let mut batch = BatchCollector::new(BatchOperation::Delete, paths.len());

        for raw in paths {
            let target = self.resolve(raw);
            let result = match PathKind::probe(&target) {
                Ok(PathKind::NotFound) if force => {
                    Ok(format!("Skipped missing path: {}", target.display()))
                }
                Ok(PathKind::NotFound) => {
                    Err(FileError::NotFound(target.display().to_string()))
                }
                Ok(_) => local::remove_path(&target)
                    .map(|()| format!("Deleted {}", target.display())),
                Err(e) => Err(e),
            };

            let result = match result {
                Err(e) if force => Ok(format!(
                    "Delete failed, continuing: {} ({e})",
                    target.display()
                )),
                other => other,
            };
            batch.record(raw.as_str(), result);
        }

        Ok(batch.finish())
    }

    pub fn create(&self, files: &[NewFile]) -> Result<BatchReport<String>, FileError> {
        require_paths(files.iter().map(|f| f.path.as_str()))?;
        let mut batch = BatchCollector::new(BatchOperation::Create, files.len());

        for file in files {
            let target = self.resolve(&file.path);
            let result = local::write_text(&target, &file.content, Encoding::Utf8).map(|_| {
                format!(
                    "Created {} ({} characters)",
                    target.display(),
                    file.content.chars().count()
                )
            });
            batch.record(file.path.as_str(), result);
        }

        Ok(batch.finish())
    }
}

fn require_paths<'a>(paths: impl IntoIterator<Item = &'a str>) -> Result<(), FileError> {
    for (index, raw) in paths.into_iter().enumerate() {
        if raw.trim().is_empty() {
            return Err(FileError::InvalidArgument(format!(
                "item {index} has an empty path"
            )));
        }
    }
    Ok(())
}
