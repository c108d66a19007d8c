//! Async facade over the blocking filesystem operations in `filemanager-core`.
//!
//! Every call runs on the blocking thread pool so a slow disk or a large
//! recursive walk never stalls the transport loop.

pub mod local;

pub use filemanager_core::errors::FileError;

/// Run `task` on the blocking pool and flatten the join error into a [`FileError`].
pub async fn run_blocking<T, F>(task: F) -> Result<T, FileError>
where
    F: FnOnce() -> Result<T, FileError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(task)
        .await
        .map_err(|e| FileError::OperationFailed(e.to_string()))?
}
