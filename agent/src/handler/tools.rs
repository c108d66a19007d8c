//! `tools/call` execution: argument decoding, the core call, and rendering.

use std::time::Instant;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{debug, warn};

use filemanager_core::files::editor::{EditMode, EditPlan};

use crate::files::local::LocalFileBackend;
use crate::files::FileError;
use crate::protocol::errors;
use crate::protocol::methods::{
    BatchCreateArgs, BatchDeleteArgs, BatchReadArgs, BatchTransferArgs, CreateFileArgs,
    CreateProjectArgs, EditFileArgs, ListDirectoryArgs, PathArgs, SearchFilesArgs,
    ToolCallResult, TransferArgs, WriteFileArgs,
};

/// Why a tool call produced a JSON-RPC error instead of a result.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Invalid arguments for {tool}: {reason}")]
    InvalidArguments { tool: String, reason: String },

    #[error("Error executing {tool}: {source}")]
    Failed {
        tool: String,
        #[source]
        source: FileError,
    },
}

impl ToolError {
    pub fn code(&self) -> i64 {
        match self {
            ToolError::UnknownTool(_) => errors::METHOD_NOT_FOUND,
            ToolError::InvalidArguments { .. } => errors::INVALID_PARAMS,
            ToolError::Failed { source, .. } => file_error_code(source),
        }
    }
}

/// JSON-RPC code for a core failure.
pub fn file_error_code(err: &FileError) -> i64 {
    match err {
        FileError::NotFound(_) => errors::FILE_NOT_FOUND,
        FileError::PermissionDenied(_) => errors::PERMISSION_DENIED,
        FileError::WrongType { .. } => errors::WRONG_TYPE,
        FileError::InvalidArgument(_) => errors::INVALID_PARAMS,
        FileError::Io(e) => match e.kind() {
            std::io::ErrorKind::NotFound => errors::FILE_NOT_FOUND,
            std::io::ErrorKind::PermissionDenied => errors::PERMISSION_DENIED,
            _ => errors::FILE_OPERATION_FAILED,
        },
        FileError::OperationFailed(_) | FileError::ListingFailed { .. } => {
            errors::FILE_OPERATION_FAILED
        }
    }
}

fn parse<T: DeserializeOwned>(tool: &str, arguments: Value) -> Result<T, ToolError> {
    // Tools without arguments may be called with `arguments` omitted.
    let arguments = if arguments.is_null() {
        json!({})
    } else {
        arguments
    };
    serde_json::from_value(arguments).map_err(|e| ToolError::InvalidArguments {
        tool: tool.to_string(),
        reason: e.to_string(),
    })
}

fn structured<T: Serialize>(tool: &str, value: &T) -> Result<Value, ToolError> {
    serde_json::to_value(value).map_err(|e| ToolError::Failed {
        tool: tool.to_string(),
        source: FileError::OperationFailed(format!("cannot encode result: {e}")),
    })
}

/// Executes tool calls against a [`LocalFileBackend`].
#[derive(Clone, Default)]
pub struct ToolRunner {
    backend: LocalFileBackend,
}

impl ToolRunner {
    pub fn new(backend: LocalFileBackend) -> Self {
        Self { backend }
    }

    pub async fn call(&self, name: &str, arguments: Value) -> Result<ToolCallResult, ToolError> {
        let started = Instant::now();
        let result = self.execute(name, arguments).await;
        match &result {
            Ok(_) => debug!(
                tool = name,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Tool call completed"
            ),
            Err(e) => warn!(tool = name, error = %e, "Tool call failed"),
        }
        result
    }

    async fn execute(&self, name: &str, arguments: Value) -> Result<ToolCallResult, ToolError> {
        let failed = |source: FileError| ToolError::Failed {
            tool: name.to_string(),
            source,
        };

        match name {
            "create_file" | "write_file" => {
                let (raw, content) = if name == "create_file" {
                    let args: CreateFileArgs = parse(name, arguments)?;
                    (args.path, args.content)
                } else {
                    let args: WriteFileArgs = parse(name, arguments)?;
                    (args.path, args.content)
                };
                let (path, bytes) = self.backend.write(&raw, &content).await.map_err(failed)?;
                let verb = if name == "create_file" { "created" } else { "written" };
                Ok(ToolCallResult::text(
                    format!("File {verb}: {} ({bytes} bytes)", path.display()),
                    json!({"path": path.display().to_string(), "bytes": bytes}),
                ))
            }
            "read_file" => {
                let args: PathArgs = parse(name, arguments)?;
                let (path, content) = self.backend.read(&args.path).await.map_err(failed)?;
                Ok(ToolCallResult::text(
                    format!("File content ({}):\n\n{content}", path.display()),
                    json!({"path": path.display().to_string(), "content": content}),
                ))
            }
            "delete_file" => {
                let args: PathArgs = parse(name, arguments)?;
                let path = self.backend.delete(&args.path).await.map_err(failed)?;
                Ok(ToolCallResult::text(
                    format!("Deleted: {}", path.display()),
                    json!({"path": path.display().to_string()}),
                ))
            }
            "copy_file" | "move_file" => {
                let args: TransferArgs = parse(name, arguments)?;
                let (verb, target) = if name == "copy_file" {
                    ("Copied", self.backend.copy(&args.source, &args.destination).await)
                } else {
                    ("Moved", self.backend.rename(&args.source, &args.destination).await)
                };
                let target = target.map_err(failed)?;
                Ok(ToolCallResult::text(
                    format!("{verb}: {} -> {}", args.source, target.display()),
                    json!({"source": args.source, "destination": target.display().to_string()}),
                ))
            }
            "create_directory" => {
                let args: PathArgs = parse(name, arguments)?;
                let path = self.backend.create_dir(&args.path).await.map_err(failed)?;
                Ok(ToolCallResult::text(
                    format!("Directory created: {}", path.display()),
                    json!({"path": path.display().to_string()}),
                ))
            }
            "list_directory" => {
                let args: ListDirectoryArgs = parse(name, arguments)?;
                let listing = self
                    .backend
                    .list(&args.path, args.detailed)
                    .await
                    .map_err(failed)?;
                Ok(ToolCallResult::text(listing.to_string(), structured(name, &listing)?))
            }
            "get_file_info" => {
                let args: PathArgs = parse(name, arguments)?;
                let info = self.backend.info(&args.path).await.map_err(failed)?;
                Ok(ToolCallResult::text(info.to_string(), structured(name, &info)?))
            }
            "search_files" => {
                let args: SearchFilesArgs = parse(name, arguments)?;
                let outcome = self
                    .backend
                    .search(&args.directory, &args.pattern, args.recursive)
                    .await
                    .map_err(failed)?;
                Ok(ToolCallResult::text(outcome.to_string(), structured(name, &outcome)?))
            }
            "batch_read_files" => {
                let args: BatchReadArgs = parse(name, arguments)?;
                let report = self
                    .backend
                    .batch_read(args.paths, args.encoding)
                    .await
                    .map_err(failed)?;
                Ok(ToolCallResult::text(report.to_string(), structured(name, &report)?))
            }
            "batch_copy_files" | "batch_move_files" => {
                let args: BatchTransferArgs = parse(name, arguments)?;
                let report = if name == "batch_copy_files" {
                    self.backend
                        .batch_copy(args.sources, args.destination, args.preserve_structure)
                        .await
                } else {
                    self.backend
                        .batch_move(args.sources, args.destination, args.preserve_structure)
                        .await
                }
                .map_err(failed)?;
                Ok(ToolCallResult::text(report.to_string(), structured(name, &report)?))
            }
            "batch_delete_files" => {
                let args: BatchDeleteArgs = parse(name, arguments)?;
                let report = self
                    .backend
                    .batch_delete(args.paths, args.force)
                    .await
                    .map_err(failed)?;
                Ok(ToolCallResult::text(report.to_string(), structured(name, &report)?))
            }
            "batch_create_files" => {
                let args: BatchCreateArgs = parse(name, arguments)?;
                let report = self.backend.batch_create(args.files).await.map_err(failed)?;
                Ok(ToolCallResult::text(report.to_string(), structured(name, &report)?))
            }
            "create_project_structure" => {
                let args: CreateProjectArgs = parse(name, arguments)?;
                let (base, report) = self
                    .backend
                    .scaffold(&args.base_path, args.structure, args.template)
                    .await
                    .map_err(failed)?;
                Ok(ToolCallResult::text(
                    format!("Project structure created at {}\n\n{report}", base.display()),
                    structured(name, &report)?,
                ))
            }
            "edit_file_advanced" => {
                let args: EditFileArgs = parse(name, arguments)?;
                let plan = EditPlan {
                    mode: EditMode::from_parts(&args.mode, args.position).map_err(failed)?,
                    encoding: args.encoding,
                    backup: args.backup,
                };
                let outcome = self
                    .backend
                    .edit(&args.path, &args.content, plan)
                    .await
                    .map_err(failed)?;
                Ok(ToolCallResult::text(outcome.to_string(), structured(name, &outcome)?))
            }
            other => Err(ToolError::UnknownTool(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use tempfile::TempDir;

    fn p(path: &Path) -> String {
        path.display().to_string()
    }

    #[tokio::test]
    async fn unknown_tool_is_method_not_found() {
        let err = ToolRunner::default()
            .call("format_disk", json!({}))
            .await
            .unwrap_err();
        assert_eq!(err.code(), errors::METHOD_NOT_FOUND);
        assert_eq!(err.to_string(), "Unknown tool: format_disk");
    }

    #[tokio::test]
    async fn missing_argument_is_invalid_params() {
        let err = ToolRunner::default()
            .call("read_file", json!({}))
            .await
            .unwrap_err();
        assert_eq!(err.code(), errors::INVALID_PARAMS);
        assert!(err.to_string().contains("path"));
    }

    #[tokio::test]
    async fn read_missing_file_names_path() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("missing.txt");
        let err = ToolRunner::default()
            .call("read_file", json!({"path": p(&missing)}))
            .await
            .unwrap_err();
        assert_eq!(err.code(), errors::FILE_NOT_FOUND);
        let message = err.to_string();
        assert!(message.starts_with("Error executing read_file: "));
        assert!(message.contains("missing.txt"));
    }

    #[tokio::test]
    async fn read_file_renders_content() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("hello.txt");
        std::fs::write(&file, "hi there").unwrap();

        let result = ToolRunner::default()
            .call("read_file", json!({"path": p(&file)}))
            .await
            .unwrap();
        assert!(result.content[0].text.starts_with("File content ("));
        assert!(result.content[0].text.ends_with("\n\nhi there"));
        assert_eq!(result.structured_content["content"], "hi there");
    }

    #[tokio::test]
    async fn batch_read_reports_partial_failure_as_success() {
        let dir = TempDir::new().unwrap();
        let good = dir.path().join("good.txt");
        std::fs::write(&good, "ok").unwrap();
        let bad = dir.path().join("bad.txt");

        let result = ToolRunner::default()
            .call("batch_read_files", json!({"paths": [p(&good), p(&bad)]}))
            .await
            .unwrap();
        assert!(!result.is_error);
        let text = &result.content[0].text;
        assert!(text.contains("2 items processed"));
        assert!(text.contains("1 succeeded, 1 failed"));
        assert_eq!(result.structured_content["successes"], 1);
        assert_eq!(result.structured_content["failures"], 1);
    }

    #[tokio::test]
    async fn empty_batch_path_rejects_whole_call() {
        let err = ToolRunner::default()
            .call("batch_delete_files", json!({"paths": ["", "x"]}))
            .await
            .unwrap_err();
        assert_eq!(err.code(), errors::INVALID_PARAMS);
    }

    #[tokio::test]
    async fn edit_rejects_unknown_mode() {
        let dir = TempDir::new().unwrap();
        let err = ToolRunner::default()
            .call(
                "edit_file_advanced",
                json!({"path": p(&dir.path().join("f")), "content": "x", "mode": "replace"}),
            )
            .await
            .unwrap_err();
        assert_eq!(err.code(), errors::INVALID_PARAMS);
        assert!(!dir.path().join("f").exists());
    }

    #[tokio::test]
    async fn list_file_is_wrong_type() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("plain.txt");
        std::fs::write(&file, "").unwrap();
        let err = ToolRunner::default()
            .call("list_directory", json!({"path": p(&file)}))
            .await
            .unwrap_err();
        assert_eq!(err.code(), errors::WRONG_TYPE);
    }

    #[tokio::test]
    async fn scaffold_from_template() {
        let dir = TempDir::new().unwrap();
        let base = dir.path().join("svc");
        let result = ToolRunner::default()
            .call(
                "create_project_structure",
                json!({"base_path": p(&base), "template": "python"}),
            )
            .await
            .unwrap();
        assert!(result.content[0].text.starts_with("Project structure created at"));
        assert_eq!(result.structured_content["failures"], 0);
        assert!(base.join("README.md").is_file());
    }

    #[test]
    fn file_error_codes() {
        assert_eq!(
            file_error_code(&FileError::NotFound("x".into())),
            errors::FILE_NOT_FOUND
        );
        assert_eq!(
            file_error_code(&FileError::PermissionDenied("x".into())),
            errors::PERMISSION_DENIED
        );
        assert_eq!(
            file_error_code(&FileError::InvalidArgument("x".into())),
            errors::INVALID_PARAMS
        );
        assert_eq!(
            file_error_code(&FileError::ListingFailed {
                path: "x".into(),
                primary: "a".into(),
                fallback: "b".into(),
            }),
            errors::FILE_OPERATION_FAILED
        );
    }
}
