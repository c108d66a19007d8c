//! File-operation engine behind the filemanager agent.
//!
//! Batch operations with per-item failure isolation, recursive file search,
//! directory listing with a shell fallback, project scaffolding and content
//! edits. All operations are synchronous; callers offload them as needed.

pub mod errors;
pub mod files;
pub mod protocol;
