//! Standard and application JSON-RPC 2.0 error codes.

pub use filemanager_core::protocol::errors::*;
