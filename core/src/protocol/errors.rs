//! Standard and application JSON-RPC 2.0 error codes.

/// Invalid JSON was received by the server.
pub const PARSE_ERROR: i64 = -32700;

/// The JSON sent is not a valid Request object.
pub const INVALID_REQUEST: i64 = -32600;

/// The method does not exist / is not available.
pub const METHOD_NOT_FOUND: i64 = -32601;

/// Invalid method parameter(s).
pub const INVALID_PARAMS: i64 = -32602;

/// Internal JSON-RPC error.
pub const INTERNAL_ERROR: i64 = -32603;

// Application error codes (filemanager-specific).

/// The agent has not been initialized yet (must call `initialize` first).
pub const NOT_INITIALIZED: i64 = -32002;

/// The file or directory was not found.
pub const FILE_NOT_FOUND: i64 = -32010;

/// Permission denied for the requested file operation.
pub const PERMISSION_DENIED: i64 = -32011;

/// A file operation failed (I/O error, fallback listing failure, etc.).
pub const FILE_OPERATION_FAILED: i64 = -32012;

/// A file was found where a directory was required, or vice versa.
pub const WRONG_TYPE: i64 = -32013;
