//! Tool catalog advertised through `tools/list`.

use serde_json::{json, Value};

use crate::protocol::methods::ToolDescriptor;

fn schema(properties: Value, required: &[&str]) -> Value {
    json!({
        "type": "object",
        "properties": properties,
        "required": required,
    })
}

fn path_only(description: &str) -> Value {
    schema(
        json!({"path": {"type": "string", "description": description}}),
        &["path"],
    )
}

fn encoding_property() -> Value {
    json!({
        "type": "string",
        "enum": ["utf8", "ascii", "latin1", "utf16le", "base64"],
        "default": "utf8",
        "description": "Text encoding of the file content"
    })
}

fn string_list(description: &str) -> Value {
    json!({"type": "array", "items": {"type": "string"}, "description": description})
}

/// Every tool the agent exposes, in a stable order.
pub fn tool_catalog() -> Vec<ToolDescriptor> {
    vec![
        ToolDescriptor {
            name: "create_file",
            description: "Create a file with the given content, creating parent directories as needed.",
            input_schema: schema(
                json!({
                    "path": {"type": "string", "description": "File to create"},
                    "content": {"type": "string", "default": ""}
                }),
                &["path"],
            ),
        },
        ToolDescriptor {
            name: "write_file",
            description: "Write content to a file, replacing any existing content.",
            input_schema: schema(
                json!({
                    "path": {"type": "string", "description": "File to write"},
                    "content": {"type": "string"}
                }),
                &["path", "content"],
            ),
        },
        ToolDescriptor {
            name: "read_file",
            description: "Read a UTF-8 text file.",
            input_schema: path_only("File to read"),
        },
        ToolDescriptor {
            name: "delete_file",
            description: "Delete a file or directory (directories are removed recursively).",
            input_schema: path_only("File or directory to delete"),
        },
        ToolDescriptor {
            name: "copy_file",
            description: "Copy a file or directory to a new location.",
            input_schema: schema(
                json!({
                    "source": {"type": "string"},
                    "destination": {"type": "string"}
                }),
                &["source", "destination"],
            ),
        },
        ToolDescriptor {
            name: "move_file",
            description: "Move or rename a file or directory.",
            input_schema: schema(
                json!({
                    "source": {"type": "string"},
                    "destination": {"type": "string"}
                }),
                &["source", "destination"],
            ),
        },
        ToolDescriptor {
            name: "create_directory",
            description: "Create a directory and any missing parents.",
            input_schema: path_only("Directory to create"),
        },
        ToolDescriptor {
            name: "list_directory",
            description: "List the entries of a directory, optionally with size and modification time.",
            input_schema: schema(
                json!({
                    "path": {"type": "string", "description": "Directory to list"},
                    "detailed": {"type": "boolean", "default": false}
                }),
                &["path"],
            ),
        },
        ToolDescriptor {
            name: "get_file_info",
            description: "Report type, size, timestamps and permissions of a path.",
            input_schema: path_only("Path to inspect"),
        },
        ToolDescriptor {
            name: "search_files",
            description: "Find files and directories whose name matches a glob pattern (* is the only wildcard, case-insensitive).",
            input_schema: schema(
                json!({
                    "directory": {"type": "string", "description": "Directory to search from"},
                    "pattern": {"type": "string", "description": "Glob pattern, e.g. *.txt"},
                    "recursive": {"type": "boolean", "default": true}
                }),
                &["directory", "pattern"],
            ),
        },
        ToolDescriptor {
            name: "batch_read_files",
            description: "Read several files at once. Failures are reported per file.",
            input_schema: schema(
                json!({
                    "paths": string_list("Files to read"),
                    "encoding": encoding_property()
                }),
                &["paths"],
            ),
        },
        ToolDescriptor {
            name: "batch_copy_files",
            description: "Copy several files or directories into a destination directory.",
            input_schema: schema(
                json!({
                    "sources": string_list("Paths to copy"),
                    "destination": {"type": "string", "description": "Destination directory"},
                    "preserve_structure": {
                        "type": "boolean",
                        "default": false,
                        "description": "Keep each source's path relative to the working directory"
                    }
                }),
                &["sources", "destination"],
            ),
        },
        ToolDescriptor {
            name: "batch_move_files",
            description: "Move several files or directories into a destination directory.",
            input_schema: schema(
                json!({
                    "sources": string_list("Paths to move"),
                    "destination": {"type": "string", "description": "Destination directory"},
                    "preserve_structure": {
                        "type": "boolean",
                        "default": false,
                        "description": "Keep each source's path relative to the working directory"
                    }
                }),
                &["sources", "destination"],
            ),
        },
        ToolDescriptor {
            name: "batch_delete_files",
            description: "Delete several files or directories. With force, missing paths are skipped.",
            input_schema: schema(
                json!({
                    "paths": string_list("Paths to delete"),
                    "force": {"type": "boolean", "default": false}
                }),
                &["paths"],
            ),
        },
        ToolDescriptor {
            name: "batch_create_files",
            description: "Create several files with content, creating parent directories as needed.",
            input_schema: schema(
                json!({
                    "files": {
                        "type": "array",
                        "items": {
                            "type": "object",
                            "properties": {
                                "path": {"type": "string"},
                                "content": {"type": "string", "default": ""}
                            },
                            "required": ["path"]
                        }
                    }
                }),
                &["files"],
            ),
        },
        ToolDescriptor {
            name: "create_project_structure",
            description: "Create a directory tree from an explicit structure or a named template (nodejs, react, python).",
            input_schema: schema(
                json!({
                    "base_path": {"type": "string", "description": "Directory the tree is created under"},
                    "structure": {
                        "type": "object",
                        "description": "Nested object: string values are file contents, object values are directories"
                    },
                    "template": {"type": "string", "enum": ["nodejs", "react", "python"]}
                }),
                &["base_path"],
            ),
        },
        ToolDescriptor {
            name: "edit_file_advanced",
            description: "Edit a file by overwriting, appending, prepending or inserting at a line, with optional backup.",
            input_schema: schema(
                json!({
                    "path": {"type": "string"},
                    "content": {"type": "string"},
                    "encoding": encoding_property(),
                    "backup": {"type": "boolean", "default": false},
                    "mode": {
                        "type": "string",
                        "enum": ["overwrite", "append", "prepend", "insert"],
                        "default": "overwrite"
                    },
                    "position": {
                        "type": "integer",
                        "minimum": 0,
                        "description": "0-based line index, required for insert mode"
                    }
                }),
                &["path", "content"],
            ),
        },
    ]
}
