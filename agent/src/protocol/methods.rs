use serde::{Deserialize, Serialize};
use serde_json::Value;

use filemanager_core::files::batch::NewFile;
use filemanager_core::files::encoding::Encoding;
use filemanager_core::files::structure::StructureNode;

// ── initialize ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeParams {
    pub protocol_version: String,
    #[serde(default)]
    pub client_info: Option<ClientInfo>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientInfo {
    pub name: String,
    #[serde(default)]
    pub version: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ServerInfo {
    pub name: String,
    pub version: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Capabilities {
    pub tools: Value,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeResult {
    pub protocol_version: String,
    pub server_info: ServerInfo,
    pub capabilities: Capabilities,
}

// ── tools/list ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDescriptor {
    pub name: &'static str,
    pub description: &'static str,
    pub input_schema: Value,
}

#[derive(Debug, Clone, Serialize)]
pub struct ToolListResult {
    pub tools: Vec<ToolDescriptor>,
}

// ── tools/call ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Deserialize)]
pub struct ToolCallParams {
    pub name: String,
    #[serde(default)]
    pub arguments: Value,
}

#[derive(Debug, Clone, Serialize)]
pub struct TextContent {
    #[serde(rename = "type")]
    pub content_type: &'static str,
    pub text: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolCallResult {
    pub content: Vec<TextContent>,
    pub structured_content: Value,
    pub is_error: bool,
}

impl ToolCallResult {
    pub fn text(text: impl Into<String>, structured: Value) -> Self {
        Self {
            content: vec![TextContent {
                content_type: "text",
                text: text.into(),
            }],
            structured_content: structured,
            is_error: false,
        }
    }
}

// ── Tool arguments ──────────────────────────────────────────────────

fn default_true() -> bool {
    true
}

fn default_edit_mode() -> String {
    "overwrite".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct PathArgs {
    pub path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateFileArgs {
    pub path: String,
    #[serde(default)]
    pub content: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WriteFileArgs {
    pub path: String,
    pub content: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TransferArgs {
    pub source: String,
    pub destination: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchFilesArgs {
    pub directory: String,
    pub pattern: String,
    #[serde(default = "default_true")]
    pub recursive: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ListDirectoryArgs {
    pub path: String,
    #[serde(default)]
    pub detailed: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BatchReadArgs {
    pub paths: Vec<String>,
    #[serde(default)]
    pub encoding: Encoding,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BatchTransferArgs {
    pub sources: Vec<String>,
    pub destination: String,
    #[serde(default)]
    pub preserve_structure: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BatchDeleteArgs {
    pub paths: Vec<String>,
    #[serde(default)]
    pub force: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BatchCreateArgs {
    pub files: Vec<NewFile>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateProjectArgs {
    pub base_path: String,
    #[serde(default)]
    pub structure: Option<StructureNode>,
    #[serde(default)]
    pub template: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EditFileArgs {
    pub path: String,
    pub content: String,
    #[serde(default)]
    pub encoding: Encoding,
    #[serde(default)]
    pub backup: bool,
    #[serde(default = "default_edit_mode")]
    pub mode: String,
    #[serde(default)]
    pub position: Option<usize>,
}
