//! Project scaffolding from a nested file/directory description.
//!
//! A [`StructureNode`] tree is written breadth-first with an explicit queue.
//! Creation is best-effort: a failed child is recorded and every other
//! declared child is still attempted, including the children of a directory
//! that could not be created (they fail individually).

use std::collections::{BTreeMap, VecDeque};
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use super::batch::{BatchCollector, BatchOperation, BatchReport};
use super::encoding::Encoding;
use super::local;
use super::path;
use crate::errors::FileError;

/// A file (its content) or a directory (its named children).
///
/// In JSON a string is a file and an object is a directory:
/// `{"src": {"main.rs": "fn main() {}"}, "README.md": "# demo"}`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum StructureNode {
    File(String),
    Directory(BTreeMap<String, StructureNode>),
}

impl StructureNode {
    fn dir<const N: usize>(children: [(&str, StructureNode); N]) -> Self {
        StructureNode::Directory(
            children
                .into_iter()
                .map(|(name, node)| (name.to_string(), node))
                .collect(),
        )
    }

    fn file(content: &str) -> Self {
        StructureNode::File(content.to_string())
    }

    fn empty_dir() -> Self {
        StructureNode::Directory(BTreeMap::new())
    }
}

/// Built-in project layouts selectable by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preset {
    Node,
    React,
    Python,
}

impl Preset {
    pub const ALL: [Preset; 3] = [Preset::Node, Preset::React, Preset::Python];

    pub fn as_str(&self) -> &'static str {
        match self {
            Preset::Node => "nodejs",
            Preset::React => "react",
            Preset::Python => "python",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "node" | "nodejs" => Some(Preset::Node),
            "react" => Some(Preset::React),
            "python" => Some(Preset::Python),
            _ => None,
        }
    }

    pub fn tree(&self) -> StructureNode {
        use StructureNode as N;
        match self {
            Preset::Node => N::dir([
                (
                    "package.json",
                    N::file(
                        "{\n  \"name\": \"my-project\",\n  \"version\": \"1.0.0\",\n  \"main\": \"src/index.js\",\n  \"scripts\": {\n    \"start\": \"node src/index.js\",\n    \"test\": \"node --test\"\n  }\n}\n",
                    ),
                ),
                ("src", N::dir([("index.js", N::file("console.log('Hello, world!');\n"))])),
                ("test", N::empty_dir()),
                ("README.md", N::file("# my-project\n")),
                (".gitignore", N::file("node_modules/\n.env\n")),
            ]),
            Preset::React => N::dir([
                (
                    "package.json",
                    N::file(
                        "{\n  \"name\": \"my-react-app\",\n  \"version\": \"0.1.0\",\n  \"private\": true,\n  \"dependencies\": {\n    \"react\": \"^18.2.0\",\n    \"react-dom\": \"^18.2.0\"\n  },\n  \"scripts\": {\n    \"start\": \"react-scripts start\",\n    \"build\": \"react-scripts build\"\n  }\n}\n",
                    ),
                ),
                (
                    "public",
                    N::dir([(
                        "index.html",
                        N::file(
                            "<!DOCTYPE html>\n<html lang=\"en\">\n  <head><meta charset=\"utf-8\" /><title>React App</title></head>\n  <body><div id=\"root\"></div></body>\n</html>\n",
                        ),
                    )]),
                ),
                (
                    "src",
                    N::dir([
                        (
                            "index.jsx",
                            N::file(
                                "import React from 'react';\nimport { createRoot } from 'react-dom/client';\nimport App from './App';\n\ncreateRoot(document.getElementById('root')).render(<App />);\n",
                            ),
                        ),
                        (
                            "App.jsx",
                            N::file(
                                "import React from 'react';\n\nexport default function App() {\n  return <h1>Hello, React!</h1>;\n}\n",
                            ),
                        ),
                        ("components", N::empty_dir()),
                    ]),
                ),
                ("README.md", N::file("# my-react-app\n")),
                (".gitignore", N::file("node_modules/\nbuild/\n")),
            ]),
            Preset::Python => N::dir([
                (
                    "main.py",
                    N::file(
                        "def main():\n    print(\"Hello, world!\")\n\n\nif __name__ == \"__main__\":\n    main()\n",
                    ),
                ),
                ("requirements.txt", N::file("")),
                ("src", N::dir([("__init__.py", N::file(""))])),
                ("tests", N::dir([("__init__.py", N::file(""))])),
                ("README.md", N::file("# my-project\n")),
                (".gitignore", N::file("__pycache__/\n*.pyc\n.venv/\n")),
            ]),
        }
    }
}

/// Pick the tree to build: an explicit tree always wins over a preset name.
pub fn select_tree(
    structure: Option<StructureNode>,
    template: Option<&str>,
) -> Result<StructureNode, FileError> {
    if let Some(tree) = structure {
        return Ok(tree);
    }
    let name = template.ok_or_else(|| {
        FileError::InvalidArgument("either a structure or a template name is required".into())
    })?;
    Preset::from_name(name).map(|p| p.tree()).ok_or_else(|| {
        let known: Vec<&str> = Preset::ALL.iter().map(Preset::as_str).collect();
        FileError::InvalidArgument(format!(
            "unknown template {name:?} (available: {})",
            known.join(", ")
        ))
    })
}

/// Write `tree` under `base`, one item per declared file or directory.
///
/// A root `File` node is written to `base` itself.
pub fn materialize(base: &Path, tree: &StructureNode) -> BatchReport<String> {
    let mut batch = BatchCollector::new(BatchOperation::Scaffold, 0);

    let children = match tree {
        StructureNode::File(content) => {
            batch.record(base.display().to_string(), write_file(base, content));
            return batch.finish();
        }
        StructureNode::Directory(children) => children,
    };

    let created = local::ensure_dir(base).map(|()| format!("Created directory {}", base.display()));
    batch.record(base.display().to_string(), created);

    let mut queue: VecDeque<(PathBuf, &BTreeMap<String, StructureNode>)> = VecDeque::new();
    queue.push_back((base.to_path_buf(), children));

    while let Some((dir, children)) = queue.pop_front() {
        for (name, node) in children {
            let target = path::join_relative(&dir, name);
            let item = target.display().to_string();
            match node {
                StructureNode::File(content) => batch.record(item, write_file(&target, content)),
                StructureNode::Directory(grandchildren) => {
                    let result = local::ensure_dir(&target)
                        .map(|()| format!("Created directory {}", target.display()));
                    batch.record(item, result);
                    queue.push_back((target, grandchildren));
                }
            }
        }
    }

    let report = batch.finish();
    debug!(base = %base.display(), items = report.results().len(), "Materialized structure");
    report
}

fn write_file(target: &Path, content: &str) -> Result<String, FileError> {
    local::write_text(target, content, Encoding::Utf8)
        .map(|n| format!("Wrote {} ({n} bytes)", target.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn deserializes_nested_json() {
        let tree: StructureNode = serde_json::from_value(serde_json::json!({
            "src": {"lib.rs": "pub fn f() {}"},
            "Cargo.toml": "[package]"
        }))
        .unwrap();
        match tree {
            StructureNode::Directory(children) => {
                assert_eq!(children["Cargo.toml"], StructureNode::file("[package]"));
                assert!(matches!(children["src"], StructureNode::Directory(_)));
            }
            other => panic!("unexpected node {other:?}"),
        }
    }

    #[test]
    fn materialize_writes_files_and_dirs() {
        let dir = TempDir::new().unwrap();
        let base = dir.path().join("proj");
        let tree: StructureNode = serde_json::from_value(serde_json::json!({
            "a": {"b": {"c.txt": "deep"}},
            "empty": {},
            "top.txt": "top"
        }))
        .unwrap();

        let report = materialize(&base, &tree);
        assert_eq!(report.failures(), 0);
        // base, a, a/b, a/b/c.txt, empty, top.txt
        assert_eq!(report.results().len(), 6);
        assert_eq!(fs::read_to_string(base.join("a/b/c.txt")).unwrap(), "deep");
        assert_eq!(fs::read_to_string(base.join("top.txt")).unwrap(), "top");
        assert!(base.join("empty").is_dir());
    }

    #[test]
    fn materialize_overwrites_existing_files() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("x.txt"), "old").unwrap();
        let tree = StructureNode::dir([("x.txt", StructureNode::file("new"))]);

        materialize(dir.path(), &tree);
        assert_eq!(fs::read_to_string(dir.path().join("x.txt")).unwrap(), "new");
    }

    #[test]
    fn failed_directory_still_attempts_children() {
        let dir = TempDir::new().unwrap();
        // A file sits where a directory is declared.
        fs::write(dir.path().join("blocked"), "").unwrap();
        let tree = StructureNode::dir([
            (
                "blocked",
                StructureNode::dir([("inner.txt", StructureNode::file("x"))]),
            ),
            ("ok.txt", StructureNode::file("fine")),
        ]);

        let report = materialize(dir.path(), &tree);
        // root, blocked, ok.txt, blocked/inner.txt
        assert_eq!(report.results().len(), 4);
        assert_eq!(report.failures(), 2);
        assert!(dir.path().join("ok.txt").exists());
    }

    #[test]
    fn explicit_tree_overrides_template() {
        let custom = StructureNode::dir([("only.txt", StructureNode::file(""))]);
        let chosen = select_tree(Some(custom.clone()), Some("react")).unwrap();
        assert_eq!(chosen, custom);
    }

    #[test]
    fn template_lookup() {
        assert_eq!(select_tree(None, Some("Python")).unwrap(), Preset::Python.tree());
        assert_eq!(select_tree(None, Some("node")).unwrap(), Preset::Node.tree());
        let err = select_tree(None, Some("cobol")).unwrap_err();
        assert!(err.to_string().contains("nodejs, react, python"));
        assert!(matches!(select_tree(None, None), Err(FileError::InvalidArgument(_))));
    }

    #[test]
    fn every_preset_materializes() {
        for preset in Preset::ALL {
            let dir = TempDir::new().unwrap();
            let report = materialize(dir.path(), &preset.tree());
            assert_eq!(report.failures(), 0, "{} preset failed", preset.as_str());
        }
    }
}
