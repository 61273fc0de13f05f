//! JSON manifests: node graphs as data.
//!
//! A manifest describes a node graph in JSON so one can be written by hand or
//! produced by another program and then rendered with the `build` command.
//!
//! ```json
//! {
//!   "type": "dir",
//!   "children": [
//!     {
//!       "type": "dir",
//!       "name": "4",
//!       "alias": "Terry Pratchett",
//!       "link_id": ["author", "4"],
//!       "children": [
//!         { "type": "file", "name": "index.html", "content": "<html></html>" },
//!         { "type": "json", "name": "meta.json", "value": { "id": 4 } }
//!       ]
//!     },
//!     null,
//!     { "type": "symlink", "name": "latest", "target": "author:4" }
//!   ]
//! }
//! ```
//!
//! | Field | Applies to | Meaning |
//! |-------|------------|---------|
//! | `type` | all | `dir`, `file`, `json`, or `symlink` |
//! | `name` | all | filename; optional only on the root |
//! | `alias` | all | name used under alias naming |
//! | `link_id` | all | string, or array of parts joined with `:` |
//! | `children` | `dir` | child nodes; `null` entries are skipped slots |
//! | `content` | `file` | UTF-8 text written verbatim |
//! | `mode` | `file` | number, or octal string like `"0755"`; default `0644` |
//! | `value` | `json` | any JSON value |
//! | `target` | `symlink` | link ID of the target, string or parts |
//!
//! Fields that don't apply to a node's type are rejected, as are unknown keys.

use crate::node::{DEFAULT_FILE_MODE, Node, NodeInfo, join_link_id};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("{location}: {message}")]
    Invalid { location: String, message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ManifestKind {
    Dir,
    File,
    Json,
    Symlink,
}

/// A link ID given either whole or as parts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LinkRef {
    Whole(String),
    Parts(Vec<String>),
}

impl LinkRef {
    pub fn joined(&self) -> String {
        match self {
            LinkRef::Whole(id) => id.clone(),
            LinkRef::Parts(parts) => join_link_id(parts),
        }
    }
}

/// Permission bits, as a number or an octal string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FileMode {
    Bits(u32),
    Octal(String),
}

impl FileMode {
    fn bits(&self) -> Option<u32> {
        let bits = match self {
            FileMode::Bits(bits) => *bits,
            FileMode::Octal(text) => {
                let digits = text.trim_start_matches("0o");
                u32::from_str_radix(digits, 8).ok()?
            }
        };
        (bits <= 0o7777).then_some(bits)
    }
}

/// One node of a manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ManifestNode {
    #[serde(rename = "type")]
    pub kind: ManifestKind,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub alias: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link_id: Option<LinkRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<Option<ManifestNode>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<FileMode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<LinkRef>,
}

impl ManifestNode {
    /// Convert into a node graph.
    ///
    /// Only the manifest's own shape is checked here. Link ID uniqueness and
    /// missing child names are left to tree construction.
    pub fn into_node(self) -> Result<Node, ManifestError> {
        self.convert("/")
    }

    fn convert(self, location: &str) -> Result<Node, ManifestError> {
        let invalid = |message: String| ManifestError::Invalid {
            location: location.to_string(),
            message,
        };

        let kind = self.kind;
        let misplaced = [
            ("children", self.children.is_some(), ManifestKind::Dir),
            ("content", self.content.is_some(), ManifestKind::File),
            ("mode", self.mode.is_some(), ManifestKind::File),
            ("value", self.value.is_some(), ManifestKind::Json),
            ("target", self.target.is_some(), ManifestKind::Symlink),
        ];
        for (field, present, owner) in misplaced {
            if present && owner != kind {
                return Err(invalid(format!(
                    "'{field}' is not allowed on a {kind:?} node"
                )));
            }
        }

        let mut info = NodeInfo::named(self.name).alias(self.alias);
        if let Some(link_id) = &self.link_id {
            info.link_id = link_id.joined();
        }

        let node = match kind {
            ManifestKind::Dir => {
                let base = location.trim_end_matches('/');
                let mut children = Vec::new();
                for (i, child) in self.children.unwrap_or_default().into_iter().enumerate() {
                    let child = match child {
                        Some(child) => {
                            let label = if child.name.is_empty() {
                                format!("#{i}")
                            } else {
                                child.name.clone()
                            };
                            Some(child.convert(&format!("{base}/{label}"))?)
                        }
                        None => None,
                    };
                    children.push(child);
                }
                Node::dir(info, children)
            }
            ManifestKind::File => {
                let mode = match &self.mode {
                    Some(mode) => mode
                        .bits()
                        .ok_or_else(|| invalid(format!("invalid file mode {mode:?}")))?,
                    None => DEFAULT_FILE_MODE,
                };
                Node::bytes(info, self.content.unwrap_or_default(), mode)
            }
            ManifestKind::Json => {
                Node::json_value(info, self.value.unwrap_or(serde_json::Value::Null))
            }
            ManifestKind::Symlink => {
                let target = self
                    .target
                    .ok_or_else(|| invalid("symlink has no 'target'".to_string()))?
                    .joined();
                if target.is_empty() {
                    return Err(invalid("symlink target is empty".to_string()));
                }
                Node::symlink(info, [target])
            }
        };
        Ok(node)
    }
}

/// Parse manifest JSON into a node graph.
pub fn parse_manifest(content: &str) -> Result<Node, ManifestError> {
    let manifest: ManifestNode = serde_json::from_str(content)?;
    manifest.into_node()
}

/// Read a manifest file into a node graph.
pub fn load_manifest(path: &Path) -> Result<Node, ManifestError> {
    debug!(path = %path.display(), "Loading manifest");
    let content = fs::read_to_string(path)?;
    parse_manifest(&content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dump::DumpNode;
    use crate::test_helpers::render_dump;
    use tempfile::TempDir;

    #[test]
    fn parse_nested_manifest() {
        let node = parse_manifest(
            r#"{
                "type": "dir",
                "name": "site",
                "children": [
                    {"type": "file", "name": "a.txt", "content": "abc"},
                    null,
                    {"type": "dir", "name": "sub", "children": [
                        {"type": "json", "name": "v.json", "value": {"k": 1}}
                    ]}
                ]
            }"#,
        )
        .unwrap();

        let children = node.children().unwrap();
        assert_eq!(children.len(), 3);
        assert!(children[1].is_none());
        assert_eq!(
            render_dump(&node),
            DumpNode::dir(
                "site",
                0o755,
                vec![
                    DumpNode::file("a.txt", 0o644, "abc"),
                    DumpNode::dir(
                        "sub",
                        0o755,
                        vec![DumpNode::file("v.json", 0o644, "{\n  \"k\": 1\n}\n")]
                    ),
                ]
            )
        );
    }

    #[test]
    fn link_ids_accept_parts() {
        let node = parse_manifest(
            r#"{"type": "dir", "name": "4", "alias": "Terry", "link_id": ["author", "4"]}"#,
        )
        .unwrap();
        assert_eq!(
            node.info(),
            &NodeInfo::named("4").alias("Terry").link_id(["author", "4"])
        );
    }

    #[test]
    fn symlink_target_parts_are_joined() {
        let node =
            parse_manifest(r#"{"type": "symlink", "name": "l", "target": ["author", "4"]}"#)
                .unwrap();
        assert_eq!(node, Node::symlink("l", ["author", "4"]));
    }

    #[test]
    fn file_modes() {
        let octal =
            parse_manifest(r#"{"type": "file", "name": "x", "mode": "0755"}"#).unwrap();
        assert_eq!(octal, Node::bytes("x", Vec::<u8>::new(), 0o755));

        let bits = parse_manifest(r#"{"type": "file", "name": "x", "mode": 384}"#).unwrap();
        assert_eq!(bits, Node::bytes("x", Vec::<u8>::new(), 0o600));

        let default = parse_manifest(r#"{"type": "file", "name": "x"}"#).unwrap();
        assert_eq!(default, Node::bytes("x", Vec::<u8>::new(), 0o644));
    }

    #[test]
    fn invalid_mode_is_rejected() {
        let err = parse_manifest(r#"{"type": "file", "name": "x", "mode": "0999"}"#).unwrap_err();
        assert!(matches!(err, ManifestError::Invalid { .. }));
    }

    #[test]
    fn misplaced_field_names_location() {
        let err = parse_manifest(
            r#"{"type": "dir", "children": [
                {"type": "dir", "name": "sub", "children": [
                    {"type": "json", "name": "v.json", "content": "x"}
                ]}
            ]}"#,
        )
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "/sub/v.json: 'content' is not allowed on a Json node"
        );
    }

    #[test]
    fn symlink_requires_target() {
        let err = parse_manifest(r#"{"type": "symlink", "name": "l"}"#).unwrap_err();
        assert!(err.to_string().contains("no 'target'"));
    }

    #[test]
    fn unknown_key_rejected() {
        let result = parse_manifest(r#"{"type": "dir", "chidlren": []}"#);
        assert!(matches!(result, Err(ManifestError::Json(_))));
    }

    #[test]
    fn unknown_type_rejected() {
        let result = parse_manifest(r#"{"type": "socket", "name": "s"}"#);
        assert!(matches!(result, Err(ManifestError::Json(_))));
    }

    #[test]
    fn unnamed_child_is_left_to_the_tree() {
        let node =
            parse_manifest(r#"{"type": "dir", "children": [{"type": "file"}]}"#).unwrap();
        assert_eq!(node.children().unwrap()[0].as_ref().unwrap().info().filename, "");
    }

    #[test]
    fn load_manifest_reads_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("site.json");
        fs::write(&path, r#"{"type": "file", "name": "a.txt", "content": "hi"}"#).unwrap();
        assert_eq!(load_manifest(&path).unwrap(), Node::string("a.txt", "hi"));
    }

    #[test]
    fn load_manifest_missing_file() {
        let tmp = TempDir::new().unwrap();
        let result = load_manifest(&tmp.path().join("missing.json"));
        assert!(matches!(result, Err(ManifestError::Io(_))));
    }
}
