//! Nodes: the content-producing building blocks of a tree.
//!
//! A node graph is plain data. It is built up front by whatever produces the
//! content (see [`crate::manifest`] for one such producer), handed to
//! [`Tree`] for wrapping and indexing, and only then written out.
//!
//! ## Variants
//!
//! | Variant | On render |
//! |---------|-----------|
//! | [`Node::Dir`] | creates the directory; children are rendered afterwards by the tree |
//! | [`Node::Static`] | writes a fixed byte payload with a fixed mode |
//! | [`Node::Json`] | serializes a value as indented JSON |
//! | [`Node::Symlink`] | links to another node, found by link ID at render time |
//!
//! ## Link IDs
//!
//! Any node may carry a link ID, a caller-chosen string that stays stable when
//! the node moves around in the tree. Symlink nodes refer to their target by
//! link ID rather than by path, which lets the same content be stored once and
//! linked from everywhere else it appears. IDs are often composed from several
//! parts, e.g. `["author", "4"]` becomes `author:4`.

use crate::path;
use crate::tree::{NodeWrapper, Tree};
use serde::Serialize;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::trace;

/// Mode used by [`Node::string`].
pub const DEFAULT_FILE_MODE: u32 = 0o644;

#[derive(Error, Debug)]
pub enum NodeError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unknown link ID '{link_id}' for symlink {}", .path.display())]
    UnknownLinkId { link_id: String, path: PathBuf },
    #[error(
        "couldn't find relative path from {} [link] to {} [link_id='{link_id}']",
        .from.display(),
        .to.display()
    )]
    RelativePath {
        link_id: String,
        from: PathBuf,
        to: PathBuf,
    },
}

/// Join link ID parts with `:`.
pub fn join_link_id<I, S>(parts: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    parts
        .into_iter()
        .map(|p| p.as_ref().to_string())
        .collect::<Vec<_>>()
        .join(":")
}

/// Identity of a node.
///
/// `filename` is required for every node except the root. `alias` is an
/// optional human-readable name used instead of the filename when the tree
/// is built with alias naming. An empty `link_id` means the node cannot be
/// linked to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeInfo {
    pub filename: String,
    pub alias: String,
    pub link_id: String,
}

impl NodeInfo {
    pub fn named(filename: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            ..Self::default()
        }
    }

    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = alias.into();
        self
    }

    pub fn link_id<I, S>(mut self, parts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.link_id = join_link_id(parts);
        self
    }

    /// The name this node gets on disk.
    pub fn display_name(&self, use_alias: bool) -> &str {
        if use_alias && !self.alias.is_empty() {
            &self.alias
        } else {
            &self.filename
        }
    }
}

impl From<&str> for NodeInfo {
    fn from(filename: &str) -> Self {
        Self::named(filename)
    }
}

impl From<String> for NodeInfo {
    fn from(filename: String) -> Self {
        Self::named(filename)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DirNode {
    pub info: NodeInfo,
    /// `None` slots are placeholders and render nothing.
    pub children: Vec<Option<Node>>,
}

impl Drop for DirNode {
    // Deep graphs are torn down with a work list instead of one stack frame
    // per level.
    fn drop(&mut self) {
        let mut pending: Vec<Node> = self.children.drain(..).flatten().collect();
        while let Some(node) = pending.pop() {
            if let Node::Dir(mut dir) = node {
                pending.extend(dir.children.drain(..).flatten());
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StaticNode {
    pub info: NodeInfo,
    pub mode: u32,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct JsonNode {
    pub info: NodeInfo,
    pub value: serde_json::Value,
}

/// A symlink to whichever node carries `target` as its link ID. The link is
/// written relative to the symlink's own directory.
#[derive(Debug, Clone, PartialEq)]
pub struct SymlinkNode {
    pub info: NodeInfo,
    pub target: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Dir(DirNode),
    Static(StaticNode),
    Json(JsonNode),
    Symlink(SymlinkNode),
}

impl Node {
    /// A directory holding `children`. Pass `Option<Node>` items to leave
    /// placeholder slots.
    pub fn dir<I, C>(info: impl Into<NodeInfo>, children: I) -> Node
    where
        I: IntoIterator<Item = C>,
        C: Into<Option<Node>>,
    {
        Node::Dir(DirNode {
            info: info.into(),
            children: children.into_iter().map(Into::into).collect(),
        })
    }

    pub fn empty_dir(info: impl Into<NodeInfo>) -> Node {
        Node::dir(info, Vec::<Node>::new())
    }

    pub fn bytes(info: impl Into<NodeInfo>, data: impl Into<Vec<u8>>, mode: u32) -> Node {
        Node::Static(StaticNode {
            info: info.into(),
            mode,
            data: data.into(),
        })
    }

    /// A text file with [`DEFAULT_FILE_MODE`].
    pub fn string(info: impl Into<NodeInfo>, text: impl Into<String>) -> Node {
        Node::bytes(info, text.into().into_bytes(), DEFAULT_FILE_MODE)
    }

    /// A JSON file holding `value`.
    ///
    /// The value is captured as a `serde_json::Value` here, so types that
    /// can't be represented as JSON (non-string map keys, for one) are
    /// rejected now rather than halfway through a render.
    pub fn json<T: Serialize + ?Sized>(
        info: impl Into<NodeInfo>,
        value: &T,
    ) -> Result<Node, serde_json::Error> {
        Ok(Node::json_value(info, serde_json::to_value(value)?))
    }

    pub fn json_value(info: impl Into<NodeInfo>, value: serde_json::Value) -> Node {
        Node::Json(JsonNode {
            info: info.into(),
            value,
        })
    }

    /// A symlink to the node whose link ID is `target` (parts joined with `:`).
    pub fn symlink<I, S>(info: impl Into<NodeInfo>, target: I) -> Node
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Node::Symlink(SymlinkNode {
            info: info.into(),
            target: join_link_id(target),
        })
    }

    pub fn info(&self) -> &NodeInfo {
        match self {
            Node::Dir(n) => &n.info,
            Node::Static(n) => &n.info,
            Node::Json(n) => &n.info,
            Node::Symlink(n) => &n.info,
        }
    }

    /// Child slots, for nodes that can hold children.
    pub fn children(&self) -> Option<&[Option<Node>]> {
        match self {
            Node::Dir(n) => Some(&n.children),
            _ => None,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Node::Dir(_) => "dir",
            Node::Static(_) => "file",
            Node::Json(_) => "json",
            Node::Symlink(_) => "symlink",
        }
    }

    /// Write this node to `path`.
    ///
    /// `this` is the node's own wrapper in `tree`; symlinks need it to know
    /// where they will live. Directories only create themselves: the tree
    /// renders their children afterwards, so a directory always exists before
    /// anything is written into it.
    pub fn render(&self, tree: &Tree<'_>, this: &NodeWrapper<'_>, path: &Path) -> Result<(), NodeError> {
        trace!(kind = self.kind(), path = %path.display(), "Rendering node");
        match self {
            Node::Dir(_) => tree.fs().mkdir_all(path, tree.config().dir_mode)?,
            Node::Static(n) => tree.fs().write_file(path, &n.data, n.mode)?,
            Node::Json(n) => {
                let mut data = serde_json::to_vec_pretty(&n.value)?;
                data.push(b'\n');
                tree.fs().write_file(path, &data, tree.config().file_mode)?;
            }
            Node::Symlink(n) => n.render(tree, this, path)?,
        }
        Ok(())
    }
}

impl SymlinkNode {
    fn render(&self, tree: &Tree<'_>, this: &NodeWrapper<'_>, path: &Path) -> Result<(), NodeError> {
        let target = tree
            .by_link_id(&self.target)
            .ok_or_else(|| NodeError::UnknownLinkId {
                link_id: self.target.clone(),
                path: this.path.clone(),
            })?;
        let from = this.path.parent().unwrap_or(Path::new("/"));
        let rel = path::relative(from, &target.path).ok_or_else(|| NodeError::RelativePath {
            link_id: self.target.clone(),
            from: this.path.clone(),
            to: target.path.clone(),
        })?;
        tree.fs().symlink(&rel, path)?;
        Ok(())
    }
}
