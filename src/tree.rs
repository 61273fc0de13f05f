//! Tree construction, indexing, and rendering.
//!
//! Turning a node graph into files happens in two explicit phases:
//!
//! ```text
//! 1. Build   Node graph  →  Tree     (wrap + index, no I/O)
//! 2. Render  Tree        →  files    (all I/O, one depth-first pass)
//! ```
//!
//! Building wraps every node in a [`NodeWrapper`] that knows its final path,
//! then indexes the wrappers by path and by link ID. This is the only
//! validation gate: duplicate link IDs and unnamed children are rejected here,
//! before anything touches the filesystem.
//!
//! Rendering can only start once every link ID is known, which is what makes
//! forward references legal: a symlink may point at a node that appears later
//! in the graph. Whether a symlink's target exists at all is only checked when
//! the symlink is rendered.
//!
//! ## Ownership
//!
//! Wrappers live in an arena owned by the tree and refer to each other by
//! [`WrapperId`]. The path and link ID indices map to ids, never to
//! references. The node graph itself is borrowed read-only for the lifetime
//! of the tree.
//!
//! ## Failure
//!
//! The first error aborts the render and is returned wrapped with the failing
//! node's tree path. Whatever was written before that point stays on disk;
//! there is no rollback.

use crate::config::{ConfigError, RenderConfig};
use crate::fs::Filesystem;
use crate::node::{Node, NodeError, NodeInfo};
use crate::path;
use std::collections::HashMap;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, info, instrument, trace, warn};

#[derive(Error, Debug)]
pub enum TreeError {
    #[error("invalid render config: {0}")]
    Config(#[from] ConfigError),
    #[error(
        "duplicate link ID '{link_id}' for {}, previously used by: {}",
        .path.display(),
        .previous.display()
    )]
    DuplicateLinkId {
        link_id: String,
        path: PathBuf,
        previous: PathBuf,
    },
    #[error("child {index} has no filename: {}", .parent.display())]
    MissingFilename { parent: PathBuf, index: usize },
    #[error("couldn't create mount point {}: {source}", .path.display())]
    Mount { path: PathBuf, source: io::Error },
    #[error("rendering {}: {source}", .path.display())]
    Render { path: PathBuf, source: NodeError },
}

/// Index of a wrapper in its tree's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WrapperId(usize);

/// A node plus its place in the tree.
#[derive(Debug)]
pub struct NodeWrapper<'a> {
    node: &'a Node,
    /// Name on disk: the node's filename, or its alias under alias naming.
    pub filename: String,
    /// Absolute path in the tree's namespace, e.g. `/books/4/index.html`.
    pub path: PathBuf,
    pub parent: Option<WrapperId>,
    /// One slot per child slot of the node; `None` slots are kept as-is.
    pub children: Vec<Option<WrapperId>>,
}

impl<'a> NodeWrapper<'a> {
    pub fn node(&self) -> &'a Node {
        self.node
    }

    pub fn info(&self) -> &'a NodeInfo {
        self.node.info()
    }

    pub fn link_id(&self) -> &'a str {
        &self.node.info().link_id
    }
}

/// An indexed, renderable projection of a node graph onto a mount point.
pub struct Tree<'a> {
    fs: &'a dyn Filesystem,
    mount: PathBuf,
    config: RenderConfig,
    arena: Vec<NodeWrapper<'a>>,
    root: Option<WrapperId>,
    by_path: HashMap<PathBuf, WrapperId>,
    by_link_id: HashMap<String, WrapperId>,
}

impl fmt::Debug for Tree<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tree")
            .field("mount", &self.mount)
            .field("config", &self.config)
            .field("root", &self.root)
            .field("nodes", &self.arena.len())
            .field("link_ids", &self.by_link_id.len())
            .finish_non_exhaustive()
    }
}

impl<'a> Tree<'a> {
    /// Build a tree that renders `root` to `mount` inside `fs`, with default
    /// options.
    pub fn new(
        fs: &'a dyn Filesystem,
        mount: impl AsRef<Path>,
        root: impl Into<Option<&'a Node>>,
    ) -> Result<Self, TreeError> {
        Self::with_options(fs, mount, root, &RenderConfig::default())
    }

    /// Build a tree with explicit options.
    ///
    /// The config is validated first. An absent root yields a tree that
    /// renders only the mount point.
    #[instrument(skip_all, fields(mount = %mount.as_ref().display()))]
    pub fn with_options(
        fs: &'a dyn Filesystem,
        mount: impl AsRef<Path>,
        root: impl Into<Option<&'a Node>>,
        config: &RenderConfig,
    ) -> Result<Self, TreeError> {
        let start = Instant::now();
        config.validate()?;
        let mut tree = Tree {
            fs,
            mount: mount.as_ref().to_path_buf(),
            config: config.clone(),
            arena: Vec::new(),
            root: None,
            by_path: HashMap::new(),
            by_link_id: HashMap::new(),
        };

        if let Some(root) = root.into() {
            let root_id = wrap(&mut tree.arena, config.use_alias, root);
            tree.root = Some(root_id);
            tree.index(root_id)?;
        }

        info!(
            nodes = tree.arena.len(),
            link_ids = tree.by_link_id.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Tree built"
        );
        Ok(tree)
    }

    /// Pre-order walk registering every wrapper in the indices.
    fn index(&mut self, root: WrapperId) -> Result<(), TreeError> {
        self.register(root)?;
        // (parent, slot, child), popped in document order.
        let mut pending = Vec::new();
        push_slots(&mut pending, root, &self.arena[root.0].children);
        while let Some((parent, index, id)) = pending.pop() {
            if self.arena[id.0].filename.is_empty() {
                return Err(TreeError::MissingFilename {
                    parent: self.arena[parent.0].path.clone(),
                    index,
                });
            }
            self.register(id)?;
            push_slots(&mut pending, id, &self.arena[id.0].children);
        }
        Ok(())
    }

    fn register(&mut self, id: WrapperId) -> Result<(), TreeError> {
        let wrapper = &self.arena[id.0];
        if let Some(old) = self.by_path.insert(wrapper.path.clone(), id) {
            warn!(
                path = %wrapper.path.display(),
                previous = old.0,
                "Path registered twice; the later node wins"
            );
        }

        let link_id = wrapper.link_id();
        if !link_id.is_empty() {
            if let Some(old) = self.by_link_id.get(link_id) {
                return Err(TreeError::DuplicateLinkId {
                    link_id: link_id.to_string(),
                    path: wrapper.path.clone(),
                    previous: self.arena[old.0].path.clone(),
                });
            }
            self.by_link_id.insert(link_id.to_string(), id);
        }
        Ok(())
    }

    /// Write the whole tree: the mount point first, then every node in
    /// pre-order, each directory before its contents.
    #[instrument(skip(self), fields(mount = %self.mount.display()))]
    pub fn render(&self) -> Result<(), TreeError> {
        let start = Instant::now();
        self.fs
            .mkdir_all(&self.mount, self.config.dir_mode)
            .map_err(|source| TreeError::Mount {
                path: self.mount.clone(),
                source,
            })?;
        let mut pending: Vec<WrapperId> = self.root.into_iter().collect();
        while let Some(id) = pending.pop() {
            let wrapper = self.render_node(id)?;
            pending.extend(wrapper.children.iter().rev().flatten());
        }
        info!(
            nodes = self.arena.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Tree rendered"
        );
        Ok(())
    }

    /// Render one node. Its children are only queued once this succeeds.
    fn render_node(&self, id: WrapperId) -> Result<&NodeWrapper<'a>, TreeError> {
        let wrapper = self.get(id);
        let target = path::under(&self.mount, &wrapper.path);
        debug!(path = %wrapper.path.display(), kind = wrapper.node.kind(), "Rendering");
        wrapper
            .node
            .render(self, wrapper, &target)
            .map_err(|source| TreeError::Render {
                path: wrapper.path.clone(),
                source,
            })?;
        Ok(wrapper)
    }

    pub fn fs(&self) -> &'a dyn Filesystem {
        self.fs
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    pub fn root(&self) -> Option<&NodeWrapper<'a>> {
        self.root.map(|id| self.get(id))
    }

    /// Look up a wrapper by id. Ids are only valid for the tree that issued
    /// them.
    pub fn get(&self, id: WrapperId) -> &NodeWrapper<'a> {
        &self.arena[id.0]
    }

    pub fn by_path(&self, path: impl AsRef<Path>) -> Option<&NodeWrapper<'a>> {
        self.by_path.get(path.as_ref()).map(|id| self.get(*id))
    }

    pub fn by_link_id(&self, link_id: &str) -> Option<&NodeWrapper<'a>> {
        self.by_link_id.get(link_id).map(|id| self.get(*id))
    }

    /// Every indexed path, sorted.
    pub fn paths(&self) -> Vec<&Path> {
        let mut paths: Vec<&Path> = self.by_path.keys().map(PathBuf::as_path).collect();
        paths.sort();
        paths
    }

    /// Every registered link ID, sorted.
    pub fn link_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.by_link_id.keys().map(String::as_str).collect();
        ids.sort();
        ids
    }

    /// Present children of a wrapper, in order.
    pub fn children<'t>(
        &'t self,
        wrapper: &'t NodeWrapper<'a>,
    ) -> impl Iterator<Item = &'t NodeWrapper<'a>> + 't {
        wrapper.children.iter().flatten().map(|id| self.get(*id))
    }

    pub fn parent(&self, wrapper: &NodeWrapper<'a>) -> Option<&NodeWrapper<'a>> {
        wrapper.parent.map(|id| self.get(id))
    }

    /// Wrappers in pre-order.
    pub fn iter(&self) -> impl Iterator<Item = &NodeWrapper<'a>> {
        self.arena.iter()
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }
}

/// Wrap `root` and its descendants, pushing them to the arena in pre-order.
fn wrap<'a>(arena: &mut Vec<NodeWrapper<'a>>, use_alias: bool, root: &'a Node) -> WrapperId {
    let root_id = WrapperId(arena.len());
    // (parent and slot, node), popped in document order.
    let mut pending: Vec<(Option<(WrapperId, usize)>, &'a Node)> = vec![(None, root)];
    while let Some((slot, node)) = pending.pop() {
        let parent = slot.map(|(parent, _)| parent);
        let filename = node.info().display_name(use_alias).to_string();
        let path = match parent {
            Some(parent) => path::clean_join(&arena[parent.0].path, &filename),
            None => path::clean_join(Path::new("/"), &filename),
        };
        trace!(path = %path.display(), "Wrapping node");

        let id = WrapperId(arena.len());
        if let Some((parent, index)) = slot {
            arena[parent.0].children[index] = Some(id);
        }
        let children = node.children().unwrap_or_default();
        arena.push(NodeWrapper {
            node,
            filename,
            path,
            parent,
            children: vec![None; children.len()],
        });
        for (index, child) in children.iter().enumerate().rev() {
            if let Some(child) = child {
                pending.push((Some((id, index)), child));
            }
        }
    }
    root_id
}

/// Queue the present child slots of `parent` so the first one pops first.
fn push_slots(
    pending: &mut Vec<(WrapperId, usize, WrapperId)>,
    parent: WrapperId,
    children: &[Option<WrapperId>],
) {
    for (index, child) in children.iter().enumerate().rev() {
        if let Some(child) = child {
            pending.push((parent, index, *child));
        }
    }
}

/// Build a tree and render it in one call.
pub fn render(
    fs: &dyn Filesystem,
    mount: impl AsRef<Path>,
    root: Option<&Node>,
) -> Result<(), TreeError> {
    render_with(fs, mount, root, &RenderConfig::default())
}

pub fn render_with(
    fs: &dyn Filesystem,
    mount: impl AsRef<Path>,
    root: Option<&Node>,
    config: &RenderConfig,
) -> Result<(), TreeError> {
    Tree::with_options(fs, mount, root, config)?.render()
}
