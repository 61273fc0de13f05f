//! Shared test utilities for the treeforge test suite.
//!
//! Provides render shortcuts and tree lookups that panic with a clear message
//! on miss.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let dumped = render_dump(&Node::dir("dir", [Node::string("a.txt", "a")]));
//! assert_eq!(dumped.find("a.txt").unwrap().data, b"a");
//!
//! let tree = Tree::new(&fs, "/", &root).unwrap();
//! assert_paths(&tree, &["/", "/a.txt"]);
//! let a = wrapper(&tree, "/a.txt");
//! ```

use std::path::Path;

use crate::dump::{DumpNode, dump};
use crate::fs::MemFs;
use crate::node::Node;
use crate::tree::{NodeWrapper, Tree};

// =========================================================================
// Render shortcuts
// =========================================================================

/// Render `root` at `/` of a fresh in-memory filesystem.
pub fn render_mem(root: &Node) -> MemFs {
    let fs = MemFs::new();
    Tree::new(&fs, "/", root)
        .and_then(|tree| tree.render())
        .unwrap_or_else(|e| panic!("render of {} node failed: {e}", root.kind()));
    fs
}

/// Render `root` in memory and dump whatever it produced.
///
/// The dump starts at the root node's own path, so an unnamed root dumps as
/// `/` and a named one under its filename.
pub fn render_dump(root: &Node) -> DumpNode {
    let fs = render_mem(root);
    let path = Path::new("/").join(&root.info().filename);
    dump(&fs, &path).unwrap_or_else(|e| panic!("dump failed: {e}"))
}

// =========================================================================
// Tree lookups
// =========================================================================

/// Find a wrapper by tree path. Panics if not found.
pub fn wrapper<'t, 'a>(tree: &'t Tree<'a>, path: &str) -> &'t NodeWrapper<'a> {
    tree.by_path(path).unwrap_or_else(|| {
        let paths = tree.paths();
        panic!("path '{path}' not in tree. Available: {paths:?}")
    })
}

/// Assert the full set of indexed paths, in sorted order.
pub fn assert_paths(tree: &Tree<'_>, expected: &[&str]) {
    let actual: Vec<&Path> = tree.paths();
    let expected: Vec<&Path> = expected.iter().map(Path::new).collect();
    assert_eq!(actual, expected, "indexed paths mismatch");
}
