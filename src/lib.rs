//! # Treeforge
//!
//! Materialize a computed content tree onto a filesystem. Content is described
//! as a graph of nodes (directories, static files, JSON documents, and
//! symlinks), each node knowing how to write itself. The same content can
//! appear in many places without being stored twice: one copy is written and
//! every other appearance becomes a relative symlink to it.
//!
//! # Architecture: Build, Then Render
//!
//! ```text
//! 1. Build   Node graph  →  Tree     (resolve paths, index link IDs; no I/O)
//! 2. Render  Tree        →  files    (one depth-first pass of writes)
//! ```
//!
//! All validation happens in the build phase, so a graph with duplicate link
//! IDs or unnamed children is rejected before a single file is written.
//!
//! ```rust,ignore
//! use treeforge::{MemFs, Node, NodeInfo, Tree};
//!
//! let root = Node::dir("", [
//!     Node::dir(NodeInfo::named("4").link_id(["author", "4"]), [
//!         Node::string("index.html", "<html></html>"),
//!     ]),
//!     Node::symlink("latest", ["author", "4"]),
//! ]);
//! let fs = MemFs::new();
//! Tree::new(&fs, "/site", &root)?.render()?;
//! // /site/latest -> 4
//! ```
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`node`] | The node variants, their identity (`NodeInfo`), and how each writes itself |
//! | [`tree`] | Wrapping, path and link ID indexing, and the render walk |
//! | [`fs`] | The `Filesystem` capability: on-disk, in-memory, and tracing implementations |
//! | [`path`] | Lexical path cleaning and relative symlink targets |
//! | [`manifest`] | JSON description of a node graph, for the CLI |
//! | [`config`] | `render.toml` loading and validation |
//! | [`dump`] | Read a rendered tree back for inspection and comparison |
//! | [`output`] | CLI output formatting |
//! | [`logging`] | `tracing` subscriber setup |
//!
//! # Design Decisions
//!
//! ## A Closed Set of Node Kinds
//!
//! Nodes are an enum rather than a trait. The set of things that can exist on
//! a filesystem is small and fixed, and a closed enum lets the tree, the CLI
//! listing, and the manifest format all match exhaustively on it. Content that
//! needs computing is computed before the graph is built.
//!
//! ## Symlinks by Link ID, Not by Path
//!
//! A symlink names its target by link ID, and the relative path is only worked
//! out at render time from both nodes' final locations. Moving a directory or
//! switching to alias naming never breaks a link. Forward references are
//! allowed because every ID is indexed before rendering starts.
//!
//! ## Filesystem as a Capability
//!
//! Nothing in the core touches `std::fs`. Rendering into [`MemFs`] makes tests
//! fast and exact, and [`TraceFs`] can wrap any backend to log every call.
//!
//! ## No Rollback
//!
//! A failed render stops at the first error and leaves whatever was already
//! written. Rendering the same tree into two empty targets produces identical
//! results, so recovery means fixing the cause and rendering into a fresh
//! directory. Rendering over a previous output fails on the first existing
//! symlink.

pub mod config;
pub mod dump;
pub mod fs;
pub mod logging;
pub mod manifest;
pub mod node;
pub mod output;
pub mod path;
pub mod tree;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use config::RenderConfig;
pub use fs::{Filesystem, MemFs, OsFs, TraceFs};
pub use node::{Node, NodeError, NodeInfo};
pub use tree::{NodeWrapper, Tree, TreeError, WrapperId, render, render_with};
