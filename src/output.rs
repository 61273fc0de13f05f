//! CLI output formatting.
//!
//! # Information-First Display
//!
//! The tree listing shows what the render will produce, node by node, in the
//! order it will be written. Each line leads with the node's positional index
//! among its parent's child slots, so skipped slots show up as gaps in the
//! numbering. Link IDs are shown next to the node that carries them and
//! symlinks show the ID they point at, which makes dedup structure readable
//! without looking at the disk.
//!
//! # Output Format
//!
//! ## Check / Build
//!
//! ```text
//! /
//!     001 authors/
//!         001 4/ [author:4]
//!             001 index.html
//!     003 latest → author:4
//!
//! 5 nodes: 3 dirs, 1 file, 1 symlink; 1 link ID
//! ```
//!
//! ## Ls
//!
//! ```text
//! drwxr-xr-x /
//!     drwxr-xr-x authors/
//!         -rw-r--r-- index.html (12 bytes)
//!     lrwxrwxrwx latest → authors/4
//! ```
//!
//! # Architecture
//!
//! Each listing has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format functions
//! are pure: no I/O, no side effects.

use crate::dump::DumpNode;
use crate::fs::FileType;
use crate::node::Node;
use crate::tree::{NodeWrapper, Tree};
use std::path::Path;

// ============================================================================
// Shared helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// `1 file`, `2 files`.
fn plural(n: usize, singular: &str, plural: &str) -> String {
    if n == 1 {
        format!("{n} {singular}")
    } else {
        format!("{n} {plural}")
    }
}

/// Render permission bits the way `ls -l` does, e.g. `drwxr-xr-x`.
fn mode_string(kind: FileType, mode: u32) -> String {
    let mut s = String::with_capacity(10);
    s.push(match kind {
        FileType::Dir => 'd',
        FileType::File => '-',
        FileType::Symlink => 'l',
    });
    for shift in [6, 3, 0] {
        let bits = (mode >> shift) & 0o7;
        s.push(if bits & 0o4 != 0 { 'r' } else { '-' });
        s.push(if bits & 0o2 != 0 { 'w' } else { '-' });
        s.push(if bits & 0o1 != 0 { 'x' } else { '-' });
    }
    s
}

/// Name plus a kind marker: `/` after directories, `→ target` after symlinks.
fn node_label(wrapper: &NodeWrapper<'_>) -> String {
    let mut label = wrapper.filename.clone();
    match wrapper.node() {
        Node::Dir(_) => label.push('/'),
        Node::Symlink(link) => label = format!("{label} → {}", link.target),
        Node::Static(_) | Node::Json(_) => {}
    }
    let link_id = wrapper.link_id();
    if !link_id.is_empty() {
        label = format!("{label} [{link_id}]");
    }
    label
}

// ============================================================================
// Tree listing (check, build)
// ============================================================================

/// Format the indexed tree, one line per node, in render order.
pub fn format_tree(tree: &Tree<'_>) -> Vec<String> {
    let mut lines = Vec::new();
    match tree.root() {
        None => lines.push("(empty tree)".to_string()),
        Some(root) => {
            let head = if root.filename.is_empty() {
                "/".to_string()
            } else {
                node_label(root)
            };
            lines.push(head);
            format_children(tree, root, 1, &mut lines);
        }
    }
    lines
}

fn format_children(tree: &Tree<'_>, parent: &NodeWrapper<'_>, depth: usize, lines: &mut Vec<String>) {
    for (i, slot) in parent.children.iter().enumerate() {
        let Some(id) = slot else {
            continue;
        };
        let child = tree.get(*id);
        lines.push(format!(
            "{}{} {}",
            indent(depth),
            format_index(i + 1),
            node_label(child)
        ));
        format_children(tree, child, depth + 1, lines);
    }
}

/// One-line count of what the tree holds.
///
/// ```text
/// 5 nodes: 3 dirs, 1 file, 1 symlink; 1 link ID
/// ```
pub fn format_counts(tree: &Tree<'_>) -> String {
    let (mut dirs, mut files, mut json, mut links) = (0, 0, 0, 0);
    for wrapper in tree.iter() {
        match wrapper.node() {
            Node::Dir(_) => dirs += 1,
            Node::Static(_) => files += 1,
            Node::Json(_) => json += 1,
            Node::Symlink(_) => links += 1,
        }
    }

    let mut kinds = Vec::new();
    if dirs > 0 {
        kinds.push(plural(dirs, "dir", "dirs"));
    }
    if files > 0 {
        kinds.push(plural(files, "file", "files"));
    }
    if json > 0 {
        kinds.push(plural(json, "JSON file", "JSON files"));
    }
    if links > 0 {
        kinds.push(plural(links, "symlink", "symlinks"));
    }

    let mut line = plural(tree.len(), "node", "nodes");
    if !kinds.is_empty() {
        line = format!("{line}: {}", kinds.join(", "));
    }
    format!(
        "{line}; {}",
        plural(tree.link_ids().len(), "link ID", "link IDs")
    )
}

pub fn print_tree(tree: &Tree<'_>) {
    for line in format_tree(tree) {
        println!("{}", line);
    }
    println!();
    println!("{}", format_counts(tree));
}

/// Format the closing line of a build.
pub fn format_render_summary(tree: &Tree<'_>, output: &Path) -> String {
    format!("Rendered {} → {}", format_counts(tree), output.display())
}

// ============================================================================
// Directory listing (ls)
// ============================================================================

/// Format a dumped directory, one line per entry.
pub fn format_dump(root: &DumpNode) -> Vec<String> {
    let mut lines = Vec::new();
    format_dump_entry(root, 0, &mut lines);
    lines
}

fn format_dump_entry(node: &DumpNode, depth: usize, lines: &mut Vec<String>) {
    let mode = mode_string(node.kind, node.mode);
    let line = match node.kind {
        FileType::Dir if node.name == "/" => format!("{mode} /"),
        FileType::Dir => format!("{mode} {}/", node.name),
        FileType::File => format!(
            "{mode} {} ({})",
            node.name,
            plural(node.data.len(), "byte", "bytes")
        ),
        FileType::Symlink => match &node.target {
            Some(target) => format!("{mode} {} → {}", node.name, target.display()),
            None => format!("{mode} {}", node.name),
        },
    };
    lines.push(format!("{}{}", indent(depth), line));
    for child in &node.children {
        format_dump_entry(child, depth + 1, lines);
    }
}

pub fn print_dump(root: &DumpNode) {
    for line in format_dump(root) {
        println!("{}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::MemFs;
    use crate::node::NodeInfo;

    // =========================================================================
    // Helper tests
    // =========================================================================

    #[test]
    fn format_index_single_digit() {
        assert_eq!(format_index(1), "001");
    }

    #[test]
    fn format_index_triple_digit() {
        assert_eq!(format_index(123), "123");
    }

    #[test]
    fn indent_two() {
        assert_eq!(indent(2), "        ");
    }

    #[test]
    fn mode_string_variants() {
        assert_eq!(mode_string(FileType::Dir, 0o755), "drwxr-xr-x");
        assert_eq!(mode_string(FileType::File, 0o640), "-rw-r-----");
        assert_eq!(mode_string(FileType::Symlink, 0o777), "lrwxrwxrwx");
    }

    #[test]
    fn plural_forms() {
        assert_eq!(plural(1, "node", "nodes"), "1 node");
        assert_eq!(plural(0, "node", "nodes"), "0 nodes");
    }

    // =========================================================================
    // Tree listing tests
    // =========================================================================

    fn library() -> Node {
        Node::dir(
            "",
            [
                Some(Node::dir(
                    "authors",
                    [Node::dir(
                        NodeInfo::named("4").link_id(["author", "4"]),
                        [Node::string("index.html", "<html></html>")],
                    )],
                )),
                None,
                Some(Node::symlink("latest", ["author", "4"])),
            ],
        )
    }

    #[test]
    fn format_tree_shows_structure() {
        let fs = MemFs::new();
        let root = library();
        let tree = Tree::new(&fs, "/", &root).unwrap();
        assert_eq!(
            format_tree(&tree),
            vec![
                "/",
                "    001 authors/",
                "        001 4/ [author:4]",
                "            001 index.html",
                "    003 latest → author:4",
            ]
        );
    }

    #[test]
    fn format_tree_empty() {
        let fs = MemFs::new();
        let tree = Tree::new(&fs, "/", None).unwrap();
        assert_eq!(format_tree(&tree), vec!["(empty tree)"]);
    }

    #[test]
    fn format_tree_named_root() {
        let fs = MemFs::new();
        let root = Node::string("a.txt", "");
        let tree = Tree::new(&fs, "/", &root).unwrap();
        assert_eq!(format_tree(&tree), vec!["a.txt"]);
    }

    #[test]
    fn format_counts_by_kind() {
        let fs = MemFs::new();
        let root = library();
        let tree = Tree::new(&fs, "/", &root).unwrap();
        assert_eq!(
            format_counts(&tree),
            "5 nodes: 3 dirs, 1 file, 1 symlink; 1 link ID"
        );
    }

    #[test]
    fn format_render_summary_names_output() {
        let fs = MemFs::new();
        let root = Node::json_value("a.json", serde_json::json!({}));
        let tree = Tree::new(&fs, "/", &root).unwrap();
        assert_eq!(
            format_render_summary(&tree, Path::new("dist")),
            "Rendered 1 node: 1 JSON file; 0 link IDs → dist"
        );
    }

    // =========================================================================
    // Directory listing tests
    // =========================================================================

    #[test]
    fn format_dump_lists_entries() {
        let root = DumpNode::dir(
            "/",
            0o755,
            vec![
                DumpNode::dir(
                    "authors",
                    0o755,
                    vec![DumpNode::file("index.html", 0o644, "<html></html>")],
                ),
                DumpNode::symlink("latest", "authors"),
            ],
        );
        assert_eq!(
            format_dump(&root),
            vec![
                "drwxr-xr-x /",
                "    drwxr-xr-x authors/",
                "        -rw-r--r-- index.html (13 bytes)",
                "    lrwxrwxrwx latest → authors",
            ]
        );
    }
}
