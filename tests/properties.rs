//! Property tests over generated trees.
//!
//! Trees are generated as shapes (nested directories holding files, JSON
//! documents, symlinks, and empty slots), turned into node graphs where every
//! file carries a link ID and every symlink points at one of those files.

use proptest::prelude::*;
use std::path::{Path, PathBuf};
use treeforge::dump::dump;
use treeforge::fs::{Filesystem, MemFs};
use treeforge::{Node, NodeInfo, Tree, render};

#[derive(Debug, Clone)]
enum Shape {
    File(Vec<u8>),
    Json(i64),
    Link(usize),
    Dir(Vec<Option<Shape>>),
}

fn slots(inner: impl Strategy<Value = Shape>) -> impl Strategy<Value = Vec<Option<Shape>>> {
    prop::collection::vec(prop::option::weighted(0.8, inner), 0..6)
}

fn shape() -> impl Strategy<Value = Shape> {
    let leaf = prop_oneof![
        prop::collection::vec(any::<u8>(), 0..16).prop_map(Shape::File),
        any::<i64>().prop_map(Shape::Json),
        any::<usize>().prop_map(Shape::Link),
    ];
    leaf.prop_recursive(4, 48, 6, |inner| slots(inner).prop_map(Shape::Dir))
}

fn count_files(shape: &Shape) -> usize {
    match shape {
        Shape::File(_) => 1,
        Shape::Dir(children) => children.iter().flatten().map(count_files).sum(),
        Shape::Json(_) | Shape::Link(_) => 0,
    }
}

/// A generated graph plus what it should produce.
struct Generated {
    root: Node,
    /// Tree path and content of every static file, in link ID order.
    files: Vec<(PathBuf, Vec<u8>)>,
    /// Tree path of every symlink and the index of the file it points at.
    links: Vec<(PathBuf, usize)>,
    nodes: usize,
}

struct Builder {
    total_files: usize,
    generated: Generated,
}

impl Builder {
    fn convert(&mut self, shape: &Shape, name: String, path: PathBuf) -> Option<Node> {
        let node = match shape {
            Shape::File(data) => {
                let id = self.generated.files.len();
                self.generated.files.push((path, data.clone()));
                Node::bytes(
                    NodeInfo::named(name).link_id(["file".to_string(), id.to_string()]),
                    data.clone(),
                    0o644,
                )
            }
            Shape::Json(n) => Node::json_value(name, serde_json::json!({ "n": n })),
            Shape::Link(pick) => {
                if self.total_files == 0 {
                    return None;
                }
                let target = pick % self.total_files;
                self.generated.links.push((path, target));
                Node::symlink(name, ["file".to_string(), target.to_string()])
            }
            Shape::Dir(children) => {
                let children = self.convert_children(children, &path);
                Node::dir(name, children)
            }
        };
        self.generated.nodes += 1;
        Some(node)
    }

    fn convert_children(&mut self, children: &[Option<Shape>], parent: &Path) -> Vec<Option<Node>> {
        children
            .iter()
            .enumerate()
            .map(|(i, child)| {
                let child = child.as_ref()?;
                let name = format!("n{i}");
                let path = parent.join(&name);
                self.convert(child, name, path)
            })
            .collect()
    }
}

fn generate(children: &[Option<Shape>]) -> Generated {
    let total_files = children.iter().flatten().map(count_files).sum();
    let mut builder = Builder {
        total_files,
        generated: Generated {
            root: Node::empty_dir(""),
            files: Vec::new(),
            links: Vec::new(),
            nodes: 1,
        },
    };
    let converted = builder.convert_children(children, Path::new("/"));
    builder.generated.root = Node::dir("", converted);
    builder.generated
}

fn under_out(tree_path: &Path) -> PathBuf {
    Path::new("/out").join(tree_path.strip_prefix("/").unwrap_or(tree_path))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn renders_are_identical_across_fresh_targets(children in slots(shape())) {
        let generated = generate(&children);
        let first = MemFs::new();
        let second = MemFs::new();
        render(&first, "/out", Some(&generated.root)).unwrap();
        render(&second, "/out", Some(&generated.root)).unwrap();
        prop_assert_eq!(
            dump(&first, Path::new("/")).unwrap(),
            dump(&second, Path::new("/")).unwrap()
        );
    }

    #[test]
    fn every_node_is_indexed_and_written(children in slots(shape())) {
        let generated = generate(&children);
        let fs = MemFs::new();
        let tree = Tree::new(&fs, "/out", &generated.root).unwrap();
        prop_assert_eq!(tree.len(), generated.nodes);
        prop_assert_eq!(tree.paths().len(), generated.nodes);
        prop_assert_eq!(tree.link_ids().len(), generated.files.len());

        tree.render().unwrap();
        let dumped = dump(&fs, Path::new("/out")).unwrap();
        prop_assert_eq!(dumped.count(), generated.nodes);

        for (path, data) in &generated.files {
            prop_assert_eq!(&fs.read_file(&under_out(path)).unwrap(), data);
        }
    }

    #[test]
    fn symlinks_are_relative_and_reach_their_target(children in slots(shape())) {
        let generated = generate(&children);
        let fs = MemFs::new();
        render(&fs, "/out", Some(&generated.root)).unwrap();

        for (link, target) in &generated.links {
            let host = under_out(link);
            let text = fs.read_link(&host).unwrap();
            prop_assert!(text.is_relative(), "{} -> {}", link.display(), text.display());
            let (_, data) = &generated.files[*target];
            prop_assert_eq!(&fs.read_file(&host).unwrap(), data);
        }
    }
}
