//! Read a rendered tree back into memory.
//!
//! [`dump`] walks a [`Filesystem`] from a starting path and returns a
//! [`DumpNode`] tree with children sorted by name. Two dumps compare equal
//! exactly when the two directory structures are identical (names, kinds,
//! modes, file bytes, and symlink targets), which makes it the workhorse for
//! render assertions and for the `ls` command.

use crate::fs::{FileType, Filesystem};
use std::io;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DumpNode {
    pub name: String,
    pub kind: FileType,
    pub mode: u32,
    /// File contents; empty for directories and symlinks.
    pub data: Vec<u8>,
    /// Literal target text, for symlinks.
    pub target: Option<PathBuf>,
    pub children: Vec<DumpNode>,
}

impl DumpNode {
    pub fn dir(name: impl Into<String>, mode: u32, children: Vec<DumpNode>) -> Self {
        Self {
            name: name.into(),
            kind: FileType::Dir,
            mode,
            data: Vec::new(),
            target: None,
            children,
        }
    }

    pub fn file(name: impl Into<String>, mode: u32, data: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            kind: FileType::File,
            mode,
            data: data.into(),
            target: None,
            children: Vec::new(),
        }
    }

    pub fn symlink(name: impl Into<String>, target: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            kind: FileType::Symlink,
            mode: 0o777,
            data: Vec::new(),
            target: Some(target.into()),
            children: Vec::new(),
        }
    }

    /// Find a descendant by `/`-separated relative path.
    pub fn find(&self, rel: &str) -> Option<&DumpNode> {
        rel.split('/')
            .filter(|part| !part.is_empty())
            .try_fold(self, |node, part| {
                node.children.iter().find(|child| child.name == part)
            })
    }

    /// Total number of entries, this one included.
    pub fn count(&self) -> usize {
        1 + self.children.iter().map(DumpNode::count).sum::<usize>()
    }
}

/// Dump everything at and below `path`.
pub fn dump(fs: &dyn Filesystem, path: &Path) -> io::Result<DumpNode> {
    let meta = fs.stat(path).map_err(|e| annotate("stat", path, e))?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "/".to_string());

    let mut node = DumpNode {
        name,
        kind: meta.file_type,
        mode: meta.mode,
        data: Vec::new(),
        target: None,
        children: Vec::new(),
    };

    match meta.file_type {
        FileType::Dir => {
            let entries = fs.read_dir(path).map_err(|e| annotate("read_dir", path, e))?;
            for entry in entries {
                node.children.push(dump(fs, &path.join(&entry.name))?);
            }
            node.children.sort_by(|a, b| a.name.cmp(&b.name));
        }
        FileType::File => {
            node.data = fs.read_file(path).map_err(|e| annotate("read", path, e))?;
        }
        FileType::Symlink => {
            node.target = Some(fs.read_link(path).map_err(|e| annotate("read_link", path, e))?);
        }
    }

    Ok(node)
}

fn annotate(op: &str, path: &Path, err: io::Error) -> io::Error {
    io::Error::new(err.kind(), format!("{op}: {}: {err}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::MemFs;

    #[test]
    fn dumps_nested_structure_sorted() {
        let fs = MemFs::new();
        fs.mkdir_all(Path::new("/a/b"), 0o755).unwrap();
        fs.write_file(Path::new("/a/b/file1.txt"), b"test 1", 0o644).unwrap();
        fs.write_file(Path::new("/a/b/file2.txt"), b"test 2", 0o644).unwrap();
        fs.mkdir_all(Path::new("/a/c"), 0o755).unwrap();
        fs.write_file(Path::new("/a/c/file3.txt"), b"test 3", 0o644).unwrap();
        fs.mkdir_all(Path::new("/a/b/d"), 0o755).unwrap();
        fs.write_file(Path::new("/a/b/d/file4.txt"), b"test 4", 0o644).unwrap();
        fs.mkdir_all(Path::new("/a/e"), 0o755).unwrap();

        assert_eq!(
            dump(&fs, Path::new("/")).unwrap(),
            DumpNode::dir(
                "/",
                0o755,
                vec![DumpNode::dir(
                    "a",
                    0o755,
                    vec![
                        DumpNode::dir(
                            "b",
                            0o755,
                            vec![
                                DumpNode::dir(
                                    "d",
                                    0o755,
                                    vec![DumpNode::file("file4.txt", 0o644, "test 4")]
                                ),
                                DumpNode::file("file1.txt", 0o644, "test 1"),
                                DumpNode::file("file2.txt", 0o644, "test 2"),
                            ]
                        ),
                        DumpNode::dir(
                            "c",
                            0o755,
                            vec![DumpNode::file("file3.txt", 0o644, "test 3")]
                        ),
                        DumpNode::dir("e", 0o755, vec![]),
                    ]
                )]
            )
        );
    }

    #[test]
    fn symlinks_are_not_followed() {
        let fs = MemFs::new();
        fs.write_file(Path::new("/a.txt"), b"abc", 0o644).unwrap();
        fs.symlink(Path::new("a.txt"), Path::new("/b.txt")).unwrap();

        let root = dump(&fs, Path::new("/")).unwrap();
        assert_eq!(root.find("b.txt"), Some(&DumpNode::symlink("b.txt", "a.txt")));
    }

    #[test]
    fn find_and_count() {
        let tree = DumpNode::dir(
            "/",
            0o755,
            vec![DumpNode::dir(
                "sub",
                0o755,
                vec![DumpNode::file("x", 0o644, "")],
            )],
        );
        assert_eq!(tree.find("sub/x").map(|n| n.name.as_str()), Some("x"));
        assert!(tree.find("sub/missing").is_none());
        assert_eq!(tree.find(""), Some(&tree));
        assert_eq!(tree.count(), 3);
    }

    #[test]
    fn missing_path_names_the_operation() {
        let fs = MemFs::new();
        let err = dump(&fs, Path::new("/nope")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
        assert!(err.to_string().starts_with("stat: /nope"));
    }
}
