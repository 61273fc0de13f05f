//! Lexical path helpers for the tree namespace.
//!
//! Tree paths are absolute and rooted at `/`. They describe where a node will
//! land relative to the mount point, never a location on the host, so they are
//! cleaned lexically instead of being canonicalized against the disk.

use std::path::{Component, Path, PathBuf};

/// Join a node filename onto its parent's tree path.
///
/// A leading `/` on `name` does not reset the result to the root; the name is
/// always taken relative to `base`.
pub fn clean_join(base: &Path, name: &str) -> PathBuf {
    clean(&base.join(name.trim_start_matches('/')))
}

/// Whether `path` is already in the form [`clean`] produces.
fn is_clean(path: &Path) -> bool {
    let bytes = path.as_os_str().as_encoded_bytes();
    match bytes {
        [b'/'] => true,
        [b'/', rest @ ..] => rest
            .split(|b| *b == b'/')
            .all(|part| !part.is_empty() && part != b"." && part != b".."),
        _ => false,
    }
}

/// Normalize a path lexically into absolute form.
///
/// - `.` components are dropped
/// - `..` removes the preceding component and stops at the root
/// - trailing separators disappear
pub fn clean(path: &Path) -> PathBuf {
    if is_clean(path) {
        return path.to_path_buf();
    }
    let mut out = PathBuf::from("/");
    for component in path.components() {
        match component {
            Component::RootDir | Component::CurDir | Component::Prefix(_) => {}
            Component::ParentDir => {
                out.pop();
            }
            Component::Normal(part) => out.push(part),
        }
    }
    out
}

/// Place a tree path underneath a mount point.
pub fn under(mount: &Path, tree_path: &Path) -> PathBuf {
    clean(&mount.join(tree_path.strip_prefix("/").unwrap_or(tree_path)))
}

/// Relative path from the directory `from_dir` to `to`.
///
/// Both arguments are tree paths. Linking a node to its own parent directory
/// yields `.` rather than an empty target.
pub fn relative(from_dir: &Path, to: &Path) -> Option<PathBuf> {
    let rel = pathdiff::diff_paths(to, from_dir)?;
    if rel.as_os_str().is_empty() {
        Some(PathBuf::from("."))
    } else {
        Some(rel)
    }
}
