//! In-memory filesystem.
//!
//! Behaves like a strict POSIX directory tree: files and symlinks can only be
//! created inside a directory that already exists. Rendering a child before
//! its parent directory therefore fails here exactly as it would on disk.
//!
//! Symlinks are followed wherever a path passes through them, so reading or
//! writing inside a linked directory reaches its target, as on disk.

use super::{DirEntry, FileType, Filesystem, Metadata};
use crate::path;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::ffi::OsString;
use std::io::{self, Cursor, Read, Write};
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

/// Mode given to files on creation, before any `set_mode`.
const CREATE_MODE: u32 = 0o666;
/// Symlink chains longer than this are treated as loops.
const MAX_LINK_DEPTH: usize = 40;

#[derive(Debug, Clone)]
enum Entry {
    Dir { mode: u32 },
    File { mode: u32, data: Arc<Mutex<Vec<u8>>> },
    Symlink { target: PathBuf },
}

impl Entry {
    fn file_type(&self) -> FileType {
        match self {
            Entry::Dir { .. } => FileType::Dir,
            Entry::File { .. } => FileType::File,
            Entry::Symlink { .. } => FileType::Symlink,
        }
    }
}

/// A filesystem held entirely in memory. The root directory always exists.
#[derive(Debug)]
pub struct MemFs {
    entries: Mutex<BTreeMap<PathBuf, Entry>>,
}

impl Default for MemFs {
    fn default() -> Self {
        Self::new()
    }
}

impl MemFs {
    pub fn new() -> Self {
        let mut entries = BTreeMap::new();
        entries.insert(PathBuf::from("/"), Entry::Dir { mode: 0o755 });
        Self {
            entries: Mutex::new(entries),
        }
    }

    /// Number of entries, the root directory included.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        // The root is always present.
        false
    }

    /// Canonical location of `path`, with every symlink along it followed.
    ///
    /// The last component is followed only when `follow_last` is set, and may
    /// be missing; every earlier component must be an existing directory.
    /// With `create` set, missing directories are made on the way instead.
    fn resolve(
        entries: &mut BTreeMap<PathBuf, Entry>,
        path: &Path,
        follow_last: bool,
        create: Option<u32>,
    ) -> io::Result<PathBuf> {
        let path = path::clean(path);
        // Keys never pass through a symlink, so a direct hit is already
        // canonical, and so is a missing entry inside a known directory.
        match entries
            .get(&path)
            .map(|entry| matches!(entry, Entry::Symlink { .. }))
        {
            Some(true) if follow_last => {}
            Some(_) => return Ok(path),
            None => {
                let parent = path.parent().unwrap_or(Path::new("/"));
                if matches!(entries.get(parent), Some(Entry::Dir { .. })) {
                    if let Some(mode) = create {
                        entries.insert(path.clone(), Entry::Dir { mode });
                    }
                    return Ok(path);
                }
            }
        }

        let mut current = PathBuf::from("/");
        let mut pending = components(&path);
        let mut links = 0;
        while let Some(name) = pending.pop() {
            let next = current.join(&name);
            let last = pending.is_empty();
            match entries.get(&next).cloned() {
                Some(Entry::Dir { .. }) => current = next,
                Some(Entry::File { .. }) if last => current = next,
                Some(Entry::File { .. }) => {
                    return Err(io::Error::new(
                        io::ErrorKind::NotADirectory,
                        format!("not a directory: {}", next.display()),
                    ));
                }
                Some(Entry::Symlink { target }) if follow_last || !last => {
                    links += 1;
                    if links > MAX_LINK_DEPTH {
                        return Err(io::Error::other(format!(
                            "too many levels of symbolic links: {}",
                            path.display()
                        )));
                    }
                    pending.extend(components(&path::clean(&current.join(target))));
                    current = PathBuf::from("/");
                }
                Some(Entry::Symlink { .. }) => current = next,
                None => match create {
                    Some(mode) => {
                        entries.insert(next.clone(), Entry::Dir { mode });
                        current = next;
                    }
                    None if last => current = next,
                    None => return Err(not_found(&next)),
                },
            }
        }
        Ok(current)
    }
}

/// Normal components of a clean path, last first, ready to pop.
fn components(path: &Path) -> Vec<OsString> {
    path.components()
        .rev()
        .filter_map(|component| match component {
            Component::Normal(name) => Some(name.to_os_string()),
            _ => None,
        })
        .collect()
}

fn not_found(path: &Path) -> io::Error {
    io::Error::new(
        io::ErrorKind::NotFound,
        format!("no such file or directory: {}", path.display()),
    )
}

struct MemFile {
    data: Arc<Mutex<Vec<u8>>>,
}

impl Write for MemFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.data.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Filesystem for MemFs {
    fn mkdir_all(&self, path: &Path, mode: u32) -> io::Result<()> {
        let mut entries = self.entries.lock();
        let dir = Self::resolve(&mut entries, path, true, Some(mode))?;
        match entries.get(&dir) {
            Some(Entry::Dir { .. }) => Ok(()),
            _ => Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("exists and is not a directory: {}", dir.display()),
            )),
        }
    }

    fn create(&self, path: &Path) -> io::Result<Box<dyn Write + '_>> {
        let mut entries = self.entries.lock();
        let path = Self::resolve(&mut entries, path, true, None)?;
        let existing = match entries.get(&path) {
            Some(Entry::Dir { .. }) => {
                return Err(io::Error::new(
                    io::ErrorKind::IsADirectory,
                    format!("is a directory: {}", path.display()),
                ));
            }
            Some(Entry::File { data, .. }) => Some(Arc::clone(data)),
            Some(Entry::Symlink { .. }) => return Err(not_found(&path)),
            None => None,
        };
        let data = match existing {
            Some(data) => {
                data.lock().clear();
                data
            }
            None => {
                let data = Arc::new(Mutex::new(Vec::new()));
                entries.insert(
                    path,
                    Entry::File {
                        mode: CREATE_MODE,
                        data: Arc::clone(&data),
                    },
                );
                data
            }
        };
        Ok(Box::new(MemFile { data }))
    }

    fn set_mode(&self, path: &Path, new_mode: u32) -> io::Result<()> {
        let mut entries = self.entries.lock();
        let path = Self::resolve(&mut entries, path, true, None)?;
        match entries.get_mut(&path) {
            Some(Entry::Dir { mode }) | Some(Entry::File { mode, .. }) => {
                *mode = new_mode & 0o7777;
                Ok(())
            }
            Some(Entry::Symlink { .. }) => Ok(()),
            None => Err(not_found(&path)),
        }
    }

    fn symlink(&self, target: &Path, link: &Path) -> io::Result<()> {
        let mut entries = self.entries.lock();
        let link = Self::resolve(&mut entries, link, false, None)?;
        if entries.contains_key(&link) {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("file exists: {}", link.display()),
            ));
        }
        entries.insert(
            link,
            Entry::Symlink {
                target: target.to_path_buf(),
            },
        );
        Ok(())
    }

    fn stat(&self, path: &Path) -> io::Result<Metadata> {
        let mut entries = self.entries.lock();
        let path = Self::resolve(&mut entries, path, false, None)?;
        let entry = entries.get(&path).ok_or_else(|| not_found(&path))?;
        let (mode, len) = match entry {
            Entry::Dir { mode } => (*mode, 0),
            Entry::File { mode, data } => (*mode, data.lock().len() as u64),
            Entry::Symlink { target } => (0o777, target.as_os_str().len() as u64),
        };
        Ok(Metadata {
            file_type: entry.file_type(),
            mode,
            len,
        })
    }

    fn read_link(&self, path: &Path) -> io::Result<PathBuf> {
        let mut entries = self.entries.lock();
        let path = Self::resolve(&mut entries, path, false, None)?;
        match entries.get(&path) {
            Some(Entry::Symlink { target }) => Ok(target.clone()),
            Some(_) => Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("not a symlink: {}", path.display()),
            )),
            None => Err(not_found(&path)),
        }
    }

    fn open(&self, path: &Path) -> io::Result<Box<dyn Read + '_>> {
        let mut entries = self.entries.lock();
        let resolved = Self::resolve(&mut entries, path, true, None)?;
        match entries.get(&resolved) {
            Some(Entry::File { data, .. }) => {
                let snapshot = data.lock().clone();
                Ok(Box::new(Cursor::new(snapshot)))
            }
            None => Err(not_found(&resolved)),
            _ => Err(io::Error::new(
                io::ErrorKind::IsADirectory,
                format!("is a directory: {}", resolved.display()),
            )),
        }
    }

    fn read_dir(&self, path: &Path) -> io::Result<Vec<DirEntry>> {
        let mut entries = self.entries.lock();
        let dir = Self::resolve(&mut entries, path, true, None)?;
        match entries.get(&dir) {
            Some(Entry::Dir { .. }) => {}
            Some(_) => {
                return Err(io::Error::new(
                    io::ErrorKind::NotADirectory,
                    format!("not a directory: {}", dir.display()),
                ));
            }
            None => return Err(not_found(&dir)),
        }
        Ok(entries
            .iter()
            .filter(|(p, _)| p.parent() == Some(dir.as_path()))
            .filter_map(|(p, e)| {
                let name = p.file_name()?.to_string_lossy().into_owned();
                Some(DirEntry {
                    name,
                    file_type: e.file_type(),
                })
            })
            .collect())
    }
}
