//! The filesystem capability the tree renders through.
//!
//! The core never touches `std::fs` directly. Everything it writes goes
//! through [`Filesystem`], so the same tree can be rendered onto disk
//! ([`OsFs`]), into memory ([`MemFs`]), or through a logging decorator
//! ([`TraceFs`]) without the tree knowing the difference.
//!
//! Paths handed to a `Filesystem` are absolute in the filesystem's own
//! namespace: `/` is whatever root the implementation was created with.
//!
//! | Operation | Used by |
//! |-----------|---------|
//! | `mkdir_all` | directory nodes, the mount point |
//! | `create` + `set_mode` | static and generated content |
//! | `symlink` | symlink nodes |
//! | `stat`, `read_link`, `open`, `read_dir` | [`crate::dump`] and tests |

mod mem;
mod os;
mod trace;

pub use mem::MemFs;
pub use os::OsFs;
pub use trace::TraceFs;

use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

/// The kind of an entry, as seen without following symlinks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileType {
    Dir,
    File,
    Symlink,
}

/// What [`Filesystem::stat`] reports about an entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Metadata {
    pub file_type: FileType,
    /// Permission bits only (`0o7777` mask).
    pub mode: u32,
    /// Byte length for files, target length for symlinks, zero for directories.
    pub len: u64,
}

impl Metadata {
    pub fn is_dir(&self) -> bool {
        self.file_type == FileType::Dir
    }

    pub fn is_file(&self) -> bool {
        self.file_type == FileType::File
    }

    pub fn is_symlink(&self) -> bool {
        self.file_type == FileType::Symlink
    }
}

/// One entry of a directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub name: String,
    pub file_type: FileType,
}

/// Storage backend a tree is rendered onto.
pub trait Filesystem {
    /// Create a directory and any missing parents. Succeeds if `path` is
    /// already a directory.
    fn mkdir_all(&self, path: &Path, mode: u32) -> io::Result<()>;

    /// Create or truncate a file. The parent directory must already exist.
    fn create(&self, path: &Path) -> io::Result<Box<dyn Write + '_>>;

    /// Replace the permission bits of an existing entry.
    fn set_mode(&self, path: &Path, mode: u32) -> io::Result<()>;

    /// Create a symlink at `link` whose literal target text is `target`.
    fn symlink(&self, target: &Path, link: &Path) -> io::Result<()>;

    /// Describe an entry without following a final symlink.
    fn stat(&self, path: &Path) -> io::Result<Metadata>;

    /// Literal target text of a symlink.
    fn read_link(&self, path: &Path) -> io::Result<PathBuf>;

    /// Open a file for reading, following symlinks.
    fn open(&self, path: &Path) -> io::Result<Box<dyn Read + '_>>;

    /// List a directory, sorted by name.
    fn read_dir(&self, path: &Path) -> io::Result<Vec<DirEntry>>;

    /// Write `data` to `path` in one go and apply `mode`.
    fn write_file(&self, path: &Path, data: &[u8], mode: u32) -> io::Result<()> {
        let mut file = self.create(path)?;
        file.write_all(data)?;
        file.flush()?;
        drop(file);
        self.set_mode(path, mode)
    }

    /// Read a whole file into memory.
    fn read_file(&self, path: &Path) -> io::Result<Vec<u8>> {
        let mut data = Vec::new();
        self.open(path)?.read_to_end(&mut data)?;
        Ok(data)
    }
}

impl<F: Filesystem + ?Sized> Filesystem for &F {
    fn mkdir_all(&self, path: &Path, mode: u32) -> io::Result<()> {
        (**self).mkdir_all(path, mode)
    }

    fn create(&self, path: &Path) -> io::Result<Box<dyn Write + '_>> {
        (**self).create(path)
    }

    fn set_mode(&self, path: &Path, mode: u32) -> io::Result<()> {
        (**self).set_mode(path, mode)
    }

    fn symlink(&self, target: &Path, link: &Path) -> io::Result<()> {
        (**self).symlink(target, link)
    }

    fn stat(&self, path: &Path) -> io::Result<Metadata> {
        (**self).stat(path)
    }

    fn read_link(&self, path: &Path) -> io::Result<PathBuf> {
        (**self).read_link(path)
    }

    fn open(&self, path: &Path) -> io::Result<Box<dyn Read + '_>> {
        (**self).open(path)
    }

    fn read_dir(&self, path: &Path) -> io::Result<Vec<DirEntry>> {
        (**self).read_dir(path)
    }
}
