//! Filesystem backed by a directory on the host.
//!
//! Every path is interpreted relative to the directory the `OsFs` was created
//! with, so `/` maps to that directory and `..` cannot climb out of it.

use super::{DirEntry, FileType, Filesystem, Metadata};
use crate::path;
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct OsFs {
    root: PathBuf,
}

impl OsFs {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The host directory `/` maps to.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Host path for a path in this filesystem's namespace.
    pub fn host_path(&self, path: &Path) -> PathBuf {
        let clean = path::clean(path);
        match clean.strip_prefix("/") {
            Ok(rel) if !rel.as_os_str().is_empty() => self.root.join(rel),
            _ => self.root.clone(),
        }
    }
}

fn file_type_of(ft: fs::FileType) -> FileType {
    if ft.is_symlink() {
        FileType::Symlink
    } else if ft.is_dir() {
        FileType::Dir
    } else {
        FileType::File
    }
}

#[cfg(unix)]
fn mode_of(meta: &fs::Metadata) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    meta.permissions().mode() & 0o7777
}

#[cfg(not(unix))]
fn mode_of(meta: &fs::Metadata) -> u32 {
    if meta.permissions().readonly() { 0o444 } else { 0o644 }
}

impl Filesystem for OsFs {
    fn mkdir_all(&self, path: &Path, mode: u32) -> io::Result<()> {
        let mut builder = fs::DirBuilder::new();
        builder.recursive(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::DirBuilderExt;
            builder.mode(mode);
        }
        #[cfg(not(unix))]
        let _ = mode;
        builder.create(self.host_path(path))
    }

    fn create(&self, path: &Path) -> io::Result<Box<dyn Write + '_>> {
        let file = fs::File::create(self.host_path(path))?;
        Ok(Box::new(io::BufWriter::new(file)))
    }

    #[cfg(unix)]
    fn set_mode(&self, path: &Path, mode: u32) -> io::Result<()> {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(self.host_path(path), fs::Permissions::from_mode(mode))
    }

    #[cfg(not(unix))]
    fn set_mode(&self, path: &Path, mode: u32) -> io::Result<()> {
        let host = self.host_path(path);
        let mut perms = fs::metadata(&host)?.permissions();
        perms.set_readonly(mode & 0o222 == 0);
        fs::set_permissions(host, perms)
    }

    #[cfg(unix)]
    fn symlink(&self, target: &Path, link: &Path) -> io::Result<()> {
        std::os::unix::fs::symlink(target, self.host_path(link))
    }

    #[cfg(not(unix))]
    fn symlink(&self, _target: &Path, link: &Path) -> io::Result<()> {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            format!("symlinks are not supported here: {}", link.display()),
        ))
    }

    fn stat(&self, path: &Path) -> io::Result<Metadata> {
        let meta = fs::symlink_metadata(self.host_path(path))?;
        let file_type = file_type_of(meta.file_type());
        Ok(Metadata {
            file_type,
            mode: mode_of(&meta),
            len: if file_type == FileType::Dir { 0 } else { meta.len() },
        })
    }

    fn read_link(&self, path: &Path) -> io::Result<PathBuf> {
        fs::read_link(self.host_path(path))
    }

    fn open(&self, path: &Path) -> io::Result<Box<dyn Read + '_>> {
        Ok(Box::new(fs::File::open(self.host_path(path))?))
    }

    fn read_dir(&self, path: &Path) -> io::Result<Vec<DirEntry>> {
        let mut entries = Vec::new();
        for entry in fs::read_dir(self.host_path(path))? {
            let entry = entry?;
            entries.push(DirEntry {
                name: entry.file_name().to_string_lossy().into_owned(),
                file_type: file_type_of(entry.file_type()?),
            });
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }
}
