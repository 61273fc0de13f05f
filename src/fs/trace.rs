//! A decorator that logs every filesystem call.
//!
//! Successful calls are logged at `debug`, failed ones at `warn`, all under the
//! `treeforge::fs` target. File handles returned by `create` and `open` get a
//! sequential descriptor number so reads and writes can be matched to the call
//! that opened them. Expect noisy output; this is meant for diagnosing a
//! render, not for routine runs.

use super::{DirEntry, Filesystem, Metadata};
use std::fmt::Debug;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, warn};

pub struct TraceFs<F> {
    inner: F,
    next_fd: AtomicU64,
}

impl<F: Filesystem> TraceFs<F> {
    pub fn new(inner: F) -> Self {
        Self {
            inner,
            next_fd: AtomicU64::new(0),
        }
    }

    pub fn inner(&self) -> &F {
        &self.inner
    }

    fn next_fd(&self) -> u64 {
        self.next_fd.fetch_add(1, Ordering::Relaxed) + 1
    }
}

fn log<T: Debug>(call: &str, result: &io::Result<T>) {
    match result {
        Ok(value) => debug!(target: "treeforge::fs", result = ?value, "{call}"),
        Err(err) => warn!(target: "treeforge::fs", error = %err, "{call}"),
    }
}

fn log_unit(call: &str, result: &io::Result<()>) {
    match result {
        Ok(()) => debug!(target: "treeforge::fs", "{call}"),
        Err(err) => warn!(target: "treeforge::fs", error = %err, "{call}"),
    }
}

struct TraceFile<W> {
    fd: u64,
    inner: W,
}

impl<W: Write> Write for TraceFile<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let result = self.inner.write(buf);
        log(&format!("fd{} write([{}]u8)", self.fd, buf.len()), &result);
        result
    }

    fn flush(&mut self) -> io::Result<()> {
        let result = self.inner.flush();
        log_unit(&format!("fd{} flush()", self.fd), &result);
        result
    }
}

impl<R: Read> Read for TraceFile<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let result = self.inner.read(buf);
        log(&format!("fd{} read([{}]u8)", self.fd, buf.len()), &result);
        result
    }
}

impl<W> Drop for TraceFile<W> {
    fn drop(&mut self) {
        debug!(target: "treeforge::fs", "fd{} close()", self.fd);
    }
}

impl<F: Filesystem> Filesystem for TraceFs<F> {
    fn mkdir_all(&self, path: &Path, mode: u32) -> io::Result<()> {
        let result = self.inner.mkdir_all(path, mode);
        log_unit(&format!("mkdir_all({:?}, {:#o})", path, mode), &result);
        result
    }

    fn create(&self, path: &Path) -> io::Result<Box<dyn Write + '_>> {
        let fd = self.next_fd();
        match self.inner.create(path) {
            Ok(file) => {
                debug!(target: "treeforge::fs", "create({:?}) fd{}", path, fd);
                Ok(Box::new(TraceFile { fd, inner: file }))
            }
            Err(err) => {
                warn!(target: "treeforge::fs", error = %err, "create({:?})", path);
                Err(err)
            }
        }
    }

    fn set_mode(&self, path: &Path, mode: u32) -> io::Result<()> {
        let result = self.inner.set_mode(path, mode);
        log_unit(&format!("set_mode({:?}, {:#o})", path, mode), &result);
        result
    }

    fn symlink(&self, target: &Path, link: &Path) -> io::Result<()> {
        let result = self.inner.symlink(target, link);
        log_unit(&format!("symlink({:?}, {:?})", target, link), &result);
        result
    }

    fn stat(&self, path: &Path) -> io::Result<Metadata> {
        let result = self.inner.stat(path);
        log(&format!("stat({:?})", path), &result);
        result
    }

    fn read_link(&self, path: &Path) -> io::Result<PathBuf> {
        let result = self.inner.read_link(path);
        log(&format!("read_link({:?})", path), &result);
        result
    }

    fn open(&self, path: &Path) -> io::Result<Box<dyn Read + '_>> {
        let fd = self.next_fd();
        match self.inner.open(path) {
            Ok(file) => {
                debug!(target: "treeforge::fs", "open({:?}) fd{}", path, fd);
                Ok(Box::new(TraceFile { fd, inner: file }))
            }
            Err(err) => {
                warn!(target: "treeforge::fs", error = %err, "open({:?})", path);
                Err(err)
            }
        }
    }

    fn read_dir(&self, path: &Path) -> io::Result<Vec<DirEntry>> {
        let result = self.inner.read_dir(path);
        log(&format!("read_dir({:?})", path), &result);
        result
    }
}
