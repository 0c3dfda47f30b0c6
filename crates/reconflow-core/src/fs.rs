//! Filesystem capability
//!
//! Stages never call `std::fs` directly. They go through a [`Filesystem`]
//! so orchestration can be exercised against [`MemoryFilesystem`] without
//! touching disk. Higher level operations (idempotent directory creation,
//! recursive copy, extension-filtered copy) are free functions built on the
//! trait primitives so every implementation shares the same semantics.

use std::collections::{BTreeMap, BTreeSet};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;

/// Filesystem errors
#[derive(Debug, Error)]
pub enum FsError {
    #[error("Failed to create directory {path}: {source}")]
    CreateDir { path: PathBuf, source: io::Error },

    #[error("Failed to copy {from} to {to}: {source}")]
    Copy {
        from: PathBuf,
        to: PathBuf,
        source: io::Error,
    },

    #[error("Failed to list directory {path}: {source}")]
    ReadDir { path: PathBuf, source: io::Error },

    #[error("Source directory does not exist: {0}")]
    MissingSource(PathBuf),
}

/// One entry returned by [`Filesystem::read_dir`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub path: PathBuf,
    pub is_dir: bool,
}

/// Minimal filesystem surface the pipeline needs
pub trait Filesystem: Send + Sync {
    /// Create a directory and all missing ancestors
    fn create_dir_all(&self, path: &Path) -> io::Result<()>;

    fn exists(&self, path: &Path) -> bool;

    fn is_dir(&self, path: &Path) -> bool;

    /// Immediate children of a directory, sorted by path
    fn read_dir(&self, path: &Path) -> io::Result<Vec<DirEntry>>;

    /// Copy one regular file; the destination's parent must exist
    fn copy_file(&self, from: &Path, to: &Path) -> io::Result<()>;
}

/// Ensure a directory exists. Succeeds silently if it already does.
pub fn ensure_dir(fs: &dyn Filesystem, path: &Path) -> Result<(), FsError> {
    if fs.is_dir(path) {
        return Ok(());
    }
    fs.create_dir_all(path).map_err(|source| FsError::CreateDir {
        path: path.to_path_buf(),
        source,
    })
}

/// Lowercased extension of a file name, if any
pub fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
}

/// Copy `src` and everything below it into `dst`.
///
/// Returns the number of files copied.
pub fn copy_dir_recursive(fs: &dyn Filesystem, src: &Path, dst: &Path) -> Result<usize, FsError> {
    if !fs.is_dir(src) {
        return Err(FsError::MissingSource(src.to_path_buf()));
    }
    ensure_dir(fs, dst)?;

    let mut copied = 0;
    for entry in list(fs, src)? {
        let Some(name) = entry.path.file_name() else {
            continue;
        };
        let target = dst.join(name);
        if entry.is_dir {
            copied += copy_dir_recursive(fs, &entry.path, &target)?;
        } else {
            copy(fs, &entry.path, &target)?;
            copied += 1;
        }
    }
    Ok(copied)
}

/// Copy the regular files directly inside `src` whose extension is on the
/// allow-list into `dst`. Matching is case-insensitive; anything else is
/// left behind.
///
/// Returns the destination paths of the copied files.
pub fn copy_by_extensions(
    fs: &dyn Filesystem,
    src: &Path,
    dst: &Path,
    allowed: &[&str],
) -> Result<Vec<PathBuf>, FsError> {
    if !fs.is_dir(src) {
        return Err(FsError::MissingSource(src.to_path_buf()));
    }
    ensure_dir(fs, dst)?;

    let mut copied = Vec::new();
    for entry in list(fs, src)? {
        if entry.is_dir {
            continue;
        }
        let allowed_ext = extension_of(&entry.path)
            .is_some_and(|ext| allowed.iter().any(|a| a.eq_ignore_ascii_case(&ext)));
        if !allowed_ext {
            continue;
        }
        let Some(name) = entry.path.file_name() else {
            continue;
        };
        let target = dst.join(name);
        copy(fs, &entry.path, &target)?;
        copied.push(target);
    }
    Ok(copied)
}

fn list(fs: &dyn Filesystem, path: &Path) -> Result<Vec<DirEntry>, FsError> {
    fs.read_dir(path).map_err(|source| FsError::ReadDir {
        path: path.to_path_buf(),
        source,
    })
}

fn copy(fs: &dyn Filesystem, from: &Path, to: &Path) -> Result<(), FsError> {
    fs.copy_file(from, to).map_err(|source| FsError::Copy {
        from: from.to_path_buf(),
        to: to.to_path_buf(),
        source,
    })
}

/// The real disk
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFilesystem;

impl Filesystem for LocalFilesystem {
    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        std::fs::create_dir_all(path)
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn read_dir(&self, path: &Path) -> io::Result<Vec<DirEntry>> {
        let mut entries = Vec::new();
        for entry in std::fs::read_dir(path)? {
            let path = entry?.path();
            let is_dir = path.is_dir();
            entries.push(DirEntry { path, is_dir });
        }
        entries.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(entries)
    }

    fn copy_file(&self, from: &Path, to: &Path) -> io::Result<()> {
        std::fs::copy(from, to).map(|_| ())
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    dirs: BTreeSet<PathBuf>,
    files: BTreeMap<PathBuf, Vec<u8>>,
    read_only: BTreeSet<PathBuf>,
}

impl MemoryState {
    fn is_read_only(&self, path: &Path) -> bool {
        self.read_only.iter().any(|p| path.starts_with(p))
    }

    fn add_dir_chain(&mut self, path: &Path) -> io::Result<()> {
        for ancestor in path.ancestors() {
            if ancestor.as_os_str().is_empty() || self.dirs.contains(ancestor) {
                continue;
            }
            if self.files.contains_key(ancestor) {
                return Err(io::Error::new(
                    io::ErrorKind::AlreadyExists,
                    format!("{} is a file", ancestor.display()),
                ));
            }
            if self.is_read_only(ancestor) {
                return Err(io::Error::new(
                    io::ErrorKind::PermissionDenied,
                    format!("{} is read-only", ancestor.display()),
                ));
            }
        }
        for ancestor in path.ancestors() {
            if !ancestor.as_os_str().is_empty() {
                self.dirs.insert(ancestor.to_path_buf());
            }
        }
        Ok(())
    }
}

/// In-memory filesystem for tests.
///
/// Clones share the same tree, so a test can keep a handle while the
/// pipeline owns another.
#[derive(Debug, Clone, Default)]
pub struct MemoryFilesystem {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryFilesystem {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Write a file, creating its parent directories
    pub fn write(&self, path: impl AsRef<Path>, contents: impl Into<Vec<u8>>) -> io::Result<()> {
        let path = path.as_ref();
        let mut state = self.state();
        if state.dirs.contains(path) {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("{} is a directory", path.display()),
            ));
        }
        if state.is_read_only(path) {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!("{} is read-only", path.display()),
            ));
        }
        if let Some(parent) = path.parent() {
            state.add_dir_chain(parent)?;
        }
        state.files.insert(path.to_path_buf(), contents.into());
        Ok(())
    }

    /// Create an empty file, creating its parent directories
    pub fn touch(&self, path: impl AsRef<Path>) -> io::Result<()> {
        self.write(path, Vec::new())
    }

    /// Contents of a file
    pub fn read(&self, path: impl AsRef<Path>) -> Option<Vec<u8>> {
        self.state().files.get(path.as_ref()).cloned()
    }

    /// Refuse any directory creation or write at or below `path`
    pub fn set_read_only(&self, path: impl Into<PathBuf>) {
        self.state().read_only.insert(path.into());
    }

    /// All directories, sorted
    pub fn dirs(&self) -> Vec<PathBuf> {
        self.state().dirs.iter().cloned().collect()
    }

    /// All files, sorted
    pub fn files(&self) -> Vec<PathBuf> {
        self.state().files.keys().cloned().collect()
    }
}

impl Filesystem for MemoryFilesystem {
    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        self.state().add_dir_chain(path)
    }

    fn exists(&self, path: &Path) -> bool {
        let state = self.state();
        state.dirs.contains(path) || state.files.contains_key(path)
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.state().dirs.contains(path)
    }

    fn read_dir(&self, path: &Path) -> io::Result<Vec<DirEntry>> {
        let state = self.state();
        if !state.dirs.contains(path) {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("{} not found", path.display()),
            ));
        }

        let children = state
            .dirs
            .iter()
            .filter(|d| d.parent() == Some(path))
            .map(|d| DirEntry {
                path: d.clone(),
                is_dir: true,
            })
            .chain(
                state
                    .files
                    .keys()
                    .filter(|f| f.parent() == Some(path))
                    .map(|f| DirEntry {
                        path: f.clone(),
                        is_dir: false,
                    }),
            );

        let mut entries: Vec<DirEntry> = children.collect();
        entries.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(entries)
    }

    fn copy_file(&self, from: &Path, to: &Path) -> io::Result<()> {
        let mut state = self.state();
        let contents = state.files.get(from).cloned().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("{} not found", from.display()),
            )
        })?;
        let parent_exists = to.parent().is_none_or(|p| state.dirs.contains(p));
        if !parent_exists {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("parent of {} not found", to.display()),
            ));
        }
        if state.is_read_only(to) {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!("{} is read-only", to.display()),
            ));
        }
        state.files.insert(to.to_path_buf(), contents);
        Ok(())
    }
}
