//! Filesystem probe port used by the layout strategies.

use std::fs;
use std::path::{Path, PathBuf};

/// Minimal view of the filesystem needed to discover the backend.
///
/// Injected into [`ExecutableLocator`](super::ExecutableLocator) so that the
/// layout strategies can be tested without touching disk.
pub trait FileProbe: Send + Sync {
    /// Whether `path` exists and is a regular file.
    fn is_file(&self, path: &Path) -> bool;

    /// Directories directly under `dir`, in a stable order.
    ///
    /// Returns an empty list when `dir` is missing or unreadable.
    fn child_dirs(&self, dir: &Path) -> Vec<PathBuf>;
}

/// [`FileProbe`] backed by the real filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsFileProbe;

impl FileProbe for OsFileProbe {
    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn child_dirs(&self, dir: &Path) -> Vec<PathBuf> {
        let Ok(read_dir) = fs::read_dir(dir) else {
            return Vec::new();
        };

        // read_dir order is platform-defined; sort so discovery is deterministic
        let mut dirs: Vec<PathBuf> = read_dir
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| path.is_dir())
            .collect();
        dirs.sort();
        dirs
    }
}
