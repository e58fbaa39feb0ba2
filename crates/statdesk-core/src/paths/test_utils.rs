//! In-memory [`FileProbe`] for layout and locator tests.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use super::probe::FileProbe;

/// Fake filesystem: a set of files plus explicit directory listings.
#[derive(Debug, Default)]
pub struct FakeProbe {
    files: HashSet<PathBuf>,
    dirs: HashMap<PathBuf, Vec<PathBuf>>,
}

impl FakeProbe {
    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.files.insert(path.into());
        self
    }

    pub fn with_dirs(mut self, parent: impl Into<PathBuf>, children: &[&str]) -> Self {
        self.dirs
            .insert(parent.into(), children.iter().map(PathBuf::from).collect());
        self
    }
}

impl FileProbe for FakeProbe {
    fn is_file(&self, path: &Path) -> bool {
        self.files.contains(path)
    }

    fn child_dirs(&self, dir: &Path) -> Vec<PathBuf> {
        self.dirs.get(dir).cloned().unwrap_or_default()
    }
}
