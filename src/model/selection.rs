//! File selection inputs and outputs.

use std::path::{Path, PathBuf};

/// Which files of which directory are bundled.
///
/// Built once per dispatch from configuration and never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionCriteria {
    /// Directory to scan (not recursive).
    pub source_dir: PathBuf,
    /// Case-sensitive suffix the base name must end with.
    pub extension: String,
}

impl SelectionCriteria {
    pub fn new(source_dir: impl AsRef<Path>, extension: impl Into<String>) -> Self {
        Self {
            source_dir: source_dir.as_ref().to_path_buf(),
            extension: extension.into(),
        }
    }

    /// Whether a base name passes the suffix filter.
    pub fn matches(&self, name: &str) -> bool {
        name.ends_with(&self.extension)
    }
}

/// A selected file: full path plus the base name used inside the archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    pub path: PathBuf,
    pub name: String,
}

impl FileEntry {
    /// Build an entry from a path, taking the base name from its last component.
    ///
    /// Returns `None` for paths without a file name (e.g. `/` or `..`) and
    /// for names that are not valid UTF-8.
    pub fn from_path(path: impl Into<PathBuf>) -> Option<Self> {
        let path = path.into();
        let name = path.file_name()?.to_str()?.to_owned();
        Some(Self { path, name })
    }
}
