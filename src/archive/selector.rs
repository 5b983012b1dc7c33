//! Source directory scanning.

use std::io::ErrorKind;

use tracing::{debug, warn};

use crate::error::{FileMailerError, Result};
use crate::model::selection::{FileEntry, SelectionCriteria};

/// Lists the files of one directory whose base name ends with a suffix.
#[derive(Debug, Clone)]
pub struct FileSelector {
    criteria: SelectionCriteria,
}

impl FileSelector {
    pub fn new(criteria: SelectionCriteria) -> Self {
        Self { criteria }
    }

    /// Scan the source directory. See [`select_files`].
    pub fn select(&self) -> Result<Vec<FileEntry>> {
        select_files(&self.criteria)
    }
}

/// Return the regular files directly inside `criteria.source_dir` whose base
/// name ends with `criteria.extension`, in directory enumeration order.
///
/// A missing source directory yields an empty list and a warning. Files whose
/// name is not valid UTF-8 cannot be stored under their own name and are
/// skipped with a warning. Any other listing failure (permissions, not a
/// directory) is an error.
pub fn select_files(criteria: &SelectionCriteria) -> Result<Vec<FileEntry>> {
    let dir = &criteria.source_dir;
    let read_dir = match std::fs::read_dir(dir) {
        Ok(rd) => rd,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            warn!(dir = %dir.display(), "Source directory does not exist; nothing to select");
            return Ok(Vec::new());
        }
        Err(e) => return Err(FileMailerError::io(dir, e)),
    };

    let mut selected = Vec::new();
    for item in read_dir {
        let item = item.map_err(|e| FileMailerError::io(dir, e))?;
        let raw = item.file_name();
        let Some(name) = raw.to_str().map(str::to_owned) else {
            if raw
                .as_encoded_bytes()
                .ends_with(criteria.extension.as_bytes())
            {
                warn!(path = %item.path().display(), "Skipping file with non-UTF-8 name");
            }
            continue;
        };
        if !criteria.matches(&name) {
            continue;
        }

        // Follows symlinks so a linked log file is still picked up.
        let path = item.path();
        let is_file = std::fs::metadata(&path)
            .map(|m| m.is_file())
            .unwrap_or(false);
        if !is_file {
            debug!(path = %path.display(), "Skipping non-file entry");
            continue;
        }

        selected.push(FileEntry { path, name });
    }

    debug!(
        dir = %dir.display(),
        extension = %criteria.extension,
        count = selected.len(),
        "Selected files"
    );
    Ok(selected)
}
