//! Archive location and build results.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How the archive file is named across dispatches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArchiveNaming {
    /// Always write the configured file name; dispatches are serialized.
    #[default]
    Fixed,
    /// Write `stem-<uuid>.ext` per dispatch and remove it afterwards.
    Unique,
}

/// Where an archive is written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveSpec {
    pub output_dir: PathBuf,
    pub file_name: String,
}

impl ArchiveSpec {
    pub fn new(output_dir: impl AsRef<Path>, file_name: impl Into<String>) -> Self {
        Self {
            output_dir: output_dir.as_ref().to_path_buf(),
            file_name: file_name.into(),
        }
    }

    /// Concrete file location.
    pub fn path(&self) -> PathBuf {
        self.output_dir.join(&self.file_name)
    }

    /// Same directory, file name suffixed with a fresh v4 UUID before the extension.
    ///
    /// `backup.zip` becomes `backup-<uuid>.zip`; a name without an extension
    /// just gets `-<uuid>` appended.
    pub fn unique(&self) -> Self {
        let id = uuid::Uuid::new_v4();
        let name = Path::new(&self.file_name);
        let stem = name
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.file_name.clone());
        let file_name = match name.extension() {
            Some(ext) => format!("{stem}-{id}.{}", ext.to_string_lossy()),
            None => format!("{stem}-{id}"),
        };
        Self {
            output_dir: self.output_dir.clone(),
            file_name,
        }
    }

    /// Resolve the spec for one dispatch under the given naming policy.
    pub fn for_dispatch(&self, naming: ArchiveNaming) -> Self {
        match naming {
            ArchiveNaming::Fixed => self.clone(),
            ArchiveNaming::Unique => self.unique(),
        }
    }
}

/// A finished archive on disk. Contents are never held in memory.
#[derive(Debug, Clone, Serialize)]
pub struct BuiltArchive {
    /// Final location of the archive.
    pub path: PathBuf,
    /// File name of the archive (what the attachment is called).
    pub file_name: String,
    /// Entry names in write order.
    pub entries: Vec<String>,
    /// Sum of the uncompressed input sizes in bytes.
    pub input_bytes: u64,
    /// Size of the archive file in bytes.
    pub size: u64,
    /// When the build finished.
    pub built_at: DateTime<Utc>,
}
