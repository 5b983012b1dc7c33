//! Read back a built archive: list, read, and extract entries.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use serde::Serialize;
use zip::ZipArchive;

use crate::error::{FileMailerError, Result};

/// One entry of an archive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArchiveEntryInfo {
    pub name: String,
    /// Uncompressed size in bytes.
    pub size: u64,
    pub compressed_size: u64,
}

fn open(path: &Path) -> Result<ZipArchive<File>> {
    let file = File::open(path).map_err(|e| FileMailerError::io(path, e))?;
    ZipArchive::new(file).map_err(|e| FileMailerError::archive(path, e))
}

/// List the entries of the archive at `path` in stored order.
pub fn list_entries(path: &Path) -> Result<Vec<ArchiveEntryInfo>> {
    let mut archive = open(path)?;
    let mut entries = Vec::with_capacity(archive.len());
    for i in 0..archive.len() {
        let file = archive
            .by_index(i)
            .map_err(|e| FileMailerError::archive(path, e))?;
        entries.push(ArchiveEntryInfo {
            name: file.name().to_string(),
            size: file.size(),
            compressed_size: file.compressed_size(),
        });
    }
    Ok(entries)
}

/// Read the decompressed content of entry `name`.
pub fn read_entry(path: &Path, name: &str) -> Result<Vec<u8>> {
    let mut archive = open(path)?;
    let mut file = archive
        .by_name(name)
        .map_err(|e| FileMailerError::archive(path, format!("{name}: {e}")))?;
    let mut data = Vec::with_capacity(file.size() as usize);
    file.read_to_end(&mut data)
        .map_err(|e| FileMailerError::archive(path, format!("{name}: {e}")))?;
    Ok(data)
}

/// Extract every entry into `output_dir`. Returns the written paths.
///
/// Entries whose names would escape `output_dir` are skipped.
pub fn extract_all(path: &Path, output_dir: &Path) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(output_dir).map_err(|e| FileMailerError::io(output_dir, e))?;
    let mut archive = open(path)?;
    let mut written = Vec::new();

    for i in 0..archive.len() {
        let mut file = archive
            .by_index(i)
            .map_err(|e| FileMailerError::archive(path, e))?;
        let Some(relative) = file.enclosed_name() else {
            tracing::warn!(name = %file.name(), "Skipping entry with unsafe path");
            continue;
        };
        let dest = output_dir.join(relative);
        if file.is_dir() {
            std::fs::create_dir_all(&dest).map_err(|e| FileMailerError::io(&dest, e))?;
            continue;
        }
        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent).map_err(|e| FileMailerError::io(parent, e))?;
        }
        let mut out = File::create(&dest).map_err(|e| FileMailerError::io(&dest, e))?;
        std::io::copy(&mut file, &mut out).map_err(|e| FileMailerError::io(&dest, e))?;
        written.push(dest);
    }

    Ok(written)
}
