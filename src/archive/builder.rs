//! ZIP archive construction.
//!
//! The archive is written to a temporary file next to the target and renamed
//! over it only after the ZIP central directory has been written, so readers
//! never observe a half-written archive at the target path.

use std::fs::File;
use std::io::{Read, Write};

use tracing::{debug, info};
use zip::{write::FileOptions, CompressionMethod, ZipWriter};

use crate::error::{FileMailerError, Result};
use crate::model::archive::{ArchiveSpec, BuiltArchive};
use crate::model::selection::FileEntry;

/// Default copy buffer size in bytes.
pub const DEFAULT_BUFFER_SIZE: usize = 8 * 1024;

/// Writes selected files into a single deflate-compressed ZIP archive.
#[derive(Debug, Clone)]
pub struct ArchiveBuilder {
    buffer_size: usize,
}

impl Default for ArchiveBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_BUFFER_SIZE)
    }
}

impl ArchiveBuilder {
    /// A builder copying file contents through a buffer of `buffer_size` bytes.
    pub fn new(buffer_size: usize) -> Self {
        Self {
            buffer_size: buffer_size.max(1),
        }
    }

    /// Build the archive described by `spec` from `entries`.
    ///
    /// Each file is stored flat under its base name, in the given order.
    /// Any existing archive at the target path is replaced. An empty
    /// `entries` slice produces a valid, empty archive.
    ///
    /// The progress callback receives `(done, total)` after each entry.
    pub fn build(
        &self,
        spec: &ArchiveSpec,
        entries: &[FileEntry],
        progress: Option<&dyn Fn(usize, usize)>,
    ) -> Result<BuiltArchive> {
        let target = spec.path();

        std::fs::create_dir_all(&spec.output_dir)
            .map_err(|e| FileMailerError::io(&spec.output_dir, e))?;

        let staging = tempfile::Builder::new()
            .prefix(".filemailer-")
            .suffix(".part")
            .tempfile_in(&spec.output_dir)
            .map_err(|e| FileMailerError::io(&spec.output_dir, e))?;

        let mut zip = ZipWriter::new(staging);
        let options: FileOptions<'_, ()> =
            FileOptions::default().compression_method(CompressionMethod::Deflated);

        let mut buffer = vec![0u8; self.buffer_size];
        let mut names = Vec::with_capacity(entries.len());
        let mut input_bytes = 0u64;
        let total = entries.len();

        for (i, entry) in entries.iter().enumerate() {
            debug!(path = %entry.path.display(), "Adding to archive");

            let mut reader =
                File::open(&entry.path).map_err(|e| FileMailerError::io(&entry.path, e))?;
            let len = reader
                .metadata()
                .map_err(|e| FileMailerError::io(&entry.path, e))?
                .len();

            zip.start_file(
                entry.name.as_str(),
                options.large_file(len >= u64::from(u32::MAX)),
            )
            .map_err(|e| FileMailerError::archive(&target, format!("{}: {e}", entry.name)))?;

            loop {
                let read = reader
                    .read(&mut buffer)
                    .map_err(|e| FileMailerError::io(&entry.path, e))?;
                if read == 0 {
                    break;
                }
                zip.write_all(&buffer[..read])
                    .map_err(|e| FileMailerError::archive(&target, e))?;
                input_bytes += read as u64;
            }

            names.push(entry.name.clone());
            if let Some(cb) = progress {
                cb(i + 1, total);
            }
        }

        let staging = zip
            .finish()
            .map_err(|e| FileMailerError::archive(&target, e))?;
        staging
            .as_file()
            .sync_all()
            .map_err(|e| FileMailerError::io(staging.path(), e))?;
        staging
            .persist(&target)
            .map_err(|e| FileMailerError::io(&target, e.error))?;

        let size = std::fs::metadata(&target)
            .map_err(|e| FileMailerError::io(&target, e))?
            .len();

        info!(
            path = %target.display(),
            entries = names.len(),
            input_bytes,
            size,
            "Archive built"
        );

        Ok(BuiltArchive {
            path: target,
            file_name: spec.file_name.clone(),
            entries: names,
            input_bytes,
            size,
            built_at: chrono::Utc::now(),
        })
    }
}

/// Build an archive with the default buffer size.
pub fn build_archive(spec: &ArchiveSpec, entries: &[FileEntry]) -> Result<BuiltArchive> {
    ArchiveBuilder::default().build(spec, entries, None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::reader;
    use std::cell::Cell;

    fn write_entry(dir: &std::path::Path, name: &str, body: &[u8]) -> FileEntry {
        let path = dir.join(name);
        std::fs::write(&path, body).unwrap();
        FileEntry::from_path(path).unwrap()
    }

    #[test]
    fn test_build_creates_output_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let src = write_entry(tmp.path(), "a.log", b"alpha");
        let spec = ArchiveSpec::new(tmp.path().join("out").join("deep"), "b.zip");

        let built = build_archive(&spec, &[src]).unwrap();
        assert!(built.path.exists());
        assert_eq!(built.path, spec.path());
        assert_eq!(built.entries, vec!["a.log"]);
        assert_eq!(built.input_bytes, 5);
        assert!(built.size > 0);
    }

    #[test]
    fn test_empty_input_yields_empty_archive() {
        let tmp = tempfile::tempdir().unwrap();
        let spec = ArchiveSpec::new(tmp.path(), "empty.zip");
        let built = build_archive(&spec, &[]).unwrap();
        assert!(built.entries.is_empty());
        assert!(reader::list_entries(&built.path).unwrap().is_empty());
    }

    #[test]
    fn test_small_buffer_copies_everything() {
        let tmp = tempfile::tempdir().unwrap();
        let body: Vec<u8> = (0..10_000u32).map(|i| (i % 251) as u8).collect();
        let src = write_entry(tmp.path(), "big.log", &body);
        let spec = ArchiveSpec::new(tmp.path().join("out"), "b.zip");

        let built = ArchiveBuilder::new(7).build(&spec, &[src], None).unwrap();
        assert_eq!(reader::read_entry(&built.path, "big.log").unwrap(), body);
    }

    #[test]
    fn test_rebuild_replaces_previous_archive() {
        let tmp = tempfile::tempdir().unwrap();
        let a = write_entry(tmp.path(), "a.log", b"a");
        let b = write_entry(tmp.path(), "b.log", b"b");
        let spec = ArchiveSpec::new(tmp.path().join("out"), "b.zip");

        build_archive(&spec, &[a, b.clone()]).unwrap();
        build_archive(&spec, &[b]).unwrap();

        let names: Vec<String> = reader::list_entries(&spec.path())
            .unwrap()
            .into_iter()
            .map(|e| e.name)
            .collect();
        assert_eq!(names, vec!["b.log"]);
    }

    #[test]
    fn test_missing_input_fails_and_leaves_no_partial_file() {
        let tmp = tempfile::tempdir().unwrap();
        let ok = write_entry(tmp.path(), "a.log", b"a");
        let gone = FileEntry::from_path(tmp.path().join("gone.log")).unwrap();
        let out = tmp.path().join("out");
        let spec = ArchiveSpec::new(&out, "b.zip");

        let err = build_archive(&spec, &[ok, gone]).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::FileSystem);
        assert!(!spec.path().exists());
        // The staging file is removed as well.
        assert_eq!(std::fs::read_dir(&out).unwrap().count(), 0);
    }

    #[test]
    fn test_failed_rebuild_keeps_previous_archive() {
        let tmp = tempfile::tempdir().unwrap();
        let ok = write_entry(tmp.path(), "a.log", b"a");
        let gone = FileEntry::from_path(tmp.path().join("gone.log")).unwrap();
        let spec = ArchiveSpec::new(tmp.path().join("out"), "b.zip");

        build_archive(&spec, std::slice::from_ref(&ok)).unwrap();
        assert!(build_archive(&spec, &[ok, gone]).is_err());
        assert_eq!(reader::read_entry(&spec.path(), "a.log").unwrap(), b"a");
    }

    #[test]
    fn test_duplicate_names_fail() {
        let tmp = tempfile::tempdir().unwrap();
        let a = write_entry(tmp.path(), "a.log", b"a");
        let spec = ArchiveSpec::new(tmp.path().join("out"), "b.zip");
        let err = build_archive(&spec, &[a.clone(), a]).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::Archive);
    }

    #[test]
    fn test_output_dir_blocked_by_file() {
        let tmp = tempfile::tempdir().unwrap();
        let blocker = tmp.path().join("out");
        std::fs::write(&blocker, "not a dir").unwrap();
        let spec = ArchiveSpec::new(&blocker, "b.zip");
        let err = build_archive(&spec, &[]).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::FileSystem);
    }

    #[test]
    fn test_progress_reports_each_entry() {
        let tmp = tempfile::tempdir().unwrap();
        let a = write_entry(tmp.path(), "a.log", b"a");
        let b = write_entry(tmp.path(), "b.log", b"b");
        let spec = ArchiveSpec::new(tmp.path().join("out"), "b.zip");

        let calls = Cell::new(0usize);
        let last = Cell::new((0usize, 0usize));
        ArchiveBuilder::default()
            .build(
                &spec,
                &[a, b],
                Some(&|done, total| {
                    calls.set(calls.get() + 1);
                    last.set((done, total));
                }),
            )
            .unwrap();
        assert_eq!(calls.get(), 2);
        assert_eq!(last.get(), (2, 2));
    }
}
