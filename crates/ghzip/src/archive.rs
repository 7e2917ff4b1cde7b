use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};

use base64::Engine;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::descriptor::{FetchedFile, FilePayload};
use crate::target::TargetReference;

/// Deflate level used for every entry. Middle of the 0-9 range.
const COMPRESSION_LEVEL: i32 = 6;

/// Errors raised while building or saving an archive.
#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
    #[error("could not decode content of {path}: {source}")]
    Decode {
        path: String,
        source: base64::DecodeError,
    },

    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("archive is empty")]
    Empty,
}

/// Decode a base64 payload, ignoring embedded line breaks.
pub fn decode_base64(encoded: &str) -> Result<Vec<u8>, base64::DecodeError> {
    // GitHub wraps base64 content at 60 columns
    let cleaned: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();
    base64::engine::general_purpose::STANDARD.decode(cleaned)
}

/// Name of the saved archive: `<repo>.zip` for a whole repository,
/// `<repo>-<last path segment>.zip` otherwise (`root` for an empty path).
pub fn archive_file_name(target: &TargetReference) -> String {
    if target.is_whole_repo {
        format!("{}.zip", target.repo)
    } else {
        let leaf = target.last_segment().unwrap_or("root");
        format!("{}-{}.zip", target.repo, leaf)
    }
}

/// In-memory zip archive that files are added to one at a time.
pub struct ArchiveBuilder {
    writer: ZipWriter<Cursor<Vec<u8>>>,
    entries: Vec<String>,
}

impl Default for ArchiveBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ArchiveBuilder {
    pub fn new() -> Self {
        Self {
            writer: ZipWriter::new(Cursor::new(Vec::new())),
            entries: Vec::new(),
        }
    }

    fn options() -> FileOptions {
        FileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .compression_level(Some(COMPRESSION_LEVEL))
            .unix_permissions(0o644)
    }

    /// Add raw bytes under `path`, which is kept verbatim as the entry name.
    pub fn add(&mut self, path: &str, bytes: &[u8]) -> Result<(), ArchiveError> {
        self.writer.start_file(path, Self::options())?;
        self.writer.write_all(bytes)?;
        self.entries.push(path.to_owned());
        Ok(())
    }

    /// Decode a fetched file and add it under its repository-relative path.
    ///
    /// Nothing is written if decoding fails.
    pub fn add_fetched(&mut self, file: &FetchedFile) -> Result<(), ArchiveError> {
        let path = &file.descriptor.path;
        match &file.payload {
            FilePayload::Base64(encoded) => {
                let bytes = decode_base64(encoded).map_err(|source| ArchiveError::Decode {
                    path: path.clone(),
                    source,
                })?;
                self.add(path, &bytes)
            }
            FilePayload::Raw(bytes) => self.add(path, bytes),
        }
    }

    /// Paths added so far, in insertion order.
    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Write the central directory and hand back the finished bytes.
    pub fn finish(mut self) -> Result<FinishedArchive, ArchiveError> {
        if self.entries.is_empty() {
            return Err(ArchiveError::Empty);
        }

        let bytes = self.writer.finish()?.into_inner();
        if bytes.is_empty() {
            return Err(ArchiveError::Empty);
        }

        Ok(FinishedArchive {
            bytes,
            entries: self.entries,
        })
    }
}

/// A sealed zip archive ready to be saved.
#[derive(Debug, Clone)]
pub struct FinishedArchive {
    bytes: Vec<u8>,
    entries: Vec<String>,
}

impl FinishedArchive {
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

/// Save `archive` as `dir/file_name`, creating `dir` if needed.
/// An existing file of the same name is replaced.
pub fn emit(
    archive: &FinishedArchive,
    file_name: &str,
    dir: &Path,
) -> Result<PathBuf, ArchiveError> {
    if archive.bytes.is_empty() {
        return Err(ArchiveError::Empty);
    }

    std::fs::create_dir_all(dir)?;
    let path = dir.join(file_name);
    std::fs::write(&path, &archive.bytes)?;
    Ok(path)
}
