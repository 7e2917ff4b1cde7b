use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::archive::{self, ArchiveBuilder, ArchiveError, FinishedArchive};
use crate::descriptor::FetchedFile;
use crate::feedback::Feedback;
use crate::lister;
use crate::source::{ContentSource, SourceError};
use crate::target::{self, ParseError, TargetReference};

/// Errors that abort a download.
///
/// Per-file fetch failures are not in here; they are collected in
/// [`DownloadReport::failed`] and only become fatal when every file fails.
#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    #[error(transparent)]
    InvalidUrl(#[from] ParseError),

    #[error(transparent)]
    Source(#[from] SourceError),

    #[error("no files found under {0}")]
    EmptyListing(String),

    #[error("none of the {attempted} files could be downloaded")]
    NoFilesDownloaded { attempted: usize },

    #[error(transparent)]
    Archive(#[from] ArchiveError),
}

/// Where a download currently is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stage {
    Parsing,
    Listing,
    Fetching {
        index: usize,
        total: usize,
        path: String,
    },
    Archiving,
    Emitting,
    Done,
    Failed(String),
}

impl Stage {
    /// Status-line rendering of this stage.
    pub fn feedback(&self) -> Feedback {
        match self {
            Self::Failed(reason) => Feedback::error(reason.clone()),
            Self::Done => Feedback::success("download complete"),
            other => Feedback::info(other.to_string()),
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parsing => write!(f, "parsing URL"),
            Self::Listing => write!(f, "listing files"),
            Self::Fetching { index, total, path } => {
                write!(f, "fetching {index}/{total}: {path}")
            }
            Self::Archiving => write!(f, "building archive"),
            Self::Emitting => write!(f, "saving archive"),
            Self::Done => write!(f, "done"),
            Self::Failed(reason) => write!(f, "failed: {reason}"),
        }
    }
}

/// A file left out of the archive, and why.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedFile {
    pub path: String,
    pub reason: String,
}

/// An archive assembled in memory but not yet saved.
#[derive(Debug)]
pub struct BuiltArchive {
    pub archive: FinishedArchive,
    pub failed: Vec<FailedFile>,
    pub feedback: Vec<Feedback>,
}

/// Outcome of a successful download.
#[derive(Debug)]
pub struct DownloadReport {
    pub target: TargetReference,
    pub file_name: String,
    pub archive_path: PathBuf,
    /// Archive entries, in listing order.
    pub written: Vec<String>,
    pub failed: Vec<FailedFile>,
    pub feedback: Vec<Feedback>,
}

/// Runs the parse, list, fetch, archive and save steps against one source.
///
/// Files are fetched one at a time in listing order.
pub struct Downloader {
    source: Arc<dyn ContentSource>,
}

impl Downloader {
    pub fn new(source: Arc<dyn ContentSource>) -> Self {
        Self { source }
    }

    /// Download `input` (a repository or directory URL) into `output_dir`.
    ///
    /// `on_status` sees every stage transition, ending in either
    /// [`Stage::Done`] or [`Stage::Failed`].
    pub async fn download(
        &self,
        input: &str,
        output_dir: &Path,
        on_status: &mut (dyn FnMut(&Stage) + Send),
    ) -> Result<DownloadReport, DownloadError> {
        match self.run(input, output_dir, on_status).await {
            Ok(report) => {
                on_status(&Stage::Done);
                Ok(report)
            }
            Err(e) => {
                tracing::error!("download failed: {e}");
                on_status(&Stage::Failed(e.to_string()));
                Err(e)
            }
        }
    }

    async fn run(
        &self,
        input: &str,
        output_dir: &Path,
        on_status: &mut (dyn FnMut(&Stage) + Send),
    ) -> Result<DownloadReport, DownloadError> {
        on_status(&Stage::Parsing);
        let target = target::parse_target_url(input)?;
        tracing::debug!(%target, whole_repo = target.is_whole_repo, "parsed target");

        let mut built = self.build_archive(&target, on_status).await?;

        on_status(&Stage::Emitting);
        let file_name = archive::archive_file_name(&target);
        let archive_path = archive::emit(&built.archive, &file_name, output_dir)?;

        let written = built.archive.entries().to_vec();
        built.feedback.push(Feedback::success(format!(
            "saved {} file(s) to {}",
            written.len(),
            archive_path.display()
        )));

        Ok(DownloadReport {
            target,
            file_name,
            archive_path,
            written,
            failed: built.failed,
            feedback: built.feedback,
        })
    }

    /// List, fetch and archive everything under `target` without saving.
    pub async fn build_archive(
        &self,
        target: &TargetReference,
        on_status: &mut (dyn FnMut(&Stage) + Send),
    ) -> Result<BuiltArchive, DownloadError> {
        on_status(&Stage::Listing);
        let files =
            lister::list_files(self.source.as_ref(), &target.owner, &target.repo, &target.path)
                .await?;

        if files.is_empty() {
            return Err(DownloadError::EmptyListing(target.to_string()));
        }
        tracing::info!(count = files.len(), %target, "listed files");

        let total = files.len();
        let mut fetched: Vec<FetchedFile> = Vec::with_capacity(total);
        let mut failed = Vec::new();
        let mut feedback = Vec::new();

        for (i, file) in files.iter().enumerate() {
            on_status(&Stage::Fetching {
                index: i + 1,
                total,
                path: file.path.clone(),
            });

            match self
                .source
                .fetch_file(&target.owner, &target.repo, file)
                .await
            {
                Ok(f) => fetched.push(f),
                Err(e) => {
                    tracing::warn!(path = %file.path, "fetch failed: {e}");
                    feedback.push(Feedback::error(format!("skipped {}: {e}", file.path)));
                    failed.push(FailedFile {
                        path: file.path.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        if fetched.is_empty() {
            return Err(DownloadError::NoFilesDownloaded { attempted: total });
        }

        on_status(&Stage::Archiving);
        let mut builder = ArchiveBuilder::new();
        for file in &fetched {
            match builder.add_fetched(file) {
                Ok(()) => {}
                Err(e @ ArchiveError::Decode { .. }) => {
                    tracing::warn!(path = %file.descriptor.path, "{e}");
                    feedback.push(Feedback::error(format!("skipped {}", file.descriptor.path)));
                    failed.push(FailedFile {
                        path: file.descriptor.path.clone(),
                        reason: e.to_string(),
                    });
                }
                Err(e) => return Err(e.into()),
            }
        }

        if builder.is_empty() {
            return Err(DownloadError::NoFilesDownloaded { attempted: total });
        }

        let archive = builder.finish()?;
        tracing::debug!(
            entries = archive.entries().len(),
            bytes = archive.size(),
            "archive finished"
        );

        Ok(BuiltArchive {
            archive,
            failed,
            feedback,
        })
    }
}
