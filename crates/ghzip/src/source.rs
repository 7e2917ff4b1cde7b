use std::sync::Arc;

use crate::descriptor::{DirListing, FetchedFile, FileDescriptor};

/// Errors that can occur when talking to a remote content source.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SourceError {
    #[error("authorization failed: missing or insufficient access token")]
    Auth,

    #[error("not found: {0}")]
    NotFound(String),

    #[error("remote API returned HTTP {status}: {message}")]
    RemoteApi { status: u16, message: String },

    #[error("network error: {0}")]
    Network(String),

    #[error("parse error: {0}")]
    Parse(String),
}

/// A remote repository exposing a contents API.
///
/// Implementations carry whatever credential the remote needs; callers
/// only pass repository coordinates.
#[async_trait::async_trait]
pub trait ContentSource: Send + Sync {
    /// List the immediate entries of `path` (empty for the repository root).
    async fn list_dir(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
    ) -> Result<DirListing, SourceError>;

    /// Retrieve the content of one file.
    async fn fetch_file(
        &self,
        owner: &str,
        repo: &str,
        file: &FileDescriptor,
    ) -> Result<FetchedFile, SourceError>;
}

#[async_trait::async_trait]
impl<T: ContentSource + ?Sized> ContentSource for Arc<T> {
    async fn list_dir(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
    ) -> Result<DirListing, SourceError> {
        (**self).list_dir(owner, repo, path).await
    }

    async fn fetch_file(
        &self,
        owner: &str,
        repo: &str,
        file: &FileDescriptor,
    ) -> Result<FetchedFile, SourceError> {
        (**self).fetch_file(owner, repo, file).await
    }
}
