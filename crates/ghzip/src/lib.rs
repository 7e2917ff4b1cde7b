pub mod archive;
pub mod credential;
pub mod descriptor;
pub mod feedback;
pub mod lister;
pub mod pipeline;
pub mod source;
pub mod target;

pub use archive::{ArchiveBuilder, ArchiveError, FinishedArchive, archive_file_name, decode_base64, emit};
pub use credential::{
    CREDENTIAL_KEY, Credential, CredentialError, CredentialStore, FileCredentialStore,
    TokenPrompt, obtain_credential, reset_credential,
};
pub use descriptor::{DirListing, EntryKind, FetchedFile, FileDescriptor, FilePayload, RemoteEntry};
pub use feedback::Feedback;
pub use lister::list_files;
pub use pipeline::{BuiltArchive, DownloadError, DownloadReport, Downloader, FailedFile, Stage};
pub use source::{ContentSource, SourceError};
pub use target::{ParseError, TargetReference, parse_target_url};

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
