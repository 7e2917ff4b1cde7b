use std::fmt;

/// One regular file found while listing a remote directory tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDescriptor {
    /// Full path relative to the repository root.
    pub path: String,
    pub name: String,
    /// Content-addressed blob id reported by the remote.
    pub sha: String,
    pub size: u64,
}

/// Type of an entry in a directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Dir,
    /// Submodules, symlinks and anything else the remote reports.
    Other(String),
}

impl EntryKind {
    pub fn parse(s: &str) -> Self {
        match s {
            "file" => Self::File,
            "dir" => Self::Dir,
            other => Self::Other(other.to_owned()),
        }
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File => write!(f, "file"),
            Self::Dir => write!(f, "dir"),
            Self::Other(s) => write!(f, "{s}"),
        }
    }
}

/// A single entry returned by the contents listing endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteEntry {
    pub kind: EntryKind,
    pub path: String,
    pub name: String,
    pub sha: String,
    pub size: u64,
}

impl RemoteEntry {
    /// The file descriptor for this entry, if it is a regular file.
    pub fn to_descriptor(&self) -> Option<FileDescriptor> {
        (self.kind == EntryKind::File).then(|| FileDescriptor {
            path: self.path.clone(),
            name: self.name.clone(),
            sha: self.sha.clone(),
            size: self.size,
        })
    }
}

/// Result of listing one remote path.
///
/// The contents endpoint answers with an array for directories and a
/// single object when the path names a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirListing {
    Directory(Vec<RemoteEntry>),
    File(RemoteEntry),
}

/// File content as delivered by the remote.
#[derive(Clone, PartialEq, Eq)]
pub enum FilePayload {
    /// Base64 text, possibly wrapped across lines.
    Base64(String),
    /// Raw bytes downloaded directly.
    Raw(Vec<u8>),
}

impl fmt::Debug for FilePayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Base64(s) => write!(f, "Base64({} chars)", s.len()),
            Self::Raw(b) => write!(f, "Raw({} bytes)", b.len()),
        }
    }
}

/// A file whose content has been retrieved but not yet decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedFile {
    pub descriptor: FileDescriptor,
    pub payload: FilePayload,
}
