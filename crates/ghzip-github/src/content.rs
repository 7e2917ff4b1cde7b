use ghzip::{EntryKind, RemoteEntry};
use serde::Deserialize;

/// One object from GitHub's Contents API.
/// `GET /repos/{owner}/{repo}/contents/{path}`
///
/// Directory listings omit `content`; single-file responses include it
/// as wrapped base64 unless the file is larger than 1 MB, in which case
/// `encoding` is `"none"` and only `download_url` is usable.
#[derive(Debug, Deserialize)]
pub struct ContentEntry {
    #[serde(rename = "type")]
    pub entry_type: String,
    pub name: String,
    pub path: String,
    #[serde(default)]
    pub sha: String,
    #[serde(default)]
    pub size: u64,
    pub content: Option<String>,
    pub encoding: Option<String>,
    pub download_url: Option<String>,
}

impl ContentEntry {
    pub fn to_remote_entry(&self) -> RemoteEntry {
        RemoteEntry {
            kind: EntryKind::parse(&self.entry_type),
            path: self.path.clone(),
            name: self.name.clone(),
            sha: self.sha.clone(),
            size: self.size,
        }
    }

    /// Base64 content, if the response carried any usable content.
    pub fn inline_content(&self) -> Option<&str> {
        if self.encoding.as_deref() == Some("none") {
            return None;
        }
        match self.content.as_deref() {
            Some(c) if !c.trim().is_empty() || self.size == 0 => Some(c),
            None if self.size == 0 => Some(""),
            _ => None,
        }
    }
}

/// The Contents API answers with an array for a directory and a single
/// object for a file.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ContentsResponse {
    Directory(Vec<ContentEntry>),
    Single(ContentEntry),
}
