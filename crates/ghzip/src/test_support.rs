use std::collections::{BTreeMap, HashMap, HashSet};
use std::hash::{DefaultHasher, Hash, Hasher};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use base64::Engine;

use crate::credential::{Credential, CredentialError, CredentialStore, TokenPrompt};
use crate::descriptor::{
    DirListing, EntryKind, FetchedFile, FileDescriptor, FilePayload, RemoteEntry,
};
use crate::source::{ContentSource, SourceError};

/// In-memory repository for testing. Paths are repository-relative and
/// directories are implied by the files beneath them.
pub struct InMemorySource {
    owner: String,
    repo: String,
    files: BTreeMap<String, Vec<u8>>,
    others: BTreeMap<String, String>,
    raw: HashSet<String>,
    corrupt: HashSet<String>,
    listing_failures: HashMap<String, SourceError>,
    fetch_failures: HashMap<String, SourceError>,
    list_calls: AtomicUsize,
    fetch_calls: AtomicUsize,
}

impl InMemorySource {
    pub fn new(owner: impl Into<String>, repo: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            repo: repo.into(),
            files: BTreeMap::new(),
            others: BTreeMap::new(),
            raw: HashSet::new(),
            corrupt: HashSet::new(),
            listing_failures: HashMap::new(),
            fetch_failures: HashMap::new(),
            list_calls: AtomicUsize::new(0),
            fetch_calls: AtomicUsize::new(0),
        }
    }

    pub fn add_file(&mut self, path: &str, content: &[u8]) {
        self.files.insert(path.to_owned(), content.to_vec());
    }

    /// Add an entry of some other type (`"submodule"`, `"symlink"`, ...).
    pub fn add_other(&mut self, path: &str, kind: &str) {
        self.others.insert(path.to_owned(), kind.to_owned());
    }

    /// Serve `path` as raw bytes instead of base64.
    pub fn serve_raw(&mut self, path: &str) {
        self.raw.insert(path.to_owned());
    }

    /// Serve `path` with a payload that is not valid base64.
    pub fn corrupt(&mut self, path: &str) {
        self.corrupt.insert(path.to_owned());
    }

    pub fn fail_listing(&mut self, path: &str, error: SourceError) {
        self.listing_failures.insert(path.to_owned(), error);
    }

    pub fn fail_fetch(&mut self, path: &str, error: SourceError) {
        self.fetch_failures.insert(path.to_owned(), error);
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn fetch_calls(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    fn check_repo(&self, owner: &str, repo: &str) -> Result<(), SourceError> {
        if owner == self.owner && repo == self.repo {
            Ok(())
        } else {
            Err(SourceError::NotFound(format!("{owner}/{repo}")))
        }
    }

    fn file_entry(&self, path: &str, content: &[u8]) -> RemoteEntry {
        RemoteEntry {
            kind: EntryKind::File,
            path: path.to_owned(),
            name: leaf(path).to_owned(),
            sha: fake_sha(content),
            size: content.len() as u64,
        }
    }

    fn children(&self, dir: &str) -> Vec<RemoteEntry> {
        let prefix = if dir.is_empty() {
            String::new()
        } else {
            format!("{dir}/")
        };

        let mut entries: BTreeMap<String, RemoteEntry> = BTreeMap::new();

        let all = self
            .files
            .keys()
            .map(|p| (p, None))
            .chain(self.others.iter().map(|(p, k)| (p, Some(k))));

        for (path, other_kind) in all {
            let Some(rest) = path.strip_prefix(&prefix) else {
                continue;
            };
            match rest.split_once('/') {
                Some((child, _)) => {
                    let child_path = format!("{prefix}{child}");
                    entries.entry(child.to_owned()).or_insert_with(|| RemoteEntry {
                        kind: EntryKind::Dir,
                        name: child.to_owned(),
                        sha: fake_sha(child_path.as_bytes()),
                        path: child_path,
                        size: 0,
                    });
                }
                None => {
                    let entry = match other_kind {
                        Some(kind) => RemoteEntry {
                            kind: EntryKind::parse(kind),
                            path: path.clone(),
                            name: rest.to_owned(),
                            sha: fake_sha(path.as_bytes()),
                            size: 0,
                        },
                        None => self.file_entry(path, &self.files[path]),
                    };
                    entries.insert(rest.to_owned(), entry);
                }
            }
        }

        entries.into_values().collect()
    }
}

fn leaf(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

fn fake_sha(content: &[u8]) -> String {
    let mut hasher = DefaultHasher::new();
    content.hash(&mut hasher);
    format!("{:016x}", hasher.finish())
}

/// Base64 wrapped at 60 columns, the way the contents API returns it.
fn wrapped_base64(content: &[u8]) -> String {
    let encoded = base64::engine::general_purpose::STANDARD.encode(content);
    let mut out = String::with_capacity(encoded.len() + encoded.len() / 60 + 1);
    for (i, c) in encoded.chars().enumerate() {
        if i > 0 && i % 60 == 0 {
            out.push('\n');
        }
        out.push(c);
    }
    out.push('\n');
    out
}

#[async_trait::async_trait]
impl ContentSource for InMemorySource {
    async fn list_dir(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
    ) -> Result<DirListing, SourceError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        self.check_repo(owner, repo)?;

        let path = path.trim_matches('/');
        if let Some(error) = self.listing_failures.get(path) {
            return Err(error.clone());
        }

        if let Some(content) = self.files.get(path) {
            return Ok(DirListing::File(self.file_entry(path, content)));
        }

        let children = self.children(path);
        if children.is_empty() && !path.is_empty() {
            return Err(SourceError::NotFound(path.to_owned()));
        }
        Ok(DirListing::Directory(children))
    }

    async fn fetch_file(
        &self,
        owner: &str,
        repo: &str,
        file: &FileDescriptor,
    ) -> Result<FetchedFile, SourceError> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        self.check_repo(owner, repo)?;

        if let Some(error) = self.fetch_failures.get(&file.path) {
            return Err(error.clone());
        }

        let content = self
            .files
            .get(&file.path)
            .ok_or_else(|| SourceError::NotFound(file.path.clone()))?;

        let payload = if self.corrupt.contains(&file.path) {
            FilePayload::Base64("%%% not base64 %%%".to_owned())
        } else if self.raw.contains(&file.path) {
            FilePayload::Raw(content.clone())
        } else {
            FilePayload::Base64(wrapped_base64(content))
        };

        Ok(FetchedFile {
            descriptor: file.clone(),
            payload,
        })
    }
}

/// Credential store that keeps the token in memory and counts writes.
#[derive(Default)]
pub struct MemoryCredentialStore {
    token: Mutex<Option<String>>,
    writes: AtomicUsize,
}

impl MemoryCredentialStore {
    pub fn with_token(token: &str) -> Self {
        Self {
            token: Mutex::new(Some(token.to_owned())),
            writes: AtomicUsize::new(0),
        }
    }

    pub fn token(&self) -> Option<String> {
        self.token.lock().unwrap().clone()
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn load(&self) -> Result<Option<Credential>, CredentialError> {
        Ok(self
            .token
            .lock()
            .unwrap()
            .as_deref()
            .and_then(|t| Credential::new(t).ok()))
    }

    fn store(&self, credential: &Credential) -> Result<(), CredentialError> {
        *self.token.lock().unwrap() = Some(credential.as_str().to_owned());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn clear(&self) -> Result<(), CredentialError> {
        *self.token.lock().unwrap() = None;
        Ok(())
    }
}

/// Prompt that replays canned answers, then reports closed input.
pub struct ScriptedPrompt {
    answers: std::vec::IntoIter<String>,
    asked: usize,
    rejections: usize,
}

impl ScriptedPrompt {
    pub fn new<S: Into<String>>(answers: Vec<S>) -> Self {
        Self {
            answers: answers
                .into_iter()
                .map(Into::into)
                .collect::<Vec<_>>()
                .into_iter(),
            asked: 0,
            rejections: 0,
        }
    }

    pub fn asked(&self) -> usize {
        self.asked
    }

    pub fn rejections(&self) -> usize {
        self.rejections
    }
}

impl TokenPrompt for ScriptedPrompt {
    fn ask(&mut self) -> Result<Option<String>, CredentialError> {
        self.asked += 1;
        Ok(self.answers.next())
    }

    fn rejected(&mut self, _reason: &CredentialError) {
        self.rejections += 1;
    }
}
