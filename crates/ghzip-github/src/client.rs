use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};

use ghzip::{
    ContentSource, Credential, DirListing, FetchedFile, FileDescriptor, FilePayload, SourceError,
};

use crate::content::{ContentEntry, ContentsResponse};

const DEFAULT_API_BASE: &str = "https://api.github.com";
const DEFAULT_USER_AGENT: &str = "ghzip";

/// Characters escaped inside one URL path segment.
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Configuration for a GitHub contents client.
#[derive(Debug, Clone)]
pub struct GitHubClientConfig {
    pub credential: Credential,
    pub api_base_url: Option<String>,
    pub user_agent: Option<String>,
}

impl GitHubClientConfig {
    pub fn new(credential: Credential) -> Self {
        Self {
            credential,
            api_base_url: None,
            user_agent: None,
        }
    }
}

/// Lists and fetches repository contents through GitHub's Contents API.
///
/// Every request carries the session credential as a bearer token.
pub struct GitHubClient {
    config: GitHubClientConfig,
    client: reqwest::Client,
}

impl GitHubClient {
    pub fn new(config: GitHubClientConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    fn api_base(&self) -> &str {
        self.config
            .api_base_url
            .as_deref()
            .unwrap_or(DEFAULT_API_BASE)
            .trim_end_matches('/')
    }

    fn user_agent(&self) -> &str {
        self.config
            .user_agent
            .as_deref()
            .unwrap_or(DEFAULT_USER_AGENT)
    }

    fn contents_url(&self, owner: &str, repo: &str, path: &str) -> String {
        let path = path.trim_matches('/');
        if path.is_empty() {
            format!(
                "{}/repos/{}/{}/contents",
                self.api_base(),
                encode_segment(owner),
                encode_segment(repo)
            )
        } else {
            format!(
                "{}/repos/{}/{}/contents/{}",
                self.api_base(),
                encode_segment(owner),
                encode_segment(repo),
                encode_path(path)
            )
        }
    }

    fn build_request(&self, url: &str) -> reqwest::RequestBuilder {
        tracing::trace!(url, "GET");
        self.client
            .get(url)
            .header("User-Agent", self.user_agent())
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", "2022-11-28")
            .header(
                "Authorization",
                format!("Bearer {}", self.config.credential.as_str()),
            )
    }

    async fn get_contents(&self, url: &str, path: &str) -> Result<ContentsResponse, SourceError> {
        let response = self
            .build_request(url)
            .send()
            .await
            .map_err(|e| SourceError::Network(e.to_string()))?;

        let response = check_status(response, path).await?;

        response
            .json()
            .await
            .map_err(|e| SourceError::Parse(e.to_string()))
    }

    /// Download a file's bytes from its `download_url`.
    async fn download_raw(&self, url: &str, path: &str) -> Result<Vec<u8>, SourceError> {
        tracing::debug!(path, "content not inlined; downloading raw");

        let response = self
            .build_request(url)
            .send()
            .await
            .map_err(|e| SourceError::Network(e.to_string()))?;

        let response = check_status(response, path).await?;

        let bytes = response
            .bytes()
            .await
            .map_err(|e| SourceError::Network(format!("failed to read body of {path}: {e}")))?;

        Ok(bytes.to_vec())
    }
}

/// Map a non-success response onto the error taxonomy.
async fn check_status(
    response: reqwest::Response,
    path: &str,
) -> Result<reqwest::Response, SourceError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let rate_limited = response
        .headers()
        .get("x-ratelimit-remaining")
        .is_some_and(|v| v.as_bytes() == b"0");

    match status.as_u16() {
        403 if rate_limited => Err(SourceError::RemoteApi {
            status: 403,
            message: "API rate limit exceeded".into(),
        }),
        401 | 403 => Err(SourceError::Auth),
        404 => Err(SourceError::NotFound(if path.is_empty() {
            "repository root".into()
        } else {
            path.to_owned()
        })),
        code => Err(SourceError::RemoteApi {
            status: code,
            message: response
                .text()
                .await
                .unwrap_or_else(|_| "unknown".into()),
        }),
    }
}

fn encode_segment(segment: &str) -> String {
    utf8_percent_encode(segment, PATH_SEGMENT).to_string()
}

/// Encode a decoded repository path, one `/`-separated segment at a time.
fn encode_path(path: &str) -> String {
    path.split('/')
        .map(encode_segment)
        .collect::<Vec<_>>()
        .join("/")
}

fn descriptor_from(entry: &ContentEntry) -> FileDescriptor {
    FileDescriptor {
        path: entry.path.clone(),
        name: entry.name.clone(),
        sha: entry.sha.clone(),
        size: entry.size,
    }
}

#[async_trait::async_trait]
impl ContentSource for GitHubClient {
    async fn list_dir(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
    ) -> Result<DirListing, SourceError> {
        let url = self.contents_url(owner, repo, path);

        match self.get_contents(&url, path).await? {
            ContentsResponse::Directory(entries) => Ok(DirListing::Directory(
                entries.iter().map(ContentEntry::to_remote_entry).collect(),
            )),
            ContentsResponse::Single(entry) => Ok(DirListing::File(entry.to_remote_entry())),
        }
    }

    async fn fetch_file(
        &self,
        owner: &str,
        repo: &str,
        file: &FileDescriptor,
    ) -> Result<FetchedFile, SourceError> {
        let url = self.contents_url(owner, repo, &file.path);

        let entry = match self.get_contents(&url, &file.path).await? {
            ContentsResponse::Single(entry) => entry,
            ContentsResponse::Directory(_) => {
                return Err(SourceError::Parse(format!(
                    "expected a file at {} but got a directory",
                    file.path
                )));
            }
        };

        let payload = match (entry.inline_content(), entry.download_url.as_deref()) {
            (Some(content), _) => FilePayload::Base64(content.to_owned()),
            (None, Some(download_url)) => {
                FilePayload::Raw(self.download_raw(download_url, &file.path).await?)
            }
            (None, None) => {
                return Err(SourceError::Parse(format!(
                    "no content or download URL for {}",
                    file.path
                )));
            }
        };

        Ok(FetchedFile {
            descriptor: descriptor_from(&entry),
            payload,
        })
    }
}
