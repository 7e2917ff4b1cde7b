use std::fmt;

use percent_encoding::percent_decode_str;

/// Errors produced while turning user input into a [`TargetReference`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("not a GitHub repository or directory URL: {0}")]
    InvalidUrl(String),
}

/// What to download: a whole repository or one directory inside it.
///
/// The branch segment of a `/tree/<branch>/...` URL is not kept. Paths are
/// resolved against the repository's default branch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetReference {
    pub owner: String,
    pub repo: String,
    pub path: String,
    pub is_whole_repo: bool,
}

impl TargetReference {
    /// Last segment of the path, or `None` for the repository root.
    pub fn last_segment(&self) -> Option<&str> {
        self.path.rsplit('/').find(|segment| !segment.is_empty())
    }
}

impl fmt::Display for TargetReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "{}/{}", self.owner, self.repo)
        } else {
            write!(f, "{}/{}/{}", self.owner, self.repo, self.path)
        }
    }
}

/// Parse a GitHub URL of one of two shapes:
///
/// - `https://github.com/<owner>/<repo>`
/// - `https://github.com/<owner>/<repo>/tree/<branch>/<optional/path>`
///
/// The scheme and a leading `www.` are optional. One trailing slash is
/// ignored, as is any query string or fragment. Segments are
/// percent-decoded, so `my%20docs` yields the path `my docs`.
pub fn parse_target_url(input: &str) -> Result<TargetReference, ParseError> {
    let invalid = || ParseError::InvalidUrl(input.trim().to_owned());

    let trimmed = input.trim();
    let trimmed = trimmed
        .split(['?', '#'])
        .next()
        .unwrap_or(trimmed);
    let trimmed = trimmed.strip_suffix('/').unwrap_or(trimmed);

    let without_scheme = trimmed
        .strip_prefix("https://")
        .or_else(|| trimmed.strip_prefix("http://"))
        .unwrap_or(trimmed);
    let without_www = without_scheme
        .strip_prefix("www.")
        .unwrap_or(without_scheme);

    let rest = without_www.strip_prefix("github.com/").ok_or_else(invalid)?;

    let segments: Vec<&str> = rest.split('/').collect();
    if segments.iter().any(|s| s.is_empty()) {
        return Err(invalid());
    }

    match segments.as_slice() {
        [owner, repo] => Ok(TargetReference {
            owner: decode_segment(owner).ok_or_else(invalid)?,
            repo: repo_name(repo).ok_or_else(invalid)?,
            path: String::new(),
            is_whole_repo: true,
        }),
        [owner, repo, "tree", branch, path @ ..] => {
            tracing::debug!(branch, "branch segment ignored; default branch is used");
            let path = path
                .iter()
                .map(|segment| decode_segment(segment))
                .collect::<Option<Vec<_>>>()
                .ok_or_else(invalid)?;
            Ok(TargetReference {
                owner: decode_segment(owner).ok_or_else(invalid)?,
                repo: repo_name(repo).ok_or_else(invalid)?,
                path: path.join("/"),
                is_whole_repo: false,
            })
        }
        _ => Err(invalid()),
    }
}

/// Percent-decode one path segment. `None` if it is not UTF-8 once decoded,
/// or decodes to nothing or to something containing `/`.
fn decode_segment(segment: &str) -> Option<String> {
    let decoded = percent_decode_str(segment).decode_utf8().ok()?;
    (!decoded.is_empty() && !decoded.contains('/')).then(|| decoded.into_owned())
}

fn repo_name(segment: &str) -> Option<String> {
    let decoded = decode_segment(segment)?;
    let name = decoded.strip_suffix(".git").unwrap_or(&decoded);
    (!name.is_empty()).then(|| name.to_owned())
}
