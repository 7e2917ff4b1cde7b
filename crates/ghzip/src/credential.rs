use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Key under which the token is persisted.
pub const CREDENTIAL_KEY: &str = "github_token";

/// Tokens of this length or shorter are rejected outright.
const MIN_EXCLUSIVE_LEN: usize = 10;

/// Errors that can occur while obtaining or persisting a credential.
#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    #[error("token is too short ({len} characters); expected more than 10")]
    TooShort { len: usize },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("credential file is malformed: {0}")]
    Parse(String),

    #[error("no token was entered")]
    PromptAborted,
}

/// An opaque bearer token.
///
/// Only checked for plausible length; the remote is the judge of validity.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(token: impl Into<String>) -> Result<Self, CredentialError> {
        let token = token.into();
        let token = token.trim();
        let len = token.chars().count();
        if len <= MIN_EXCLUSIVE_LEN {
            return Err(CredentialError::TooShort { len });
        }
        Ok(Self(token.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

/// Persistent home for the access token across sessions.
pub trait CredentialStore: Send + Sync {
    fn load(&self) -> Result<Option<Credential>, CredentialError>;

    fn store(&self, credential: &Credential) -> Result<(), CredentialError>;

    fn clear(&self) -> Result<(), CredentialError>;
}

/// Interactive source of candidate tokens.
pub trait TokenPrompt {
    /// Ask for a token. `Ok(None)` means input was closed.
    fn ask(&mut self) -> Result<Option<String>, CredentialError>;

    /// Called when a candidate was rejected, before asking again.
    fn rejected(&mut self, _reason: &CredentialError) {}
}

/// Resolve the session credential.
///
/// Order: a valid `env_token` (never persisted), then the stored token,
/// then the prompt. Prompted tokens are persisted once accepted.
pub fn obtain_credential(
    store: &dyn CredentialStore,
    env_token: Option<String>,
    prompt: &mut dyn TokenPrompt,
) -> Result<Credential, CredentialError> {
    if let Some(raw) = env_token {
        match Credential::new(raw) {
            Ok(credential) => return Ok(credential),
            Err(e) => tracing::warn!("ignoring token from environment: {e}"),
        }
    }

    if let Some(credential) = store.load()? {
        return Ok(credential);
    }

    prompt_and_store(store, prompt)
}

/// Discard the stored token and run the prompt flow again.
pub fn reset_credential(
    store: &dyn CredentialStore,
    prompt: &mut dyn TokenPrompt,
) -> Result<Credential, CredentialError> {
    store.clear()?;
    tracing::info!("stored credential cleared");
    prompt_and_store(store, prompt)
}

fn prompt_and_store(
    store: &dyn CredentialStore,
    prompt: &mut dyn TokenPrompt,
) -> Result<Credential, CredentialError> {
    loop {
        let Some(raw) = prompt.ask()? else {
            return Err(CredentialError::PromptAborted);
        };

        match Credential::new(raw) {
            Ok(credential) => {
                store.store(&credential)?;
                return Ok(credential);
            }
            Err(e) => prompt.rejected(&e),
        }
    }
}

#[derive(Debug, Default, Deserialize, Serialize)]
struct StoredCredentials {
    github_token: Option<String>,
}

/// Stores the token in a small TOML file, e.g. `~/.config/ghzip/credentials.toml`.
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CredentialStore for FileCredentialStore {
    fn load(&self) -> Result<Option<Credential>, CredentialError> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let stored: StoredCredentials =
            toml::from_str(&contents).map_err(|e| CredentialError::Parse(e.to_string()))?;

        match stored.github_token.map(Credential::new) {
            Some(Ok(credential)) => Ok(Some(credential)),
            Some(Err(e)) => {
                tracing::warn!(path = %self.path.display(), "discarding stored {CREDENTIAL_KEY}: {e}");
                Ok(None)
            }
            None => Ok(None),
        }
    }

    fn store(&self, credential: &Credential) -> Result<(), CredentialError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let stored = StoredCredentials {
            github_token: Some(credential.as_str().to_owned()),
        };
        let contents =
            toml::to_string(&stored).map_err(|e| CredentialError::Parse(e.to_string()))?;
        let mut options = std::fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }
        let mut file = options.open(&self.path)?;

        // `mode` only applies on creation; tighten a file that already existed
        // before the token goes in.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            file.set_permissions(std::fs::Permissions::from_mode(0o600))?;
        }

        file.write_all(contents.as_bytes())?;
        Ok(())
    }

    fn clear(&self) -> Result<(), CredentialError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{MemoryCredentialStore, ScriptedPrompt};

    const GOOD: &str = "ghp_0123456789abcdef";

    #[test]
    fn credential_requires_more_than_ten_chars() {
        assert!(matches!(
            Credential::new("0123456789"),
            Err(CredentialError::TooShort { len: 10 })
        ));
        assert!(Credential::new("0123456789a").is_ok());
    }

    #[test]
    fn credential_is_trimmed() {
        let credential = Credential::new(format!("  {GOOD}\n")).unwrap();
        assert_eq!(credential.as_str(), GOOD);
    }

    #[test]
    fn credential_debug_is_redacted() {
        let credential = Credential::new(GOOD).unwrap();
        assert!(!format!("{credential:?}").contains(GOOD));
    }

    #[test]
    fn stored_token_is_used_without_prompting() {
        let store = MemoryCredentialStore::with_token(GOOD);
        let mut prompt = ScriptedPrompt::new(Vec::<&str>::new());

        let credential = obtain_credential(&store, None, &mut prompt).unwrap();
        assert_eq!(credential.as_str(), GOOD);
        assert_eq!(prompt.asked(), 0);
    }

    #[test]
    fn environment_token_wins_and_is_not_persisted() {
        let store = MemoryCredentialStore::default();
        let mut prompt = ScriptedPrompt::new(Vec::<&str>::new());

        let credential =
            obtain_credential(&store, Some("ghp_from_environment".into()), &mut prompt).unwrap();
        assert_eq!(credential.as_str(), "ghp_from_environment");
        assert!(store.token().is_none());
    }

    #[test]
    fn short_environment_token_falls_through_to_store() {
        let store = MemoryCredentialStore::with_token(GOOD);
        let mut prompt = ScriptedPrompt::new(Vec::<&str>::new());

        let credential = obtain_credential(&store, Some("short".into()), &mut prompt).unwrap();
        assert_eq!(credential.as_str(), GOOD);
    }

    #[test]
    fn short_tokens_are_reprompted_and_not_persisted() {
        let store = MemoryCredentialStore::default();
        let mut prompt = ScriptedPrompt::new(vec!["abc", "0123456789", GOOD]);

        let credential = obtain_credential(&store, None, &mut prompt).unwrap();
        assert_eq!(credential.as_str(), GOOD);
        assert_eq!(prompt.asked(), 3);
        assert_eq!(prompt.rejections(), 2);
        assert_eq!(store.token().as_deref(), Some(GOOD));
        assert_eq!(store.writes(), 1);
    }

    #[test]
    fn closed_input_aborts() {
        let store = MemoryCredentialStore::default();
        let mut prompt = ScriptedPrompt::new(vec!["abc"]);

        let result = obtain_credential(&store, None, &mut prompt);
        assert!(matches!(result, Err(CredentialError::PromptAborted)));
        assert!(store.token().is_none());
    }

    #[test]
    fn reset_clears_and_prompts_again() {
        let store = MemoryCredentialStore::with_token(GOOD);
        let mut prompt = ScriptedPrompt::new(vec!["ghp_replacement_token"]);

        let credential = reset_credential(&store, &mut prompt).unwrap();
        assert_eq!(credential.as_str(), "ghp_replacement_token");
        assert_eq!(store.token().as_deref(), Some("ghp_replacement_token"));
    }

    #[test]
    fn file_store_round_trips_and_clears() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCredentialStore::new(dir.path().join("nested").join("credentials.toml"));

        assert!(store.load().unwrap().is_none());

        store.store(&Credential::new(GOOD).unwrap()).unwrap();
        let contents = std::fs::read_to_string(store.path()).unwrap();
        assert!(contents.contains(CREDENTIAL_KEY));
        assert_eq!(store.load().unwrap().unwrap().as_str(), GOOD);

        store.clear().unwrap();
        assert!(store.load().unwrap().is_none());
        // clearing twice is fine
        store.clear().unwrap();
    }

    #[test]
    fn file_store_ignores_invalid_stored_token() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials.toml");
        std::fs::write(&path, "github_token = \"short\"\n").unwrap();

        let store = FileCredentialStore::new(path);
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn file_store_reports_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials.toml");
        std::fs::write(&path, "github_token = [").unwrap();

        let store = FileCredentialStore::new(path);
        assert!(matches!(store.load(), Err(CredentialError::Parse(_))));
    }

    #[cfg(unix)]
    #[test]
    fn file_store_restricts_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let store = FileCredentialStore::new(dir.path().join("credentials.toml"));
        store.store(&Credential::new(GOOD).unwrap()).unwrap();

        let mode = std::fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[cfg(unix)]
    #[test]
    fn file_store_tightens_existing_readable_file() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials.toml");
        std::fs::write(&path, "github_token = \"ghp_previous_token\"\n").unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o644)).unwrap();

        let store = FileCredentialStore::new(path);
        store.store(&Credential::new(GOOD).unwrap()).unwrap();

        let mode = std::fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
        assert_eq!(store.load().unwrap().unwrap().as_str(), GOOD);
    }
}
