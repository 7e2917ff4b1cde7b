use anyhow::{Context, Result};
use ghzip::{CredentialStore, Feedback, TokenPrompt, reset_credential};

use crate::status;

/// Forget the stored token and ask for a new one.
pub fn run(store: &dyn CredentialStore, prompt: &mut dyn TokenPrompt) -> Result<()> {
    reset_credential(store, prompt).context("could not store a new access token")?;

    if std::env::var_os("GITHUB_TOKEN").is_some() {
        status::render(&Feedback::info(
            "note: GITHUB_TOKEN is set and takes precedence over the stored token",
        ));
    }
    status::render(&Feedback::success("access token replaced"));
    Ok(())
}

#[cfg(test)]
mod tests {
    use ghzip::test_support::{MemoryCredentialStore, ScriptedPrompt};

    use super::*;

    #[test]
    fn replaces_stored_token() {
        let store = MemoryCredentialStore::with_token("ghp_old_token_value");
        let mut prompt = ScriptedPrompt::new(vec!["tiny", "ghp_new_token_value"]);

        run(&store, &mut prompt).unwrap();
        assert_eq!(store.token().as_deref(), Some("ghp_new_token_value"));
    }

    #[test]
    fn aborted_prompt_leaves_store_empty() {
        let store = MemoryCredentialStore::with_token("ghp_old_token_value");
        let mut prompt = ScriptedPrompt::new(Vec::<&str>::new());

        assert!(run(&store, &mut prompt).is_err());
        assert!(store.token().is_none());
    }
}
