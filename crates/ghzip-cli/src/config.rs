use std::path::PathBuf;

use serde::{Deserialize, Serialize};

const APP_DIR: &str = "ghzip";

/// Optional settings read from `~/.config/ghzip/config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct AppConfig {
    /// Base URL of the GitHub REST API (GitHub Enterprise hosts differ).
    pub api_base_url: Option<String>,
    /// Where archives are saved when `--output` is not given.
    pub output_dir: Option<PathBuf>,
    pub user_agent: Option<String>,
}

impl AppConfig {
    /// Output directory after applying the command-line override.
    pub fn resolve_output_dir(&self, flag: Option<PathBuf>) -> PathBuf {
        flag.or_else(|| self.output_dir.clone())
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// API base URL after applying the command-line override.
    pub fn resolve_api_base(&self, flag: Option<String>) -> Option<String> {
        flag.or_else(|| self.api_base_url.clone())
    }
}

fn app_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(APP_DIR))
}

/// Config file path: `~/.config/ghzip/config.toml`
pub fn config_path() -> Option<PathBuf> {
    app_dir().map(|d| d.join("config.toml"))
}

/// Credential file path: `~/.config/ghzip/credentials.toml`
pub fn credentials_path() -> Option<PathBuf> {
    app_dir().map(|d| d.join("credentials.toml"))
}

/// Load config from file, falling back to defaults if missing.
pub fn load_config() -> AppConfig {
    if let Some(path) = config_path()
        && let Ok(contents) = std::fs::read_to_string(&path)
    {
        return parse_config(&contents).unwrap_or_else(|e| {
            tracing::warn!(
                "failed to parse config at {}, using defaults: {e}",
                path.display()
            );
            AppConfig::default()
        });
    }

    AppConfig::default()
}

fn parse_config(contents: &str) -> Result<AppConfig, toml::de::Error> {
    toml::from_str(contents)
}
