mod commands;
mod config;
mod logging;
mod prompt;
mod status;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use ghzip::{Downloader, Feedback, FileCredentialStore, obtain_credential};
use ghzip_github::{GitHubClient, GitHubClientConfig};

use crate::config::AppConfig;
use crate::prompt::LinePrompt;

#[derive(Parser)]
#[command(name = "ghzip")]
#[command(about = "Download a GitHub repository or directory as a zip archive")]
struct Cli {
    /// Show more detail (-v per-file progress and info logs, -vv debug logs)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Download a repository or directory URL into a zip archive
    Download {
        /// https://github.com/<owner>/<repo> or .../tree/<branch>/<path>
        url: String,
        /// Directory to save the archive in (defaults to the current directory)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// GitHub API base URL (for GitHub Enterprise)
        #[arg(long)]
        api_base_url: Option<String>,
    },
    /// Forget the stored access token and enter a new one
    ResetToken,
}

fn github_token() -> Option<String> {
    std::env::var("GITHUB_TOKEN").ok()
}

fn credential_store() -> Result<FileCredentialStore> {
    let path = config::credentials_path().context("could not determine config directory")?;
    Ok(FileCredentialStore::new(path))
}

async fn run(cli: Cli, app_config: AppConfig) -> Result<()> {
    match cli.command {
        Command::Download {
            url,
            output,
            api_base_url,
        } => {
            let store = credential_store()?;
            let credential = obtain_credential(&store, github_token(), &mut LinePrompt::stdin())
                .context("could not obtain a GitHub access token")?;

            let client = GitHubClient::new(GitHubClientConfig {
                credential,
                api_base_url: app_config.resolve_api_base(api_base_url),
                user_agent: app_config.user_agent.clone(),
            });
            let downloader = Downloader::new(Arc::new(client));
            let output_dir = app_config.resolve_output_dir(output);

            commands::download::run(&downloader, &url, &output_dir, cli.verbose > 0).await?;
            Ok(())
        }
        Command::ResetToken => {
            let store = credential_store()?;
            commands::reset::run(&store, &mut LinePrompt::stdin())
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose);

    let app_config = config::load_config();

    match run(cli, app_config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::debug!("{e:?}");
            status::render(&Feedback::error(format!("{e:#}")));
            ExitCode::FAILURE
        }
    }
}
