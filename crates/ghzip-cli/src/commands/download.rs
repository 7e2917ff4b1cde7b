use std::path::Path;

use anyhow::{Result, anyhow};
use ghzip::{DownloadError, DownloadReport, Downloader, SourceError};

use crate::status;

/// Run one download and print its outcome.
pub async fn run(
    downloader: &Downloader,
    url: &str,
    output_dir: &Path,
    verbose: bool,
) -> Result<DownloadReport> {
    status::render(&ghzip::Feedback::info(format!("downloading {url}")));

    let mut on_status = status::stage_printer(verbose);
    let report = downloader
        .download(url, output_dir, &mut on_status)
        .await
        .map_err(describe)?;

    for item in &report.feedback {
        status::render(item);
    }

    Ok(report)
}

/// Turn a pipeline error into the one-line message shown to the user.
fn describe(error: DownloadError) -> anyhow::Error {
    match error {
        DownloadError::Source(SourceError::Auth) => anyhow!(
            "GitHub rejected the access token; run `ghzip reset-token` to enter a new one"
        ),
        DownloadError::Source(SourceError::NotFound(path)) => {
            anyhow!("{path} was not found, or the token cannot see this repository")
        }
        other => anyhow!(other),
    }
}
