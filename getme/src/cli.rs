use crate::ui;
use anyhow::{Context, Result, bail};
use clap::Parser;
use getme_lib::{Downloader, Options};
use reqwest::Url;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "getme")]
#[command(about = "Download files from HTTP, GitHub releases, Appveyor artifacts and S3")]
#[command(version)]
pub struct Cli {
    /// Url to download: https://, s3://, a GitHub release download url
    /// or an Appveyor project artifact url
    pub url: String,

    /// Destination file (defaults to the url's file name)
    pub destination: Option<PathBuf>,

    /// Bearer token for private GitHub releases and Appveyor artifacts
    #[arg(long)]
    pub auth_token: Option<String>,

    /// Access key for s3:// urls
    #[arg(long)]
    pub s3_access_key: Option<String>,

    /// Secret key for s3:// urls
    #[arg(long)]
    pub s3_secret_key: Option<String>,
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        let destination = match self.destination {
            Some(destination) => destination,
            None => default_destination(&self.url)?,
        };

        let options = Options {
            auth_token: self.auth_token,
            s3_access_key: self.s3_access_key,
            s3_secret_key: self.s3_secret_key,
        };

        Downloader::new(options)
            .download(&self.url, &destination)
            .await
            .context(format!("Failed to download {}", self.url))?;

        ui::success(&format!("Downloaded to {}", destination.display()));
        Ok(())
    }
}

/// The url's last path segment, when there is one to name the file after.
fn default_destination(url: &str) -> Result<PathBuf> {
    let parsed = Url::parse(url).context(format!("Invalid url: {url}"))?;

    let name = parsed
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .filter(|segment| !segment.is_empty())
        .map(str::to_string);

    match name {
        Some(name) => Ok(PathBuf::from(name)),
        None => bail!("Cannot guess a file name from {url}, pass a destination"),
    }
}
