use crate::error::{DownloadError, Result};
use crate::logging::progress_bar_style;
use crate::provider::Provider;
use crate::{headers, s3};
use futures_util::StreamExt;
use reqwest::redirect::Policy;
use reqwest::{Client, Url};
use std::fs;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::instrument;
use tracing_indicatif::span_ext::IndicatifSpanExt;

const USER_AGENT: &str = "getme/0.3.0";

/// Per-download configuration. Built once by the caller, never mutated.
#[derive(Debug, Clone, Default)]
pub struct Options {
    /// Bearer token for private GitHub releases and Appveyor artifacts
    pub auth_token: Option<String>,

    /// Credentials for s3:// urls
    pub s3_access_key: Option<String>,
    pub s3_secret_key: Option<String>,
}

pub struct Downloader {
    client: Client,
    probe_client: Client,
    options: Options,
}

impl Downloader {
    pub fn new(options: Options) -> Self {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .expect("Failed to create HTTP client");

        // Visibility probes must see the first response unfollowed.
        let probe_client = Client::builder()
            .user_agent(USER_AGENT)
            .redirect(Policy::none())
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            probe_client,
            options,
        }
    }

    /// Downloads `raw_url` to `destination`.
    ///
    /// The body is streamed to a `.tmp` sibling first and renamed into place
    /// once complete, so readers of `destination` only ever see a complete
    /// old file or a complete new file. On failure the destination is left in
    /// its prior state.
    pub async fn download(&self, raw_url: &str, destination: &Path) -> Result<()> {
        let url = Url::parse(raw_url)
            .map_err(|_| DownloadError::InvalidLocator(raw_url.to_string()))?;

        if url.scheme() == "s3" {
            return s3::download(&url, destination, &self.options).await;
        }

        self.download_http(raw_url, destination).await
    }

    async fn download_http(&self, url: &str, destination: &Path) -> Result<()> {
        let header_entries = headers::default_headers(&self.options);
        let (actual_url, actual_headers) = Provider::classify(url)
            .resolve(&self.client, &self.probe_client, url, header_entries)
            .await?;

        let tmp = tmp_path(destination);
        self.fetch_url(&actual_url, &tmp, &actual_headers).await?;

        if destination.exists() {
            fs::remove_file(destination)?;
        }
        promote(&tmp, destination)
    }

    #[instrument(skip_all)]
    async fn fetch_url(&self, url: &str, destination: &Path, entries: &[String]) -> Result<()> {
        let request = headers::apply(entries, self.client.get(url))?;
        let response = request
            .send()
            .await
            .map_err(|e| DownloadError::Transfer(format!("GET {url}: {e}")))?;

        if response.status().as_u16() >= 400 {
            return Err(DownloadError::Transfer(response.status().to_string()));
        }

        let current_span = tracing::Span::current();
        if let Ok(style) = progress_bar_style() {
            current_span.pb_set_style(&style);
        }
        if let Some(length) = response.content_length() {
            current_span.pb_set_length(length);
        }

        let mut file = tokio::fs::File::create(destination).await?;
        let mut downloaded = 0u64;
        let mut stream = response.bytes_stream();

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| DownloadError::Transfer(e.to_string()))?;
            file.write_all(&chunk).await?;
            downloaded += chunk.len() as u64;
            current_span.pb_set_position(downloaded);
        }

        file.flush().await?;
        Ok(())
    }
}

pub(crate) fn tmp_path(destination: &Path) -> PathBuf {
    let mut path = destination.as_os_str().to_owned();
    path.push(".tmp");
    PathBuf::from(path)
}

/// Renames a fully written temp file onto the destination. Atomic on the
/// usual filesystems as long as both live in the same directory.
pub(crate) fn promote(tmp: &Path, destination: &Path) -> Result<()> {
    fs::rename(tmp, destination)?;
    Ok(())
}
