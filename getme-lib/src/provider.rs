use crate::error::Result;
use crate::{appveyor, github, probe};
use reqwest::Client;

/// How a download url must be turned into a directly fetchable url.
/// Classified once, from the shape of the url alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    /// Fetch the url as given.
    Plain,
    /// GitHub release asset; private releases go through the release API.
    GitHubRelease,
    /// Appveyor project artifact; always resolved to a build job url.
    Appveyor,
}

impl Provider {
    pub fn classify(url: &str) -> Provider {
        if github::is_release_url(url) {
            Provider::GitHubRelease
        } else if appveyor::is_artifact_url(url) {
            Provider::Appveyor
        } else {
            Provider::Plain
        }
    }

    /// Returns the url and headers to use for the actual byte transfer.
    /// `probe_client` must have redirects disabled; `client` is used for
    /// provider API calls. A resolution failure is fatal, there is no
    /// fallback to the original url.
    pub async fn resolve(
        self,
        client: &Client,
        probe_client: &Client,
        url: &str,
        headers: Vec<String>,
    ) -> Result<(String, Vec<String>)> {
        match self {
            Provider::Plain => Ok((url.to_string(), headers)),

            Provider::GitHubRelease => {
                tracing::info!("GitHub release url detected");

                let public = probe::is_public(probe_client, url).await;
                github::transfer_target(client, url, headers, public).await
            }

            Provider::Appveyor => {
                tracing::info!("Appveyor url detected");

                let artifact_url = appveyor::artifact_url(client, url, &headers).await?;
                tracing::info!("Appveyor artifact url is: {artifact_url}");
                Ok((artifact_url, headers))
            }
        }
    }
}
