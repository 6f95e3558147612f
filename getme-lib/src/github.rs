use crate::error::{DownloadError, Result};
use crate::headers;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use serde::Deserialize;

const GITHUB_API: &str = "https://api.github.com";

/// Matches browser download urls of published release assets, e.g.
/// `https://github.com/dgageot/getme/releases/download/v1.0.0/getme.tar.gz`
static RELEASE_URL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^https://github\.com/([^/]+)/([^/]+)/releases/download/([^/]+)/([^/]+)$")
        .expect("Invalid GitHub release url regex")
});

/// Matches the GitHub API JSON response for a single release
#[derive(Debug, Clone, Deserialize)]
struct ReleaseJson {
    assets: Vec<AssetJson>,
}

/// Matches the GitHub API JSON response for a single release asset
#[derive(Debug, Clone, Deserialize)]
struct AssetJson {
    name: String,
    url: String,
}

pub fn is_release_url(url: &str) -> bool {
    RELEASE_URL.is_match(url)
}

/// Returns the url and headers to use for the byte transfer of a release
/// asset. Public releases are fetched as given; private ones are resolved
/// through the release API to the asset's API url, which can be fetched with
/// credentials.
pub async fn transfer_target(
    client: &Client,
    url: &str,
    headers: Vec<String>,
    public: bool,
) -> Result<(String, Vec<String>)> {
    transfer_target_at(client, GITHUB_API, url, headers, public).await
}

async fn transfer_target_at(
    client: &Client,
    api_base: &str,
    url: &str,
    mut headers: Vec<String>,
    public: bool,
) -> Result<(String, Vec<String>)> {
    if public {
        tracing::info!("GitHub release is public");
        return Ok((url.to_string(), headers));
    }

    tracing::info!("GitHub release is private");
    let asset_url = asset_url_at(client, api_base, url, &headers).await?;
    tracing::info!("GitHub asset url is: {asset_url}");

    // The asset endpoint answers JSON unless asked for the binary.
    headers.push("Accept=application/octet-stream".to_string());
    Ok((asset_url, headers))
}

async fn asset_url_at(
    client: &Client,
    api_base: &str,
    url: &str,
    headers: &[String],
) -> Result<String> {
    let captures = RELEASE_URL
        .captures(url)
        .ok_or_else(|| resolution_error(format!("'{url}' is not a release download url")))?;
    let (owner, repo, tag, file) = (&captures[1], &captures[2], &captures[3], &captures[4]);

    let release_url = format!("{api_base}/repos/{owner}/{repo}/releases/tags/{tag}");
    let request = headers::apply(headers, client.get(&release_url))?;
    let response = request
        .send()
        .await
        .map_err(|e| resolution_error(e.to_string()))?;

    if !response.status().is_success() {
        return Err(resolution_error(format!(
            "GitHub API answered {} for {release_url}",
            response.status()
        )));
    }

    let release: ReleaseJson = response
        .json()
        .await
        .map_err(|e| resolution_error(e.to_string()))?;

    release
        .assets
        .into_iter()
        .find(|asset| asset.name == file)
        .map(|asset| asset.url)
        .ok_or_else(|| resolution_error(format!("release {tag} has no asset named '{file}'")))
}

fn resolution_error(reason: String) -> DownloadError {
    DownloadError::Resolution {
        provider: "GitHub",
        reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RELEASE_ASSET_URL: &str =
        "https://github.com/dgageot/getme/releases/download/v1.0.0/getme.tar.gz";

    #[test]
    fn test_recognizes_release_urls() {
        assert!(is_release_url(RELEASE_ASSET_URL));
        assert!(!is_release_url("https://github.com/dgageot/getme"));
        assert!(!is_release_url(
            "https://github.com/dgageot/getme/releases/tag/v1.0.0"
        ));
        assert!(!is_release_url("https://example.com/getme.tar.gz"));
    }

    #[tokio::test]
    async fn test_resolves_asset_by_name() {
        use httpmock::prelude::*;

        let server = MockServer::start_async().await;
        let release = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/repos/dgageot/getme/releases/tags/v1.0.0")
                    .header("Authorization", "Bearer s3cret");
                then.status(200).json_body(serde_json::json!({
                    "tag_name": "v1.0.0",
                    "assets": [
                        {"name": "other.zip", "url": "https://api.github.com/assets/1"},
                        {"name": "getme.tar.gz", "url": "https://api.github.com/assets/2"},
                    ]
                }));
            })
            .await;

        let headers = vec!["Authorization=Bearer s3cret".to_string()];
        let url = asset_url_at(
            &Client::new(),
            &server.base_url(),
            RELEASE_ASSET_URL,
            &headers,
        )
        .await
        .unwrap();

        release.assert_async().await;
        assert_eq!(url, "https://api.github.com/assets/2");
    }

    #[tokio::test]
    async fn test_public_release_never_calls_the_api() {
        use httpmock::prelude::*;

        let server = MockServer::start_async().await;
        let release = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/repos/dgageot/getme/releases/tags/v1.0.0");
                then.status(200)
                    .json_body(serde_json::json!({"tag_name": "v1.0.0", "assets": []}));
            })
            .await;

        let headers = vec!["Authorization=Bearer s3cret".to_string()];
        let (url, resolved_headers) = transfer_target_at(
            &Client::new(),
            &server.base_url(),
            RELEASE_ASSET_URL,
            headers.clone(),
            true,
        )
        .await
        .unwrap();

        release.assert_hits_async(0).await;
        assert_eq!(url, RELEASE_ASSET_URL);
        assert_eq!(resolved_headers, headers);
    }

    #[tokio::test]
    async fn test_private_release_resolves_once_and_adds_accept_header() {
        use httpmock::prelude::*;

        let server = MockServer::start_async().await;
        let release = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/repos/dgageot/getme/releases/tags/v1.0.0")
                    .header("Authorization", "Bearer s3cret");
                then.status(200).json_body(serde_json::json!({
                    "tag_name": "v1.0.0",
                    "assets": [
                        {"name": "getme.tar.gz", "url": "https://api.github.com/assets/2"},
                    ]
                }));
            })
            .await;

        let headers = vec!["Authorization=Bearer s3cret".to_string()];
        let (url, resolved_headers) = transfer_target_at(
            &Client::new(),
            &server.base_url(),
            RELEASE_ASSET_URL,
            headers,
            false,
        )
        .await
        .unwrap();

        release.assert_async().await;
        assert_eq!(url, "https://api.github.com/assets/2");
        assert_eq!(
            resolved_headers,
            vec![
                "Authorization=Bearer s3cret".to_string(),
                "Accept=application/octet-stream".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_missing_asset_is_a_resolution_failure() {
        use httpmock::prelude::*;

        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/repos/dgageot/getme/releases/tags/v1.0.0");
                then.status(200)
                    .json_body(serde_json::json!({"tag_name": "v1.0.0", "assets": []}));
            })
            .await;

        let err = asset_url_at(&Client::new(), &server.base_url(), RELEASE_ASSET_URL, &[])
            .await
            .unwrap_err();
        assert!(matches!(err, DownloadError::Resolution { provider: "GitHub", .. }));
    }

    #[tokio::test]
    async fn test_api_error_status_is_a_resolution_failure() {
        use httpmock::prelude::*;

        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/repos/dgageot/getme/releases/tags/v1.0.0");
                then.status(404);
            })
            .await;

        let err = asset_url_at(&Client::new(), &server.base_url(), RELEASE_ASSET_URL, &[])
            .await
            .unwrap_err();
        assert!(matches!(err, DownloadError::Resolution { .. }));
    }
}
