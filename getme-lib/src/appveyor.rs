use crate::error::{DownloadError, Result};
use crate::headers;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use serde::Deserialize;

const APPVEYOR_API: &str = "https://ci.appveyor.com";

/// Matches project artifact urls, e.g.
/// `https://ci.appveyor.com/api/projects/dgageot/getme/artifacts/getme.zip`
static ARTIFACT_URL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^https://ci\.appveyor\.com/api/projects/([^/]+)/([^/]+)/artifacts/(.+)$")
        .expect("Invalid Appveyor artifact url regex")
});

/// Matches the Appveyor API JSON response for a project's last build
#[derive(Debug, Clone, Deserialize)]
struct ProjectJson {
    build: BuildJson,
}

#[derive(Debug, Clone, Deserialize)]
struct BuildJson {
    jobs: Vec<JobJson>,
}

#[derive(Debug, Clone, Deserialize)]
struct JobJson {
    #[serde(rename = "jobId")]
    job_id: String,
}

pub fn is_artifact_url(url: &str) -> bool {
    ARTIFACT_URL.is_match(url)
}

/// Resolves a project artifact url to the artifact of the last build's first
/// job. Project artifact urls are not directly fetchable; job urls are.
pub async fn artifact_url(client: &Client, url: &str, headers: &[String]) -> Result<String> {
    artifact_url_at(client, APPVEYOR_API, url, headers).await
}

async fn artifact_url_at(
    client: &Client,
    api_base: &str,
    url: &str,
    headers: &[String],
) -> Result<String> {
    let captures = ARTIFACT_URL
        .captures(url)
        .ok_or_else(|| resolution_error(format!("'{url}' is not a project artifact url")))?;
    let (account, project, artifact) = (&captures[1], &captures[2], &captures[3]);

    let project_url = format!("{api_base}/api/projects/{account}/{project}");
    let request = headers::apply(headers, client.get(&project_url))?;
    let response = request
        .send()
        .await
        .map_err(|e| resolution_error(e.to_string()))?;

    if !response.status().is_success() {
        return Err(resolution_error(format!(
            "Appveyor API answered {} for {project_url}",
            response.status()
        )));
    }

    let project: ProjectJson = response
        .json()
        .await
        .map_err(|e| resolution_error(e.to_string()))?;

    let job = project
        .build
        .jobs
        .first()
        .ok_or_else(|| resolution_error("last build has no jobs".to_string()))?;

    Ok(format!(
        "{api_base}/api/buildjobs/{}/artifacts/{artifact}",
        job.job_id
    ))
}

fn resolution_error(reason: String) -> DownloadError {
    DownloadError::Resolution {
        provider: "Appveyor",
        reason,
    }
}
