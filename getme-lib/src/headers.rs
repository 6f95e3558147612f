use crate::download::Options;
use crate::error::{DownloadError, Result};
use reqwest::RequestBuilder;
use reqwest::header::{HeaderName, HeaderValue};

/// Builds the default header list for a download.
/// An auth token becomes a bearer `Authorization` header; no token, no headers.
pub fn default_headers(options: &Options) -> Vec<String> {
    match &options.auth_token {
        Some(token) => vec![format!("Authorization=Bearer {token}")],
        None => Vec::new(),
    }
}

/// Applies `Name=Value` header entries to an outbound request, in order.
pub fn apply(headers: &[String], mut request: RequestBuilder) -> Result<RequestBuilder> {
    for entry in headers {
        let (name, value) = entry
            .split_once('=')
            .ok_or_else(|| DownloadError::InvalidHeader(entry.clone()))?;
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| DownloadError::InvalidHeader(entry.clone()))?;
        let value = HeaderValue::from_str(value)
            .map_err(|_| DownloadError::InvalidHeader(entry.clone()))?;
        request = request.header(name, value);
    }
    Ok(request)
}
