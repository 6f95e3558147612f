use reqwest::Client;

/// Checks whether a url can be fetched without provider-side resolution.
///
/// Issues a single HEAD request; the first response is decisive, so `client`
/// must be built with redirects disabled. GitHub answers an immediate error
/// status for release assets that require authentication, while public assets
/// answer a redirect or a success that we never need to follow.
///
/// Any failure to build or execute the probe counts as "not public": when in
/// doubt, assume access control applies and let the resolver take over.
pub async fn is_public(client: &Client, url: &str) -> bool {
    match client.head(url).send().await {
        Ok(response) => response.status().as_u16() < 400,
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use httpmock::Method::HEAD;
    use reqwest::redirect::Policy;

    fn probe_client() -> Client {
        Client::builder().redirect(Policy::none()).build().unwrap()
    }

    #[tokio::test]
    async fn test_success_is_public() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(HEAD).path("/asset");
                then.status(200);
            })
            .await;

        assert!(is_public(&probe_client(), &server.url("/asset")).await);
    }

    #[tokio::test]
    async fn test_not_found_is_private() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(HEAD).path("/asset");
                then.status(404);
            })
            .await;

        assert!(!is_public(&probe_client(), &server.url("/asset")).await);
    }

    #[tokio::test]
    async fn test_redirect_is_public_and_not_followed() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(HEAD).path("/asset");
                then.status(302)
                    .header("Location", server.url("/poisoned"));
            })
            .await;
        let poisoned = server
            .mock_async(|when, then| {
                when.method(HEAD).path("/poisoned");
                then.status(500);
            })
            .await;

        assert!(is_public(&probe_client(), &server.url("/asset")).await);
        poisoned.assert_hits_async(0).await;
    }

    #[tokio::test]
    async fn test_unreachable_server_is_private() {
        // Nothing listens on this port.
        assert!(!is_public(&probe_client(), "http://127.0.0.1:1/asset").await);
    }
}
