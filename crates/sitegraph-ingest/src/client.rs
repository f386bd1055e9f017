//! HTTP client bound to the CMS base URL
//!
//! One configured `reqwest::Client` is shared by the whole run: JSON routes,
//! remote-file downloads, and the startup reachability probe all go through
//! it, so timeout and user-agent settings apply uniformly.

use crate::config::Options;
use crate::error::Result;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// User agent sent with every request.
pub const USER_AGENT: &str = concat!("sitegraph-ingest/", env!("CARGO_PKG_VERSION"));

/// Bytes of a downloaded remote file plus its reported content type.
#[derive(Debug, Clone)]
pub struct RemoteContent {
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
}

/// HTTP client for the CMS API.
pub struct CmsClient {
    client: Client,
    base_url: Url,
}

impl CmsClient {
    /// Create a new client from resolved options.
    pub fn new(options: &Options) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(options.timeout_secs))
            .user_agent(USER_AGENT)
            .build()?;

        Ok(CmsClient {
            client,
            base_url: options.url.clone(),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Build the request URL for a route or node path.
    ///
    /// Routes are appended to the base URL's path (a leading `/` does not
    /// reset to the host root, matching how the CMS publishes node paths
    /// under the API base). Absolute URLs pass through unchanged.
    pub fn url_for(&self, route: &str) -> Result<Url> {
        if route.starts_with("http://") || route.starts_with("https://") {
            return Ok(Url::parse(route)?);
        }
        let base = self.base_url.as_str().trim_end_matches('/');
        Ok(Url::parse(&format!("{}/{}", base, route.trim_start_matches('/')))?)
    }

    /// GET a JSON payload.
    pub async fn get_json(&self, url: &Url) -> std::result::Result<Value, reqwest::Error> {
        debug!(%url, "GET");
        let response = self.client.get(url.clone()).send().await?.error_for_status()?;
        debug!(%url, status = %response.status(), "response");
        response.json().await
    }

    /// GET raw bytes (remote-file downloads).
    pub async fn get_bytes(&self, url: &Url) -> std::result::Result<RemoteContent, reqwest::Error> {
        debug!(%url, "GET (bytes)");
        let response = self.client.get(url.clone()).send().await?.error_for_status()?;
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(String::from);
        let bytes = response.bytes().await?.to_vec();
        Ok(RemoteContent { bytes, content_type })
    }

    /// Probe the base URL for reachability.
    ///
    /// Any HTTP response counts as reachable, including 4xx/5xx; only
    /// transport-level failures (DNS, refused connection, timeout) fail the
    /// probe.
    pub async fn probe(&self) -> bool {
        self.client.get(self.base_url.clone()).send().await.is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RawOptions;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn options_for(base: &str) -> Options {
        RawOptions {
            url: Some(base.to_string()),
            ..RawOptions::default()
        }
        .resolve()
        .unwrap()
    }

    #[test]
    fn url_for_appends_to_base_path() {
        let options = options_for("http://cms.example.com/api/");
        let client = CmsClient::new(&options).unwrap();

        assert_eq!(
            client.url_for("sitemap").unwrap().as_str(),
            "http://cms.example.com/api/sitemap"
        );
        // Node paths keep the base path even with a leading slash.
        assert_eq!(
            client.url_for("/home/about").unwrap().as_str(),
            "http://cms.example.com/api/home/about"
        );
        // Absolute URLs pass through.
        assert_eq!(
            client.url_for("https://cdn.example.com/a.png").unwrap().as_str(),
            "https://cdn.example.com/a.png"
        );
    }

    #[tokio::test]
    async fn get_json_returns_payload() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/sitemap"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ok": true })))
            .mount(&server)
            .await;

        let client = CmsClient::new(&options_for(&server.uri())).unwrap();
        let url = client.url_for("sitemap").unwrap();
        let payload = client.get_json(&url).await.unwrap();

        assert_eq!(payload, json!({ "ok": true }));
    }

    #[tokio::test]
    async fn get_json_fails_on_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/sitemap"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client = CmsClient::new(&options_for(&server.uri())).unwrap();
        let url = client.url_for("sitemap").unwrap();

        assert!(client.get_json(&url).await.is_err());
    }

    #[tokio::test]
    async fn probe_accepts_any_response_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let client = CmsClient::new(&options_for(&server.uri())).unwrap();
        assert!(client.probe().await);
    }

    #[tokio::test]
    async fn probe_fails_on_refused_connection() {
        // Nothing is listening on this port.
        let client = CmsClient::new(&options_for("http://127.0.0.1:9")).unwrap();
        assert!(!client.probe().await);
    }
}
