//! Label badges rendered by a remote image service.
//!
//! Plugin pages carry small SVG badges (current version, author). The SVG text
//! comes from a static-badge endpoint such as shields.io and is cached on disk
//! so repeated builds do not hit the network.

use std::time::Duration;

use reqwest::Client;
use sha2::{Digest, Sha256};
use tracing::{debug, instrument};
use url::Url;

use plugindoc_shared::{BadgesConfig, PackageManifest, PluginDocError, Result};
use plugindoc_storage::Cache;

/// Cache operation name for badge images.
pub const BADGE_OPERATION: &str = "badge";

/// User-Agent string for badge requests.
const USER_AGENT: &str = concat!("plugindoc/", env!("CARGO_PKG_VERSION"));

// ---------------------------------------------------------------------------
// Badge
// ---------------------------------------------------------------------------

/// A label/message pair to render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Badge {
    pub label: String,
    pub message: String,
}

impl Badge {
    pub fn new(label: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            message: message.into(),
        }
    }
}

/// The badges shown in a plugin's metadata line.
pub fn plugin_badges(manifest: &PackageManifest) -> Result<Vec<Badge>> {
    let mut badges = vec![Badge::new("Current version", manifest.require_version()?)];
    if let Some(author) = manifest.author_name() {
        badges.push(Badge::new("Author", author));
    }
    Ok(badges)
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// HTTP client for the badge endpoint.
#[derive(Debug, Clone)]
pub struct BadgeClient {
    client: Client,
    endpoint: Url,
    color: String,
    style: String,
}

impl BadgeClient {
    /// Build a client from the `[badges]` config section.
    pub fn new(config: &BadgesConfig) -> Result<Self> {
        let endpoint = Url::parse(&config.endpoint).map_err(|e| {
            PluginDocError::config(format!("invalid badge endpoint '{}': {e}", config.endpoint))
        })?;

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| PluginDocError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint,
            color: config.color.clone(),
            style: config.style.clone(),
        })
    }

    /// Request URL for a badge.
    pub fn badge_url(&self, badge: &Badge) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("label", &badge.label)
            .append_pair("message", &badge.message)
            .append_pair("color", &self.color)
            .append_pair("style", &self.style);
        url
    }

    /// Fetch the SVG text for a badge. Network failures are returned as-is.
    #[instrument(skip(self), fields(label = %badge.label))]
    pub async fn fetch_svg(&self, badge: &Badge) -> Result<String> {
        let url = self.badge_url(badge);
        debug!(%url, "fetching badge");

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| PluginDocError::Network(format!("{url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(PluginDocError::Network(format!("{url}: HTTP {status}")));
        }

        let body = response
            .text()
            .await
            .map_err(|e| PluginDocError::Network(format!("{url}: failed to read body: {e}")))?;

        if !body.trim_start().starts_with("<svg") {
            return Err(PluginDocError::validation(format!(
                "{url}: response is not an SVG image"
            )));
        }

        Ok(body)
    }

    /// Key identifying this client's rendering settings.
    fn settings_hash(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.endpoint.as_str().as_bytes());
        hasher.update(b"|");
        hasher.update(self.color.as_bytes());
        hasher.update(b"|");
        hasher.update(self.style.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    /// Fetch a badge through the cache.
    pub async fn cached_svg(&self, cache: &Cache, badge: &Badge, ttl: Duration) -> Result<String> {
        let subject = format!("{}: {}", badge.label, badge.message);
        let hash = self.settings_hash();

        if let Some(svg) = cache.get(BADGE_OPERATION, &subject, &hash).await? {
            debug!(%subject, "badge cache hit");
            return Ok(svg);
        }

        let svg = self.fetch_svg(badge).await?;
        cache.set(BADGE_OPERATION, &subject, &hash, &svg, ttl).await?;
        Ok(svg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const SVG: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" width="120" height="20"></svg>"#;

    fn client_for(server: &MockServer) -> BadgeClient {
        let config = BadgesConfig {
            endpoint: format!("{}/static/v1", server.uri()),
            ..BadgesConfig::default()
        };
        BadgeClient::new(&config).unwrap()
    }

    #[test]
    fn badge_url_encodes_query() {
        let client = BadgeClient::new(&BadgesConfig::default()).unwrap();
        let url = client.badge_url(&Badge::new("Current version", "2.0.0"));
        assert_eq!(url.host_str(), Some("img.shields.io"));
        let query = url.query().unwrap();
        assert!(query.contains("label=Current+version"));
        assert!(query.contains("message=2.0.0"));
        assert!(query.contains("color=4cae4f"));
        assert!(query.contains("style=flat-square"));
    }

    #[test]
    fn invalid_endpoint_is_config_error() {
        let config = BadgesConfig {
            endpoint: "not a url".into(),
            ..BadgesConfig::default()
        };
        assert!(matches!(
            BadgeClient::new(&config),
            Err(PluginDocError::Config { .. })
        ));
    }

    #[test]
    fn badges_from_manifest() {
        let manifest: PackageManifest =
            serde_json::from_str(r#"{"version": "1.1.3", "author": "Josh de Leeuw"}"#).unwrap();
        let badges = plugin_badges(&manifest).unwrap();
        assert_eq!(
            badges,
            vec![
                Badge::new("Current version", "1.1.3"),
                Badge::new("Author", "Josh de Leeuw")
            ]
        );

        let no_version = PackageManifest::default();
        assert!(plugin_badges(&no_version).is_err());
    }

    #[tokio::test]
    async fn fetch_svg_from_mock_server() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/static/v1"))
            .and(query_param("label", "Author"))
            .and(query_param("message", "Josh de Leeuw"))
            .respond_with(ResponseTemplate::new(200).set_body_string(SVG))
            .mount(&server)
            .await;

        let svg = client_for(&server)
            .fetch_svg(&Badge::new("Author", "Josh de Leeuw"))
            .await
            .unwrap();
        assert_eq!(svg, SVG);
    }

    #[tokio::test]
    async fn http_error_is_network_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .fetch_svg(&Badge::new("Current version", "1.0.0"))
            .await
            .unwrap_err();
        assert!(matches!(err, PluginDocError::Network(_)));
    }

    #[tokio::test]
    async fn non_svg_body_is_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>rate limited</html>"))
            .mount(&server)
            .await;

        let err = client_for(&server)
            .fetch_svg(&Badge::new("Current version", "1.0.0"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("not an SVG"));
    }

    #[tokio::test]
    async fn cached_svg_hits_network_once() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(SVG))
            .expect(1)
            .mount(&server)
            .await;

        let cache = Cache::open_in_memory().await.unwrap();
        let client = client_for(&server);
        let badge = Badge::new("Current version", "2.0.0");
        let ttl = Duration::from_secs(60);

        let first = client.cached_svg(&cache, &badge, ttl).await.unwrap();
        let second = client.cached_svg(&cache, &badge, ttl).await.unwrap();
        assert_eq!(first, second);
        // MockServer verifies `.expect(1)` on drop.
    }
}
