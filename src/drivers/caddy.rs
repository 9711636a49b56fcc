//! Caddy proxy driver.
//!
//! Implements [`ProxyDriver`] over the Caddy admin API. Routes live under
//! `/config/apps/http/servers/srv0/routes`: one host-matched terminal route
//! per domain, handled by `reverse_proxy` dialing `upstream:port`. Caddy
//! applies configuration changes live, so `reload` is a no-op.

use crate::constants::{DEFAULT_PROXY_ADMIN_URL, PROXY_HTTP_TIMEOUT};
use crate::error::{Error, Result};
use crate::proxy::ProxyDriver;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::debug;

const ROUTES_PATH: &str = "/config/apps/http/servers/srv0/routes";

// =============================================================================
// Route Model
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RouteConfig {
    #[serde(default)]
    r#match: Vec<MatchConfig>,
    #[serde(default)]
    handle: Vec<HandleConfig>,
    #[serde(default)]
    terminal: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct MatchConfig {
    #[serde(default)]
    host: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct HandleConfig {
    handler: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    upstreams: Vec<Upstream>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Upstream {
    dial: String,
}

impl RouteConfig {
    fn reverse_proxy(domain: &str, upstream_host: &str, port: u16) -> Self {
        Self {
            r#match: vec![MatchConfig {
                host: vec![domain.to_string()],
            }],
            handle: vec![HandleConfig {
                handler: "reverse_proxy".to_string(),
                upstreams: vec![Upstream {
                    dial: format!("{upstream_host}:{port}"),
                }],
            }],
            terminal: true,
        }
    }

    fn matches_domain(&self, domain: &str) -> bool {
        self.r#match
            .iter()
            .any(|m| m.host.iter().any(|h| h == domain))
    }

    fn upstream(&self) -> Option<&str> {
        self.handle
            .first()
            .and_then(|h| h.upstreams.first())
            .map(|u| u.dial.as_str())
    }
}

// =============================================================================
// Caddy Proxy
// =============================================================================

/// Reverse proxy driver backed by the Caddy admin API.
pub struct CaddyProxy {
    admin_url: String,
    client: Client,
}

impl CaddyProxy {
    /// Creates a driver against an admin endpoint. An empty URL selects the
    /// default `http://localhost:2019`.
    pub fn new(admin_url: &str) -> Result<Self> {
        let admin_url = if admin_url.is_empty() {
            DEFAULT_PROXY_ADMIN_URL.to_string()
        } else {
            admin_url.trim_end_matches('/').to_string()
        };
        let client = Client::builder()
            .timeout(PROXY_HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::Proxy(e.to_string()))?;
        Ok(Self { admin_url, client })
    }

    fn routes_url(&self) -> String {
        format!("{}{ROUTES_PATH}", self.admin_url)
    }

    /// Fetches the current route list. A 404 means the server block does not
    /// exist yet, which reads as "no routes".
    async fn fetch_routes(&self) -> Result<Vec<RouteConfig>> {
        let response = self
            .client
            .get(self.routes_url())
            .send()
            .await
            .map_err(|e| Error::Proxy(e.to_string()))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(Vec::new());
        }
        if response.status().is_client_error() || response.status().is_server_error() {
            return Err(Error::Proxy(format!(
                "admin API returned {}",
                response.status()
            )));
        }

        response
            .json::<Option<Vec<RouteConfig>>>()
            .await
            .map(Option::unwrap_or_default)
            .map_err(|e| Error::Proxy(format!("cannot parse routes: {e}")))
    }

    async fn check_status(response: reqwest::Response) -> Result<()> {
        let status = response.status();
        if status.is_client_error() || status.is_server_error() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Proxy(format!("admin API returned {status}: {body}")));
        }
        Ok(())
    }
}

#[async_trait]
impl ProxyDriver for CaddyProxy {
    async fn add_route(&self, domain: &str, upstream_host: &str, port: u16) -> Result<()> {
        let route = RouteConfig::reverse_proxy(domain, upstream_host, port);
        let routes = self.fetch_routes().await?;

        // Upsert: replace the existing route for this domain in place,
        // append otherwise.
        let request = match routes.iter().position(|r| r.matches_domain(domain)) {
            Some(index) => {
                debug!(domain, index, "replacing existing route");
                self.client
                    .patch(format!("{}/{index}", self.routes_url()))
                    .json(&route)
            }
            None => {
                debug!(domain, "appending new route");
                self.client.post(self.routes_url()).json(&route)
            }
        };

        let response = request
            .send()
            .await
            .map_err(|e| Error::Proxy(e.to_string()))?;
        Self::check_status(response).await
    }

    async fn remove_route(&self, domain: &str) -> Result<()> {
        let routes = self.fetch_routes().await?;
        let Some(index) = routes.iter().position(|r| r.matches_domain(domain)) else {
            return Ok(());
        };

        let response = self
            .client
            .delete(format!("{}/{index}", self.routes_url()))
            .send()
            .await
            .map_err(|e| Error::Proxy(e.to_string()))?;
        Self::check_status(response).await
    }

    async fn get_upstream(&self, domain: &str) -> Result<Option<String>> {
        let routes = self.fetch_routes().await?;
        Ok(routes
            .iter()
            .find(|r| r.matches_domain(domain))
            .and_then(|r| r.upstream())
            .map(String::from))
    }

    async fn health(&self) -> Result<()> {
        let response = self
            .client
            .get(format!("{}/config/", self.admin_url))
            .send()
            .await
            .map_err(|e| Error::Proxy(format!("admin endpoint not reachable: {e}")))?;
        Self::check_status(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_json_shape() {
        let route = RouteConfig::reverse_proxy("api.example.com", "berth-api-1a2b3c4d", 8080);
        let json = serde_json::to_value(&route).unwrap();
        assert_eq!(json["match"][0]["host"][0], "api.example.com");
        assert_eq!(json["handle"][0]["handler"], "reverse_proxy");
        assert_eq!(json["handle"][0]["upstreams"][0]["dial"], "berth-api-1a2b3c4d:8080");
        assert_eq!(json["terminal"], true);
    }

    #[test]
    fn test_route_domain_matching() {
        let route = RouteConfig::reverse_proxy("api.example.com", "upstream", 80);
        assert!(route.matches_domain("api.example.com"));
        assert!(!route.matches_domain("other.example.com"));
        assert_eq!(route.upstream(), Some("upstream:80"));
    }

    #[test]
    fn test_routes_roundtrip() {
        let raw = r#"[{"match":[{"host":["a.example.com"]}],
                      "handle":[{"handler":"reverse_proxy","upstreams":[{"dial":"a:80"}]}],
                      "terminal":true}]"#;
        let routes: Vec<RouteConfig> = serde_json::from_str(raw).unwrap();
        assert_eq!(routes.len(), 1);
        assert!(routes[0].matches_domain("a.example.com"));
    }
}
