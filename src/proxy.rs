//! Reverse proxy driver trait.
//!
//! [`ProxyDriver`] is the capability set the reconciler consumes from a
//! host-routing reverse proxy. One route per domain; the upstream is
//! addressed by container name (resolved inside the project network from the
//! proxy's vantage point) or by IP, at the driver's discretion.

use crate::error::Result;
use async_trait::async_trait;

/// Capability abstraction over a host-routing reverse proxy.
#[async_trait]
pub trait ProxyDriver: Send + Sync {
    /// Upserts the route for `domain` to `upstream_host:port`.
    ///
    /// If a route for the domain already exists it is replaced atomically
    /// from the caller's point of view; otherwise it is appended.
    async fn add_route(&self, domain: &str, upstream_host: &str, port: u16) -> Result<()>;

    /// Removes the route for `domain`. An absent route is success.
    async fn remove_route(&self, domain: &str) -> Result<()>;

    /// Returns true if a route exists for `domain`.
    async fn has_route(&self, domain: &str) -> Result<bool> {
        Ok(self.get_upstream(domain).await?.is_some())
    }

    /// Returns the current upstream address for `domain`, if routed.
    async fn get_upstream(&self, domain: &str) -> Result<Option<String>>;

    /// Forces the proxy to reload its configuration. A no-op for proxies
    /// that apply changes live.
    async fn reload(&self) -> Result<()> {
        Ok(())
    }

    /// Succeeds iff the proxy is reachable and accepting configuration.
    async fn health(&self) -> Result<()>;
}
