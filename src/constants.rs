//! Constants for the orchestration core.
//!
//! All timeouts, limits, and defaults are defined here to ensure
//! consistency and prevent magic numbers throughout the codebase.

use std::time::Duration;

// =============================================================================
// Deploy Timeouts
// =============================================================================

/// How long a new container may take to report healthy before the deploy is
/// rolled back.
pub const HEALTH_GATE_TIMEOUT: Duration = Duration::from_secs(60);

/// Poll cadence while waiting on the health gate.
pub const HEALTH_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Graceful stop window for a container being rolled back after a failed
/// health gate.
pub const ROLLBACK_STOP_TIMEOUT: Duration = Duration::from_secs(10);

/// Graceful stop window when retiring a superseded container or tearing a
/// project down.
pub const RETIRE_STOP_TIMEOUT: Duration = Duration::from_secs(30);

// =============================================================================
// Networking Defaults
// =============================================================================

/// Internal container port used when the intent declares port 0.
pub const DEFAULT_INTERNAL_PORT: u16 = 80;

/// Default admin endpoint of the Caddy reverse proxy.
pub const DEFAULT_PROXY_ADMIN_URL: &str = "http://localhost:2019";

/// Timeout for individual proxy admin API requests.
pub const PROXY_HTTP_TIMEOUT: Duration = Duration::from_secs(10);

// =============================================================================
// Intent Document
// =============================================================================

/// Default intent file name, looked up when a directory is given.
pub const DEFAULT_INTENT_FILE: &str = "berth.json";

/// Maximum size of an intent document in bytes (1 MiB).
/// Prevents accidental parsing of arbitrarily large files.
pub const MAX_INTENT_SIZE: usize = 1024 * 1024;

/// Maximum image reference length (bytes).
pub const MAX_ORIGIN_LEN: usize = 512;

// =============================================================================
// Naming
// =============================================================================

/// Number of version hash characters embedded in container names and shown
/// to users.
pub const SHORT_VERSION_LEN: usize = 8;

/// Prefix for deterministic container names: `berth-<project>-<ver8>`.
pub const CONTAINER_NAME_PREFIX: &str = "berth";

/// Format of per-project bridge network names: `berth-<project>-net`.
pub const NETWORK_NAME_SUFFIX: &str = "net";

/// Returns the deterministic container name for a project and version.
pub fn container_name(project: &str, version: &str) -> String {
    let short = &version[..version.len().min(SHORT_VERSION_LEN)];
    format!("{CONTAINER_NAME_PREFIX}-{project}-{short}")
}

/// Returns the deterministic network name for a project.
pub fn network_name(project: &str) -> String {
    format!("{CONTAINER_NAME_PREFIX}-{project}-{NETWORK_NAME_SUFFIX}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_container_name_truncates_version() {
        let name = container_name("api", "1a2b3c4d5e6f");
        assert_eq!(name, "berth-api-1a2b3c4d");
    }

    #[test]
    fn test_container_name_short_version() {
        // Versions shorter than the display width are used as-is.
        assert_eq!(container_name("api", "abc"), "berth-api-abc");
    }

    #[test]
    fn test_network_name() {
        assert_eq!(network_name("api"), "berth-api-net");
    }
}
