//! Observed container state.
//!
//! These types describe what the container runtime reports about a managed
//! container. They are snapshots: the runtime's own store, filtered by the
//! ownership labels, is the durable state across invocations.

use serde::{Deserialize, Serialize};

// =============================================================================
// Container Status
// =============================================================================

/// Lifecycle status reported by the runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContainerStatus {
    /// Created but never started.
    Created,
    /// Running.
    Running,
    /// Stopped (exited or never started after a stop).
    Stopped,
    /// Removal in progress.
    Removing,
}

impl std::fmt::Display for ContainerStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Created => write!(f, "created"),
            Self::Running => write!(f, "running"),
            Self::Stopped => write!(f, "stopped"),
            Self::Removing => write!(f, "removing"),
        }
    }
}

// =============================================================================
// Health Status
// =============================================================================

/// Health as reported by the image's health check, if it declares one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// No health information available.
    #[default]
    Unknown,
    /// Health check is still in its start period.
    Starting,
    /// Container reported healthy.
    Healthy,
    /// Container reported unhealthy.
    Unhealthy,
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unknown => write!(f, "unknown"),
            Self::Starting => write!(f, "starting"),
            Self::Healthy => write!(f, "healthy"),
            Self::Unhealthy => write!(f, "unhealthy"),
        }
    }
}

// =============================================================================
// Observed Container
// =============================================================================

/// A managed container as observed via the runtime.
///
/// Identity fields (`project`, `version`, `domain`) are read back from the
/// ownership labels. `domain` is carried so teardown can remove proxy routes,
/// which are keyed on domain rather than project.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Container {
    /// Runtime-assigned container id.
    pub id: String,
    /// Container name (`berth-<project>-<ver8>`).
    pub name: String,
    /// Owning project, from labels.
    pub project: String,
    /// Deploy version hash, from labels.
    pub version: String,
    /// Image reference the container was created from.
    pub image: String,
    /// Lifecycle status.
    pub status: ContainerStatus,
    /// Health, if the image declares a check.
    pub health: HealthStatus,
    /// Creation timestamp.
    pub created_at: chrono::DateTime<chrono::Utc>,
    /// Host-side port when the container publishes one.
    pub public_port: Option<u16>,
    /// Public domain, from labels. Empty for containers predating the label.
    pub domain: String,
}

impl Container {
    /// Returns true if the container is running.
    pub fn is_running(&self) -> bool {
        self.status == ContainerStatus::Running
    }

    /// Returns true if the container is running and healthy, i.e. ready to
    /// receive traffic.
    pub fn is_healthy(&self) -> bool {
        self.status == ContainerStatus::Running && self.health == HealthStatus::Healthy
    }

    /// First characters of the version hash, as shown to users.
    pub fn short_version(&self) -> &str {
        let len = self.version.len().min(crate::constants::SHORT_VERSION_LEN);
        &self.version[..len]
    }
}
