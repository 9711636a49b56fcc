//! Error types for the orchestration core.

/// Result type alias for orchestration operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while reconciling a project.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    // =========================================================================
    // Preflight Errors (no side effects yet)
    // =========================================================================
    /// The intent document failed validation.
    #[error("invalid intent: {0}")]
    InvalidIntent(String),

    /// The intent's domain does not resolve via DNS.
    #[error("domain '{domain}' does not resolve, configure DNS before deploying: {reason}")]
    DomainNotResolvable { domain: String, reason: String },

    /// The reverse proxy is configured but not reachable.
    #[error("reverse proxy not reachable: {0}")]
    ProxyUnavailable(String),

    /// The container runtime is not reachable.
    #[error("container runtime not reachable: {0}")]
    RuntimeUnavailable(String),

    // =========================================================================
    // Deploy Errors (rolled back before the health gate)
    // =========================================================================
    /// Image pull failed. The project network may already exist and is left
    /// in place for `down` to reclaim.
    #[error("failed to pull image '{image}': {reason}")]
    ImagePullFailed { image: String, reason: String },

    /// Container create failed.
    #[error("failed to create container for project '{project}': {reason}")]
    ContainerCreateFailed { project: String, reason: String },

    /// Container start failed. The new container has been removed.
    #[error("failed to start container '{id}': {reason}")]
    ContainerStartFailed { id: String, reason: String },

    /// The container never reported healthy within the gate window.
    #[error("health check failed for container '{id}': {reason}")]
    HealthCheckFailed { id: String, reason: String },

    /// Terminal deploy failure. The new container has been torn down and the
    /// previous version, if any, is still serving.
    #[error("deploy failed for project '{project}': {reason}")]
    DeployFailed { project: String, reason: String },

    // =========================================================================
    // Lookup Errors
    // =========================================================================
    /// Container not found.
    #[error("container not found: {0}")]
    ContainerNotFound(String),

    /// No managed containers exist for the project.
    #[error("no containers found for project '{0}'")]
    NoContainers(String),

    // =========================================================================
    // Driver Errors
    // =========================================================================
    /// Container runtime API call failed.
    #[error("runtime error: {0}")]
    Runtime(String),

    /// Reverse proxy API call failed.
    #[error("proxy error: {0}")]
    Proxy(String),

    /// The operation was cancelled via its cancellation token.
    #[error("operation cancelled")]
    Cancelled,

    /// I/O failure (intent file access, log sinks).
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}
