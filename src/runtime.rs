//! Container runtime driver trait.
//!
//! This module defines [`RuntimeDriver`] - the capability set the reconciler
//! consumes from a container engine. It is deliberately an abstraction, not a
//! Docker binding: swapping the concrete engine must not require changes to
//! the reconciler.

use crate::error::Result;
use crate::intent::Intent;
use crate::state::Container;
use async_trait::async_trait;
use std::time::Duration;
use tokio::io::AsyncWrite;
use tokio_util::sync::CancellationToken;

// =============================================================================
// Log Options
// =============================================================================

/// Options for streaming container logs.
#[derive(Debug, Clone, Default)]
pub struct LogOptions {
    /// Keep the stream open and follow new output.
    pub follow: bool,
    /// Number of lines from the tail (`None` = all).
    pub tail: Option<u32>,
    /// Prefix each line with its timestamp.
    pub timestamps: bool,
}

/// Write sink for a log stream.
pub type LogSink<'a> = &'a mut (dyn AsyncWrite + Unpin + Send);

// =============================================================================
// Runtime Driver
// =============================================================================

/// Capability abstraction over a container engine.
///
/// # Ownership discipline
///
/// Every discovery operation (`list`, `list_networks`) MUST filter on the
/// managed ownership label so the reconciler never observes, let alone
/// mutates, containers it did not create.
///
/// # Cancellation
///
/// Every operation takes a [`CancellationToken`] and must honour it
/// promptly, returning [`Error::Cancelled`](crate::Error::Cancelled) when it
/// fires mid-call.
#[async_trait]
pub trait RuntimeDriver: Send + Sync {
    /// Lists managed containers, including stopped ones.
    ///
    /// With a project, only that project's containers are returned; with
    /// `None`, all managed containers. Ordering is unspecified but stable
    /// within a single call.
    async fn list(&self, project: Option<&str>, cancel: &CancellationToken)
        -> Result<Vec<Container>>;

    /// Ensures the image is locally available. Blocks until the pull
    /// completes, draining any progress stream.
    async fn pull(&self, image: &str, cancel: &CancellationToken) -> Result<()>;

    /// Creates a container for the intent without starting it.
    ///
    /// The container is named deterministically from the project and the
    /// short version, labeled per the ownership scheme, attached to the
    /// project network, and restarted `unless-stopped`. The intent's port
    /// (or the default when 0) is exposed internally; with `publish_port`
    /// it is additionally bound on the host at the same port, or at a
    /// runtime-allocated port when the intent port is 0.
    ///
    /// Returns the new container id.
    async fn create(
        &self,
        intent: &Intent,
        version: &str,
        publish_port: bool,
        cancel: &CancellationToken,
    ) -> Result<String>;

    /// Starts a created or stopped container.
    async fn start(&self, id: &str, cancel: &CancellationToken) -> Result<()>;

    /// Stops a container, allowing `timeout` for graceful shutdown.
    async fn stop(&self, id: &str, timeout: Duration, cancel: &CancellationToken) -> Result<()>;

    /// Removes a container. Volumes are preserved.
    async fn remove(&self, id: &str, force: bool, cancel: &CancellationToken) -> Result<()>;

    /// Waits for the container to become healthy, polling on an internal
    /// cadence.
    ///
    /// If the image declares a health check, succeeds only on `healthy` and
    /// fails on `unhealthy`; otherwise `running` counts as healthy. Fails
    /// with [`Error::HealthCheckFailed`](crate::Error::HealthCheckFailed) on
    /// timeout.
    async fn wait_healthy(
        &self,
        id: &str,
        timeout: Duration,
        cancel: &CancellationToken,
    ) -> Result<()>;

    /// Returns the full observed record for a container, including the
    /// resolved public port.
    async fn inspect(&self, id: &str, cancel: &CancellationToken) -> Result<Container>;

    /// Idempotently ensures the project's bridge network exists. Returns the
    /// network id.
    async fn ensure_network(&self, project: &str, cancel: &CancellationToken) -> Result<String>;

    /// Idempotently removes the project's network. An absent network is not
    /// an error.
    async fn remove_network(&self, project: &str, cancel: &CancellationToken) -> Result<()>;

    /// Returns the project names of all managed networks. Used by fleet
    /// teardown.
    async fn list_networks(&self, cancel: &CancellationToken) -> Result<Vec<String>>;

    /// Streams container logs into the supplied sinks.
    async fn logs(
        &self,
        id: &str,
        opts: &LogOptions,
        stdout: LogSink<'_>,
        stderr: LogSink<'_>,
        cancel: &CancellationToken,
    ) -> Result<()>;
}
