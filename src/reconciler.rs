//! Blue/green reconciliation engine.
//!
//! The [`Reconciler`] drives a [`RuntimeDriver`] and an optional
//! [`ProxyDriver`] to transition a project from its observed state to the
//! intended state:
//!
//! ```text
//!  preflight      mint        ensure      snapshot     pull/create
//!  (dns, proxy) → version  →  network  →  old set   →  new container
//!                                                           │
//!                      ┌──────────────────────────────
//!                      ▼
//!                 start → health gate ──fail──▶ rollback new, old set untouched
//!                              │
//!                           healthy
//!                              ▼
//!                 inspect → proxy cutover → retire old set
//! ```
//!
//! The ordering is the contract. The old set is snapshotted before create so
//! the new container cannot appear in it; the proxy never points at the new
//! container before it is healthy; the old set is retired only after the
//! cutover so in-flight requests keep reaching the old upstream until the
//! switch flips.
//!
//! There is no background loop and no persistent process. The ownership
//! labels written to the runtime are the durable state across invocations.

use crate::constants::{
    HEALTH_GATE_TIMEOUT, RETIRE_STOP_TIMEOUT, ROLLBACK_STOP_TIMEOUT,
};
use crate::error::{Error, Result};
use crate::intent::Intent;
use crate::proxy::ProxyDriver;
use crate::runtime::{LogOptions, LogSink, RuntimeDriver};
use crate::state::Container;
use crate::version;
use async_trait::async_trait;
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

// =============================================================================
// Domain Resolver
// =============================================================================

/// Resolves deploy domains during preflight.
///
/// A seam over the system resolver so the engine can be exercised without
/// network access. `*.localhost` domains never reach the resolver.
#[async_trait]
pub trait DomainResolver: Send + Sync {
    /// Succeeds iff the domain resolves to at least one address.
    async fn resolve(&self, domain: &str) -> std::result::Result<(), String>;
}

/// Default resolver backed by the operating system.
pub struct SystemResolver;

#[async_trait]
impl DomainResolver for SystemResolver {
    async fn resolve(&self, domain: &str) -> std::result::Result<(), String> {
        tokio::net::lookup_host((domain, 80))
            .await
            .map(|_| ())
            .map_err(|e| e.to_string())
    }
}

// =============================================================================
// Progress Sink
// =============================================================================

/// Receives human-facing progress events from the reconciler.
///
/// The engine itself never prints. The front-end decides how steps and
/// warnings are rendered; the default sink forwards to `tracing`.
pub trait ProgressSink: Send + Sync {
    /// A deploy step has begun or completed.
    fn step(&self, message: &str);
    /// Something went wrong but the operation continues.
    fn warn(&self, message: &str);
}

/// Progress sink that forwards events to `tracing`.
pub struct TracingProgress;

impl ProgressSink for TracingProgress {
    fn step(&self, message: &str) {
        info!("{message}");
    }

    fn warn(&self, message: &str) {
        warn!("{message}");
    }
}

// =============================================================================
// Deployment Outcome
// =============================================================================

/// Terminal result of a successful `up`.
#[derive(Debug, Clone)]
pub struct Deployment {
    /// Project that was deployed.
    pub project: String,
    /// Full version hash minted for this deploy.
    pub version: String,
    /// Id of the now-live container.
    pub container_id: String,
    /// Name of the now-live container.
    pub container_name: String,
    /// Host-side port, when the container publishes one.
    pub public_port: Option<u16>,
    /// Domain the project serves.
    pub domain: String,
    /// True when the proxy route now points at the new container.
    pub routed: bool,
    /// Number of superseded containers retired.
    pub retired: usize,
}

// =============================================================================
// Reconciler
// =============================================================================

/// Blue/green deployment engine over a runtime and an optional proxy.
///
/// When no proxy is configured the deploy publishes the container's port on
/// the host instead (local-only mode).
///
/// Concurrent `up` calls against the same project are not serialised here;
/// callers must not race them. Ownership labels guarantee that concurrent
/// deploys to *different* projects never interfere.
pub struct Reconciler {
    runtime: Arc<dyn RuntimeDriver>,
    proxy: Option<Arc<dyn ProxyDriver>>,
    resolver: Arc<dyn DomainResolver>,
    progress: Arc<dyn ProgressSink>,
}

impl Reconciler {
    /// Creates a reconciler over the given drivers.
    pub fn new(runtime: Arc<dyn RuntimeDriver>, proxy: Option<Arc<dyn ProxyDriver>>) -> Self {
        Self {
            runtime,
            proxy,
            resolver: Arc::new(SystemResolver),
            progress: Arc::new(TracingProgress),
        }
    }

    /// Replaces the domain resolver.
    pub fn with_resolver(mut self, resolver: Arc<dyn DomainResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    /// Replaces the progress sink.
    pub fn with_progress(mut self, progress: Arc<dyn ProgressSink>) -> Self {
        self.progress = progress;
        self
    }

    // =========================================================================
    // Up
    // =========================================================================

    /// Deploys the intent blue/green.
    ///
    /// On any failure before the health gate the new container is removed and
    /// the error surfaces; the pre-existing containers are untouched. Once
    /// the gate passes the deploy is committed: a proxy cutover failure is
    /// downgraded to a warning and the old set is still retired.
    pub async fn up(&self, intent: &Intent, cancel: &CancellationToken) -> Result<Deployment> {
        intent.validate()?;

        // Preflight: domain must resolve unless it is local-only.
        if !intent.is_local_domain() {
            self.resolver.resolve(&intent.domain).await.map_err(|reason| {
                Error::DomainNotResolvable {
                    domain: intent.domain.clone(),
                    reason,
                }
            })?;
        }

        // Preflight: a configured proxy must be accepting configuration.
        if let Some(proxy) = &self.proxy {
            self.progress.step("checking proxy connectivity");
            proxy
                .health()
                .await
                .map_err(|e| Error::ProxyUnavailable(e.to_string()))?;
        }

        let version = version::mint(intent);
        info!(project = %intent.project, version = version::short(&version), "starting deploy");
        self.progress.step(&format!(
            "deploying '{}' (version {})",
            intent.project,
            version::short(&version)
        ));

        self.progress.step("ensuring project network");
        self.runtime.ensure_network(&intent.project, cancel).await?;

        // Snapshot before create: the new container cannot appear in the
        // old set.
        let old_set = self.runtime.list(Some(&intent.project), cancel).await?;

        self.progress.step(&format!("pulling image '{}'", intent.origin));
        self.runtime.pull(&intent.origin, cancel).await?;

        // Without a proxy the container's port is published on the host.
        let publish_port = self.proxy.is_none();

        self.progress.step("creating container");
        let new_id = self
            .runtime
            .create(intent, &version, publish_port, cancel)
            .await?;

        self.progress.step("starting container");
        if let Err(e) = self.runtime.start(&new_id, cancel).await {
            self.discard(&new_id, false).await;
            if matches!(e, Error::Cancelled) {
                return Err(e);
            }
            return Err(Error::ContainerStartFailed {
                id: new_id,
                reason: e.to_string(),
            });
        }

        // Health gate: the decision point between rollback and commit.
        self.progress.step("waiting for health check");
        if let Err(e) = self
            .runtime
            .wait_healthy(&new_id, HEALTH_GATE_TIMEOUT, cancel)
            .await
        {
            self.progress.warn("health check failed, rolling back");
            self.discard(&new_id, true).await;
            if matches!(e, Error::Cancelled) {
                return Err(e);
            }
            return Err(Error::DeployFailed {
                project: intent.project.clone(),
                reason: e.to_string(),
            });
        }

        // The deploy is committed from here on. Failures no longer roll back
        // the new container; the only "rollback" would destroy a working
        // instance.
        let observed = match self.runtime.inspect(&new_id, cancel).await {
            Ok(c) => c,
            Err(Error::Cancelled) => {
                self.discard(&new_id, true).await;
                return Err(Error::Cancelled);
            }
            Err(e) => {
                // Healthy but unobservable: leave it running, skip cutover
                // and retirement, let the next up/down converge.
                self.progress
                    .warn(&format!("cannot inspect new container: {e}"));
                return Ok(Deployment {
                    project: intent.project.clone(),
                    version,
                    container_name: new_id.clone(),
                    container_id: new_id,
                    public_port: None,
                    domain: intent.domain.clone(),
                    routed: false,
                    retired: 0,
                });
            }
        };

        let mut routed = false;
        if let Some(proxy) = &self.proxy {
            self.progress
                .step(&format!("routing {} to {}", intent.domain, observed.name));
            match proxy
                .add_route(&intent.domain, &observed.name, intent.internal_port())
                .await
            {
                Ok(()) => routed = true,
                Err(e) => {
                    // Non-fatal and non-rolled-back: the new container is
                    // healthy and the operator can retry the route.
                    self.progress
                        .warn(&format!("failed to update proxy route: {e}"));
                }
            }
        }

        // Retire the old set. Errors are logged and ignored; the new version
        // is already live.
        let mut retired = 0;
        for old in old_set.iter().filter(|c| c.id != new_id) {
            self.progress.step(&format!("retiring {}", old.name));
            if let Err(e) = self.runtime.stop(&old.id, RETIRE_STOP_TIMEOUT, cancel).await {
                warn!(container = %old.name, error = %e, "failed to stop superseded container");
            }
            if let Err(e) = self.runtime.remove(&old.id, false, cancel).await {
                warn!(container = %old.name, error = %e, "failed to remove superseded container");
                continue;
            }
            retired += 1;
        }

        info!(
            project = %intent.project,
            container = %observed.name,
            routed,
            retired,
            "deploy complete"
        );

        Ok(Deployment {
            project: intent.project.clone(),
            version,
            container_id: new_id,
            container_name: observed.name,
            public_port: observed.public_port,
            domain: intent.domain.clone(),
            routed,
            retired,
        })
    }

    /// Best-effort teardown of a container that failed its deploy. Runs on a
    /// fresh token so a cancelled deploy can still clean up after itself.
    async fn discard(&self, id: &str, stop_first: bool) {
        let cleanup = CancellationToken::new();
        if stop_first {
            if let Err(e) = self.runtime.stop(id, ROLLBACK_STOP_TIMEOUT, &cleanup).await {
                debug!(container = %id, error = %e, "rollback stop failed");
            }
        }
        if let Err(e) = self.runtime.remove(id, true, &cleanup).await {
            warn!(container = %id, error = %e, "rollback remove failed");
        }
    }

    // =========================================================================
    // Down
    // =========================================================================

    /// Tears down a project, or every managed project when `project` is
    /// `None`.
    ///
    /// Idempotent: running it twice is equivalent to running it once, and a
    /// never-deployed project is a successful no-op. Individual step failures
    /// are logged and iteration continues.
    pub async fn down(&self, project: Option<&str>, cancel: &CancellationToken) -> Result<()> {
        let containers = self.runtime.list(project, cancel).await?;

        for c in &containers {
            self.progress.step(&format!("removing {}", c.name));
            if let Err(e) = self.runtime.stop(&c.id, RETIRE_STOP_TIMEOUT, cancel).await {
                warn!(container = %c.name, error = %e, "failed to stop container");
            }
            if let Err(e) = self.runtime.remove(&c.id, false, cancel).await {
                warn!(container = %c.name, error = %e, "failed to remove container");
            }
        }

        // Routes are keyed on domain, recovered from the ownership labels.
        if let Some(proxy) = &self.proxy {
            let domains: BTreeSet<&str> = containers
                .iter()
                .map(|c| c.domain.as_str())
                .filter(|d| !d.is_empty())
                .collect();
            for domain in domains {
                self.progress.step(&format!("removing route for {domain}"));
                if let Err(e) = proxy.remove_route(domain).await {
                    warn!(domain, error = %e, "failed to remove proxy route");
                }
            }
        }

        match project {
            Some(p) => {
                self.progress.step("removing project network");
                if let Err(e) = self.runtime.remove_network(p, cancel).await {
                    warn!(project = p, error = %e, "failed to remove network");
                }
            }
            None => {
                self.progress.step("removing all managed networks");
                match self.runtime.list_networks(cancel).await {
                    Ok(projects) => {
                        for p in projects {
                            if let Err(e) = self.runtime.remove_network(&p, cancel).await {
                                warn!(project = %p, error = %e, "failed to remove network");
                            }
                        }
                    }
                    Err(e) => warn!(error = %e, "failed to enumerate managed networks"),
                }
            }
        }

        Ok(())
    }

    // =========================================================================
    // Stop / Start / Status / Logs
    // =========================================================================

    /// Stops every running container in scope. Proxy routes are left intact.
    pub async fn stop(&self, project: Option<&str>, cancel: &CancellationToken) -> Result<()> {
        let containers = self.runtime.list(project, cancel).await?;
        for c in containers.iter().filter(|c| c.is_running()) {
            self.progress.step(&format!("stopping {}", c.name));
            if let Err(e) = self.runtime.stop(&c.id, RETIRE_STOP_TIMEOUT, cancel).await {
                warn!(container = %c.name, error = %e, "failed to stop container");
            }
        }
        Ok(())
    }

    /// Starts every non-running container in scope. No health gate, no proxy
    /// changes.
    pub async fn start(&self, project: Option<&str>, cancel: &CancellationToken) -> Result<()> {
        let containers = self.runtime.list(project, cancel).await?;
        for c in containers.iter().filter(|c| !c.is_running()) {
            self.progress.step(&format!("starting {}", c.name));
            if let Err(e) = self.runtime.start(&c.id, cancel).await {
                warn!(container = %c.name, error = %e, "failed to start container");
            }
        }
        Ok(())
    }

    /// Returns the observed container list verbatim.
    pub async fn status(
        &self,
        project: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<Vec<Container>> {
        self.runtime.list(project, cancel).await
    }

    /// Streams logs from the project's container: any running one is
    /// preferred, else the first returned.
    pub async fn logs(
        &self,
        project: &str,
        opts: &LogOptions,
        stdout: LogSink<'_>,
        stderr: LogSink<'_>,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let containers = self.runtime.list(Some(project), cancel).await?;
        let target = containers
            .iter()
            .find(|c| c.is_running())
            .or_else(|| containers.first())
            .ok_or_else(|| Error::NoContainers(project.to_string()))?;

        self.progress.step(&format!("showing logs for {}", target.name));
        self.runtime
            .logs(&target.id, opts, stdout, stderr, cancel)
            .await
    }
}
