//! # berth
//!
//! **Single-node, intent-driven container orchestrator**
//!
//! A declarative intent document describes *what* should run - a project
//! name, an image origin, a public domain, a port, resource limits - and
//! `berth` reconverges the local container runtime and a front-facing
//! reverse proxy to match it, without downtime.
//!
//! # Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                             berth                                   │
//! ├─────────────────────────────────────────────────────────────────────┤
//! │  ┌─────────────────────────────────────────────────────────────┐    │
//! │  │                       Reconciler                            │    │
//! │  │   up (blue/green) · down · stop · start · status · logs    │    │
//! │  └───────────────┬──────────────────────────┬──────────────────┘    │
//! │                  │                          │                       │
//! │  ┌───────────────▼───────────┐  ┌───────────▼──────────────┐       │
//! │  │   RuntimeDriver trait     │  │    ProxyDriver trait     │       │
//! │  │  list/pull/create/start   │  │  add_route/remove_route  │       │
//! │  │  stop/remove/wait_healthy │  │  get_upstream/health     │       │
//! │  │  networks/logs            │  │                          │       │
//! │  └───────────────┬───────────┘  └───────────┬──────────────┘       │
//! │                  │                          │                       │
//! │  ┌───────────────▼───────────┐  ┌───────────▼──────────────┐       │
//! │  │      DockerRuntime        │  │       CaddyProxy         │       │
//! │  │    (Docker Engine API)    │  │    (Caddy admin API)     │       │
//! │  └───────────────────────────┘  └──────────────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Blue/Green Deployment
//!
//! Every `up` mints a fresh version, brings a new container to health next
//! to the old one, cuts the proxy route over, and only then retires the old
//! set:
//!
//! ```text
//!   snapshot ─▶ pull ─▶ create ─▶ start ─▶ health gate ─▶ cutover ─▶ retire
//!                                              │
//!                                           failure
//!                                              ▼
//!                              new container removed, old set untouched
//! ```
//!
//! A failure before the health gate rolls the new container back and leaves
//! the previous version serving. After the gate the deploy is committed:
//! even a proxy failure is only a warning, because the one "rollback" left
//! would destroy a working instance.
//!
//! # Labels Are the State
//!
//! There is no database and no persistent process. Every managed container
//! and network carries labels under the `io.berth.` prefix recording the
//! project, version, domain, and port; discovery always filters on
//! `io.berth.managed=true`, so the tool is stateless across invocations and
//! never touches objects it did not create.
//!
//! # Example
//!
//! ```rust,ignore
//! use berth::{DockerRuntime, CaddyProxy, Intent, Reconciler};
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//!
//! let runtime = Arc::new(DockerRuntime::new()?);
//! let proxy = Arc::new(CaddyProxy::new("")?);
//! let reconciler = Reconciler::new(runtime, Some(proxy));
//!
//! let intent = Intent::load("berth.json")?;
//! let deployment = reconciler.up(&intent, &CancellationToken::new()).await?;
//! println!("live: {}", deployment.container_name);
//! ```

pub mod constants;
pub mod drivers;
mod error;
pub mod intent;
pub mod labels;
mod proxy;
mod reconciler;
mod runtime;
pub mod state;
pub mod version;

// Re-export public API
pub use drivers::{CaddyProxy, DockerRuntime};
pub use error::{Error, Result};
pub use intent::{DevOverlay, Intent, Resources};
pub use proxy::ProxyDriver;
pub use reconciler::{
    Deployment, DomainResolver, ProgressSink, Reconciler, SystemResolver, TracingProgress,
};
pub use runtime::{LogOptions, LogSink, RuntimeDriver};
pub use state::{Container, ContainerStatus, HealthStatus};
