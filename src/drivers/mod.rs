//! Concrete driver implementations.
//!
//! - [`DockerRuntime`]: container runtime over the Docker Engine API
//! - [`CaddyProxy`]: reverse proxy over the Caddy admin API
//!
//! Both implement the capability traits the reconciler consumes; either can
//! be swapped out without touching the engine.

mod caddy;
mod docker;

pub use caddy::CaddyProxy;
pub use docker::DockerRuntime;
