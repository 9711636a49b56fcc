//! Docker runtime driver.
//!
//! Implements [`RuntimeDriver`] over the Docker Engine API via `bollard`.
//! Connection settings come from the host environment per Docker conventions
//! (`DOCKER_HOST` et al.). Every discovery call filters on the ownership
//! labels; the driver never lists or mutates containers it did not create.

use crate::constants::{container_name, network_name, HEALTH_POLL_INTERVAL};
use crate::error::{Error, Result};
use crate::intent::{parse_cpu, parse_memory, Intent};
use crate::labels;
use crate::runtime::{LogOptions, LogSink, RuntimeDriver};
use crate::state::{Container, ContainerStatus, HealthStatus};
use async_trait::async_trait;
use bollard::container::{
    Config, CreateContainerOptions, ListContainersOptions, LogOutput, LogsOptions,
    NetworkingConfig, RemoveContainerOptions, StartContainerOptions, StopContainerOptions,
};
use bollard::image::CreateImageOptions;
use bollard::models::{
    ContainerSummary, EndpointSettings, HealthStatusEnum, HostConfig, PortBinding, RestartPolicy,
    RestartPolicyNameEnum,
};
use bollard::network::{CreateNetworkOptions, ListNetworksOptions};
use bollard::Docker;
use futures_util::StreamExt;
use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Races a Docker API call against the cancellation token.
async fn guard<T, F>(cancel: &CancellationToken, fut: F) -> Result<T>
where
    F: Future<Output = std::result::Result<T, bollard::errors::Error>>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(Error::Cancelled),
        res = fut => res.map_err(|e| Error::Runtime(e.to_string())),
    }
}

/// Container runtime driver backed by the Docker Engine.
pub struct DockerRuntime {
    docker: Docker,
}

impl DockerRuntime {
    /// Connects to the Docker Engine using host environment conventions.
    pub fn new() -> Result<Self> {
        let docker = Docker::connect_with_defaults()
            .map_err(|e| Error::RuntimeUnavailable(e.to_string()))?;
        Ok(Self { docker })
    }

    /// Verifies the engine is reachable.
    pub async fn ping(&self) -> Result<()> {
        self.docker
            .ping()
            .await
            .map(|_| ())
            .map_err(|e| Error::RuntimeUnavailable(e.to_string()))
    }

    fn managed_filters(project: Option<&str>) -> HashMap<String, Vec<String>> {
        let mut label_filters = vec![labels::managed_filter()];
        if let Some(p) = project {
            label_filters.push(labels::project_filter(p));
        }
        HashMap::from([("label".to_string(), label_filters)])
    }

    async fn find_network_id(
        &self,
        name: &str,
        cancel: &CancellationToken,
    ) -> Result<Option<String>> {
        let options = ListNetworksOptions {
            filters: HashMap::from([("name".to_string(), vec![name.to_string()])]),
        };
        let networks = guard(cancel, self.docker.list_networks(Some(options))).await?;
        Ok(networks.into_iter().find_map(|n| n.id))
    }

    fn summary_to_container(summary: ContainerSummary) -> Container {
        let labels = summary.labels.unwrap_or_default();
        let name = summary
            .names
            .and_then(|names| names.into_iter().next())
            .map(|n| n.trim_start_matches('/').to_string())
            .unwrap_or_default();

        let status = match summary.state.as_deref() {
            Some("created") => ContainerStatus::Created,
            Some("running") => ContainerStatus::Running,
            Some("removing") => ContainerStatus::Removing,
            _ => ContainerStatus::Stopped,
        };

        let public_port = summary
            .ports
            .unwrap_or_default()
            .into_iter()
            .find_map(|p| p.public_port)
            .and_then(|p| u16::try_from(p).ok());

        Container {
            id: summary.id.unwrap_or_default(),
            name,
            project: labels::project_of(&labels).unwrap_or_default().to_string(),
            version: labels::version_of(&labels).unwrap_or_default().to_string(),
            image: summary.image.unwrap_or_default(),
            status,
            // The list endpoint does not carry health; inspect does.
            health: HealthStatus::Unknown,
            created_at: summary
                .created
                .and_then(|c| chrono::DateTime::from_timestamp(c, 0))
                .unwrap_or_else(chrono::Utc::now),
            public_port,
            domain: labels::domain_of(&labels).unwrap_or_default().to_string(),
        }
    }
}

#[async_trait]
impl RuntimeDriver for DockerRuntime {
    async fn list(
        &self,
        project: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<Vec<Container>> {
        let options = ListContainersOptions {
            all: true,
            filters: Self::managed_filters(project),
            ..Default::default()
        };
        let summaries = guard(cancel, self.docker.list_containers(Some(options))).await?;
        Ok(summaries.into_iter().map(Self::summary_to_container).collect())
    }

    async fn pull(&self, image: &str, cancel: &CancellationToken) -> Result<()> {
        let options = CreateImageOptions {
            from_image: image.to_string(),
            ..Default::default()
        };
        let mut stream = self.docker.create_image(Some(options), None, None);

        // The pull is complete only once the progress stream is drained.
        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(Error::Cancelled),
                item = stream.next() => match item {
                    Some(Ok(progress)) => {
                        if let Some(status) = progress.status {
                            debug!(image, status, "pull progress");
                        }
                    }
                    Some(Err(e)) => {
                        return Err(Error::ImagePullFailed {
                            image: image.to_string(),
                            reason: e.to_string(),
                        })
                    }
                    None => return Ok(()),
                },
            }
        }
    }

    async fn create(
        &self,
        intent: &Intent,
        version: &str,
        publish_port: bool,
        cancel: &CancellationToken,
    ) -> Result<String> {
        let name = container_name(&intent.project, version);
        let network = network_name(&intent.project);
        let internal_port = intent.internal_port();
        let exposed_port = format!("{internal_port}/tcp");

        let mut host_config = HostConfig {
            nano_cpus: parse_cpu(intent.resources.cpu.as_deref()),
            memory: parse_memory(intent.resources.memory.as_deref()),
            restart_policy: Some(RestartPolicy {
                name: Some(RestartPolicyNameEnum::UNLESS_STOPPED),
                ..Default::default()
            }),
            ..Default::default()
        };

        if publish_port {
            // Host port 0 lets the engine allocate one.
            host_config.port_bindings = Some(HashMap::from([(
                exposed_port.clone(),
                Some(vec![PortBinding {
                    host_ip: Some("0.0.0.0".to_string()),
                    host_port: Some(intent.port.to_string()),
                }]),
            )]));
        }

        let dev = intent.dev.as_ref();
        if let Some(volumes) = dev.map(|d| &d.volumes).filter(|v| !v.is_empty()) {
            host_config.binds = Some(volumes.clone());
        }

        let config = Config {
            image: Some(intent.origin.clone()),
            labels: Some(labels::labels_for(
                &intent.project,
                version,
                &intent.domain,
                intent.port,
            )),
            exposed_ports: Some(HashMap::from([(exposed_port, HashMap::new())])),
            cmd: dev.map(|d| d.command.clone()).filter(|c| !c.is_empty()),
            host_config: Some(host_config),
            networking_config: Some(NetworkingConfig {
                endpoints_config: HashMap::from([(network, EndpointSettings::default())]),
            }),
            ..Default::default()
        };

        let options = CreateContainerOptions {
            name,
            platform: None,
        };

        let response = guard(cancel, self.docker.create_container(Some(options), config))
            .await
            .map_err(|e| match e {
                Error::Cancelled => Error::Cancelled,
                other => Error::ContainerCreateFailed {
                    project: intent.project.clone(),
                    reason: other.to_string(),
                },
            })?;

        Ok(response.id)
    }

    async fn start(&self, id: &str, cancel: &CancellationToken) -> Result<()> {
        guard(
            cancel,
            self.docker
                .start_container(id, None::<StartContainerOptions<String>>),
        )
        .await
    }

    async fn stop(&self, id: &str, timeout: Duration, cancel: &CancellationToken) -> Result<()> {
        let options = StopContainerOptions {
            t: timeout.as_secs() as i64,
        };
        guard(cancel, self.docker.stop_container(id, Some(options))).await
    }

    async fn remove(&self, id: &str, force: bool, cancel: &CancellationToken) -> Result<()> {
        let options = RemoveContainerOptions {
            force,
            // Volumes survive container replacement.
            v: false,
            ..Default::default()
        };
        guard(cancel, self.docker.remove_container(id, Some(options))).await
    }

    async fn wait_healthy(
        &self,
        id: &str,
        timeout: Duration,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let deadline = Instant::now() + timeout;
        let mut ticker = tokio::time::interval(HEALTH_POLL_INTERVAL);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(Error::Cancelled),
                _ = ticker.tick() => {}
            }

            if Instant::now() > deadline {
                return Err(Error::HealthCheckFailed {
                    id: id.to_string(),
                    reason: "timed out waiting for container to become healthy".to_string(),
                });
            }

            let info = guard(cancel, self.docker.inspect_container(id, None)).await?;
            let state = info.state.unwrap_or_default();
            let running = state.running.unwrap_or(false);

            match state.health.and_then(|h| h.status) {
                Some(HealthStatusEnum::HEALTHY) => return Ok(()),
                Some(HealthStatusEnum::UNHEALTHY) => {
                    return Err(Error::HealthCheckFailed {
                        id: id.to_string(),
                        reason: "container reported unhealthy".to_string(),
                    })
                }
                Some(HealthStatusEnum::STARTING) => {}
                // No health check declared: running counts as healthy.
                _ if running => return Ok(()),
                _ => {}
            }
        }
    }

    async fn inspect(&self, id: &str, cancel: &CancellationToken) -> Result<Container> {
        let info = guard(cancel, self.docker.inspect_container(id, None)).await?;

        let config = info.config.unwrap_or_default();
        let labels = config.labels.unwrap_or_default();
        let state = info.state.unwrap_or_default();
        let running = state.running.unwrap_or(false);

        let status = if running {
            ContainerStatus::Running
        } else {
            ContainerStatus::Stopped
        };

        let health = match state.health.and_then(|h| h.status) {
            Some(HealthStatusEnum::HEALTHY) => HealthStatus::Healthy,
            Some(HealthStatusEnum::UNHEALTHY) => HealthStatus::Unhealthy,
            Some(HealthStatusEnum::STARTING) => HealthStatus::Starting,
            // No declared check: running stands in for healthy.
            _ if running => HealthStatus::Healthy,
            _ => HealthStatus::Unknown,
        };

        let public_port = info
            .network_settings
            .and_then(|ns| ns.ports)
            .unwrap_or_default()
            .into_values()
            .flatten()
            .flatten()
            .find_map(|binding| binding.host_port)
            .and_then(|p| p.parse().ok());

        Ok(Container {
            id: info.id.unwrap_or_else(|| id.to_string()),
            name: info
                .name
                .map(|n| n.trim_start_matches('/').to_string())
                .unwrap_or_default(),
            project: labels::project_of(&labels).unwrap_or_default().to_string(),
            version: labels::version_of(&labels).unwrap_or_default().to_string(),
            image: config.image.unwrap_or_default(),
            status,
            health,
            created_at: info
                .created
                .and_then(|c| c.parse().ok())
                .unwrap_or_else(chrono::Utc::now),
            public_port,
            domain: labels::domain_of(&labels).unwrap_or_default().to_string(),
        })
    }

    async fn ensure_network(&self, project: &str, cancel: &CancellationToken) -> Result<String> {
        let name = network_name(project);
        if let Some(id) = self.find_network_id(&name, cancel).await? {
            return Ok(id);
        }

        let options = CreateNetworkOptions {
            name: name.clone(),
            driver: "bridge".to_string(),
            labels: labels::network_labels(project),
            ..Default::default()
        };
        guard(cancel, self.docker.create_network(options)).await?;

        Ok(self.find_network_id(&name, cancel).await?.unwrap_or(name))
    }

    async fn remove_network(&self, project: &str, cancel: &CancellationToken) -> Result<()> {
        let name = network_name(project);
        if self.find_network_id(&name, cancel).await?.is_none() {
            return Ok(());
        }
        guard(cancel, self.docker.remove_network(&name)).await
    }

    async fn list_networks(&self, cancel: &CancellationToken) -> Result<Vec<String>> {
        let options = ListNetworksOptions {
            filters: HashMap::from([("label".to_string(), vec![labels::managed_filter()])]),
        };
        let networks = guard(cancel, self.docker.list_networks(Some(options))).await?;
        Ok(networks
            .into_iter()
            .filter_map(|n| {
                n.labels
                    .as_ref()
                    .and_then(labels::project_of)
                    .map(String::from)
            })
            .collect())
    }

    async fn logs(
        &self,
        id: &str,
        opts: &LogOptions,
        stdout: LogSink<'_>,
        stderr: LogSink<'_>,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let options = LogsOptions {
            follow: opts.follow,
            stdout: true,
            stderr: true,
            timestamps: opts.timestamps,
            tail: opts.tail.map_or_else(|| "all".to_string(), |n| n.to_string()),
            ..Default::default()
        };
        let mut stream = self.docker.logs(id, Some(options));

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(Error::Cancelled),
                item = stream.next() => match item {
                    Some(Ok(LogOutput::StdErr { message })) => stderr.write_all(&message).await?,
                    Some(Ok(output)) => stdout.write_all(&output.into_bytes()).await?,
                    Some(Err(e)) => return Err(Error::Runtime(e.to_string())),
                    None => return Ok(()),
                },
            }
        }
    }
}
