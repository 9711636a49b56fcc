//! Integration tests for the blue/green reconciliation engine.
//!
//! The runtime and proxy are in-memory fakes, so every scenario runs
//! hermetically: no Docker, no Caddy, no DNS.

use async_trait::async_trait;
use berth::constants::{container_name, network_name};
use berth::{
    Container, ContainerStatus, DomainResolver, Error, HealthStatus, Intent, LogOptions,
    LogSink, ProgressSink, ProxyDriver, Reconciler, Resources, RuntimeDriver,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio_util::sync::CancellationToken;

// =============================================================================
// Fake Runtime
// =============================================================================

#[derive(Debug, Clone)]
struct FakeContainer {
    id: String,
    name: String,
    project: String,
    version: String,
    image: String,
    status: ContainerStatus,
    domain: String,
    public_port: Option<u16>,
}

#[derive(Default)]
struct RuntimeState {
    containers: Vec<FakeContainer>,
    networks: HashMap<String, String>,
    pulled: Vec<String>,
    calls: Vec<String>,
    next_id: u64,
}

/// In-memory container runtime with per-step failure knobs.
#[derive(Default)]
struct FakeRuntime {
    state: Mutex<RuntimeState>,
    fail_pull: AtomicBool,
    fail_start: AtomicBool,
    unhealthy: AtomicBool,
    cancel_on_start: Mutex<Option<CancellationToken>>,
}

impl FakeRuntime {
    fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn containers(&self) -> Vec<FakeContainer> {
        self.state.lock().unwrap().containers.clone()
    }

    fn network_projects(&self) -> Vec<String> {
        let mut projects: Vec<String> =
            self.state.lock().unwrap().networks.keys().cloned().collect();
        projects.sort();
        projects
    }

    fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    /// Seeds a container as if a previous deploy had left it behind.
    fn seed(&self, project: &str, version: &str, domain: &str, status: ContainerStatus) -> String {
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let id = format!("ctr-{}", state.next_id);
        state.containers.push(FakeContainer {
            id: id.clone(),
            name: container_name(project, version),
            project: project.to_string(),
            version: version.to_string(),
            image: "seeded:1".to_string(),
            status,
            domain: domain.to_string(),
            public_port: None,
        });
        id
    }

    fn observe(c: &FakeContainer) -> Container {
        Container {
            id: c.id.clone(),
            name: c.name.clone(),
            project: c.project.clone(),
            version: c.version.clone(),
            image: c.image.clone(),
            status: c.status,
            health: HealthStatus::Unknown,
            created_at: chrono::Utc::now(),
            public_port: c.public_port,
            domain: c.domain.clone(),
        }
    }

    fn checkpoint(&self, cancel: &CancellationToken, call: &str) -> Result<(), Error> {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }
        self.state.lock().unwrap().calls.push(call.to_string());
        Ok(())
    }
}

#[async_trait]
impl RuntimeDriver for FakeRuntime {
    async fn list(
        &self,
        project: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<Vec<Container>, Error> {
        self.checkpoint(cancel, "list")?;
        let state = self.state.lock().unwrap();
        Ok(state
            .containers
            .iter()
            .filter(|c| project.map_or(true, |p| c.project == p))
            .map(Self::observe)
            .collect())
    }

    async fn pull(&self, image: &str, cancel: &CancellationToken) -> Result<(), Error> {
        self.checkpoint(cancel, "pull")?;
        if self.fail_pull.load(Ordering::SeqCst) {
            return Err(Error::ImagePullFailed {
                image: image.to_string(),
                reason: "registry unreachable".to_string(),
            });
        }
        self.state.lock().unwrap().pulled.push(image.to_string());
        Ok(())
    }

    async fn create(
        &self,
        intent: &Intent,
        version: &str,
        publish_port: bool,
        cancel: &CancellationToken,
    ) -> Result<String, Error> {
        self.checkpoint(cancel, "create")?;
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let id = format!("ctr-{}", state.next_id);
        let public_port = publish_port.then(|| {
            if intent.port == 0 {
                32768 + state.next_id as u16
            } else {
                intent.port
            }
        });
        state.containers.push(FakeContainer {
            id: id.clone(),
            name: container_name(&intent.project, version),
            project: intent.project.clone(),
            version: version.to_string(),
            image: intent.origin.clone(),
            status: ContainerStatus::Created,
            domain: intent.domain.clone(),
            public_port,
        });
        Ok(id)
    }

    async fn start(&self, id: &str, cancel: &CancellationToken) -> Result<(), Error> {
        self.checkpoint(cancel, "start")?;
        if self.fail_start.load(Ordering::SeqCst) {
            return Err(Error::Runtime("exec format error".to_string()));
        }
        if let Some(token) = self.cancel_on_start.lock().unwrap().take() {
            token.cancel();
        }
        let mut state = self.state.lock().unwrap();
        let container = state
            .containers
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| Error::ContainerNotFound(id.to_string()))?;
        container.status = ContainerStatus::Running;
        Ok(())
    }

    async fn stop(
        &self,
        id: &str,
        _timeout: Duration,
        cancel: &CancellationToken,
    ) -> Result<(), Error> {
        self.checkpoint(cancel, "stop")?;
        let mut state = self.state.lock().unwrap();
        let container = state
            .containers
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| Error::ContainerNotFound(id.to_string()))?;
        container.status = ContainerStatus::Stopped;
        Ok(())
    }

    async fn remove(&self, id: &str, force: bool, cancel: &CancellationToken) -> Result<(), Error> {
        self.checkpoint(cancel, "remove")?;
        let mut state = self.state.lock().unwrap();
        let Some(index) = state.containers.iter().position(|c| c.id == id) else {
            return Err(Error::ContainerNotFound(id.to_string()));
        };
        if state.containers[index].status == ContainerStatus::Running && !force {
            return Err(Error::Runtime("container is running".to_string()));
        }
        state.containers.remove(index);
        Ok(())
    }

    async fn wait_healthy(
        &self,
        id: &str,
        _timeout: Duration,
        cancel: &CancellationToken,
    ) -> Result<(), Error> {
        self.checkpoint(cancel, "wait_healthy")?;
        if self.unhealthy.load(Ordering::SeqCst) {
            return Err(Error::HealthCheckFailed {
                id: id.to_string(),
                reason: "container reported unhealthy".to_string(),
            });
        }
        Ok(())
    }

    async fn inspect(&self, id: &str, cancel: &CancellationToken) -> Result<Container, Error> {
        self.checkpoint(cancel, "inspect")?;
        let state = self.state.lock().unwrap();
        state
            .containers
            .iter()
            .find(|c| c.id == id)
            .map(Self::observe)
            .ok_or_else(|| Error::ContainerNotFound(id.to_string()))
    }

    async fn ensure_network(
        &self,
        project: &str,
        cancel: &CancellationToken,
    ) -> Result<String, Error> {
        self.checkpoint(cancel, "ensure_network")?;
        let mut state = self.state.lock().unwrap();
        let id = state
            .networks
            .entry(project.to_string())
            .or_insert_with(|| format!("net-{project}"))
            .clone();
        Ok(id)
    }

    async fn remove_network(&self, project: &str, cancel: &CancellationToken) -> Result<(), Error> {
        self.checkpoint(cancel, "remove_network")?;
        self.state.lock().unwrap().networks.remove(project);
        Ok(())
    }

    async fn list_networks(&self, cancel: &CancellationToken) -> Result<Vec<String>, Error> {
        self.checkpoint(cancel, "list_networks")?;
        Ok(self.network_projects())
    }

    async fn logs(
        &self,
        id: &str,
        _opts: &LogOptions,
        stdout: LogSink<'_>,
        _stderr: LogSink<'_>,
        cancel: &CancellationToken,
    ) -> Result<(), Error> {
        self.checkpoint(cancel, "logs")?;
        stdout.write_all(format!("logs:{id}\n").as_bytes()).await?;
        Ok(())
    }
}

// =============================================================================
// Fake Proxy
// =============================================================================

#[derive(Default)]
struct FakeProxy {
    routes: Mutex<HashMap<String, String>>,
    fail_add: AtomicBool,
    unhealthy: AtomicBool,
}

impl FakeProxy {
    fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn routes(&self) -> HashMap<String, String> {
        self.routes.lock().unwrap().clone()
    }
}

#[async_trait]
impl ProxyDriver for FakeProxy {
    async fn add_route(&self, domain: &str, upstream_host: &str, port: u16) -> Result<(), Error> {
        if self.fail_add.load(Ordering::SeqCst) {
            return Err(Error::Proxy("admin API returned 500".to_string()));
        }
        self.routes
            .lock()
            .unwrap()
            .insert(domain.to_string(), format!("{upstream_host}:{port}"));
        Ok(())
    }

    async fn remove_route(&self, domain: &str) -> Result<(), Error> {
        self.routes.lock().unwrap().remove(domain);
        Ok(())
    }

    async fn get_upstream(&self, domain: &str) -> Result<Option<String>, Error> {
        Ok(self.routes.lock().unwrap().get(domain).cloned())
    }

    async fn health(&self) -> Result<(), Error> {
        if self.unhealthy.load(Ordering::SeqCst) {
            return Err(Error::Proxy("connection refused".to_string()));
        }
        Ok(())
    }
}

// =============================================================================
// Fake Resolver / Recording Progress
// =============================================================================

struct StaticResolver {
    resolves: bool,
}

#[async_trait]
impl DomainResolver for StaticResolver {
    async fn resolve(&self, _domain: &str) -> Result<(), String> {
        if self.resolves {
            Ok(())
        } else {
            Err("no such host".to_string())
        }
    }
}

#[derive(Default)]
struct RecordingProgress {
    warnings: Mutex<Vec<String>>,
}

impl ProgressSink for RecordingProgress {
    fn step(&self, _message: &str) {}

    fn warn(&self, message: &str) {
        self.warnings.lock().unwrap().push(message.to_string());
    }
}

impl RecordingProgress {
    fn warnings(&self) -> Vec<String> {
        self.warnings.lock().unwrap().clone()
    }
}

// =============================================================================
// Test Helpers
// =============================================================================

fn intent(project: &str, domain: &str, port: u16) -> Intent {
    Intent {
        project: project.to_string(),
        origin: "img:1".to_string(),
        domain: domain.to_string(),
        port,
        resources: Resources::default(),
        dev: None,
    }
}

fn reconciler(
    runtime: Arc<FakeRuntime>,
    proxy: Option<Arc<FakeProxy>>,
) -> (Reconciler, Arc<RecordingProgress>) {
    let progress = Arc::new(RecordingProgress::default());
    let engine = Reconciler::new(
        runtime,
        proxy.map(|p| p as Arc<dyn ProxyDriver>),
    )
    .with_resolver(Arc::new(StaticResolver { resolves: true }))
    .with_progress(progress.clone());
    (engine, progress)
}

fn token() -> CancellationToken {
    CancellationToken::new()
}

// =============================================================================
// Scenarios
// =============================================================================

/// A healthy deploy ends with one running container, the project network,
/// and a route pointing at the new container.
#[tokio::test]
async fn deploy_happy_path() {
    let runtime = FakeRuntime::new();
    let proxy = FakeProxy::new();
    let (engine, _) = reconciler(runtime.clone(), Some(proxy.clone()));

    let deployment = engine
        .up(&intent("api", "api.example.com", 8080), &token())
        .await
        .expect("deploy should succeed");

    assert!(deployment.routed);
    assert_eq!(deployment.project, "api");
    assert_eq!(network_name("api"), "berth-api-net");
    assert_eq!(runtime.network_projects(), vec!["api"]);

    let containers = runtime.containers();
    assert_eq!(containers.len(), 1);
    assert_eq!(containers[0].project, "api");
    assert_eq!(containers[0].status, ContainerStatus::Running);

    let routes = proxy.routes();
    assert_eq!(
        routes.get("api.example.com"),
        Some(&format!("{}:8080", deployment.container_name))
    );
}

/// A health failure removes the new container, adds no route, surfaces
/// DeployFailed, and leaves pre-existing containers untouched.
#[tokio::test]
async fn health_failure_rolls_back() {
    let runtime = FakeRuntime::new();
    let proxy = FakeProxy::new();
    runtime.seed("api", "oldver11", "api.example.com", ContainerStatus::Running);
    let before = runtime.containers();

    runtime.unhealthy.store(true, Ordering::SeqCst);
    let (engine, _) = reconciler(runtime.clone(), Some(proxy.clone()));

    let err = engine
        .up(&intent("api", "api.example.com", 8080), &token())
        .await
        .expect_err("deploy should fail");
    assert!(matches!(err, Error::DeployFailed { .. }), "got {err:?}");

    let after = runtime.containers();
    assert_eq!(after.len(), before.len());
    assert_eq!(after[0].id, before[0].id);
    assert_eq!(after[0].status, ContainerStatus::Running);
    assert!(proxy.routes().is_empty());
}

/// Redeploying the same intent replaces the container and repoints the
/// single route at the new one.
#[tokio::test]
async fn redeploy_replaces_previous_version() {
    let runtime = FakeRuntime::new();
    let proxy = FakeProxy::new();
    let (engine, _) = reconciler(runtime.clone(), Some(proxy.clone()));
    let desired = intent("api", "api.example.com", 8080);

    let first = engine.up(&desired, &token()).await.expect("first deploy");
    let second = engine.up(&desired, &token()).await.expect("second deploy");

    let containers = runtime.containers();
    assert_eq!(containers.len(), 1, "old container must be retired");
    assert_eq!(containers[0].id, second.container_id);
    assert_ne!(first.container_id, second.container_id);
    assert_eq!(second.retired, 1);

    let routes = proxy.routes();
    assert_eq!(routes.len(), 1);
    assert_eq!(
        routes.get("api.example.com"),
        Some(&format!("{}:8080", second.container_name))
    );
    assert_eq!(runtime.network_projects(), vec!["api"]);
}

/// With no proxy, DNS is skipped, the port is published on the host,
/// and no routes exist anywhere.
#[tokio::test]
async fn local_only_without_proxy() {
    let runtime = FakeRuntime::new();
    let progress = Arc::new(RecordingProgress::default());
    // A resolver that refuses everything proves *.localhost bypasses DNS.
    let engine = Reconciler::new(runtime.clone(), None)
        .with_resolver(Arc::new(StaticResolver { resolves: false }))
        .with_progress(progress);

    let deployment = engine
        .up(&intent("app", "app.localhost", 0), &token())
        .await
        .expect("local-only deploy should succeed");

    assert!(!deployment.routed);
    assert!(
        deployment.public_port.is_some(),
        "host port must be allocated when no proxy fronts the container"
    );
    assert_eq!(runtime.containers().len(), 1);
}

/// Fleet-wide down removes every managed container, network, and route.
#[tokio::test]
async fn down_all_removes_everything() {
    let runtime = FakeRuntime::new();
    let proxy = FakeProxy::new();
    let (engine, _) = reconciler(runtime.clone(), Some(proxy.clone()));

    engine
        .up(&intent("a", "a.example.com", 8080), &token())
        .await
        .expect("deploy a");
    engine
        .up(&intent("b", "b.example.com", 9090), &token())
        .await
        .expect("deploy b");
    assert_eq!(runtime.containers().len(), 2);

    engine.down(None, &token()).await.expect("down all");

    assert!(runtime.containers().is_empty());
    assert!(runtime.network_projects().is_empty());
    assert!(proxy.routes().is_empty());
}

/// A cutover failure is non-fatal - the deploy succeeds, the old set is
/// retired, and a warning reaches the progress sink.
#[tokio::test]
async fn cutover_failure_is_nonfatal() {
    let runtime = FakeRuntime::new();
    let proxy = FakeProxy::new();
    runtime.seed("api", "oldver11", "api.example.com", ContainerStatus::Running);
    proxy.fail_add.store(true, Ordering::SeqCst);
    let (engine, progress) = reconciler(runtime.clone(), Some(proxy.clone()));

    let deployment = engine
        .up(&intent("api", "api.example.com", 8080), &token())
        .await
        .expect("deploy should still succeed");

    assert!(!deployment.routed);
    assert_eq!(deployment.retired, 1, "old set is retired even without a route");
    assert_eq!(runtime.containers().len(), 1);
    assert_eq!(runtime.containers()[0].id, deployment.container_id);
    assert!(
        progress.warnings().iter().any(|w| w.contains("proxy route")),
        "warning must surface via the progress sink: {:?}",
        progress.warnings()
    );
}

// =============================================================================
// Invariants
// =============================================================================

/// A non-local domain that fails DNS terminates the deploy before any
/// runtime or proxy call.
#[tokio::test]
async fn dns_failure_precedes_all_driver_calls() {
    let runtime = FakeRuntime::new();
    let proxy = FakeProxy::new();
    proxy.unhealthy.store(true, Ordering::SeqCst);
    let progress = Arc::new(RecordingProgress::default());
    let engine = Reconciler::new(
        runtime.clone(),
        Some(proxy.clone() as Arc<dyn ProxyDriver>),
    )
    .with_resolver(Arc::new(StaticResolver { resolves: false }))
    .with_progress(progress);

    let err = engine
        .up(&intent("api", "api.example.com", 8080), &token())
        .await
        .expect_err("deploy must fail");
    assert!(matches!(err, Error::DomainNotResolvable { .. }), "got {err:?}");
    assert!(runtime.calls().is_empty(), "runtime must not be invoked");
}

/// An unreachable proxy terminates the deploy before any runtime call.
#[tokio::test]
async fn proxy_unavailable_is_terminal() {
    let runtime = FakeRuntime::new();
    let proxy = FakeProxy::new();
    proxy.unhealthy.store(true, Ordering::SeqCst);
    let (engine, _) = reconciler(runtime.clone(), Some(proxy));

    let err = engine
        .up(&intent("api", "api.example.com", 8080), &token())
        .await
        .expect_err("deploy must fail");
    assert!(matches!(err, Error::ProxyUnavailable(_)), "got {err:?}");
    assert!(runtime.calls().is_empty());
}

/// Pre-gate failures (pull, start) leave the old set untouched.
#[tokio::test]
async fn pre_gate_failures_preserve_old_set() {
    for knob in ["pull", "start"] {
        let runtime = FakeRuntime::new();
        runtime.seed("api", "oldver11", "api.example.com", ContainerStatus::Running);
        let before: Vec<String> = runtime.containers().iter().map(|c| c.id.clone()).collect();

        match knob {
            "pull" => runtime.fail_pull.store(true, Ordering::SeqCst),
            _ => runtime.fail_start.store(true, Ordering::SeqCst),
        }
        let (engine, _) = reconciler(runtime.clone(), Some(FakeProxy::new()));

        engine
            .up(&intent("api", "api.example.com", 8080), &token())
            .await
            .expect_err("deploy must fail");

        let after: Vec<String> = runtime.containers().iter().map(|c| c.id.clone()).collect();
        assert_eq!(after, before, "old set changed after {knob} failure");
        assert!(runtime.containers()[0].status == ContainerStatus::Running);
    }
}

/// Down is idempotent and succeeds on a never-deployed project.
#[tokio::test]
async fn down_idempotence() {
    let runtime = FakeRuntime::new();
    let proxy = FakeProxy::new();
    let (engine, _) = reconciler(runtime.clone(), Some(proxy.clone()));

    engine.down(Some("ghost"), &token()).await.expect("down on nothing");

    engine
        .up(&intent("api", "api.example.com", 8080), &token())
        .await
        .expect("deploy");
    engine.down(Some("api"), &token()).await.expect("first down");
    engine.down(Some("api"), &token()).await.expect("second down");

    assert!(runtime.containers().is_empty());
    assert!(runtime.network_projects().is_empty());
    assert!(proxy.routes().is_empty());
}

/// Up then Down returns the runtime to its pre-Up container and network set.
#[tokio::test]
async fn up_down_roundtrip() {
    let runtime = FakeRuntime::new();
    let proxy = FakeProxy::new();
    let (engine, _) = reconciler(runtime.clone(), Some(proxy.clone()));

    engine
        .up(&intent("api", "api.example.com", 8080), &token())
        .await
        .expect("deploy");
    engine.down(Some("api"), &token()).await.expect("down");

    assert!(runtime.containers().is_empty());
    assert!(runtime.network_projects().is_empty());
    assert!(proxy.routes().is_empty());
}

/// Teardown of one project leaves other projects untouched.
#[tokio::test]
async fn down_scoped_to_project() {
    let runtime = FakeRuntime::new();
    let proxy = FakeProxy::new();
    let (engine, _) = reconciler(runtime.clone(), Some(proxy.clone()));

    engine
        .up(&intent("a", "a.example.com", 8080), &token())
        .await
        .expect("deploy a");
    engine
        .up(&intent("b", "b.example.com", 9090), &token())
        .await
        .expect("deploy b");

    engine.down(Some("a"), &token()).await.expect("down a");

    let remaining = runtime.containers();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].project, "b");
    assert_eq!(runtime.network_projects(), vec!["b"]);
    assert_eq!(proxy.routes().len(), 1);
    assert!(proxy.routes().contains_key("b.example.com"));
}

/// Cancellation between create and cutover removes the new container on a
/// best-effort basis and surfaces Cancelled.
#[tokio::test]
async fn cancellation_mid_deploy_cleans_up() {
    let runtime = FakeRuntime::new();
    let cancel = token();
    *runtime.cancel_on_start.lock().unwrap() = Some(cancel.clone());
    let (engine, _) = reconciler(runtime.clone(), None);

    let err = engine
        .up(&intent("app", "app.localhost", 0), &cancel)
        .await
        .expect_err("deploy must be cancelled");
    assert!(matches!(err, Error::Cancelled), "got {err:?}");
    assert!(
        runtime.containers().is_empty(),
        "half-deployed container must be removed"
    );
}

// =============================================================================
// Stop / Start / Status / Logs
// =============================================================================

#[tokio::test]
async fn stop_only_touches_running_containers() {
    let runtime = FakeRuntime::new();
    runtime.seed("api", "aaaa1111", "api.example.com", ContainerStatus::Running);
    let stopped = runtime.seed("api", "bbbb2222", "api.example.com", ContainerStatus::Stopped);
    let (engine, _) = reconciler(runtime.clone(), None);

    engine.stop(Some("api"), &token()).await.expect("stop");

    assert!(runtime.containers().iter().all(|c| c.status == ContainerStatus::Stopped));
    // Only one stop call: the already-stopped container is skipped.
    let stops = runtime.calls().iter().filter(|c| *c == "stop").count();
    assert_eq!(stops, 1);
    assert!(runtime.containers().iter().any(|c| c.id == stopped));
}

#[tokio::test]
async fn start_resumes_stopped_containers() {
    let runtime = FakeRuntime::new();
    runtime.seed("api", "aaaa1111", "api.example.com", ContainerStatus::Stopped);
    let (engine, _) = reconciler(runtime.clone(), None);

    engine.start(Some("api"), &token()).await.expect("start");

    assert!(runtime.containers()[0].status == ContainerStatus::Running);
}

#[tokio::test]
async fn status_returns_observed_list_verbatim() {
    let runtime = FakeRuntime::new();
    runtime.seed("api", "aaaa1111", "api.example.com", ContainerStatus::Running);
    runtime.seed("web", "bbbb2222", "web.example.com", ContainerStatus::Stopped);
    let (engine, _) = reconciler(runtime.clone(), None);

    let scoped = engine.status(Some("api"), &token()).await.expect("status");
    assert_eq!(scoped.len(), 1);
    assert_eq!(scoped[0].project, "api");

    let fleet = engine.status(None, &token()).await.expect("status all");
    assert_eq!(fleet.len(), 2);
}

#[tokio::test]
async fn logs_prefer_running_container() {
    let runtime = FakeRuntime::new();
    runtime.seed("api", "aaaa1111", "api.example.com", ContainerStatus::Stopped);
    let running = runtime.seed("api", "bbbb2222", "api.example.com", ContainerStatus::Running);
    let (engine, _) = reconciler(runtime.clone(), None);

    let mut stdout = Vec::new();
    let mut stderr = Vec::new();
    engine
        .logs("api", &LogOptions::default(), &mut stdout, &mut stderr, &token())
        .await
        .expect("logs");

    assert_eq!(String::from_utf8(stdout).unwrap(), format!("logs:{running}\n"));
}

#[tokio::test]
async fn logs_without_containers_is_an_error() {
    let runtime = FakeRuntime::new();
    let (engine, _) = reconciler(runtime, None);

    let mut stdout = Vec::new();
    let mut stderr = Vec::new();
    let err = engine
        .logs("ghost", &LogOptions::default(), &mut stdout, &mut stderr, &token())
        .await
        .expect_err("logs must fail");
    assert!(matches!(err, Error::NoContainers(_)), "got {err:?}");
}
