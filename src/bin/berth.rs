//! berth CLI - declare what should run, let the tool converge reality.
//!
//! ```sh
//! berth up                      # deploy ./berth.json blue/green
//! berth status --all            # every managed container
//! berth logs -p api --follow    # live logs
//! berth down --all              # tear the fleet down
//! ```

use anyhow::{bail, Context, Result};
use berth::{
    CaddyProxy, Container, DockerRuntime, Intent, LogOptions, ProgressSink, ProxyDriver,
    Reconciler,
};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Environment variable overriding the proxy admin endpoint.
const PROXY_ADMIN_ENV: &str = "BERTH_PROXY_ADMIN";

#[derive(Parser)]
#[command(name = "berth", version, about = "Single-node, intent-driven container orchestrator")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug logging.
    #[arg(long, global = true)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Deploy a project blue/green from its intent file
    Up {
        /// Intent file or directory containing berth.json
        #[arg(short, long, default_value = ".")]
        file: PathBuf,
        /// Additional intent files to process sequentially
        files: Vec<PathBuf>,
        /// Skip the reverse proxy and publish the port on the host
        #[arg(long)]
        no_proxy: bool,
        /// Deploy every *.json intent in the current directory
        #[arg(long)]
        all: bool,
    },
    /// Stop and remove containers, routes, and networks
    #[command(alias = "rm")]
    Down {
        #[arg(short, long, default_value = ".")]
        file: PathBuf,
        /// Project name (overrides the intent file)
        #[arg(short, long)]
        project: Option<String>,
        /// Skip reverse proxy route removal
        #[arg(long)]
        no_proxy: bool,
        /// Tear down every managed project
        #[arg(long)]
        all: bool,
    },
    /// Start stopped containers
    Start {
        #[arg(short, long, default_value = ".")]
        file: PathBuf,
        #[arg(short, long)]
        project: Option<String>,
        /// Start containers of every managed project
        #[arg(long)]
        all: bool,
    },
    /// Stop running containers, leaving routes intact
    Stop {
        #[arg(short, long, default_value = ".")]
        file: PathBuf,
        #[arg(short, long)]
        project: Option<String>,
    },
    /// Show the observed state of managed containers
    Status {
        #[arg(short, long, default_value = ".")]
        file: PathBuf,
        #[arg(short, long)]
        project: Option<String>,
        /// Show every managed project
        #[arg(long)]
        all: bool,
    },
    /// Stream container logs
    Logs {
        #[arg(short, long, default_value = ".")]
        file: PathBuf,
        #[arg(short, long)]
        project: Option<String>,
        /// Keep the stream open and follow new output
        #[arg(long)]
        follow: bool,
        /// Only show the last N lines
        #[arg(long)]
        tail: Option<u32>,
    },
}

/// Progress sink printing human-readable steps to the terminal.
struct ConsoleProgress;

impl ProgressSink for ConsoleProgress {
    fn step(&self, message: &str) {
        println!("  {message}");
    }

    fn warn(&self, message: &str) {
        eprintln!("  warning: {message}");
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.debug { "berth=debug" } else { "berth=warn" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    // Ctrl-C cancels the in-flight operation; cleanup paths run on their own
    // tokens so a cancelled deploy still removes its half-made container.
    let cancel = CancellationToken::new();
    let signal_token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            signal_token.cancel();
        }
    });

    match cli.command {
        Commands::Up {
            file,
            files,
            no_proxy,
            all,
        } => up(file, files, no_proxy, all, &cancel).await,
        Commands::Down {
            file,
            project,
            no_proxy,
            all,
        } => {
            let scope = resolve_scope(&file, project, all)?;
            let reconciler = build_reconciler(no_proxy).await?;
            reconciler.down(scope.as_deref(), &cancel).await?;
            println!("resources removed");
            Ok(())
        }
        Commands::Start { file, project, all } => {
            let scope = resolve_scope(&file, project, all)?;
            let reconciler = build_reconciler(true).await?;
            reconciler.start(scope.as_deref(), &cancel).await?;
            Ok(())
        }
        Commands::Stop { file, project } => {
            let scope = resolve_scope(&file, project, false)?;
            let reconciler = build_reconciler(true).await?;
            reconciler.stop(scope.as_deref(), &cancel).await?;
            Ok(())
        }
        Commands::Status { file, project, all } => {
            let scope = resolve_scope(&file, project, all)?;
            let reconciler = build_reconciler(true).await?;
            let containers = reconciler.status(scope.as_deref(), &cancel).await?;
            print_status(&containers, scope.as_deref());
            Ok(())
        }
        Commands::Logs {
            file,
            project,
            follow,
            tail,
        } => {
            let project = match project {
                Some(p) => p,
                None => Intent::load(&file)
                    .map(|i| i.project)
                    .context("specify --project or provide a valid intent file")?,
            };
            let reconciler = build_reconciler(true).await?;
            let opts = LogOptions {
                follow,
                tail,
                timestamps: false,
            };
            let mut stdout = tokio::io::stdout();
            let mut stderr = tokio::io::stderr();
            reconciler
                .logs(&project, &opts, &mut stdout, &mut stderr, &cancel)
                .await?;
            Ok(())
        }
    }
}

/// Determines the project scope: `None` means the whole fleet.
fn resolve_scope(file: &std::path::Path, project: Option<String>, all: bool) -> Result<Option<String>> {
    if all {
        return Ok(None);
    }
    if let Some(p) = project {
        return Ok(Some(p));
    }
    let intent = Intent::load(file)?;
    Ok(Some(intent.project))
}

/// Builds a reconciler over the Docker engine and, unless disabled, a Caddy
/// proxy probed for reachability. An unreachable proxy degrades to
/// local-only mode with a warning.
async fn build_reconciler(no_proxy: bool) -> Result<Reconciler> {
    let runtime = DockerRuntime::new().context("cannot connect to Docker")?;
    runtime.ping().await.context("Docker is not responding")?;

    let proxy: Option<Arc<dyn ProxyDriver>> = if no_proxy {
        None
    } else {
        let admin_url = std::env::var(PROXY_ADMIN_ENV).unwrap_or_default();
        let caddy = CaddyProxy::new(&admin_url)?;
        match caddy.health().await {
            Ok(()) => Some(Arc::new(caddy)),
            Err(e) => {
                eprintln!("  warning: proxy not available, continuing without it: {e}");
                None
            }
        }
    };

    Ok(Reconciler::new(Arc::new(runtime), proxy).with_progress(Arc::new(ConsoleProgress)))
}

async fn up(
    file: PathBuf,
    extra: Vec<PathBuf>,
    no_proxy: bool,
    all: bool,
    cancel: &CancellationToken,
) -> Result<()> {
    let targets = if all {
        intent_files_in_cwd()?
    } else if !extra.is_empty() {
        extra
    } else {
        vec![file]
    };
    if targets.is_empty() {
        bail!("no intent files found");
    }

    let reconciler = build_reconciler(no_proxy).await?;

    let mut failures = 0usize;
    for path in &targets {
        println!("reading {}", path.display());
        let intent = match Intent::load(path) {
            Ok(i) => i,
            Err(e) => {
                eprintln!("  failed to load {}: {e}", path.display());
                failures += 1;
                continue;
            }
        };

        match reconciler.up(&intent, cancel).await {
            Ok(deployment) => {
                println!("deploy of '{}' complete", deployment.project);
                print_access(&intent, deployment.public_port, deployment.routed);
            }
            Err(e) => {
                eprintln!("  deploy of '{}' failed: {e}", intent.project);
                failures += 1;
            }
        }
    }

    if failures > 0 {
        bail!("{failures} of {} deploys failed", targets.len());
    }
    Ok(())
}

/// All *.json files in the current directory, for `up --all`.
fn intent_files_in_cwd() -> Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = std::fs::read_dir(".")?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
        .collect();
    files.sort();
    Ok(files)
}

fn print_access(intent: &Intent, public_port: Option<u16>, routed: bool) {
    if intent.is_local_domain() {
        let port = public_port.unwrap_or(intent.port);
        println!("  local access:");
        println!("    http://localhost:{port}");
        if routed {
            println!("    https://{} (via proxy)", intent.domain);
        }
    } else {
        println!("  access: https://{}", intent.domain);
    }
}

fn print_status(containers: &[Container], scope: Option<&str>) {
    if containers.is_empty() {
        match scope {
            Some(p) => println!("no containers found for project '{p}'"),
            None => println!("no managed containers"),
        }
        return;
    }

    println!(
        "{:<16} {:<32} {:<10} {:<10} {:<8}",
        "PROJECT", "NAME", "STATUS", "HEALTH", "VERSION"
    );
    for c in containers {
        println!(
            "{:<16} {:<32} {:<10} {:<10} {:<8}",
            c.project,
            c.name,
            c.status.to_string(),
            c.health.to_string(),
            c.short_version(),
        );
    }
}
