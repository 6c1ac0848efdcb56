mod script;

use anyhow::{Context, bail};
use arstep_assets::{DisposalManager, FileAssetLoader, ResourceLedger};
use arstep_scene::{DebugTextRenderer, DrawListRenderer};
use arstep_session::{Session, SessionInspector, TextPresentation, ViewerConfig};
use arstep_steps::{StepRegistry, dobot_tutorial};
use arstep_tracking::LockPolicy;
use clap::{Parser, Subcommand, ValueEnum};
use script::{Command, ScriptRunner};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "arstep-cli", about = "CLI tool for AR step-by-step tutorials")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print version and crate info
    Info,
    /// List the steps of a tutorial
    Steps {
        /// Step registry file (.yaml or .json); the built-in tutorial if omitted
        #[arg(short, long)]
        registry: Option<PathBuf>,
        /// Print the registry as YAML instead of a table
        #[arg(long)]
        yaml: bool,
    },
    /// Load every step's asset and report failures
    Validate {
        #[arg(short, long)]
        registry: Option<PathBuf>,
        /// Directory asset references are resolved against
        #[arg(short, long, default_value = ".")]
        asset_root: PathBuf,
    },
    /// Run a scripted session and print the final scene
    Simulate {
        #[arg(short, long)]
        registry: Option<PathBuf>,
        #[arg(short, long, default_value = ".")]
        asset_root: PathBuf,
        /// Viewer config file (.yaml or .json)
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Override the configured lock policy
        #[arg(long, value_enum)]
        policy: Option<PolicyArg>,
        /// Comma-separated commands: tick, found:ID, lost:ID, next, prev,
        /// goto:N, reset, restart, drag:DX:DY, pinch:RATIO, doubletap, summary
        #[arg(short, long, value_delimiter = ',', default_value = "found:hiro,tick,summary")]
        script: Vec<String>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum PolicyArg {
    OneShot,
    ContinuousFollow,
}

impl From<PolicyArg> for LockPolicy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::OneShot => LockPolicy::OneShot,
            PolicyArg::ContinuousFollow => LockPolicy::ContinuousFollow,
        }
    }
}

fn load_registry(path: Option<&Path>) -> anyhow::Result<StepRegistry> {
    match path {
        Some(path) => StepRegistry::load(path)
            .with_context(|| format!("loading step registry {}", path.display())),
        None => Ok(dobot_tutorial()),
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match cli.command {
        Commands::Info => {
            println!("arstep-cli v{}", env!("CARGO_PKG_VERSION"));
            println!("common: {}", arstep_common::crate_info());
            println!("steps: {}", arstep_steps::crate_info());
            println!("assets: {}", arstep_assets::crate_info());
            println!("scene: {}", arstep_scene::crate_info());
            println!("tracking: {}", arstep_tracking::crate_info());
            println!("input: {}", arstep_input::crate_info());
            println!("session: {}", arstep_session::crate_info());
        }
        Commands::Steps { registry, yaml } => {
            let registry = load_registry(registry.as_deref())?;
            if yaml {
                print!("{}", registry.to_yaml()?);
                return Ok(());
            }
            for step in registry.iter() {
                println!(
                    "{:>3}  {:<6} {:<24} {}",
                    step.index() + 1,
                    step.kind(),
                    step.asset(),
                    step.title().unwrap_or("-")
                );
                println!("       {}", step.text());
            }
        }
        Commands::Validate {
            registry,
            asset_root,
        } => {
            let registry = load_registry(registry.as_deref())?;
            let mut loader = FileAssetLoader::new(&asset_root);
            let mut gpu = ResourceLedger::new();
            let mut disposal = DisposalManager::new();
            let mut failures = 0;

            for step in registry.iter() {
                match loader.load_now(step.asset(), step.kind(), &mut gpu) {
                    Ok(mut object) => {
                        let missing = step
                            .content()
                            .highlight()
                            .filter(|part| !object.highlight(part, [0.0, 1.0, 0.0]));
                        let highlight = match missing {
                            Some(part) => {
                                failures += 1;
                                format!(" (highlight part '{part}' missing)")
                            }
                            None => String::new(),
                        };
                        println!(
                            "ok    step {:>2}: {} nodes={} meshes={} resources={}{highlight}",
                            step.index() + 1,
                            step.asset(),
                            object.node_count(),
                            object.mesh_count(),
                            object.gpu_handles().len()
                        );
                        disposal.dispose(Some(object), &mut gpu);
                    }
                    Err(e) => {
                        failures += 1;
                        println!("FAIL  step {:>2}: {}: {e}", step.index() + 1, step.asset());
                    }
                }
            }

            let stats = loader.stats();
            println!(
                "{} steps, {} loaded, {} failed, {} cache hits, {} resources live",
                registry.len(),
                stats.loaded,
                stats.failed,
                stats.cache_hits,
                gpu.live_count()
            );
            if failures > 0 {
                bail!("{failures} step(s) failed validation");
            }
        }
        Commands::Simulate {
            registry,
            asset_root,
            config,
            policy,
            script,
        } => {
            let registry = load_registry(registry.as_deref())?;
            let mut config = match config {
                Some(path) => ViewerConfig::load(&path)
                    .with_context(|| format!("loading viewer config {}", path.display()))?,
                None => ViewerConfig::default(),
            };
            if let Some(policy) = policy {
                config.lock_policy = policy.into();
            }
            let commands = script
                .iter()
                .map(|s| s.parse::<Command>())
                .collect::<anyhow::Result<Vec<_>>>()?;

            let loader = FileAssetLoader::new(&asset_root).with_budget(config.load_budget);
            let mut session = Session::new(registry, config, loader, TextPresentation::new());
            let mut runner = ScriptRunner::new();
            runner.run(&mut session, &commands);
            runner.settle(&mut session);

            println!("{}", SessionInspector::summary(&session));
            if let Some(info) = SessionInspector::inspect_object(&session) {
                println!("{info}");
            }
            print!("{}", session.presentation());
            print!("{}", session.render(&DebugTextRenderer::new()));
            let calls = session
                .render(&DrawListRenderer::new())
                .context("building draw list")?;
            tracing::debug!(draw_calls = calls.len(), "final frame");

            session.shutdown();
            println!("Live resources after shutdown: {}", session.gpu().live_count());
        }
    }

    Ok(())
}
