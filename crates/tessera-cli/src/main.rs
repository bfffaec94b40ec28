use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, ValueEnum};
use eyre::{Result, WrapErr};
use tessera_core::app::{AppManifest, OrchestratorBuilder};
use tessera_core::domain::{LifecycleExports, LifecycleFn, Props};
use tessera_core::impls::{MemoryHost, StaticModuleLoader};
use tokio::time::{Duration, timeout};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Run a manifest of apps against an in-memory host and print the final states.
#[derive(Debug, Parser)]
#[command(name = "tessera", version)]
struct Cli {
    /// JSON manifest declaring the apps
    #[arg(long)]
    manifest: PathBuf,

    /// URLs to push onto the history after start, in order
    #[arg(long = "navigate", value_name = "URL")]
    navigate: Vec<String>,

    #[arg(long, value_enum, default_value_t = LogFormat::Compact)]
    log_format: LogFormat,

    /// How long to wait for each navigation's lifecycles to settle
    #[arg(long, default_value_t = 2000)]
    settle_timeout_ms: u64,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogFormat {
    Compact,
    Json,
    Pretty,
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match format {
        LogFormat::Compact => builder.compact().init(),
        LogFormat::Json => builder.json().init(),
        LogFormat::Pretty => builder.pretty().init(),
    }
}

/// Lifecycle that only logs, standing in for real app code.
fn logging(app: &str, phase: &'static str) -> LifecycleFn {
    let app = app.to_string();
    LifecycleFn::new(move |props: Props| {
        let app = app.clone();
        async move {
            info!(%app, phase, %props, "lifecycle");
            Ok(())
        }
    })
}

fn loader_for(manifest: &AppManifest) -> StaticModuleLoader {
    manifest
        .apps
        .iter()
        .fold(StaticModuleLoader::new(), |loader, declaration| {
            let name = declaration.name.as_str();
            loader.with_exports(
                declaration.entry.clone(),
                LifecycleExports::new()
                    .with_bootstrap(logging(name, "bootstrap"))
                    .with_mount(logging(name, "mount"))
                    .with_unmount(logging(name, "unmount"))
                    .with_update(logging(name, "update")),
            )
        })
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_format);

    let manifest = AppManifest::from_path(&cli.manifest)
        .wrap_err(format!("failed to read manifest {}", cli.manifest.display()))?;
    let initial_url = manifest
        .initial_url
        .clone()
        .unwrap_or_else(|| "http://localhost/".to_string());

    let host = Arc::new(MemoryHost::parse(&initial_url)?);
    let orchestrator = OrchestratorBuilder::new()
        .host_window(host)
        .module_loader(Arc::new(loader_for(&manifest)))
        .build()?;

    orchestrator.register_manifest(&manifest).await?;
    orchestrator.start().await?.wait().await?;

    let settle_timeout = Duration::from_millis(cli.settle_timeout_ms);
    let mut settled = orchestrator.settled_navigations();
    for url in &cli.navigate {
        info!(%url, "navigate");
        let target = *settled.borrow_and_update() + 1;
        if !orchestrator.push_state(serde_json::Value::Null, url)? {
            info!(%url, "location unchanged, nothing to reroute");
            continue;
        }

        // the reroute runs on the navigation loop; wait until its work has settled
        let reached = timeout(settle_timeout, settled.wait_for(|n| *n >= target))
            .await
            .is_ok_and(|changed| changed.is_ok());
        if !reached {
            tracing::warn!(%url, "lifecycles did not settle in time");
        }
    }

    let snapshot = orchestrator.snapshot().await;
    println!("{}", serde_json::to_string_pretty(&snapshot)?);

    orchestrator.shutdown().await;
    Ok(())
}
