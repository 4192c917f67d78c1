//! canvass-dash - volunteer canvassing service
//!
//! Loads the address set through the source chain, then serves canvassing
//! sessions over HTTP. All session state is in memory.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use canvass_common::config::{ConfigResolver, ConfigSource};
use canvass_dash::ingest::AddressLoader;
use canvass_dash::{build_router, AppState};

#[derive(Parser, Debug)]
#[command(name = "canvass-dash")]
#[command(about = "Volunteer canvassing dashboard service")]
#[command(version)]
struct Args {
    /// Config file (TOML); falls back to CANVASS_CONFIG, then the user config dir
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address to bind
    #[arg(short, long)]
    bind: Option<String>,

    /// Port to listen on
    #[arg(short, long, env = "CANVASS_PORT")]
    port: Option<u16>,

    /// Local address file, tried before configured paths (repeatable)
    #[arg(short, long = "data")]
    data: Vec<PathBuf>,

    /// Skip the remote fetch tier
    #[arg(long)]
    offline: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let resolver = ConfigResolver::new(args.config.clone());
    let source = resolver.resolve();
    let mut config = resolver.load().context("Failed to load configuration")?;

    // Tracing needs the configured level, so it starts after the config read
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.logging.level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!(
        "Starting canvass-dash v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    match &source {
        ConfigSource::Defaults => warn!("No config file found, using built-in defaults"),
        ConfigSource::CommandLine(path)
        | ConfigSource::Environment(path)
        | ConfigSource::UserConfig(path) => info!("Config: {}", path.display()),
    }

    if let Some(bind) = args.bind {
        config.server.bind = bind;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if !args.data.is_empty() {
        let mut paths = args.data;
        paths.append(&mut config.data.local_paths);
        config.data.local_paths = paths;
    }
    if args.offline {
        config.data.offline = true;
    }

    let loader = AddressLoader::new(&config.data).context("Failed to build address loader")?;
    let state = AppState::bootstrap(loader)
        .await
        .with_upload_limit(config.data.max_upload_bytes);
    {
        let dataset = state.dataset.read().await;
        info!(
            "Loaded {} addresses from {} ({:?})",
            dataset.len(),
            dataset.loaded_from.location,
            dataset.loaded_from.kind
        );
    }

    let app = build_router(state);

    let addr = format!("{}:{}", config.server.bind, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("canvass-dash listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
