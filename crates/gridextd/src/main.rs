//! gridextd — the GridExt scheduler-extender daemon.
//!
//! Assembles the extender from configuration: registry (predicates +
//! weighted priorities) → decision pipeline → wire adapter, then
//! serves the callback routes until interrupted.
//!
//! # Usage
//!
//! ```text
//! gridextd serve --config /etc/gridext/gridext.toml
//! gridextd serve --port 8880
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::info;

use gridext_core::ExtenderConfig;
use gridext_engine::{DecisionPipeline, ExtenderRegistry};

#[derive(Parser)]
#[command(name = "gridextd", about = "GridExt scheduler-extender daemon")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the extender callbacks.
    Serve {
        /// Path to gridext.toml. Defaults apply when omitted.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Override the configured listen port.
        #[arg(long)]
        port: Option<u16>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Serve { config, port } => serve(config, port).await,
    }
}

async fn serve(config_path: Option<PathBuf>, port_override: Option<u16>) -> anyhow::Result<()> {
    let mut config = match &config_path {
        Some(path) => ExtenderConfig::from_file(path)?,
        None => ExtenderConfig::default(),
    };
    if let Some(port) = port_override {
        config.port = port;
    }

    // Initialize tracing. RUST_LOG wins over the configured filter so
    // operators can raise verbosity without touching the config file.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log_filter.parse().expect("invalid log filter")),
        )
        .init();

    info!(
        config = ?config_path,
        port = config.port,
        bind_mode = ?config.bind_mode,
        "gridext extender starting"
    );

    // Registry is immutable from here on; every concurrent call shares
    // it read-only through the pipeline's Arc.
    let registry = Arc::new(ExtenderRegistry::from_config(&config)?);
    info!(
        predicates = ?registry.predicates.names(),
        priorities = ?registry.aggregator.names(),
        "registry assembled"
    );

    // No cluster-commit collaborator is wired in this binary, so the
    // pipeline serves declining-mode binds; the caller binds itself.
    let pipeline = Arc::new(DecisionPipeline::new(&config, registry, None));
    let router = gridext_api::build_router(pipeline);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "extender listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("extender stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
        return;
    }
    info!("shutdown signal received");
}
