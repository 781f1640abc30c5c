//! IPL predictor HTTP service
//!
//! Loads the trained artifacts and serves win probabilities over JSON.

use anyhow::{Context, Result};
use clap::Parser;
use ipl_predictor_core::{ArtifactPaths, PredictorConfig};
use ipl_predictor_service::{build_router, AppState};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "ipl-predictor-service")]
#[command(about = "IPL match winner prediction service")]
#[command(version)]
struct Cli {
    /// TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Artifacts directory, overriding the configured one
    #[arg(long)]
    artifacts: Option<PathBuf>,

    /// Bind address
    #[arg(long)]
    host: Option<String>,

    /// Bind port
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let mut config = PredictorConfig::load_or_default(cli.config.as_deref())
        .context("Failed to load configuration")?;
    if let Some(dir) = cli.artifacts {
        config.artifacts.dir = dir;
    }
    if let Some(host) = cli.host {
        config.service.host = host;
    }
    if let Some(port) = cli.port {
        config.service.port = port;
    }

    let paths = ArtifactPaths::from_config(&config.artifacts);
    let state = AppState::load(&paths, config.service.teams.clone())
        .with_context(|| format!("Failed to load artifacts from {}", paths.dir.display()))?;
    let app = build_router(Arc::new(state));

    let addr = format!("{}:{}", config.service.host, config.service.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!("IPL predictor service listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Prediction service terminated unexpectedly")?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for shutdown signal: {}", err);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}
