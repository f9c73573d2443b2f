//! veriscan-api - Product/ad safety scoring service
//!
//! Orchestrates the external workflow engine (OCR, claim detection, safety
//! scoring, barcode lookup) and serves the analysis/product/auth HTTP API.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use veriscan_api::services::offline::FallbackWorkflowClient;
use veriscan_api::services::{HttpWorkflowClient, ImageStore, Orchestrator, WorkflowEngine};
use veriscan_api::AppState;
use veriscan_common::config::{Config, Overrides};

/// Command-line options (highest-priority configuration tier)
#[derive(Debug, Parser)]
#[command(name = "veriscan-api", version)]
struct Cli {
    /// Address to bind the HTTP server to
    #[arg(long)]
    bind: Option<String>,

    /// SQLite database file path
    #[arg(long)]
    database: Option<PathBuf>,

    /// Directory for uploaded images
    #[arg(long)]
    uploads: Option<PathBuf>,

    /// Base URL of the workflow engine webhooks
    #[arg(long)]
    workflow_url: Option<String>,

    /// Deployment mode: production or development
    #[arg(long)]
    mode: Option<String>,

    /// Path to a TOML config file
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    // Log build identification immediately after tracing init
    info!(
        "Starting VeriScan API v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let cli = Cli::parse();
    let overrides = Overrides {
        bind_addr: cli.bind,
        database_path: cli.database,
        uploads_dir: cli.uploads,
        workflow_base_url: cli.workflow_url,
        mode: cli.mode.as_deref().map(str::parse).transpose()?,
        token_ttl_days: None,
    };

    let config = Config::resolve(overrides, cli.config.as_ref())?;
    config.ensure_directories()?;

    info!("Deployment mode: {}", config.mode.as_str());
    info!("Database: {}", config.database_path.display());
    info!("Workflow engine: {}", config.workflow_base_url);

    let pool = veriscan_api::db::init_database_pool(&config.database_path).await?;
    info!("Database connection established");

    // The live client always exists; development mode wraps it so upstream
    // failures substitute canned responses instead of failing pipelines.
    // Production never substitutes.
    let http_client = Arc::new(HttpWorkflowClient::new(config.workflow_base_url.clone())?);
    let engine: Arc<dyn WorkflowEngine> = if config.mode.is_production() {
        http_client
    } else {
        info!("Development mode: canned workflow fallback enabled");
        Arc::new(FallbackWorkflowClient::new(http_client))
    };

    let orchestrator = Arc::new(Orchestrator::new(pool.clone(), engine));
    let image_store = ImageStore::new(&config.uploads_dir);
    let state = AppState::new(pool, orchestrator, image_store, config.token_ttl_days);
    let app = veriscan_api::build_router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!("veriscan-api listening on http://{}", config.bind_addr);
    info!("Health check: http://{}/health", config.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
