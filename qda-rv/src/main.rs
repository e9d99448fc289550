//! qda-rv (Report Viewer) - Read-only QDA project reports
//!
//! Serves code frequencies, coder comparisons and coded segment searches for
//! one project database over HTTP.

use anyhow::{Context, Result};
use clap::Parser;
use qda_common::config::{
    default_config_path, project_database_path, ProjectResolver, ServerConfig, TomlConfig,
};
use qda_rv::{build_router, db, AppState};
use std::path::PathBuf;
use tracing::{error, info, warn};

#[derive(Debug, Parser)]
#[command(name = "qda-rv", version, about = "Read-only reports for QDA projects")]
struct Args {
    /// Project directory (ending in .qda)
    #[arg(short, long, env = "QDA_PROJECT")]
    project: Option<PathBuf>,

    /// TOML config file [default: <config dir>/qda/config.toml]
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Listen address
    #[arg(long)]
    host: Option<String>,

    /// Listen port
    #[arg(long)]
    port: Option<u16>,

    /// Log filter (e.g. info, debug, qda_rv=trace)
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config_path = args.config.clone().or_else(default_config_path);
    // Reported after the subscriber is installed
    let (toml_config, config_error) = match TomlConfig::load_if_present(config_path.as_deref()) {
        Ok(config) => (config, None),
        Err(e) => (TomlConfig::default(), Some(e)),
    };
    let server = ServerConfig::resolve(&toml_config, args.host, args.port, args.log_level);

    // RUST_LOG wins over the configured level
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&server.log_level)),
        )
        .init();

    if let Some(e) = config_error {
        warn!("Ignoring config file: {}", e);
    }

    info!(
        "Starting QDA Report Viewer (qda-rv) v{}",
        env!("CARGO_PKG_VERSION")
    );

    let project = ProjectResolver::new(toml_config)
        .resolve(args.project.as_deref())
        .context("Could not determine which project to open")?;
    let db_path = project_database_path(&project)?;
    info!("Project database: {}", db_path.display());

    let pool = match db::connect_readonly(&db_path).await {
        Ok(pool) => {
            info!("✓ Connected to project database (read-only)");
            pool
        }
        Err(e) => {
            error!("Failed to connect to project database: {}", e);
            return Err(e);
        }
    };

    let app = build_router(AppState::new(pool));

    let address = server.bind_address();
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {}", address))?;
    info!("qda-rv listening on http://{}", address);
    info!("Health check: http://{}/health", address);

    axum::serve(listener, app).await?;

    Ok(())
}
