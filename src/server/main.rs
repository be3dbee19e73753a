//! Map server for Indian state boundaries.
//!
//! Serves the map page plus JSON endpoints for autocomplete, one-shot
//! boundary resolution and one search session per map client.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use sima::config::Config;
use sima::geoapify::GeoapifyClient;
use sima::resolver::BoundaryResolver;
use sima::session::SessionStore;

mod handlers;
use handlers::AppState;

#[derive(Parser, Debug)]
#[command(name = "server")]
#[command(about = "Indian state boundary map server")]
struct Args {
    /// Listen address (overrides config and SIMA_LISTEN)
    #[arg(short, long)]
    listen: Option<String>,

    /// TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Geoapify API root
    #[arg(long)]
    base_url: Option<String>,

    /// Attempts per provider request
    #[arg(long)]
    max_attempts: Option<u32>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args = Args::parse();

    let mut config = Config::load(args.config.as_deref())?;
    if let Some(listen) = args.listen {
        config.server.listen = listen;
    }
    if let Some(base_url) = args.base_url {
        config.provider.base_url = base_url;
    }
    if let Some(max_attempts) = args.max_attempts {
        config.provider.max_attempts = max_attempts;
    }
    let api_key_configured = !config.warn_if_keyless();

    info!("Sima Map Server");
    info!("Provider at {}", config.provider.base_url);

    let client = GeoapifyClient::new(config.provider.clone())?;
    let state = Arc::new(AppState {
        sessions: SessionStore::new(
            BoundaryResolver::new(client),
            Duration::from_secs(config.server.session_idle_secs),
        ),
        api_key_configured,
    });

    // Build router
    let app = handlers::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    info!("Starting server on {}", config.server.listen);

    let listener = tokio::net::TcpListener::bind(&config.server.listen)
        .await
        .with_context(|| format!("Failed to bind {}", config.server.listen))?;
    axum::serve(listener, app).await?;

    Ok(())
}
