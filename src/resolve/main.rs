//! One-shot boundary lookup from the command line.
//!
//! Prints the resolution as JSON (renderer order) or GeoJSON, or lists
//! autocomplete suggestions with `--suggest`.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, ValueEnum};
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use sima::autocomplete::suggest_states;
use sima::config::Config;
use sima::geoapify::GeoapifyClient;
use sima::geojson::feature_collection;
use sima::resolver::BoundaryResolver;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Format {
    /// Display name, centroid, bounds and `[lat, lon]` rings
    Json,
    /// FeatureCollection with the outline and centroid
    Geojson,
}

#[derive(Parser, Debug)]
#[command(name = "resolve")]
#[command(about = "Resolve an Indian state name to its boundary")]
struct Args {
    /// State name to look up
    query: String,

    /// Only print autocomplete suggestions for the query
    #[arg(long)]
    suggest: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: Format,

    /// TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Geoapify API key (overrides config and GEOAPIFY_KEY)
    #[arg(long)]
    api_key: Option<String>,

    /// Geoapify API root
    #[arg(long)]
    base_url: Option<String>,

    /// Attempts per provider request
    #[arg(long)]
    max_attempts: Option<u32>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so stdout stays machine-readable
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args = Args::parse();

    if args.suggest {
        for suggestion in suggest_states(&args.query) {
            println!("{}", suggestion);
        }
        return Ok(());
    }

    let mut config = Config::load(args.config.as_deref())?;
    if let Some(api_key) = args.api_key {
        config.provider.api_key = Some(api_key);
    }
    if let Some(base_url) = args.base_url {
        config.provider.base_url = base_url;
    }
    if let Some(max_attempts) = args.max_attempts {
        config.provider.max_attempts = max_attempts;
    }
    config.warn_if_keyless();

    let resolver = BoundaryResolver::new(GeoapifyClient::new(config.provider)?);

    info!("Resolving '{}'", args.query);
    let resolution = resolver.resolve(&args.query).await?;

    let output = match args.format {
        Format::Json => serde_json::to_string_pretty(&resolution)?,
        Format::Geojson => serde_json::to_string_pretty(&feature_collection(&resolution))?,
    };
    println!("{}", output);

    Ok(())
}
