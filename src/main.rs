use std::path::PathBuf;

use anyhow::{Context, Result};
use citycast::api::AppState;
use citycast::config::LoggingConfig;
use citycast::{CitycastConfig, JsonFileHistory, WeatherService, web};
use clap::Parser;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// City weather lookup server
#[derive(Parser, Debug)]
#[command(name = "citycast", version, about)]
struct Args {
    /// Path to a TOML config file (defaults to ./citycast.toml if present)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the listening port
    #[arg(long)]
    port: Option<u16>,
}

fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{},tower_http=info", logging.level)));

    let registry = tracing_subscriber::registry().with(filter);
    if logging.format == "json" {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    dotenvy::dotenv().ok();

    let mut config = CitycastConfig::load_from_path(args.config)?;
    if let Some(port) = args.port {
        config.server.port = port;
    }

    init_tracing(&config.logging);
    config.validate_provider()?;

    tracing::info!("Starting citycast {}", citycast::VERSION);
    tracing::info!(
        "Provider {} ({} units), history at {}",
        config.weather.base_url,
        config.weather.units.as_query_value(),
        config.history.path
    );

    let weather =
        WeatherService::new(&config.weather).context("Failed to create weather service")?;
    let history = JsonFileHistory::new(&config.history.path);
    let state = AppState::new(weather, history);

    web::run(&config.server, state).await
}
