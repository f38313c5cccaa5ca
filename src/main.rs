//! SkyCast — city weather lookup server.
//!
//! Entry point. Loads configuration, initialises structured logging, opens
//! the search-history store, and serves the HTTP API with graceful
//! shutdown. If the store cannot be opened the server refuses to start.

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;

use skycast::config::AppConfig;
use skycast::server;
use skycast::server::routes::AppState;
use skycast::storage::HistoryStore;
use skycast::upstream::geocoding::GeocodingClient;
use skycast::upstream::meteo::MeteoClient;

const BANNER: &str = r#"
  ____  _  ____   __ ____    _    ____ _____
 / ___|| |/ /\ \ / // ___|  / \  / ___|_   _|
 \___ \| ' /  \ V /| |     / _ \ \___ \ | |
  ___) | . \   | | | |___ / ___ \ ___) || |
 |____/|_|\_\  |_|  \____/_/   \_\____/ |_|

  City weather lookup with search history
  v0.1.0
"#;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    let cfg = AppConfig::load("config.toml")?;

    init_logging();

    println!("{BANNER}");

    // The store opens before the listener binds; without it there is no
    // point accepting requests.
    let history = HistoryStore::open(&cfg.database.path)
        .await
        .with_context(|| format!("Failed to initialise history database: {}", cfg.database.path))?;
    info!(path = %cfg.database.path, "History database ready");

    let state = Arc::new(AppState {
        geocoder: GeocodingClient::new()?,
        meteo: MeteoClient::new()?,
        history,
    });

    let port = cfg.resolved_port();
    info!(host = %cfg.server.host, port, "SkyCast starting up");

    server::serve(state.clone(), &cfg.server.host, port).await?;

    // Let any in-flight history writes drain before exit.
    state.history.close().await;
    info!("SkyCast shut down cleanly.");

    Ok(())
}

/// Initialise the `tracing` subscriber.
fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("skycast=info"));

    let json_logging = std::env::var("SKYCAST_LOG_JSON").is_ok();

    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_thread_ids(true)
            .init();
    } else {
        fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .init();
    }
}
