//! Cabinet runner binary.
//!
//! Resolves configuration from the environment, opens the practice store
//! once, and serves the REST API.
//!
//! # Environment Variables
//! - `CABINET_REST_ADDR`: server address (default: "0.0.0.0:3000")
//! - `CABINET_DATA_DIR`: data directory (default: "./cabinet_data", created
//!   if missing)

use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_rest::AppState;
use cabinet_core::{CabinetStore, CoreConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("cabinet_core=info".parse()?)
                .add_directive("api_rest=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let addr = std::env::var("CABINET_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());
    let data_dir = std::env::var("CABINET_DATA_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(cabinet_core::DEFAULT_DATA_DIR));

    tracing::info!("-- Starting Cabinet REST API on {}", addr);
    tracing::info!("-- Data directory: {}", data_dir.display());

    let cfg = CoreConfig::new(data_dir);
    let store = CabinetStore::open(cfg)?;
    let state = AppState::new(store);

    api_rest::serve(&addr, state).await
}
