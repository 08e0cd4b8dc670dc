//! AgriShield API server.
//!
//! Run with:
//!   cargo run --release -- --port 5000
//! Endpoints: POST /predict, GET /api/commodity-prices, GET /health

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tiny_http::Server;
use tracing::info;

use agrishield::{logging, server, AppState, Config};

fn main() -> anyhow::Result<()> {
    let config = Config::parse();
    logging::init(config.verbose);

    info!("AgriShield v{}", env!("CARGO_PKG_VERSION"));
    info!("  Model candidates: {:?}", config.model_candidates());
    info!("  Price feed:       {}", config.price_base_url);

    let state = Arc::new(AppState::from_config(&config).context("failed to build price feed client")?);

    if config.preload {
        info!("Loading ML model...");
        let loaded = state.classifier.ensure_loaded();
        info!("Model {}", if loaded { "loaded" } else { "not loaded; serving fallback predictions" });
    }

    let addr = config.bind_addr();
    let server = Server::http(&addr).map_err(|e| anyhow::anyhow!("failed to bind {}: {}", addr, e))?;
    info!("Listening on http://{}", addr);

    server::serve(server, state);
    Ok(())
}
