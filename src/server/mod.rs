//! Blocking HTTP facade over the classifier and the price aggregator.
//!
//! Served by tiny_http; every request is handled on its own thread and the
//! handlers share one [`AppState`].

pub mod error;
pub mod handlers;
pub mod routes;
pub mod util;

use std::sync::Arc;

use tiny_http::Server;

use crate::classifier::DiseaseClassifier;
use crate::config::Config;
use crate::market::{FetchError, PriceAggregator, PriceFeed};

/// Long-lived collaborators injected into every handler.
pub struct AppState {
    pub classifier: DiseaseClassifier,
    pub prices: PriceAggregator,
}

impl AppState {
    pub fn new(classifier: DiseaseClassifier, prices: PriceAggregator) -> Self {
        AppState { classifier, prices }
    }

    pub fn from_config(config: &Config) -> Result<Self, FetchError> {
        let feed = PriceFeed::new(config.feed_settings())?;
        Ok(AppState::new(
            DiseaseClassifier::new(config.model_source()),
            PriceAggregator::new(feed),
        ))
    }
}

pub type SharedState = Arc<AppState>;

/// Accepts requests forever, one thread each.
pub fn serve(server: Server, state: SharedState) {
    for request in server.incoming_requests() {
        let state = state.clone();
        std::thread::spawn(move || routes::dispatch(request, state));
    }
}
