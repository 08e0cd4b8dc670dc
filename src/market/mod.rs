//! Commodity prices: a best-effort live feed with a synthetic fallback.

pub mod history;
pub mod live;
pub mod mock;
pub mod records;

use chrono::NaiveDate;
use rand::Rng;
use tracing::{info, warn};

pub use live::{FeedSettings, FetchError, PriceFeed};
pub use mock::{mock_prices, MOCK_COMMODITIES};
pub use records::{CommodityRecord, PricePoint};

/// Serves commodity prices, falling back to mock data whenever the live
/// feed yields nothing usable. Never fails.
pub struct PriceAggregator {
    feed: PriceFeed,
}

impl PriceAggregator {
    pub fn new(feed: PriceFeed) -> Self {
        PriceAggregator { feed }
    }

    pub fn get_prices(&self) -> Vec<CommodityRecord> {
        let today = chrono::Local::now().date_naive();
        self.get_prices_on(today, &mut rand::thread_rng())
    }

    pub fn get_prices_on<R: Rng + ?Sized>(&self, today: NaiveDate, rng: &mut R) -> Vec<CommodityRecord> {
        match self.feed.fetch_live(today, rng) {
            Ok(records) => {
                info!("Returning {} commodities from the live price feed", records.len());
                records
            }
            Err(e) => {
                warn!("Live price feed unavailable ({}); using mock data", e);
                mock_prices(today, rng)
            }
        }
    }
}
