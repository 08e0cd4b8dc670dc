use chrono::NaiveDate;
use rand::Rng;

use crate::market::history::synthesize_history;
use crate::market::records::{round2, CommodityRecord};

pub const MOCK_COMMODITIES: [&str; 5] = ["wheat", "rice", "cotton", "sugarcane", "soybean"];

/// Daily noise applied around the back-computed base price.
pub const MOCK_HISTORY_SPREAD: f64 = 0.02;

/// Synthetic stand-in for the live feed, shaped exactly like it.
///
/// Current price is a whole number in [2000, 5000], change in [-5, 5]
/// percent; the history hovers around the price the commodity would have
/// had before that change.
pub fn mock_prices<R: Rng + ?Sized>(today: NaiveDate, rng: &mut R) -> Vec<CommodityRecord> {
    MOCK_COMMODITIES
        .iter()
        .map(|name| {
            let current = rng.gen_range(2000u32..=5000) as f64;
            let change = rng.gen_range(-5.0..=5.0);
            let base = current / (1.0 + change / 100.0);
            CommodityRecord {
                name: (*name).to_owned(),
                current_price: round2(current),
                change: round2(change),
                history: synthesize_history(base, MOCK_HISTORY_SPREAD, today, rng),
            }
        })
        .collect()
}
