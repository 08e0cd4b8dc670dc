use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One day of a commodity's price series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub price: f64,
}

/// Per-commodity payload of `GET /api/commodity-prices`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommodityRecord {
    pub name: String,
    pub current_price: f64,
    /// Percent change.
    pub change: f64,
    /// Oldest first.
    pub history: Vec<PricePoint>,
}

/// Rounds to two decimal places, as shown to API clients.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
