use std::time::Duration;

use chrono::NaiveDate;
use rand::Rng;
use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::market::history::synthesize_history;
use crate::market::records::{round2, CommodityRecord};

/// Free-text needle -> canonical key. Matching is a case-insensitive
/// substring test in this order; the first hit wins.
pub const COMMODITY_NAMES: [(&str, &str); 8] = [
    ("Wheat", "wheat"),
    ("Rice", "rice"),
    ("Cotton", "cotton"),
    ("Sugarcane", "sugarcane"),
    ("Soyabean", "soybean"),
    ("Maize", "maize"),
    ("Gram", "gram"),
    ("Tur", "tur"),
];

/// Daily noise applied to the live average when building the history.
pub const LIVE_HISTORY_SPREAD: f64 = 0.05;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to price feed failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("price feed answered with status {0}")]
    Status(u16),

    #[error("price feed payload could not be decoded: {0}")]
    Decode(String),

    #[error("price feed returned no recognised commodities")]
    NoMatches,
}

/// Connection settings for the upstream feed.
#[derive(Debug, Clone)]
pub struct FeedSettings {
    pub base_url: String,
    pub api_key: String,
    pub limit: u32,
    pub timeout: Duration,
}

#[derive(Debug, Deserialize)]
struct Payload {
    records: Option<Vec<UpstreamRecord>>,
}

/// Upstream prices arrive as JSON numbers or as numeric strings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum PriceField {
    Number(f64),
    Text(String),
}

impl PriceField {
    fn value(&self) -> Result<f64, FetchError> {
        let parsed = match self {
            PriceField::Number(n) => Some(*n),
            PriceField::Text(s) => s.trim().parse::<f64>().ok(),
        };
        parsed
            .filter(|v| v.is_finite())
            .ok_or_else(|| FetchError::Decode(format!("price {:?} is not a finite number", self)))
    }
}

/// One row of the upstream market report.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UpstreamRecord {
    #[serde(default)]
    pub commodity: String,
    #[serde(default)]
    pub modal_price: Option<PriceField>,
    #[serde(default)]
    pub min_price: Option<PriceField>,
    #[serde(default)]
    pub max_price: Option<PriceField>,
    #[serde(default)]
    pub arrival_date: Option<String>,
}

/// Matched records of one canonical commodity, in arrival order.
#[derive(Debug, Clone, PartialEq)]
pub struct CommodityGroup {
    pub key: &'static str,
    pub prices: Vec<f64>,
    pub dates: Vec<String>,
    /// Taken from the first record of the group only.
    pub min_price: f64,
    /// Taken from the first record of the group only.
    pub max_price: f64,
}

/// Maps a free-text commodity name onto its canonical key.
pub fn canonical_commodity(name: &str) -> Option<&'static str> {
    let lowered = name.trim().to_lowercase();
    COMMODITY_NAMES
        .iter()
        .find(|(needle, _)| lowered.contains(&needle.to_lowercase()))
        .map(|(_, key)| *key)
}

/// Groups matched records by canonical key, in order of first appearance.
/// Unmatched records are dropped without inspecting their prices.
pub fn group_records(
    records: &[UpstreamRecord],
    today: NaiveDate,
) -> Result<Vec<CommodityGroup>, FetchError> {
    let mut groups: Vec<CommodityGroup> = Vec::new();
    for record in records {
        let Some(key) = canonical_commodity(&record.commodity) else {
            debug!("Skipping unrecognised commodity {:?}", record.commodity);
            continue;
        };
        let modal = match &record.modal_price {
            Some(p) => p.value()?,
            None => 0.0,
        };
        let date = record
            .arrival_date
            .clone()
            .unwrap_or_else(|| today.format("%Y-%m-%d").to_string());

        match groups.iter_mut().find(|g| g.key == key) {
            Some(group) => {
                group.prices.push(modal);
                group.dates.push(date);
            }
            None => {
                let bound = |field: &Option<PriceField>| match field {
                    Some(p) => p.value(),
                    None => Ok(modal),
                };
                groups.push(CommodityGroup {
                    key,
                    prices: vec![modal],
                    dates: vec![date],
                    min_price: bound(&record.min_price)?,
                    max_price: bound(&record.max_price)?,
                });
            }
        }
    }
    Ok(groups)
}

/// Collapses a group into the API record: mean price, first-to-last percent
/// change, and a synthetic history around the mean.
///
/// A group of two or more samples starting at zero has no defined change and
/// fails the fetch.
pub fn aggregate<R: Rng + ?Sized>(
    group: &CommodityGroup,
    today: NaiveDate,
    rng: &mut R,
) -> Result<CommodityRecord, FetchError> {
    let avg = if group.prices.is_empty() {
        0.0
    } else {
        group.prices.iter().sum::<f64>() / group.prices.len() as f64
    };
    let change = match (group.prices.first(), group.prices.last()) {
        (Some(&first), Some(&last)) if group.prices.len() > 1 => {
            if first == 0.0 {
                return Err(FetchError::Decode(format!(
                    "{} series starts at zero; change is undefined",
                    group.key
                )));
            }
            (last - first) / first * 100.0
        }
        _ => 0.0,
    };
    Ok(CommodityRecord {
        name: group.key.to_owned(),
        current_price: round2(avg),
        change: round2(change),
        history: synthesize_history(avg, LIVE_HISTORY_SPREAD, today, rng),
    })
}

/// Client for the upstream daily price report.
pub struct PriceFeed {
    client: Client,
    settings: FeedSettings,
}

impl PriceFeed {
    pub fn new(settings: FeedSettings) -> Result<PriceFeed, FetchError> {
        let client = Client::builder().timeout(settings.timeout).build()?;
        Ok(PriceFeed { client, settings })
    }

    /// Issues the single upstream request and decodes its records.
    pub fn fetch_records(&self) -> Result<Vec<UpstreamRecord>, FetchError> {
        let limit = self.settings.limit.to_string();
        let response = self
            .client
            .get(&self.settings.base_url)
            .query(&[
                ("api-key", self.settings.api_key.as_str()),
                ("format", "json"),
                ("limit", limit.as_str()),
            ])
            .send()?;

        if response.status() != StatusCode::OK {
            return Err(FetchError::Status(response.status().as_u16()));
        }
        let body = response.bytes()?;
        let payload: Payload =
            serde_json::from_slice(&body).map_err(|e| FetchError::Decode(e.to_string()))?;
        payload
            .records
            .ok_or_else(|| FetchError::Decode("response has no records array".into()))
    }

    /// Live commodity records, or the reason there are none.
    pub fn fetch_live<R: Rng + ?Sized>(
        &self,
        today: NaiveDate,
        rng: &mut R,
    ) -> Result<Vec<CommodityRecord>, FetchError> {
        let records = self.fetch_records()?;
        let groups = group_records(&records, today)?;
        if groups.is_empty() {
            return Err(FetchError::NoMatches);
        }
        groups.iter().map(|g| aggregate(g, today, rng)).collect()
    }
}
