use chrono::{Duration, NaiveDate};
use rand::Rng;

use crate::market::records::{round2, PricePoint};

pub const HISTORY_DAYS: usize = 30;

/// Builds a cosmetic `HISTORY_DAYS`-long series ending on `today`, each day
/// being `base` perturbed by independent uniform noise in `[-spread, +spread]`
/// (a fraction, e.g. `0.05` for ±5%).
pub fn synthesize_history<R: Rng + ?Sized>(
    base: f64,
    spread: f64,
    today: NaiveDate,
    rng: &mut R,
) -> Vec<PricePoint> {
    (0..HISTORY_DAYS)
        .map(|i| {
            let days_back = (HISTORY_DAYS - 1 - i) as i64;
            let noise = if spread > 0.0 { rng.gen_range(-spread..=spread) } else { 0.0 };
            PricePoint {
                date: today - Duration::days(days_back),
                price: round2(base * (1.0 + noise)),
            }
        })
        .collect()
}
