//! Indicative mandi prices.
//!
//! Prices come from a fixed per-quintal table; only the trend is random.
//! The generator takes its RNG so callers (and tests) control it.

use chrono::NaiveDate;
use rand::Rng;
use serde::Serialize;

pub const DEFAULT_STATE: &str = "Punjab";
pub const DEFAULT_MARKET: &str = "Ludhiana";
pub const DEFAULT_BASE_PRICE: f64 = 2500.0;

const PRICE_VARIATION: f64 = 0.1;

/// INR per quintal.
const CROP_BASE_PRICES: &[(&str, f64)] = &[
    ("wheat", 2200.0),
    ("rice", 2800.0),
    ("cotton", 5500.0),
    ("sugarcane", 350.0),
    ("maize", 1800.0),
    ("bajra", 2100.0),
    ("gram", 5200.0),
    ("mustard", 5800.0),
    ("groundnut", 5500.0),
    ("soybean", 4200.0),
    ("jowar", 2900.0),
    ("barley", 1750.0),
    ("lentil", 6200.0),
    ("chickpea", 5200.0),
    ("onion", 1200.0),
    ("potato", 1800.0),
    ("tomato", 2500.0),
    ("cabbage", 1500.0),
    ("cauliflower", 2000.0),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Up,
    Down,
    Stable,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceBand {
    pub min_price: i64,
    pub max_price: i64,
    pub modal_price: i64,
    pub date: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trend {
    pub direction: TrendDirection,
    pub percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarketQuote {
    pub crop: String,
    pub market: String,
    pub state: String,
    pub prices: PriceBand,
    pub trend: Trend,
    pub advisory: String,
}

#[must_use]
pub fn base_price(crop: &str) -> f64 {
    let crop = crop.to_lowercase();
    CROP_BASE_PRICES
        .iter()
        .find(|(name, _)| *name == crop)
        .map_or(DEFAULT_BASE_PRICE, |(_, price)| *price)
}

/// Draws a trend: up with probability 1/2, otherwise down 3/4 of the time.
/// The percentage lies in [0, 10] with two decimals.
pub fn draw_trend(rng: &mut impl Rng) -> Trend {
    let direction = if rng.random::<f64>() > 0.5 {
        TrendDirection::Up
    } else if rng.random::<f64>() > 0.25 {
        TrendDirection::Down
    } else {
        TrendDirection::Stable
    };

    let percentage = (rng.random::<f64>() * 10.0 * 100.0).round() / 100.0;
    Trend {
        direction,
        percentage,
    }
}

fn advisory_text(crop: &str, trend: &Trend) -> String {
    match trend.direction {
        TrendDirection::Up => format!(
            "{crop} prices are trending upward (+{}%). Good time to consider selling if you have stock. Monitor market closely for optimal selling opportunity.",
            trend.percentage
        ),
        TrendDirection::Down => format!(
            "{crop} prices are declining (-{}%). Consider holding if possible or explore value-added processing options. Check for government procurement schemes.",
            trend.percentage
        ),
        TrendDirection::Stable => format!(
            "{crop} prices are stable. Current rates are fair for trading. Consider market timing and transportation costs before selling."
        ),
    }
}

#[allow(clippy::cast_possible_truncation)]
fn round_price(value: f64) -> i64 {
    value.round() as i64
}

/// Builds a quote for `crop` at `market`, `state` dated `today`.
pub fn quote(
    rng: &mut impl Rng,
    crop: &str,
    state: Option<&str>,
    market: Option<&str>,
    today: NaiveDate,
) -> MarketQuote {
    let base = base_price(crop);
    let trend = draw_trend(rng);

    MarketQuote {
        crop: crop.to_string(),
        market: market.unwrap_or(DEFAULT_MARKET).to_string(),
        state: state.unwrap_or(DEFAULT_STATE).to_string(),
        prices: PriceBand {
            min_price: round_price(base * (1.0 - PRICE_VARIATION)),
            max_price: round_price(base * (1.0 + PRICE_VARIATION)),
            modal_price: round_price(base),
            date: today.format("%Y-%m-%d").to_string(),
        },
        advisory: advisory_text(crop, &trend),
        trend,
    }
}
