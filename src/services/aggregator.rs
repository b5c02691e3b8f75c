//! Folds 3-hourly forecast samples into per-day summaries.

use chrono::{DateTime, NaiveDate};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::models::{DailyForecast, ForecastSample, round_half_up};

pub const MAX_FORECAST_DAYS: usize = 5;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AggregateError {
    #[error("Forecast contains no samples")]
    NoSamples,

    #[error("Forecast sample has an invalid timestamp: {0}")]
    InvalidTimestamp(i64),
}

/// Buckets samples by UTC calendar date and summarizes each bucket.
///
/// At most [`MAX_FORECAST_DAYS`] buckets are returned in chronological
/// order; later days are dropped.
pub fn aggregate_daily(samples: &[ForecastSample]) -> Result<Vec<DailyForecast>, AggregateError> {
    if samples.is_empty() {
        return Err(AggregateError::NoSamples);
    }

    let mut buckets: BTreeMap<NaiveDate, Vec<&ForecastSample>> = BTreeMap::new();
    for sample in samples {
        let date = DateTime::from_timestamp(sample.timestamp, 0)
            .ok_or(AggregateError::InvalidTimestamp(sample.timestamp))?
            .date_naive();
        buckets.entry(date).or_default().push(sample);
    }

    Ok(buckets
        .into_iter()
        .take(MAX_FORECAST_DAYS)
        .map(|(date, day)| summarize_day(date, &day))
        .collect())
}

fn summarize_day(date: NaiveDate, day: &[&ForecastSample]) -> DailyForecast {
    let high = day
        .iter()
        .map(|s| s.temperature)
        .fold(f64::NEG_INFINITY, f64::max);
    let low = day
        .iter()
        .map(|s| s.temperature)
        .fold(f64::INFINITY, f64::min);

    let condition = mode_condition(day);
    // The mode always comes from the bucket, so a match exists.
    let representative = day
        .iter()
        .find(|s| s.condition == condition)
        .unwrap_or(&day[0]);

    #[allow(clippy::cast_precision_loss)]
    let mean_pop = day.iter().map(|s| s.pop).sum::<f64>() / day.len() as f64;

    DailyForecast {
        date: date.format("%Y-%m-%d").to_string(),
        high: round_half_up(high),
        low: round_half_up(low),
        condition,
        icon: representative.icon.clone(),
        rain_chance: round_half_up(mean_pop * 100.0),
        description: representative.description.clone(),
    }
}

/// Most frequent condition; on a tie the one seen first wins.
fn mode_condition(day: &[&ForecastSample]) -> String {
    let mut counts: Vec<(&str, usize)> = Vec::new();
    for sample in day {
        match counts.iter_mut().find(|(c, _)| *c == sample.condition) {
            Some((_, n)) => *n += 1,
            None => counts.push((&sample.condition, 1)),
        }
    }

    let mut best: Option<(&str, usize)> = None;
    for (condition, count) in counts {
        if best.is_none_or(|(_, n)| count > n) {
            best = Some((condition, count));
        }
    }

    best.map(|(c, _)| c.to_string()).unwrap_or_default()
}
