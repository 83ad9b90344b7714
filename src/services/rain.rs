// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Precipitation aggregation for "today".
//!
//! Everything here is pure: forecast entries and current conditions in,
//! a combined probability and a list of rain periods out. Entries are
//! treated as independent events, so the chance of rain at some point in
//! the day is `1 - Π(1 - pᵢ)`.

use crate::error::AppError;
use crate::models::{CurrentConditions, ForecastEntry, RainPeriod};
use crate::time_utils::{format_local_hhmm, local_day_bounds};
use chrono::{DateTime, TimeZone, Utc};
use serde::Serialize;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Chance at or above which a forecast slot counts as rainy.
pub const DEFAULT_RAIN_THRESHOLD: f64 = 0.3;

/// Forecast granularity (3 hours).
pub const FORECAST_SLOT_SECS: i64 = 3 * 60 * 60;

/// Half-width of the synthesized period when it is raining with no forecast.
const FALLBACK_HALF_WINDOW_SECS: i64 = 2 * 60 * 60;

/// Where the reported probability came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "snake_case")]
pub enum ProbabilitySource {
    /// Combined from today's forecast entries
    Forecast,
    /// Estimated from current conditions (no forecast entries for today)
    Heuristic,
}

/// Combined chance (0-100) that it rains at some point across `entries`.
///
/// Returns `None` when there are no entries; callers fall back to
/// [`heuristic_probability`].
pub fn aggregate_today_probability(entries: &[ForecastEntry]) -> Option<u8> {
    if entries.is_empty() {
        return None;
    }

    let all_dry: f64 = entries
        .iter()
        .map(|e| 1.0 - e.precipitation_chance.clamp(0.0, 1.0))
        .product();

    Some(to_percent(1.0 - all_dry))
}

/// Estimate from current conditions alone.
///
/// Active rain → 90, cloudy and humid (> 80%) → 60, anything else → 20.
pub fn heuristic_probability(current: &CurrentConditions) -> u8 {
    use crate::models::ConditionCategory;

    if current.condition.is_raining() {
        90
    } else if current.condition == ConditionCategory::Clouds && current.humidity > 80 {
        60
    } else {
        20
    }
}

/// Today's probability plus which path produced it.
pub fn today_probability(
    entries: &[ForecastEntry],
    current: &CurrentConditions,
) -> (u8, ProbabilitySource) {
    match aggregate_today_probability(entries) {
        Some(p) => (p, ProbabilitySource::Forecast),
        None => (heuristic_probability(current), ProbabilitySource::Heuristic),
    }
}

/// Keep only entries that fall on the local calendar day containing `now`.
pub fn entries_for_local_day<Tz: TimeZone>(
    entries: &[ForecastEntry],
    now: DateTime<Utc>,
    tz: &Tz,
) -> Vec<ForecastEntry> {
    let (start, end) = local_day_bounds(now, tz);
    entries
        .iter()
        .filter(|e| e.timestamp >= start && e.timestamp < end)
        .copied()
        .collect()
}

/// Group consecutive rainy slots into periods.
///
/// A slot is rainy when its chance is at least `threshold`. Each period
/// runs from the first rainy slot's start to the last rainy slot's start
/// plus one slot, and reports the highest chance seen inside it.
pub fn compute_rain_periods<Tz: TimeZone>(
    entries: &[ForecastEntry],
    threshold: f64,
    tz: &Tz,
) -> Result<Vec<RainPeriod>, AppError>
where
    Tz::Offset: std::fmt::Display,
{
    if !threshold.is_finite() || threshold <= 0.0 || threshold > 1.0 {
        return Err(AppError::Validation(format!(
            "rain threshold {} must be in (0, 1]",
            threshold
        )));
    }

    let mut sorted = entries.to_vec();
    sorted.sort_by_key(|e| e.timestamp);

    let mut periods = Vec::new();
    let mut open: Option<OpenPeriod> = None;

    for entry in &sorted {
        let rainy = entry.precipitation_chance >= threshold;
        match (rainy, open.as_mut()) {
            (true, Some(period)) => {
                period.end = entry.timestamp + FORECAST_SLOT_SECS;
                period.max_chance = period.max_chance.max(entry.precipitation_chance);
            }
            (true, None) => {
                open = Some(OpenPeriod {
                    start: entry.timestamp,
                    end: entry.timestamp + FORECAST_SLOT_SECS,
                    max_chance: entry.precipitation_chance,
                });
            }
            (false, Some(_)) => {
                if let Some(period) = open.take() {
                    periods.push(period.finish(tz));
                }
            }
            (false, None) => {}
        }
    }

    if let Some(period) = open {
        periods.push(period.finish(tz));
    }

    Ok(periods)
}

/// Single period centered on `now` when it is raining and no forecast exists.
pub fn fallback_rain_periods<Tz: TimeZone>(
    now: DateTime<Utc>,
    current: &CurrentConditions,
    tz: &Tz,
) -> Vec<RainPeriod>
where
    Tz::Offset: std::fmt::Display,
{
    if !current.condition.is_raining() {
        return Vec::new();
    }

    let now_secs = now.timestamp();
    vec![RainPeriod {
        start_label: format_local_hhmm(now_secs - FALLBACK_HALF_WINDOW_SECS, tz),
        end_label: format_local_hhmm(now_secs + FALLBACK_HALF_WINDOW_SECS, tz),
        probability_percent: heuristic_probability(current),
    }]
}

/// Rain periods for today, using the fallback when there are no entries.
pub fn rain_periods_for_today<Tz: TimeZone>(
    entries: &[ForecastEntry],
    current: &CurrentConditions,
    now: DateTime<Utc>,
    tz: &Tz,
) -> Result<Vec<RainPeriod>, AppError>
where
    Tz::Offset: std::fmt::Display,
{
    if entries.is_empty() {
        return Ok(fallback_rain_periods(now, current, tz));
    }
    compute_rain_periods(entries, DEFAULT_RAIN_THRESHOLD, tz)
}

struct OpenPeriod {
    start: i64,
    end: i64,
    max_chance: f64,
}

impl OpenPeriod {
    fn finish<Tz: TimeZone>(self, tz: &Tz) -> RainPeriod
    where
        Tz::Offset: std::fmt::Display,
    {
        RainPeriod {
            start_label: format_local_hhmm(self.start, tz),
            end_label: format_local_hhmm(self.end, tz),
            probability_percent: to_percent(self.max_chance),
        }
    }
}

fn to_percent(fraction: f64) -> u8 {
    (fraction * 100.0).round().clamp(0.0, 100.0) as u8
}
