// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for date/time formatting.

use chrono::{DateTime, Duration, LocalResult, NaiveDate, NaiveTime, SecondsFormat, TimeZone, Utc};

/// Format a UTC timestamp as RFC3339 using a `Z` suffix.
pub fn format_utc_rfc3339(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Format a Unix timestamp (seconds) as `HH:MM` in the given timezone.
pub fn format_local_hhmm<Tz: TimeZone>(timestamp: i64, tz: &Tz) -> String
where
    Tz::Offset: std::fmt::Display,
{
    match DateTime::from_timestamp(timestamp, 0) {
        Some(utc) => utc.with_timezone(tz).format("%H:%M").to_string(),
        None => "--:--".to_string(),
    }
}

/// Unix timestamps (seconds) of local midnight on the day containing `now`
/// and of the following local midnight, as a half-open range.
pub fn local_day_bounds<Tz: TimeZone>(now: DateTime<Utc>, tz: &Tz) -> (i64, i64) {
    let today = now.with_timezone(tz).date_naive();
    let tomorrow = today.succ_opt().unwrap_or(today);
    (
        local_midnight(today, tz).timestamp(),
        local_midnight(tomorrow, tz).timestamp(),
    )
}

/// Longest DST gap searched when local midnight does not exist.
const MAX_GAP_MINUTES: i64 = 24 * 60;

fn local_midnight<Tz: TimeZone>(date: NaiveDate, tz: &Tz) -> DateTime<Utc> {
    let midnight = date.and_time(NaiveTime::MIN);
    match tz.from_local_datetime(&midnight) {
        LocalResult::Single(dt) => dt.with_timezone(&Utc),
        LocalResult::Ambiguous(earliest, _) => earliest.with_timezone(&Utc),
        // Midnight skipped by a DST transition; the day starts at the
        // first local time after the gap.
        LocalResult::None => (1..=MAX_GAP_MINUTES)
            .find_map(|minutes| {
                tz.from_local_datetime(&(midnight + Duration::minutes(minutes)))
                    .earliest()
            })
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|| Utc.from_utc_datetime(&midnight)),
    }
}
