// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Weather report assembly for the weather widget.

use crate::error::AppError;
use crate::models::{ConditionCategory, RainPeriod};
use crate::services::openweather::{OpenWeatherClient, WeatherLocation};
use crate::services::rain::{self, ProbabilitySource};
use crate::time_utils::format_utc_rfc3339;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::Serialize;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Weather summary returned to the display.
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct WeatherReport {
    pub temperature: f64,
    pub condition: ConditionCategory,
    pub description: String,
    pub humidity: u8,
    /// Chance of rain at some point today, 0-100
    pub precipitation_probability: u8,
    pub probability_source: ProbabilitySource,
    pub rain_periods: Vec<RainPeriod>,
    pub fetched_at: String,
}

/// Fetches upstream weather and runs the rain aggregation.
#[derive(Clone)]
pub struct WeatherService {
    client: OpenWeatherClient,
    timezone: Tz,
}

impl WeatherService {
    pub fn new(client: OpenWeatherClient, timezone: Tz) -> Self {
        Self { client, timezone }
    }

    /// Build today's report for a location.
    ///
    /// Current conditions are required. A failed forecast fetch is logged
    /// and treated as "no forecast", which routes through the heuristic.
    pub async fn report(&self, location: &WeatherLocation) -> Result<WeatherReport, AppError> {
        self.report_at(location, Utc::now()).await
    }

    /// Same as [`Self::report`] with an explicit clock.
    pub async fn report_at(
        &self,
        location: &WeatherLocation,
        now: DateTime<Utc>,
    ) -> Result<WeatherReport, AppError> {
        let (current, forecast) = tokio::join!(
            self.client.current_conditions(location),
            self.client.forecast(location),
        );
        let current = current?;

        let forecast = match forecast {
            Ok(entries) => entries,
            Err(e) => {
                tracing::warn!(error = %e, "Forecast unavailable, using current conditions only");
                Vec::new()
            }
        };

        let today = rain::entries_for_local_day(&forecast, now, &self.timezone);
        let (precipitation_probability, probability_source) =
            rain::today_probability(&today, &current);
        let rain_periods = rain::rain_periods_for_today(&today, &current, now, &self.timezone)?;

        tracing::debug!(
            entries = today.len(),
            probability = precipitation_probability,
            periods = rain_periods.len(),
            "Weather aggregated"
        );

        Ok(WeatherReport {
            temperature: current.temperature,
            condition: current.condition,
            description: current.description,
            humidity: current.humidity,
            precipitation_probability,
            probability_source,
            rain_periods,
            fetched_at: format_utc_rfc3339(now),
        })
    }
}
