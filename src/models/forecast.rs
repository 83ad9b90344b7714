// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Weather forecast and rain period models.

use crate::error::AppError;
use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// One 3-hour slot of the upstream forecast.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastEntry {
    /// Start of the slot (Unix seconds)
    pub timestamp: i64,
    /// Probability of precipitation in [0, 1]
    pub precipitation_chance: f64,
}

impl ForecastEntry {
    /// Build an entry, rejecting chances that are not finite or outside [0, 1].
    pub fn new(timestamp: i64, precipitation_chance: f64) -> Result<Self, AppError> {
        if !precipitation_chance.is_finite() || !(0.0..=1.0).contains(&precipitation_chance) {
            return Err(AppError::Validation(format!(
                "precipitation chance {} is outside [0, 1]",
                precipitation_chance
            )));
        }
        Ok(Self {
            timestamp,
            precipitation_chance,
        })
    }
}

/// Coarse condition category reported by the weather provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "snake_case")]
pub enum ConditionCategory {
    Clear,
    Clouds,
    Rain,
    Drizzle,
    Thunderstorm,
    Snow,
    /// Mist, fog, haze, smoke, dust and similar
    Atmosphere,
    #[default]
    Unknown,
}

impl ConditionCategory {
    /// Map OpenWeatherMap's `weather[].main` group name.
    pub fn from_provider(main: &str) -> Self {
        match main.trim().to_ascii_lowercase().as_str() {
            "clear" => Self::Clear,
            "clouds" => Self::Clouds,
            "rain" => Self::Rain,
            "drizzle" => Self::Drizzle,
            "thunderstorm" => Self::Thunderstorm,
            "snow" => Self::Snow,
            "mist" | "smoke" | "haze" | "dust" | "fog" | "sand" | "ash" | "squall" | "tornado" => {
                Self::Atmosphere
            }
            _ => Self::Unknown,
        }
    }

    /// True when the condition means precipitation is falling right now.
    pub fn is_raining(&self) -> bool {
        matches!(self, Self::Rain | Self::Drizzle | Self::Thunderstorm)
    }
}

/// Snapshot of current conditions, used when no forecast is available.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentConditions {
    pub condition: ConditionCategory,
    /// Relative humidity in percent
    pub humidity: u8,
    pub temperature: f64,
    pub description: String,
}

impl CurrentConditions {
    /// Conditions with only the fields the probability heuristic looks at.
    pub fn new(condition: ConditionCategory, humidity: u8) -> Self {
        Self {
            condition,
            humidity,
            temperature: 0.0,
            description: String::new(),
        }
    }
}

/// A contiguous stretch of the day where rain is likely.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct RainPeriod {
    /// Local start time (`HH:MM`)
    pub start_label: String,
    /// Local end time (`HH:MM`)
    pub end_label: String,
    /// Highest chance of rain within the period, 0-100
    pub probability_percent: u8,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forecast_entry_rejects_out_of_range() {
        assert!(ForecastEntry::new(0, 0.0).is_ok());
        assert!(ForecastEntry::new(0, 1.0).is_ok());
        assert!(matches!(
            ForecastEntry::new(0, 1.2),
            Err(AppError::Validation(_))
        ));
        assert!(ForecastEntry::new(0, -0.1).is_err());
        assert!(ForecastEntry::new(0, f64::NAN).is_err());
    }

    #[test]
    fn test_condition_from_provider() {
        assert_eq!(ConditionCategory::from_provider("Rain"), ConditionCategory::Rain);
        assert_eq!(ConditionCategory::from_provider("Clouds"), ConditionCategory::Clouds);
        assert_eq!(ConditionCategory::from_provider("Mist"), ConditionCategory::Atmosphere);
        assert_eq!(ConditionCategory::from_provider("???"), ConditionCategory::Unknown);
    }

    #[test]
    fn test_condition_is_raining() {
        assert!(ConditionCategory::Rain.is_raining());
        assert!(ConditionCategory::Drizzle.is_raining());
        assert!(ConditionCategory::Thunderstorm.is_raining());
        assert!(!ConditionCategory::Clouds.is_raining());
        assert!(!ConditionCategory::Snow.is_raining());
    }

    #[test]
    fn test_rain_period_serializes_camel_case() {
        let period = RainPeriod {
            start_label: "09:00".to_string(),
            end_label: "12:00".to_string(),
            probability_percent: 40,
        };
        let json = serde_json::to_value(&period).unwrap();
        assert_eq!(json["startLabel"], "09:00");
        assert_eq!(json["probabilityPercent"], 40);
    }
}
