// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Weather widget routes.

use crate::error::{AppError, Result};
use crate::services::{WeatherLocation, WeatherReport};
use crate::AppState;
use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use validator::Validate;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/weather", get(get_weather))
}

/// Location query. Either both coordinates, a city name, or nothing
/// (falls back to the configured default city).
#[derive(Debug, Deserialize, Validate)]
pub struct WeatherQuery {
    #[validate(range(min = -90.0, max = 90.0))]
    lat: Option<f64>,
    #[validate(range(min = -180.0, max = 180.0))]
    lon: Option<f64>,
    #[validate(length(min = 1, max = 100))]
    city: Option<String>,
}

impl WeatherQuery {
    fn into_location(self, default_city: &str) -> Result<WeatherLocation> {
        match (self.lat, self.lon, self.city) {
            // `range` lets NaN through
            (Some(lat), Some(lon), None) if !lat.is_finite() || !lon.is_finite() => Err(
                AppError::Validation("lat and lon must be finite numbers".to_string()),
            ),
            (Some(lat), Some(lon), None) => Ok(WeatherLocation::Coordinates { lat, lon }),
            (None, None, Some(city)) => Ok(WeatherLocation::City(city.trim().to_string())),
            (None, None, None) => Ok(WeatherLocation::City(default_city.to_string())),
            (Some(_), Some(_), Some(_)) => Err(AppError::Validation(
                "use either lat/lon or city, not both".to_string(),
            )),
            _ => Err(AppError::Validation(
                "lat and lon must be given together".to_string(),
            )),
        }
    }
}

/// Current conditions plus today's rain outlook.
async fn get_weather(
    State(state): State<Arc<AppState>>,
    Query(query): Query<WeatherQuery>,
) -> Result<Json<WeatherReport>> {
    query
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let location = query.into_location(&state.config.default_city)?;
    let report = state.weather_service.report(&location).await?;
    Ok(Json(report))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(lat: Option<f64>, lon: Option<f64>, city: Option<&str>) -> WeatherQuery {
        WeatherQuery {
            lat,
            lon,
            city: city.map(str::to_string),
        }
    }

    #[test]
    fn test_into_location() {
        assert_eq!(
            query(Some(1.0), Some(2.0), None).into_location("X").unwrap(),
            WeatherLocation::Coordinates { lat: 1.0, lon: 2.0 }
        );
        assert_eq!(
            query(None, None, Some(" Oslo ")).into_location("X").unwrap(),
            WeatherLocation::City("Oslo".to_string())
        );
        assert_eq!(
            query(None, None, None).into_location("London").unwrap(),
            WeatherLocation::City("London".to_string())
        );
        assert!(query(Some(1.0), None, None).into_location("X").is_err());
        assert!(query(Some(1.0), Some(2.0), Some("Oslo"))
            .into_location("X")
            .is_err());
    }

    #[test]
    fn test_non_finite_coordinates_rejected() {
        assert!(query(Some(f64::NAN), Some(0.0), None)
            .into_location("X")
            .is_err());
        assert!(query(Some(0.0), Some(f64::NAN), None)
            .into_location("X")
            .is_err());
        assert!(query(Some(f64::INFINITY), Some(0.0), None)
            .into_location("X")
            .is_err());
    }

    #[test]
    fn test_query_validation() {
        assert!(query(Some(91.0), Some(0.0), None).validate().is_err());
        assert!(query(Some(0.0), Some(-181.0), None).validate().is_err());
        assert!(query(None, None, Some("")).validate().is_err());
        assert!(query(None, None, Some(&"a".repeat(101))).validate().is_err());
        assert!(query(Some(45.0), Some(7.0), None).validate().is_ok());
    }
}
