// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! OpenWeatherMap API client.
//!
//! Handles:
//! - Current conditions (`/data/2.5/weather`)
//! - 5-day / 3-hour forecast (`/data/2.5/forecast`)
//! - Mapping provider JSON into forecast entries and condition snapshots

use crate::error::AppError;
use crate::models::{ConditionCategory, CurrentConditions, ForecastEntry};
use serde::Deserialize;
use std::time::Duration;

const OPENWEATHER_BASE_URL: &str = "https://api.openweathermap.org";

/// Where to fetch weather for.
#[derive(Debug, Clone, PartialEq)]
pub enum WeatherLocation {
    Coordinates { lat: f64, lon: f64 },
    City(String),
}

impl WeatherLocation {
    fn query_pairs(&self) -> Vec<(&'static str, String)> {
        match self {
            WeatherLocation::Coordinates { lat, lon } => {
                vec![("lat", lat.to_string()), ("lon", lon.to_string())]
            }
            WeatherLocation::City(name) => vec![("q", name.clone())],
        }
    }
}

/// OpenWeatherMap API client.
#[derive(Clone)]
pub struct OpenWeatherClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    units: String,
}

impl OpenWeatherClient {
    /// Create a new client against the public OpenWeatherMap endpoint.
    pub fn new(api_key: String, units: String) -> Self {
        Self::with_base_url(api_key, units, OPENWEATHER_BASE_URL.to_string())
    }

    /// Create a client against a custom base URL (used by tests).
    pub fn with_base_url(api_key: String, units: String, base_url: String) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_default();

        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            units,
        }
    }

    /// Fetch current conditions.
    pub async fn current_conditions(
        &self,
        location: &WeatherLocation,
    ) -> Result<CurrentConditions, AppError> {
        let url = format!("{}/data/2.5/weather", self.base_url);
        let response: CurrentWeatherResponse = self.get_json(&url, location).await?;
        Ok(response.into_conditions())
    }

    /// Fetch the 3-hour forecast series.
    pub async fn forecast(&self, location: &WeatherLocation) -> Result<Vec<ForecastEntry>, AppError> {
        let url = format!("{}/data/2.5/forecast", self.base_url);
        let response: ForecastResponse = self.get_json(&url, location).await?;
        Ok(response.into_entries())
    }

    /// Generic GET request with JSON response.
    async fn get_json<T: for<'de> Deserialize<'de>>(
        &self,
        url: &str,
        location: &WeatherLocation,
    ) -> Result<T, AppError> {
        let mut query = location.query_pairs();
        query.push(("appid", self.api_key.clone()));
        query.push(("units", self.units.clone()));

        let response = self
            .http
            .get(url)
            .query(&query)
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("OpenWeather request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();

            if status.as_u16() == 404 {
                return Err(AppError::NotFound("Weather location not found".to_string()));
            }

            if status.as_u16() == 401 {
                tracing::error!("OpenWeather rejected the API key");
                return Err(AppError::Upstream(
                    "OpenWeather rejected the API key".to_string(),
                ));
            }

            return Err(AppError::Upstream(format!("HTTP {}: {}", status, body)));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::Upstream(format!("JSON parse error: {}", e)))
    }
}

/// `weather[]` element shared by both endpoints.
#[derive(Debug, Clone, Deserialize)]
struct WeatherDescription {
    main: String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Clone, Deserialize)]
struct MainReadings {
    temp: f64,
    humidity: f64,
}

/// Current weather response (subset).
#[derive(Debug, Clone, Deserialize)]
struct CurrentWeatherResponse {
    #[serde(default)]
    weather: Vec<WeatherDescription>,
    main: MainReadings,
}

impl CurrentWeatherResponse {
    fn into_conditions(self) -> CurrentConditions {
        let first = self.weather.into_iter().next();
        CurrentConditions {
            condition: first
                .as_ref()
                .map(|w| ConditionCategory::from_provider(&w.main))
                .unwrap_or_default(),
            humidity: self.main.humidity.round().clamp(0.0, 100.0) as u8,
            temperature: self.main.temp,
            description: first.map(|w| w.description).unwrap_or_default(),
        }
    }
}

/// Forecast response (subset).
#[derive(Debug, Clone, Deserialize)]
struct ForecastResponse {
    #[serde(default)]
    list: Vec<ForecastItem>,
}

#[derive(Debug, Clone, Deserialize)]
struct ForecastItem {
    dt: i64,
    /// Missing on some items; treated as no chance of rain
    #[serde(default)]
    pop: f64,
}

impl ForecastResponse {
    fn into_entries(self) -> Vec<ForecastEntry> {
        self.list
            .into_iter()
            .map(|item| ForecastEntry {
                timestamp: item.dt,
                precipitation_chance: if item.pop.is_finite() {
                    item.pop.clamp(0.0, 1.0)
                } else {
                    0.0
                },
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> OpenWeatherClient {
        OpenWeatherClient::with_base_url("key".to_string(), "metric".to_string(), server.uri())
    }

    #[tokio::test]
    async fn test_current_conditions_mapping() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/data/2.5/weather"))
            .and(query_param("q", "Oslo"))
            .and(query_param("appid", "key"))
            .and(query_param("units", "metric"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "weather": [{"main": "Drizzle", "description": "light intensity drizzle"}],
                "main": {"temp": 7.4, "humidity": 93},
                "name": "Oslo"
            })))
            .mount(&server)
            .await;

        let current = client(&server)
            .current_conditions(&WeatherLocation::City("Oslo".to_string()))
            .await
            .unwrap();

        assert_eq!(current.condition, ConditionCategory::Drizzle);
        assert_eq!(current.humidity, 93);
        assert_eq!(current.description, "light intensity drizzle");
    }

    #[tokio::test]
    async fn test_forecast_mapping_clamps_and_defaults_pop() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/data/2.5/forecast"))
            .and(query_param("lat", "59.9"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "list": [
                    {"dt": 1000, "pop": 0.42},
                    {"dt": 11800},
                    {"dt": 22600, "pop": 1.3}
                ]
            })))
            .mount(&server)
            .await;

        let entries = client(&server)
            .forecast(&WeatherLocation::Coordinates { lat: 59.9, lon: 10.7 })
            .await
            .unwrap();

        let chances: Vec<_> = entries.iter().map(|e| e.precipitation_chance).collect();
        assert_eq!(chances, vec![0.42, 0.0, 1.0]);
        assert_eq!(entries[1].timestamp, 11800);
    }

    #[tokio::test]
    async fn test_unknown_city_is_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({"cod": "404"})))
            .mount(&server)
            .await;

        let result = client(&server)
            .current_conditions(&WeatherLocation::City("Nowhere".to_string()))
            .await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_server_error_is_upstream() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let result = client(&server)
            .forecast(&WeatherLocation::City("Oslo".to_string()))
            .await;
        assert!(matches!(result, Err(AppError::Upstream(_))));
    }
}
