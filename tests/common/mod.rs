// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use chrono::Utc;
use smart_display_api::config::Config;
use smart_display_api::models::OAuthTokenRecord;
use smart_display_api::routes::create_router;
use smart_display_api::services::{
    CalendarService, GoogleClient, GoogleEndpoints, OpenWeatherClient, TokenStore, WeatherService,
};
use smart_display_api::AppState;
use std::sync::Arc;
use tempfile::TempDir;
use wiremock::MockServer;

/// Router plus everything a test needs to poke at behind it.
#[allow(dead_code)]
pub struct TestApp {
    pub router: axum::Router,
    pub state: Arc<AppState>,
    /// Stands in for both OpenWeatherMap and Google
    pub server: MockServer,
    pub dir: TempDir,
}

/// Calendar service wired to a mock Google server and a temp token file.
#[allow(dead_code)]
pub async fn test_calendar_service(server: &MockServer, dir: &TempDir) -> CalendarService {
    let store = Arc::new(TokenStore::load(dir.path().join("tokens.json")).await);
    let google = GoogleClient::new(
        "test_client_id".to_string(),
        "test_secret".to_string(),
        "http://localhost:8080/auth/google/callback".to_string(),
        GoogleEndpoints::with_base_url(&server.uri()),
    );
    CalendarService::new(google, store)
}

/// Create a test app with all upstreams pointed at one mock server.
#[allow(dead_code)]
pub async fn create_test_app() -> TestApp {
    let server = MockServer::start().await;
    let dir = TempDir::new().expect("Failed to create temp dir");

    let mut config = Config::test_default();
    config.token_store_path = dir.path().join("tokens.json");

    let calendar_service = test_calendar_service(&server, &dir).await;
    let weather_client = OpenWeatherClient::with_base_url(
        config.openweather_api_key.clone(),
        config.weather_units.clone(),
        server.uri(),
    );
    let weather_service = WeatherService::new(weather_client, config.display_timezone);

    let state = Arc::new(AppState {
        config,
        weather_service,
        calendar_service,
    });

    TestApp {
        router: create_router(state.clone()),
        state,
        server,
        dir,
    }
}

/// A token record expiring `expires_in_secs` from now.
#[allow(dead_code)]
pub fn token_record(access: &str, expires_in_secs: i64) -> OAuthTokenRecord {
    OAuthTokenRecord {
        access_token: access.to_string(),
        refresh_token: "refresh-1".to_string(),
        expiry_epoch_millis: Some(Utc::now().timestamp_millis() + expires_in_secs * 1000),
        scope: "https://www.googleapis.com/auth/calendar.readonly".to_string(),
        token_type: "Bearer".to_string(),
    }
}
