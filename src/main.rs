// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Smart Display API Server
//!
//! Serves weather and calendar data to the dashboard widgets and manages
//! the Google OAuth tokens of the display user.

use smart_display_api::{
    config::Config,
    services::{
        CalendarService, GoogleClient, GoogleEndpoints, OpenWeatherClient, TokenStore,
        WeatherService,
    },
    AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging
    init_logging()?;

    // Load configuration from environment
    let config = Config::from_env()?;
    tracing::info!(
        port = config.port,
        timezone = %config.display_timezone,
        "Starting Smart Display API"
    );

    // Load persisted OAuth tokens
    let token_store = Arc::new(TokenStore::load(config.token_store_path.clone()).await);

    let google = GoogleClient::new(
        config.google_client_id.clone(),
        config.google_client_secret.clone(),
        config.google_redirect_uri.clone(),
        GoogleEndpoints::default(),
    );
    let calendar_service = CalendarService::new(google, token_store);

    let weather_client = OpenWeatherClient::new(
        config.openweather_api_key.clone(),
        config.weather_units.clone(),
    );
    let weather_service = WeatherService::new(weather_client, config.display_timezone);

    // Build shared state
    let state = Arc::new(AppState {
        config: config.clone(),
        weather_service,
        calendar_service,
    });

    // Build router
    let app = smart_display_api::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging.
fn init_logging() -> Result<(), Box<dyn std::error::Error>> {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("smart_display_api=debug".parse()?)
                .add_directive("info".parse()?),
        )
        .with(format)
        .init();
    Ok(())
}
