// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Smart display API: weather and calendar backend for a dashboard display.
//!
//! This crate proxies OpenWeatherMap and Google Calendar for the widget
//! board, aggregates today's rain outlook, and keeps the Google OAuth
//! tokens of the single display user fresh.

pub mod config;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use services::{CalendarService, WeatherService};

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub weather_service: WeatherService,
    pub calendar_service: CalendarService,
}
