// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod calendar;
pub mod google;
pub mod openweather;
pub mod rain;
pub mod token_store;
pub mod weather;

pub use calendar::{CalendarService, TokenState};
pub use google::{GoogleClient, GoogleEndpoints};
pub use openweather::{OpenWeatherClient, WeatherLocation};
pub use token_store::TokenStore;
pub use weather::{WeatherReport, WeatherService};
