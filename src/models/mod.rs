// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod calendar;
pub mod forecast;
pub mod token;

pub use calendar::CalendarEvent;
pub use forecast::{ConditionCategory, CurrentConditions, ForecastEntry, RainPeriod};
pub use token::{OAuthTokenRecord, DEFAULT_USER_ID};
