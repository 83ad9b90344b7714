// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Calendar widget routes.

use crate::error::{AppError, Result};
use crate::models::{CalendarEvent, DEFAULT_USER_ID};
use crate::services::TokenState;
use crate::AppState;
use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

const DEFAULT_DAYS: u32 = 7;
const DEFAULT_MAX_RESULTS: u32 = 20;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/calendar/status", get(get_status))
        .route("/api/calendar/events", get(get_events))
}

/// Authentication status for the calendar widget.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct CalendarStatusResponse {
    pub authenticated: bool,
    pub state: TokenState,
}

/// Report whether tokens exist, without refreshing them.
async fn get_status(State(state): State<Arc<AppState>>) -> Json<CalendarStatusResponse> {
    let token_state = state.calendar_service.token_state(DEFAULT_USER_ID).await;
    Json(CalendarStatusResponse {
        authenticated: token_state != TokenState::Absent,
        state: token_state,
    })
}

#[derive(Debug, Deserialize, Validate)]
pub struct EventsQuery {
    #[validate(range(min = 1, max = 31))]
    days: Option<u32>,
    #[validate(range(min = 1, max = 250))]
    max_results: Option<u32>,
}

/// Upcoming events list.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct EventsResponse {
    pub events: Vec<CalendarEvent>,
}

/// Upcoming events for the default user.
async fn get_events(
    State(state): State<Arc<AppState>>,
    Query(query): Query<EventsQuery>,
) -> Result<Json<EventsResponse>> {
    query
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let events = state
        .calendar_service
        .list_upcoming_events(
            DEFAULT_USER_ID,
            query.days.unwrap_or(DEFAULT_DAYS),
            query.max_results.unwrap_or(DEFAULT_MAX_RESULTS),
        )
        .await?;

    Ok(Json(EventsResponse { events }))
}
