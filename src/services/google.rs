// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Google OAuth2 and Calendar API client.
//!
//! Handles:
//! - Consent URL construction (offline access for a refresh token)
//! - Authorization code exchange
//! - Access token refresh
//! - Listing upcoming events from the primary calendar

use crate::error::AppError;
use crate::models::{CalendarEvent, OAuthTokenRecord};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::time::Duration;

/// Read-only access to the user's calendars.
pub const CALENDAR_SCOPE: &str = "https://www.googleapis.com/auth/calendar.readonly";

/// Upstream endpoints, overridable for tests.
#[derive(Debug, Clone)]
pub struct GoogleEndpoints {
    pub auth_url: String,
    pub token_url: String,
    pub calendar_base_url: String,
}

impl Default for GoogleEndpoints {
    fn default() -> Self {
        Self {
            auth_url: "https://accounts.google.com/o/oauth2/v2/auth".to_string(),
            token_url: "https://oauth2.googleapis.com/token".to_string(),
            calendar_base_url: "https://www.googleapis.com/calendar/v3".to_string(),
        }
    }
}

impl GoogleEndpoints {
    /// All endpoints rooted at one mock server.
    pub fn with_base_url(base_url: &str) -> Self {
        let base = base_url.trim_end_matches('/');
        Self {
            auth_url: format!("{}/o/oauth2/v2/auth", base),
            token_url: format!("{}/token", base),
            calendar_base_url: format!("{}/calendar/v3", base),
        }
    }
}

/// Google API client.
#[derive(Clone)]
pub struct GoogleClient {
    http: reqwest::Client,
    client_id: String,
    client_secret: String,
    redirect_uri: String,
    endpoints: GoogleEndpoints,
}

impl GoogleClient {
    /// Create a new Google client with OAuth credentials.
    pub fn new(
        client_id: String,
        client_secret: String,
        redirect_uri: String,
        endpoints: GoogleEndpoints,
    ) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_default();

        Self {
            http,
            client_id,
            client_secret,
            redirect_uri,
            endpoints,
        }
    }

    /// Consent screen URL carrying the signed `state`.
    pub fn authorization_url(&self, state: &str) -> String {
        format!(
            "{}?client_id={}&redirect_uri={}&response_type=code&scope={}&state={}&access_type=offline&prompt=consent",
            self.endpoints.auth_url,
            urlencoding::encode(&self.client_id),
            urlencoding::encode(&self.redirect_uri),
            urlencoding::encode(CALENDAR_SCOPE),
            urlencoding::encode(state),
        )
    }

    /// Exchange an authorization code for tokens.
    pub async fn exchange_code(&self, code: &str) -> Result<GoogleTokenResponse, AppError> {
        let response = self
            .http
            .post(&self.endpoints.token_url)
            .form(&[
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("code", code),
                ("grant_type", "authorization_code"),
                ("redirect_uri", self.redirect_uri.as_str()),
            ])
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("Token exchange failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, body = %body, "Google token exchange failed");
            return Err(AppError::Upstream(format!(
                "Token exchange failed with status {}",
                status
            )));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::Upstream(format!("Failed to parse token response: {}", e)))
    }

    /// Refresh an expiring access token.
    pub async fn refresh_token(&self, refresh_token: &str) -> Result<GoogleTokenResponse, AppError> {
        let response = self
            .http
            .post(&self.endpoints.token_url)
            .form(&[
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("refresh_token", refresh_token),
                ("grant_type", "refresh_token"),
            ])
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("Token refresh request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Upstream(format!(
                "Token refresh failed with status {}: {}",
                status, body
            )));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::Upstream(format!("Failed to parse refresh response: {}", e)))
    }

    /// List events from the primary calendar between `time_min` and `time_max`.
    pub async fn list_events(
        &self,
        access_token: &str,
        time_min: DateTime<Utc>,
        time_max: DateTime<Utc>,
        max_results: u32,
    ) -> Result<Vec<CalendarEvent>, AppError> {
        let url = format!(
            "{}/calendars/primary/events",
            self.endpoints.calendar_base_url
        );

        let response = self
            .http
            .get(&url)
            .bearer_auth(access_token)
            .query(&[
                ("timeMin", time_min.to_rfc3339()),
                ("timeMax", time_max.to_rfc3339()),
                ("singleEvents", "true".to_string()),
                ("orderBy", "startTime".to_string()),
                ("maxResults", max_results.to_string()),
            ])
            .send()
            .await
            .map_err(|e| AppError::Upstream(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();

            if status.as_u16() == 401 {
                return Err(AppError::Upstream(AppError::UPSTREAM_UNAUTHORIZED.to_string()));
            }

            return Err(AppError::Upstream(format!("HTTP {}: {}", status, body)));
        }

        let events: EventListResponse = response
            .json()
            .await
            .map_err(|e| AppError::Upstream(format!("JSON parse error: {}", e)))?;

        Ok(events
            .items
            .into_iter()
            .filter(|item| item.status.as_deref() != Some("cancelled"))
            .map(CalendarEvent::from)
            .collect())
    }
}

/// Token endpoint response (code exchange and refresh).
#[derive(Debug, Clone, Deserialize)]
pub struct GoogleTokenResponse {
    pub access_token: String,
    /// Only returned on first consent; absent on most refreshes
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Lifetime of the access token in seconds
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(default)]
    pub token_type: Option<String>,
}

impl GoogleTokenResponse {
    /// Convert into a stored record.
    ///
    /// Fields missing from the response are carried over from `previous`,
    /// most importantly the refresh token.
    pub fn into_record(
        self,
        previous: Option<&OAuthTokenRecord>,
        now_millis: i64,
    ) -> OAuthTokenRecord {
        let refresh_token = self
            .refresh_token
            .filter(|t| !t.is_empty())
            .or_else(|| previous.map(|p| p.refresh_token.clone()))
            .unwrap_or_default();

        OAuthTokenRecord {
            access_token: self.access_token,
            refresh_token,
            expiry_epoch_millis: self
                .expires_in
                .map(|secs| now_millis.saturating_add(secs.saturating_mul(1000))),
            scope: self
                .scope
                .or_else(|| previous.map(|p| p.scope.clone()))
                .unwrap_or_default(),
            token_type: self
                .token_type
                .or_else(|| previous.map(|p| p.token_type.clone()))
                .unwrap_or_else(|| "Bearer".to_string()),
        }
    }
}

#[derive(Debug, Deserialize)]
struct EventListResponse {
    #[serde(default)]
    items: Vec<ApiEvent>,
}

#[derive(Debug, Deserialize)]
struct ApiEvent {
    id: String,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    summary: Option<String>,
    #[serde(default)]
    location: Option<String>,
    start: ApiEventTime,
    end: ApiEventTime,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiEventTime {
    #[serde(default)]
    date_time: Option<String>,
    /// All-day events carry only a date
    #[serde(default)]
    date: Option<String>,
}

impl From<ApiEvent> for CalendarEvent {
    fn from(event: ApiEvent) -> Self {
        let all_day = event.start.date_time.is_none() && event.start.date.is_some();
        Self {
            id: event.id,
            summary: event.summary.unwrap_or_else(|| "(No title)".to_string()),
            start: event.start.date_time.or(event.start.date).unwrap_or_default(),
            end: event.end.date_time.or(event.end.date).unwrap_or_default(),
            all_day,
            location: event.location,
        }
    }
}
