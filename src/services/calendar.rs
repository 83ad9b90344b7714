// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Google Calendar service with OAuth token lifecycle.
//!
//! A user's tokens move through these states:
//!
//! ```text
//! Absent ──callback──▶ Valid ──time──▶ ExpiringSoon ──refresh ok──▶ Valid
//!                                            │
//!                                            └──refresh failed──▶ Absent
//! ```
//!
//! A failed refresh or a 401 from the Calendar API purges the record; the
//! user has to go through the consent screen again.

use crate::error::AppError;
use crate::models::{CalendarEvent, OAuthTokenRecord, DEFAULT_USER_ID};
use crate::services::google::GoogleClient;
use crate::services::token_store::TokenStore;
use chrono::{Duration, Utc};
use dashmap::DashMap;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Margin before token expiration when we proactively refresh (5 minutes).
const TOKEN_REFRESH_MARGIN_MILLIS: i64 = 5 * 60 * 1000;

const AUTH_CODE_MIN_LEN: usize = 10;
const AUTH_CODE_MAX_LEN: usize = 500;

/// Where a user's tokens are in their lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "snake_case")]
pub enum TokenState {
    Absent,
    Valid,
    ExpiringSoon,
}

/// Shared per-user locks that serialize token mutations.
pub type TokenLocks = Arc<DashMap<String, Arc<Mutex<()>>>>;

/// Calendar service that owns the token lifecycle and Calendar API calls.
#[derive(Clone)]
pub struct CalendarService {
    google: GoogleClient,
    store: Arc<TokenStore>,
    /// Credentials currently applied to the Google client.
    credentials: Arc<RwLock<Option<OAuthTokenRecord>>>,
    /// Per-user mutex so concurrent requests refresh at most once.
    token_locks: TokenLocks,
}

impl CalendarService {
    pub fn new(google: GoogleClient, store: Arc<TokenStore>) -> Self {
        Self {
            google,
            store,
            credentials: Arc::new(RwLock::new(None)),
            token_locks: Arc::new(DashMap::new()),
        }
    }

    /// The Google client (for building consent URLs).
    pub fn google(&self) -> &GoogleClient {
        &self.google
    }

    /// The underlying token store.
    pub fn store(&self) -> &Arc<TokenStore> {
        &self.store
    }

    /// Credentials last applied by [`Self::ensure_valid_tokens`] or the callback.
    pub async fn current_credentials(&self) -> Option<OAuthTokenRecord> {
        self.credentials.read().await.clone()
    }

    fn user_lock(&self, user_id: &str) -> Arc<Mutex<()>> {
        self.token_locks
            .entry(user_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    // ─── Token Management ────────────────────────────────────────────────────

    /// Make sure the user has usable tokens, refreshing if they expire soon.
    ///
    /// Returns false when there is no record or the refresh failed. A
    /// failed refresh deletes the record.
    pub async fn ensure_valid_tokens(&self, user_id: &str) -> bool {
        let lock = self.user_lock(user_id);
        let _guard = lock.lock().await;

        let Some(record) = self.store.get(user_id).await else {
            tracing::debug!(user_id, "No tokens stored");
            return false;
        };

        *self.credentials.write().await = Some(record.clone());

        let now = Utc::now().timestamp_millis();
        if !record.expires_within(now, TOKEN_REFRESH_MARGIN_MILLIS) {
            return true;
        }

        tracing::info!(user_id, "Access token expiring, refreshing");

        let refreshed = if record.refresh_token.is_empty() {
            Err(AppError::Upstream("No refresh token stored".to_string()))
        } else {
            self.google.refresh_token(&record.refresh_token).await
        };

        match refreshed {
            Ok(response) => {
                let updated = response.into_record(Some(&record), Utc::now().timestamp_millis());
                self.store.put(user_id, updated.clone()).await;
                *self.credentials.write().await = Some(updated);
                tracing::info!(user_id, "Token refreshed and stored");
                true
            }
            Err(e) => {
                tracing::warn!(user_id, error = %e, "Token refresh failed, discarding tokens");
                self.purge(user_id).await;
                false
            }
        }
    }

    /// Current lifecycle state, without refreshing.
    pub async fn token_state(&self, user_id: &str) -> TokenState {
        match self.store.get(user_id).await {
            None => TokenState::Absent,
            Some(record)
                if record.expires_within(
                    Utc::now().timestamp_millis(),
                    TOKEN_REFRESH_MARGIN_MILLIS,
                ) =>
            {
                TokenState::ExpiringSoon
            }
            Some(_) => TokenState::Valid,
        }
    }

    /// Forget the user's tokens. Returns true if a record was removed.
    pub async fn logout(&self, user_id: &str) -> bool {
        let lock = self.user_lock(user_id);
        let _guard = lock.lock().await;

        let removed = self.purge(user_id).await;
        if removed {
            tracing::info!(user_id, "Tokens removed on logout");
        }
        removed
    }

    async fn purge(&self, user_id: &str) -> bool {
        let removed = self.store.remove(user_id).await.is_some();
        *self.credentials.write().await = None;
        removed
    }

    // ─── OAuth Callback Handling ─────────────────────────────────────────────

    /// Exchange an authorization code and store the tokens for the default user.
    ///
    /// Any earlier record is overwritten.
    pub async fn handle_authorization_callback(&self, code: &str) -> Result<(), AppError> {
        validate_authorization_code(code)?;

        let response = self.google.exchange_code(code).await?;
        let record = response.into_record(None, Utc::now().timestamp_millis());

        let lock = self.user_lock(DEFAULT_USER_ID);
        let _guard = lock.lock().await;

        self.store.put(DEFAULT_USER_ID, record.clone()).await;
        *self.credentials.write().await = Some(record);

        tracing::info!(user_id = DEFAULT_USER_ID, "OAuth callback handled, tokens stored");
        Ok(())
    }

    // ─── API Wrappers ────────────────────────────────────────────────────────

    /// List upcoming events for the next `days` days.
    pub async fn list_upcoming_events(
        &self,
        user_id: &str,
        days: u32,
        max_results: u32,
    ) -> Result<Vec<CalendarEvent>, AppError> {
        if !self.ensure_valid_tokens(user_id).await {
            return Err(AppError::NotAuthenticated);
        }

        let access_token = self
            .current_credentials()
            .await
            .map(|r| r.access_token)
            .ok_or(AppError::NotAuthenticated)?;

        let now = Utc::now();
        let until = now + Duration::days(i64::from(days));

        match self
            .google
            .list_events(&access_token, now, until, max_results)
            .await
        {
            Ok(events) => Ok(events),
            Err(e) if e.is_upstream_unauthorized() => {
                tracing::warn!(user_id, "Calendar API rejected access token, discarding tokens");
                let lock = self.user_lock(user_id);
                let _guard = lock.lock().await;
                // A callback may have stored fresh tokens while the request was in flight
                let still_current = self
                    .store
                    .get(user_id)
                    .await
                    .is_some_and(|r| r.access_token == access_token);
                if still_current {
                    self.purge(user_id).await;
                }
                Err(AppError::NotAuthenticated)
            }
            Err(e) => Err(e),
        }
    }
}

/// Check the shape of an authorization code before sending it upstream.
///
/// Codes must be 10-500 characters of `[A-Za-z0-9._-]`.
pub fn validate_authorization_code(code: &str) -> Result<(), AppError> {
    let len = code.len();
    if !(AUTH_CODE_MIN_LEN..=AUTH_CODE_MAX_LEN).contains(&len) {
        return Err(AppError::Validation(format!(
            "authorization code must be {}-{} characters",
            AUTH_CODE_MIN_LEN, AUTH_CODE_MAX_LEN
        )));
    }

    if !code
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'.' | b'_' | b'-'))
    {
        return Err(AppError::Validation(
            "authorization code contains invalid characters".to_string(),
        ));
    }

    Ok(())
}
