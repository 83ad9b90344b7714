// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Google OAuth routes.
//!
//! The display opens `/auth/google` in a popup. After consent, the callback
//! page posts the outcome to `window.opener` and closes itself.

use axum::{
    extract::{Query, State},
    http::{header, HeaderValue, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
    Router,
};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use subtle::ConstantTimeEq;

use crate::error::{AppError, Result};
use crate::models::DEFAULT_USER_ID;
use crate::AppState;

// Type alias for HMAC-SHA256
type HmacSha256 = Hmac<Sha256>;

/// How long a signed state parameter stays valid (10 minutes).
const STATE_MAX_AGE_MILLIS: u128 = 10 * 60 * 1000;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/google", get(auth_start))
        .route("/auth/google/callback", get(auth_callback))
        .route("/auth/logout", post(logout))
}

/// Start OAuth flow - redirect to Google consent.
async fn auth_start(State(state): State<Arc<AppState>>) -> Result<Redirect> {
    let oauth_state = create_state(&state.config.oauth_state_key, now_millis()?)?;
    let auth_url = state
        .calendar_service
        .google()
        .authorization_url(&oauth_state);

    tracing::info!("Starting OAuth flow, redirecting to Google");
    Ok(Redirect::temporary(&auth_url))
}

#[derive(Deserialize)]
pub struct CallbackParams {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    state: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// OAuth callback - exchange code for tokens, then notify the opener window.
async fn auth_callback(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CallbackParams>,
) -> Response {
    let frontend_url = &state.config.frontend_url;

    if let Some(error) = params.error {
        tracing::warn!(error = %error, "OAuth error from Google");
        return popup_page(StatusCode::OK, frontend_url, Err("access_denied"));
    }

    let state_ok = match (params.state.as_deref(), now_millis()) {
        (Some(s), Ok(now)) => verify_state(s, &state.config.oauth_state_key, now),
        _ => false,
    };
    if !state_ok {
        tracing::warn!("Invalid, expired or tampered OAuth state parameter");
        return popup_page(StatusCode::BAD_REQUEST, frontend_url, Err("invalid_state"));
    }

    let code = params.code.unwrap_or_default();
    match state
        .calendar_service
        .handle_authorization_callback(&code)
        .await
    {
        Ok(()) => {
            tracing::info!("OAuth successful, tokens stored");
            popup_page(StatusCode::OK, frontend_url, Ok(()))
        }
        Err(AppError::Validation(msg)) => {
            tracing::warn!(reason = %msg, "Rejected authorization code");
            popup_page(StatusCode::BAD_REQUEST, frontend_url, Err("invalid_code"))
        }
        Err(e) => {
            tracing::error!(error = %e, "Authorization code exchange failed");
            popup_page(StatusCode::BAD_GATEWAY, frontend_url, Err("exchange_failed"))
        }
    }
}

/// Logout - forget the stored Google tokens.
async fn logout(State(state): State<Arc<AppState>>) -> StatusCode {
    state.calendar_service.logout(DEFAULT_USER_ID).await;
    StatusCode::NO_CONTENT
}

fn now_millis() -> Result<u128> {
    Ok(SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("System time error: {}", e)))?
        .as_millis())
}

/// Build a signed state parameter: base64url("timestamp_hex|signature_hex").
fn create_state(secret: &[u8], now_millis: u128) -> Result<String> {
    let payload = format!("{:x}", now_millis);

    let mut mac = HmacSha256::new_from_slice(secret)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("HMAC init failed: {}", e)))?;
    mac.update(payload.as_bytes());
    let signature = hex::encode(mac.finalize().into_bytes());

    Ok(URL_SAFE_NO_PAD.encode(format!("{}|{}", payload, signature)))
}

/// Verify the HMAC signature and age of a state parameter.
fn verify_state(state: &str, secret: &[u8], now_millis: u128) -> bool {
    let Some(state_str) = URL_SAFE_NO_PAD
        .decode(state)
        .ok()
        .and_then(|bytes| String::from_utf8(bytes).ok())
    else {
        return false;
    };

    let Some((timestamp_hex, signature_hex)) = state_str.split_once('|') else {
        return false;
    };

    let Ok(mut mac) = HmacSha256::new_from_slice(secret) else {
        return false;
    };
    mac.update(timestamp_hex.as_bytes());
    let expected_signature = hex::encode(mac.finalize().into_bytes());

    if !bool::from(
        expected_signature
            .as_bytes()
            .ct_eq(signature_hex.as_bytes()),
    ) {
        tracing::error!("OAuth state signature mismatch! Potential tampering.");
        return false;
    }

    match u128::from_str_radix(timestamp_hex, 16) {
        Ok(issued) => issued <= now_millis && now_millis - issued <= STATE_MAX_AGE_MILLIS,
        Err(_) => false,
    }
}

/// Small HTML page that reports the outcome to the opener and closes itself.
fn popup_page(
    status: StatusCode,
    frontend_url: &str,
    outcome: std::result::Result<(), &str>,
) -> Response {
    let message = match outcome {
        Ok(()) => serde_json::json!({ "type": "google-auth-success" }),
        Err(reason) => serde_json::json!({ "type": "google-auth-error", "error": reason }),
    };
    let text = if outcome.is_ok() {
        "Calendar connected. You can close this window."
    } else {
        "Calendar connection failed. You can close this window."
    };

    let body = format!(
        "<!doctype html><html><head><meta charset=\"utf-8\"><title>Google Calendar</title></head>\
         <body><p>{}</p><script>\
         if (window.opener) {{ window.opener.postMessage({}, {}); }}\
         window.close();\
         </script></body></html>",
        text,
        script_literal(&message),
        script_literal(&serde_json::Value::String(frontend_url.to_string())),
    );

    let mut response = (status, Html(body)).into_response();
    response.headers_mut().insert(
        header::CONTENT_SECURITY_POLICY,
        HeaderValue::from_static("default-src 'none'; script-src 'unsafe-inline'"),
    );
    response
}

/// JSON value safe to embed inside a `<script>` element.
fn script_literal(value: &serde_json::Value) -> String {
    value.to_string().replace('<', "\\u003c")
}
