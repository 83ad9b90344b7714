// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! HTTP tests for the weather and calendar routes.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use chrono::Utc;
use serde_json::{json, Value};
use smart_display_api::models::DEFAULT_USER_ID;
use tower::ServiceExt;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

mod common;
use common::{create_test_app, token_record};

async fn get(app: axum::Router, uri: &str) -> (StatusCode, Value) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .unwrap();
    let value = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, value)
}

#[tokio::test]
async fn test_health_check() {
    let app = create_test_app().await;

    let (status, body) = get(app.router, "/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_weather_latitude_out_of_range() {
    let app = create_test_app().await;

    let (status, body) = get(app.router, "/api/weather?lat=123&lon=10").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "bad_request");
}

#[tokio::test]
async fn test_weather_lat_without_lon() {
    let app = create_test_app().await;

    let (status, _) = get(app.router, "/api/weather?lat=12").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_weather_nan_coordinates() {
    let app = create_test_app().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&app.server)
        .await;

    let (status, body) = get(app.router, "/api/weather?lat=NaN&lon=0").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "bad_request");
}

#[tokio::test]
async fn test_weather_city_too_long() {
    let app = create_test_app().await;

    let uri = format!("/api/weather?city={}", "a".repeat(101));
    let (status, _) = get(app.router, &uri).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_weather_report_for_default_city() {
    let app = create_test_app().await;

    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .and(query_param("q", "London"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "weather": [{"main": "Clouds", "description": "overcast clouds"}],
            "main": {"temp": 14.2, "humidity": 88}
        })))
        .mount(&app.server)
        .await;
    // Only tomorrow's slots: today has no entries, so the heuristic applies
    let tomorrow = Utc::now().timestamp() + 2 * 24 * 3600;
    Mock::given(method("GET"))
        .and(path("/data/2.5/forecast"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "list": [{"dt": tomorrow, "pop": 0.9}]
        })))
        .mount(&app.server)
        .await;

    let (status, body) = get(app.router, "/api/weather").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["condition"], "clouds");
    assert_eq!(body["humidity"], 88);
    assert_eq!(body["precipitationProbability"], 60);
    assert_eq!(body["probabilitySource"], "heuristic");
    assert_eq!(body["rainPeriods"], json!([]));
}

#[tokio::test]
async fn test_weather_upstream_failure_is_bad_gateway() {
    let app = create_test_app().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&app.server)
        .await;

    let (status, body) = get(app.router, "/api/weather?city=Oslo").await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"], "upstream_error");
}

#[tokio::test]
async fn test_calendar_status_without_tokens() {
    let app = create_test_app().await;

    let (status, body) = get(app.router, "/api/calendar/status").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["authenticated"], false);
    assert_eq!(body["state"], "absent");
}

#[tokio::test]
async fn test_calendar_events_without_tokens() {
    let app = create_test_app().await;

    let (status, body) = get(app.router, "/api/calendar/events").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "not_authenticated");
}

#[tokio::test]
async fn test_calendar_events_invalid_days() {
    let app = create_test_app().await;

    let (status, _) = get(app.router, "/api/calendar/events?days=0").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_calendar_events_with_tokens() {
    let app = create_test_app().await;
    app.state
        .calendar_service
        .store()
        .put(DEFAULT_USER_ID, token_record("access-1", 3600))
        .await;

    Mock::given(method("GET"))
        .and(path("/calendar/v3/calendars/primary/events"))
        .and(query_param("maxResults", "5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [{
                "id": "e1",
                "summary": "Dentist",
                "start": {"dateTime": "2026-05-04T15:00:00Z"},
                "end": {"dateTime": "2026-05-04T16:00:00Z"}
            }]
        })))
        .mount(&app.server)
        .await;

    let (status, body) = get(app.router, "/api/calendar/events?days=3&max_results=5").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["events"][0]["summary"], "Dentist");
    assert_eq!(body["events"][0]["allDay"], false);
}

#[tokio::test]
async fn test_security_headers_on_api_responses() {
    let app = create_test_app().await;

    let response = app
        .router
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(
        response.headers().get(header::X_CONTENT_TYPE_OPTIONS).unwrap(),
        "nosniff"
    );
    assert!(response
        .headers()
        .get(header::CONTENT_SECURITY_POLICY)
        .is_some());
}

#[tokio::test]
async fn test_cors_preflight_from_frontend() {
    let app = create_test_app().await;

    let response = app
        .router
        .oneshot(
            Request::builder()
                .method("OPTIONS")
                .uri("/api/weather")
                .header(header::ORIGIN, "http://localhost:5173")
                .header(header::ACCESS_CONTROL_REQUEST_METHOD, "GET")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(
        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .unwrap(),
        "http://localhost:5173"
    );
}
