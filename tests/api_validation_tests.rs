// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! API input validation tests.
//!
//! These run against the offline mock database: every request here must be
//! rejected (or answered) before any storage access happens.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use tower::ServiceExt;

mod common;

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_health_check() {
    let (app, _state) = common::create_test_app();

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn test_join_rejects_invalid_session_key() {
    let (app, _state) = common::create_test_app();

    for bad_key in [
        "",
        "club_pinetina",
        "club_pinetina_2025013_tee1",
        "club_pinetina_20250230_tee1",
        "club_pinetina_20250120_",
    ] {
        let body = serde_json::json!({
            "club_id": "club_pinetina",
            "player_id": "player-1",
            "player_name": "Anna",
            "session_key": bad_key,
        });

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/session/join")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(
            response.status(),
            StatusCode::BAD_REQUEST,
            "key {:?} should be rejected",
            bad_key
        );
    }
}

#[tokio::test]
async fn test_join_rejects_out_of_range_start_hole() {
    let (app, _state) = common::create_test_app();

    let body = serde_json::json!({
        "club_id": "club_pinetina",
        "player_id": "player-1",
        "player_name": "Anna",
        "session_key": "club_pinetina_20250120_tee1",
        "start_hole": 19,
    });

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/session/join")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_position_rejects_out_of_range_coordinates() {
    let (app, _state) = common::create_test_app();

    let body = serde_json::json!({
        "player_id": "player-1",
        "player_name": "Anna",
        "lat": 95.0,
        "lng": 8.95,
    });

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/flights/F-1/position")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_scan_normalize_parses_url_forms() {
    let (app, _state) = common::create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/scan/normalize?raw=https%3A%2F%2Fplaytrack.app%2Fjoin%3FclubId%3Dclub_pinetina")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["club_id"], "club_pinetina");
    assert_eq!(json["action"], "start");
}

#[tokio::test]
async fn test_scan_normalize_detects_end_action() {
    let (app, _state) = common::create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/scan/normalize?raw=playtrack%3A%2F%2Fscan%3FclubId%3Dclub_pinetina%26action%3Dend")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["club_id"], "club_pinetina");
    assert_eq!(json["action"], "end");
}

#[tokio::test]
async fn test_scan_normalize_rejects_empty_raw() {
    let (app, _state) = common::create_test_app();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/scan/normalize?raw=%20")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_database_unavailable_maps_to_503() {
    let (app, _state) = common::create_test_app();

    // A well-formed join passes validation and then hits the offline mock.
    let body = serde_json::json!({
        "club_id": "club_pinetina",
        "player_id": "player-1",
        "player_name": "Anna",
        "session_key": "club_pinetina_20250120_tee1",
    });

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/session/join")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}
