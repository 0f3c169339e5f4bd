// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Position ingestion integration tests (Firestore emulator).
//!
//! Seeds a small course layout, forms a flight, and pushes GPS samples
//! through the full resolve → update → stats pipeline.

use fairway_tracker::db::firestore::CourseLayoutDoc;
use fairway_tracker::models::{LatLng, ZoneDoc};
use fairway_tracker::services::{JoinParams, PositionSample};

mod common;

fn rect(id: &str, kind: &str, hole: Option<u8>, west: f64, south: f64, east: f64, north: f64) -> ZoneDoc {
    ZoneDoc {
        id: id.to_string(),
        kind: kind.to_string(),
        location: None,
        path: Some(vec![
            LatLng { lat: south, lng: west },
            LatLng { lat: south, lng: east },
            LatLng { lat: north, lng: east },
            LatLng { lat: north, lng: west },
        ]),
        hole_number: hole,
        metadata: None,
    }
}

/// Hole 1 tee, fairway, and green on adjacent rectangles.
fn demo_zones() -> Vec<ZoneDoc> {
    vec![
        rect("tee-1", "tee", Some(1), 8.9500, 45.5800, 8.9505, 45.5804),
        rect("fairway-1", "area_buca", Some(1), 8.9505, 45.5800, 8.9535, 45.5815),
        rect("green-1", "green", Some(1), 8.9525, 45.5805, 8.9529, 45.5809),
    ]
}

async fn seeded_state(club_id: &str) -> std::sync::Arc<fairway_tracker::AppState> {
    let (_app, state) = common::create_emulator_app().await;
    state
        .layouts
        .seed_layout(&CourseLayoutDoc {
            club_id: club_id.to_string(),
            course_id: "default".to_string(),
            zones: demo_zones(),
        })
        .await
        .expect("Failed to seed layout");
    state
}

fn sample(player: &str, lat: f64, lng: f64) -> PositionSample {
    PositionSample {
        player_id: player.to_string(),
        player_name: player.to_string(),
        lat,
        lng,
        accuracy: 5.0,
        heading: Some(180.0),
        speed: Some(1.2),
    }
}

#[tokio::test]
async fn test_sample_on_green_updates_flight_area() {
    require_emulator!();
    let club_id = format!("club_it{}", common::unique_suffix());
    let state = seeded_state(&club_id).await;

    let outcome = state
        .sessions
        .join_or_create(JoinParams {
            club_id: club_id.clone(),
            course_id: "default".to_string(),
            player_id: "player-a".to_string(),
            player_name: "Anna".to_string(),
            session_key: format!("{}_20250120_tee1", club_id),
            start_hole: 1,
        })
        .await
        .expect("join failed");

    let result = state
        .telemetry
        .sync_position(&outcome.flight_id, sample("player-a", 45.5807, 8.9527))
        .await
        .expect("sync failed");

    assert!(result.applied);
    assert_eq!(result.area, "GREEN 1");

    let flight = state
        .db
        .get_flight(&outcome.flight_id)
        .await
        .expect("read failed")
        .expect("flight missing");
    assert_eq!(flight.current_area.as_deref(), Some("GREEN 1"));
    assert_eq!(flight.current_hole, 1);
    assert!(flight.location.is_some());
    assert!(flight.last_position_sync.is_some());
}

#[tokio::test]
async fn test_second_sample_inside_debounce_window_is_dropped() {
    require_emulator!();
    let club_id = format!("club_it{}", common::unique_suffix());
    let state = seeded_state(&club_id).await;

    let outcome = state
        .sessions
        .join_or_create(JoinParams {
            club_id: club_id.clone(),
            course_id: "default".to_string(),
            player_id: "player-a".to_string(),
            player_name: "Anna".to_string(),
            session_key: format!("{}_20250120_tee2", club_id),
            start_hole: 1,
        })
        .await
        .expect("join failed");

    let first = state
        .telemetry
        .sync_position(&outcome.flight_id, sample("player-a", 45.5802, 8.9502))
        .await
        .expect("first sync failed");
    assert!(first.applied);
    assert_eq!(first.area, "TEE 1");

    // Immediately after: inside the 10s window, must be dropped and the
    // stored area must not change.
    let second = state
        .telemetry
        .sync_position(&outcome.flight_id, sample("player-a", 45.5807, 8.9527))
        .await
        .expect("second sync failed");
    assert!(!second.applied);
    assert_eq!(second.area, "TEE 1");
}

#[tokio::test]
async fn test_concurrent_samples_in_same_window_apply_exactly_once() {
    require_emulator!();
    let club_id = format!("club_it{}", common::unique_suffix());
    let state = seeded_state(&club_id).await;

    let outcome = state
        .sessions
        .join_or_create(JoinParams {
            club_id: club_id.clone(),
            course_id: "default".to_string(),
            player_id: "player-a".to_string(),
            player_name: "Anna".to_string(),
            session_key: format!("{}_20250120_tee4", club_id),
            start_hole: 1,
        })
        .await
        .expect("join failed");

    // All samples land inside one debounce window. The write is
    // conditional on the sync checkpoint each caller observed, so even
    // callers that pass the pre-write check on a stale read must lose
    // the commit.
    const NUM_SAMPLES: usize = 4;
    let mut handles = vec![];
    for i in 0..NUM_SAMPLES {
        let state = state.clone();
        let flight_id = outcome.flight_id.clone();
        handles.push(tokio::spawn(async move {
            state
                .telemetry
                .sync_position(&flight_id, sample(&format!("player-{}", i), 45.5807, 8.9527))
                .await
        }));
    }

    let mut applied = 0;
    for handle in handles {
        let result = handle
            .await
            .expect("task join failed")
            .expect("sync failed");
        if result.applied {
            applied += 1;
        }
    }
    assert_eq!(applied, 1);

    let flight = state
        .db
        .get_flight(&outcome.flight_id)
        .await
        .expect("read failed")
        .expect("flight missing");
    assert!(flight.last_position_sync.is_some());
    assert_eq!(flight.current_area.as_deref(), Some("GREEN 1"));
}

#[tokio::test]
async fn test_sample_for_completed_flight_is_dropped() {
    require_emulator!();
    let club_id = format!("club_it{}", common::unique_suffix());
    let state = seeded_state(&club_id).await;

    let outcome = state
        .sessions
        .join_or_create(JoinParams {
            club_id: club_id.clone(),
            course_id: "default".to_string(),
            player_id: "player-a".to_string(),
            player_name: "Anna".to_string(),
            session_key: format!("{}_20250120_tee3", club_id),
            start_hole: 1,
        })
        .await
        .expect("join failed");

    state
        .sessions
        .force_complete(&outcome.flight_id)
        .await
        .expect("complete failed");

    let result = state
        .telemetry
        .sync_position(&outcome.flight_id, sample("player-a", 45.5807, 8.9527))
        .await
        .expect("sync failed");
    assert!(!result.applied);
}

#[tokio::test]
async fn test_unknown_flight_is_not_found() {
    require_emulator!();
    let club_id = format!("club_it{}", common::unique_suffix());
    let state = seeded_state(&club_id).await;

    let result = state
        .telemetry
        .sync_position("no-such-flight", sample("player-a", 45.5807, 8.9527))
        .await;

    assert!(matches!(
        result,
        Err(fairway_tracker::error::AppError::NotFound(_))
    ));
}
