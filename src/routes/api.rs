// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! API routes: session formation, position ingestion, flight snapshots.

use crate::error::{AppError, Result};
use crate::services::{JoinParams, PositionSample};
use crate::time_utils::format_utc_rfc3339;
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/session/join", post(join_session))
        .route("/api/flights/{id}/position", post(sync_position))
        .route("/api/flights/{id}/complete", post(complete_flight))
        .route("/api/flights/{id}/pace-reset", post(reset_pace))
        .route("/api/flights/{id}", get(get_flight))
        .route("/api/flights/{id}/stats", get(get_flight_stats))
        .route("/api/scan/normalize", get(normalize_scan))
}

// ─── Session Join ────────────────────────────────────────────

#[derive(Deserialize)]
pub struct JoinRequest {
    /// Club id, or a full scan string (URL / app scheme) to normalize.
    pub club_id: String,
    #[serde(default = "default_course")]
    pub course_id: String,
    pub player_id: String,
    pub player_name: String,
    pub session_key: String,
    #[serde(default = "default_start_hole")]
    pub start_hole: u8,
}

fn default_course() -> String {
    "default".to_string()
}

fn default_start_hole() -> u8 {
    1
}

#[derive(Serialize)]
pub struct JoinResponse {
    pub flight_id: String,
    pub session_key: String,
    pub is_new_flight: bool,
}

/// Join the flight for a session key, creating it if none exists.
async fn join_session(
    State(state): State<Arc<AppState>>,
    Json(req): Json<JoinRequest>,
) -> Result<Json<JoinResponse>> {
    let outcome = state
        .sessions
        .join_or_create(JoinParams {
            club_id: req.club_id,
            course_id: req.course_id,
            player_id: req.player_id,
            player_name: req.player_name,
            session_key: req.session_key,
            start_hole: req.start_hole,
        })
        .await?;

    Ok(Json(JoinResponse {
        flight_id: outcome.flight_id,
        session_key: outcome.session_key,
        is_new_flight: outcome.is_new_flight,
    }))
}

// ─── Position Ingestion ──────────────────────────────────────

#[derive(Deserialize)]
pub struct PositionRequest {
    pub player_id: String,
    pub player_name: String,
    pub lat: f64,
    pub lng: f64,
    #[serde(default)]
    pub accuracy: f64,
    pub heading: Option<f64>,
    pub speed: Option<f64>,
}

#[derive(Serialize)]
pub struct PositionResponse {
    /// False when the sample was debounced or the flight is closed.
    pub applied: bool,
    pub area: String,
}

/// Ingest one GPS sample for a flight.
async fn sync_position(
    State(state): State<Arc<AppState>>,
    Path(flight_id): Path<String>,
    Json(req): Json<PositionRequest>,
) -> Result<Json<PositionResponse>> {
    let result = state
        .telemetry
        .sync_position(
            &flight_id,
            PositionSample {
                player_id: req.player_id,
                player_name: req.player_name,
                lat: req.lat,
                lng: req.lng,
                accuracy: req.accuracy,
                heading: req.heading,
                speed: req.speed,
            },
        )
        .await?;

    Ok(Json(PositionResponse {
        applied: result.applied,
        area: result.area,
    }))
}

// ─── Flight Lifecycle ────────────────────────────────────────

#[derive(Serialize)]
pub struct StatusResponse {
    pub status: String,
}

/// Close a flight and release its session key. Idempotent.
async fn complete_flight(
    State(state): State<Arc<AppState>>,
    Path(flight_id): Path<String>,
) -> Result<Json<StatusResponse>> {
    state.sessions.force_complete(&flight_id).await?;
    Ok(Json(StatusResponse {
        status: "completed".to_string(),
    }))
}

/// Record a pace-reset checkpoint (staff acknowledging an external delay).
async fn reset_pace(
    State(state): State<Arc<AppState>>,
    Path(flight_id): Path<String>,
) -> Result<Json<StatusResponse>> {
    state.pace.reset_pace(&flight_id).await?;
    Ok(Json(StatusResponse {
        status: "ok".to_string(),
    }))
}

// ─── Flight Snapshot ─────────────────────────────────────────

#[derive(Serialize)]
pub struct ParticipantView {
    pub player_id: String,
    pub name: String,
    pub joined_at: String,
}

#[derive(Serialize)]
pub struct FlightSnapshot {
    pub id: String,
    pub club_id: String,
    pub course_id: String,
    pub session_key: String,
    pub status: crate::models::FlightStatus,
    pub start_hole: u8,
    pub current_hole: u8,
    pub location: Option<crate::models::LatLng>,
    pub current_area: Option<String>,
    /// Minutes behind target, computed against the pace-reset checkpoint
    /// when one exists.
    pub delay_minutes: i64,
    pub started_at: String,
    pub completed_at: Option<String>,
    pub last_update: String,
    /// Participants ordered by join time.
    pub participants: Vec<ParticipantView>,
}

/// Read a flight snapshot with freshly computed delay.
async fn get_flight(
    State(state): State<Arc<AppState>>,
    Path(flight_id): Path<String>,
) -> Result<Json<FlightSnapshot>> {
    let flight = state
        .db
        .get_flight(&flight_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Flight {} not found", flight_id)))?;

    let delay_minutes = if flight.is_active() {
        state.pace.flight_delay(&flight, chrono::Utc::now()).await?
    } else {
        flight.delay_minutes
    };

    let participants = flight
        .participants_sorted()
        .into_iter()
        .map(|p| ParticipantView {
            player_id: p.player_id.clone(),
            name: p.name.clone(),
            joined_at: format_utc_rfc3339(p.joined_at),
        })
        .collect();

    Ok(Json(FlightSnapshot {
        id: flight.id.clone(),
        club_id: flight.club_id.clone(),
        course_id: flight.course_id.clone(),
        session_key: flight.session_key.clone(),
        status: flight.status,
        start_hole: flight.start_hole,
        current_hole: flight.current_hole,
        location: flight.location,
        current_area: flight.current_area.clone(),
        delay_minutes,
        started_at: format_utc_rfc3339(flight.started_at),
        completed_at: flight.completed_at.map(format_utc_rfc3339),
        last_update: format_utc_rfc3339(flight.last_update),
        participants,
    }))
}

// ─── Hole Stats ──────────────────────────────────────────────

#[derive(Serialize)]
pub struct FlightStatsResponse {
    pub flight_id: String,
    pub players: Vec<crate::models::PlayerHoleStats>,
}

/// Pull-based per-player hole stats for a flight.
async fn get_flight_stats(
    State(state): State<Arc<AppState>>,
    Path(flight_id): Path<String>,
) -> Result<Json<FlightStatsResponse>> {
    let flight = state
        .db
        .get_flight(&flight_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Flight {} not found", flight_id)))?;

    let players = state.stats.flight_stats(&flight).await?;

    Ok(Json(FlightStatsResponse { flight_id, players }))
}

// ─── Scan Normalization ──────────────────────────────────────

#[derive(Deserialize)]
struct NormalizeQuery {
    raw: String,
}

#[derive(Serialize)]
pub struct NormalizeResponse {
    pub club_id: String,
    pub action: crate::services::ScanAction,
}

/// Normalize a scanned QR payload into a club id and action.
///
/// Pure string parsing; exposed so thin clients don't have to reimplement
/// the URL / app-scheme unwrapping rules.
async fn normalize_scan(Query(params): Query<NormalizeQuery>) -> Result<Json<NormalizeResponse>> {
    if params.raw.trim().is_empty() {
        return Err(AppError::Validation(
            "Query parameter 'raw' must not be empty".to_string(),
        ));
    }

    let target = crate::services::parse_scan_string(&params.raw);
    Ok(Json(NormalizeResponse {
        club_id: target.club_id,
        action: target.action,
    }))
}
