// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Position ingestion for active flights.
//!
//! Each accepted sample resolves to a course zone, refreshes the flight's
//! shared telemetry fields (masked write, conditional on the observed
//! debounce checkpoint), and feeds the hole-stats aggregator. Samples
//! arriving inside the debounce window, racing a winning sample, or
//! reported for a completed flight are dropped without writes.

use crate::db::FirestoreDb;
use crate::error::{AppError, Result};
use crate::models::LatLng;
use crate::services::layout::{area_label, resolve_zone, LayoutService};
use crate::services::pace::PaceService;
use crate::services::stats::HoleStatAggregator;
use chrono::{DateTime, Duration, Utc};

/// One GPS sample from a device, after HTTP-level deserialization.
#[derive(Debug, Clone)]
pub struct PositionSample {
    pub player_id: String,
    pub player_name: String,
    pub lat: f64,
    pub lng: f64,
    pub accuracy: f64,
    pub heading: Option<f64>,
    pub speed: Option<f64>,
}

/// Outcome of a sync attempt.
#[derive(Debug, Clone)]
pub struct SyncResult {
    /// False when the sample was dropped (debounce, completed flight, or
    /// layout unavailable).
    pub applied: bool,
    /// Area label after the attempt; the prior label when dropped.
    pub area: String,
}

/// Area label a dropped sample reports: the stored one, or Outside when
/// the flight has never resolved a zone.
fn prior_area(flight: &crate::models::Flight) -> String {
    flight
        .current_area
        .clone()
        .unwrap_or_else(|| crate::models::zone::OUTSIDE_AREA_LABEL.to_string())
}

/// Whether enough time has passed since the last accepted sample.
///
/// A flight that has never synced always passes. The comparison uses the
/// stored `last_position_sync`, so debounce is shared across the whole
/// flight rather than per device.
pub fn should_sync(
    last_sync: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    min_interval: Duration,
) -> bool {
    match last_sync {
        Some(last) => now - last >= min_interval,
        None => true,
    }
}

#[derive(Clone)]
pub struct TelemetryService {
    db: FirestoreDb,
    layouts: LayoutService,
    pace: PaceService,
    stats: HoleStatAggregator,
    min_interval: Duration,
}

impl TelemetryService {
    pub fn new(
        db: FirestoreDb,
        layouts: LayoutService,
        pace: PaceService,
        stats: HoleStatAggregator,
        sync_min_interval_secs: u64,
    ) -> Self {
        Self {
            db,
            layouts,
            pace,
            stats,
            min_interval: Duration::seconds(sync_min_interval_secs as i64),
        }
    }

    /// Ingest one position sample for a flight.
    ///
    /// Order of checks matters: validation, then flight lookup, then the
    /// cheap debounce decision, and only then the layout resolution and
    /// writes. A sample for a completed flight is a silent drop, not an
    /// error, because devices keep reporting for a few seconds after a
    /// round is closed.
    pub async fn sync_position(&self, flight_id: &str, sample: PositionSample) -> Result<SyncResult> {
        if !(-90.0..=90.0).contains(&sample.lat) || !(-180.0..=180.0).contains(&sample.lng) {
            return Err(AppError::Validation(format!(
                "Coordinates out of range: ({}, {})",
                sample.lat, sample.lng
            )));
        }

        let mut flight = self
            .db
            .get_flight(flight_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Flight {} not found", flight_id)))?;

        if !flight.is_active() {
            tracing::debug!(flight_id, "Dropping sample for completed flight");
            return Ok(SyncResult {
                applied: false,
                area: prior_area(&flight),
            });
        }

        let now = Utc::now();
        let observed_sync = flight.last_position_sync;
        if !should_sync(observed_sync, now, self.min_interval) {
            return Ok(SyncResult {
                applied: false,
                area: prior_area(&flight),
            });
        }

        // Fail open on layout trouble: drop the sample and keep the prior
        // zone rather than failing the request or mislabeling the player.
        let layout = match self
            .layouts
            .course_layout(&flight.club_id, &flight.course_id)
            .await
        {
            Ok(layout) => layout,
            Err(e) => {
                tracing::warn!(
                    flight_id,
                    club_id = %flight.club_id,
                    course_id = %flight.course_id,
                    error = %e,
                    "Course layout unavailable, dropping sample"
                );
                return Ok(SyncResult {
                    applied: false,
                    area: prior_area(&flight),
                });
            }
        };

        let resolved = resolve_zone(sample.lat, sample.lng, &layout);
        let area = area_label(resolved);
        let stored_area = prior_area(&flight);

        flight.location = Some(LatLng {
            lat: sample.lat,
            lng: sample.lng,
        });
        flight.current_area = Some(area.clone());
        if let Some(hole) = resolved.and_then(|z| z.hole_number) {
            flight.current_hole = hole;
        }
        flight.accuracy = sample.accuracy;
        flight.heading = sample.heading.unwrap_or(0.0);
        flight.speed = sample.speed.unwrap_or(0.0);
        flight.delay_minutes = self.pace.flight_delay(&flight, now).await?;
        flight.last_update = now;
        flight.last_position_sync = Some(now);

        // Conditional on the last_position_sync observed above. When two
        // samples race inside the same window, exactly one commits; the
        // loser is dropped here without touching the stats.
        if !self.db.update_flight_telemetry(&flight, observed_sync).await? {
            return Ok(SyncResult {
                applied: false,
                area: stored_area,
            });
        }

        self.stats
            .record_transition(
                flight_id,
                &sample.player_id,
                &sample.player_name,
                resolved,
                now,
            )
            .await?;

        tracing::debug!(
            flight_id,
            player_id = %sample.player_id,
            area = %area,
            hole = flight.current_hole,
            delay = flight.delay_minutes,
            "Position applied"
        );

        Ok(SyncResult {
            applied: true,
            area,
        })
    }
}
