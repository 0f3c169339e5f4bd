// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Pace-of-play calculation service.
//!
//! Cumulative target time and delay math, plus the staff pace-reset
//! checkpoint. The calculation functions are pure and CPU-bound; only the
//! reset touches storage.

use crate::db::FirestoreDb;
use crate::error::{AppError, Result};
use crate::models::{Flight, PaceConfig};
use chrono::{DateTime, Utc};

/// Standard round length; the wraparound bound for target walks.
pub const MAX_HOLES: u8 = 18;

/// Cumulative target minutes from `start_hole` to `current_hole` inclusive.
///
/// Walks hole by hole, wrapping from 18 back to 1 to support back-nine and
/// shotgun starts, and is bounded to at most 18 steps so a missing or
/// cyclic config can never loop forever. Unconfigured holes contribute 0.
pub fn target_minutes(config: &PaceConfig, start_hole: u8, current_hole: u8) -> u32 {
    if current_hole == 0 || current_hole > MAX_HOLES {
        return 0;
    }
    if start_hole == current_hole {
        return config.hole_target(current_hole);
    }

    let mut total = 0u32;
    let mut hole = if (1..=MAX_HOLES).contains(&start_hole) {
        start_hole
    } else {
        1
    };

    let mut steps = 0;
    while hole != current_hole && steps < MAX_HOLES {
        total += config.hole_target(hole);
        hole = if hole >= MAX_HOLES { 1 } else { hole + 1 };
        steps += 1;
    }

    total + config.hole_target(current_hole)
}

/// Minutes behind (positive) or ahead of (negative) the target pace.
///
/// `floor(elapsed / 60) - target`, computed against the given clock so the
/// function stays pure and testable.
pub fn delay_minutes(
    reference_start: DateTime<Utc>,
    target_minutes: u32,
    now: DateTime<Utc>,
) -> i64 {
    let elapsed_secs = (now - reference_start).num_seconds();
    elapsed_secs.div_euclid(60) - i64::from(target_minutes)
}

/// Pace service: delay computation for flights and the staff reset hook.
#[derive(Clone)]
pub struct PaceService {
    db: FirestoreDb,
}

impl PaceService {
    pub fn new(db: FirestoreDb) -> Self {
        Self { db }
    }

    /// Compute a flight's current delay in minutes.
    ///
    /// Uses the pace-reset checkpoint when staff acknowledged an external
    /// delay, otherwise the round start; a missing pace config means a
    /// zero target (everything reads as elapsed time).
    pub async fn flight_delay(&self, flight: &Flight, now: DateTime<Utc>) -> Result<i64> {
        let config = self
            .db
            .get_pace_config(&flight.club_id, &flight.course_id)
            .await?
            .unwrap_or_default();

        let (reference_start, reference_hole) = flight.pace_reference();
        let target = target_minutes(&config, reference_hole, flight.current_hole);
        Ok(delay_minutes(reference_start, target, now))
    }

    /// Record a pace-reset checkpoint on a flight.
    ///
    /// Subsequent delay is computed relative to the checkpoint; the
    /// flight's `started_at` is never mutated. This is an explicit
    /// "relative pace" mode, not a correction of history.
    pub async fn reset_pace(&self, flight_id: &str) -> Result<()> {
        let mut flight = self
            .db
            .get_flight(flight_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Flight {} not found", flight_id)))?;

        if !flight.is_active() {
            return Err(AppError::NotFound(format!(
                "Flight {} is already completed",
                flight_id
            )));
        }

        let now = Utc::now();
        flight.pace_reset_at = Some(now);
        flight.pace_reset_hole = Some(flight.current_hole);
        flight.delay_minutes = 0;
        flight.last_update = now;

        self.db.update_flight_pace(&flight).await?;

        tracing::info!(
            flight_id,
            hole = flight.current_hole,
            "Pace reset checkpoint recorded"
        );
        Ok(())
    }
}
