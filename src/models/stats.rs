// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Per-hole per-player timing statistics, derived from zone transitions.

use crate::models::zone::ZoneKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which HoleStat bucket a zone's dwell time accrues to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentBucket {
    Tee,
    Fairway,
    Green,
}

impl SegmentBucket {
    /// Map a resolved zone kind to its timing bucket.
    ///
    /// Approach and generic hole-area time both count as fairway time;
    /// facilities and out-of-bounds are untimed.
    pub fn from_zone(kind: ZoneKind) -> Option<Self> {
        match kind {
            ZoneKind::Tee => Some(Self::Tee),
            ZoneKind::Green => Some(Self::Green),
            ZoneKind::Approach | ZoneKind::Hole | ZoneKind::Area => Some(Self::Fairway),
            _ => None,
        }
    }
}

/// Timing record for one (flight, player, hole).
///
/// Written/overwritten by the aggregator as segments close; read-only to
/// reporting. Keyed `{flight_id}_{player_id}_{hole_number}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HoleStat {
    pub flight_id: String,
    pub player_id: String,
    pub hole_number: u8,
    #[serde(default)]
    pub tee_seconds: i64,
    #[serde(default)]
    pub fairway_seconds: i64,
    #[serde(default)]
    pub green_seconds: i64,
    #[serde(default)]
    pub total_seconds: i64,
    pub updated_at: DateTime<Utc>,
}

impl HoleStat {
    pub fn new(flight_id: &str, player_id: &str, hole_number: u8, now: DateTime<Utc>) -> Self {
        Self {
            flight_id: flight_id.to_string(),
            player_id: player_id.to_string(),
            hole_number,
            tee_seconds: 0,
            fairway_seconds: 0,
            green_seconds: 0,
            total_seconds: 0,
            updated_at: now,
        }
    }

    /// Accrue a closed segment into the matching bucket and refresh the
    /// total. Negative durations (clock skew) are clamped to 0.
    pub fn apply_segment(&mut self, bucket: SegmentBucket, seconds: i64, now: DateTime<Utc>) {
        let seconds = seconds.max(0);
        match bucket {
            SegmentBucket::Tee => self.tee_seconds += seconds,
            SegmentBucket::Fairway => self.fairway_seconds += seconds,
            SegmentBucket::Green => self.green_seconds += seconds,
        }
        self.total_seconds = self.tee_seconds + self.fairway_seconds + self.green_seconds;
        self.updated_at = now;
    }
}

/// Per-player last-resolved-zone record, keyed `{flight_id}_{player_id}`.
///
/// Persisted alongside the stats so segment tracking survives process
/// restarts and works across server instances.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerZoneState {
    pub flight_id: String,
    pub player_id: String,
    pub player_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zone_kind: Option<ZoneKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hole_number: Option<u8>,
    pub entered_at: DateTime<Utc>,
}

/// Reporting snapshot: one participant's hole-by-hole timings.
#[derive(Debug, Clone, Serialize)]
pub struct PlayerHoleStats {
    pub player_id: String,
    pub name: String,
    pub holes: Vec<HoleStat>,
}
