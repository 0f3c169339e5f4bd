// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Flight model - the live session aggregate.

use crate::models::zone::LatLng;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Flight lifecycle status. Monotonic: active -> completed, never reopened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlightStatus {
    Active,
    Completed,
}

/// One participant of a flight.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParticipantRef {
    pub player_id: String,
    pub name: String,
    pub joined_at: DateTime<Utc>,
}

/// The live session aggregate, stored in the `active_flights` collection.
///
/// Shared telemetry fields (`location`, `current_area`, `current_hole`,
/// `accuracy`, `heading`, `speed`) are last-writer-wins across the flight's
/// participants: the displayed "party position" is necessarily approximate
/// for a multi-person group.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Flight {
    pub id: String,
    pub club_id: String,
    pub course_id: String,
    pub session_key: String,
    pub status: FlightStatus,
    /// Hole the round started on (1 for a standard start, 10 for back-nine,
    /// arbitrary for shotgun starts).
    pub start_hole: u8,
    pub current_hole: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<LatLng>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_area: Option<String>,
    #[serde(default)]
    pub delay_minutes: i64,
    pub started_at: DateTime<Utc>,
    /// Checkpoint set by a staff pace reset; delay is computed relative to
    /// it without mutating `started_at`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pace_reset_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pace_reset_hole: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    pub last_update: DateTime<Utc>,
    /// Timestamp of the last committed position write, the debounce gate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_position_sync: Option<DateTime<Utc>>,
    #[serde(default)]
    pub accuracy: f64,
    #[serde(default)]
    pub heading: f64,
    #[serde(default)]
    pub speed: f64,
    /// Participant set, keyed by player id. Map keys give set semantics:
    /// joining twice is a no-op.
    #[serde(default)]
    pub participants: HashMap<String, ParticipantRef>,
}

impl Flight {
    /// Create a fresh active flight with its first participant.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: String,
        club_id: String,
        course_id: String,
        session_key: String,
        start_hole: u8,
        player_id: String,
        player_name: String,
        now: DateTime<Utc>,
    ) -> Self {
        let mut participants = HashMap::new();
        participants.insert(
            player_id.clone(),
            ParticipantRef {
                player_id,
                name: player_name,
                joined_at: now,
            },
        );

        Self {
            id,
            club_id,
            course_id,
            session_key,
            status: FlightStatus::Active,
            start_hole,
            current_hole: start_hole,
            location: None,
            current_area: None,
            delay_minutes: 0,
            started_at: now,
            pace_reset_at: None,
            pace_reset_hole: None,
            completed_at: None,
            last_update: now,
            last_position_sync: None,
            accuracy: 0.0,
            heading: 0.0,
            speed: 0.0,
            participants,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == FlightStatus::Active
    }

    /// Add a participant if not already present.
    ///
    /// Returns `true` if the set changed. Re-joining preserves the original
    /// `joined_at`.
    pub fn add_participant(
        &mut self,
        player_id: &str,
        name: &str,
        now: DateTime<Utc>,
    ) -> bool {
        if self.participants.contains_key(player_id) {
            return false;
        }
        self.participants.insert(
            player_id.to_string(),
            ParticipantRef {
                player_id: player_id.to_string(),
                name: name.to_string(),
                joined_at: now,
            },
        );
        true
    }

    /// Participants ordered by join time (then id, for stable output).
    pub fn participants_sorted(&self) -> Vec<&ParticipantRef> {
        let mut refs: Vec<&ParticipantRef> = self.participants.values().collect();
        refs.sort_by(|a, b| {
            a.joined_at
                .cmp(&b.joined_at)
                .then_with(|| a.player_id.cmp(&b.player_id))
        });
        refs
    }

    /// Reference point for delay computation: the pace-reset checkpoint if
    /// staff acknowledged an external delay, otherwise the round start.
    pub fn pace_reference(&self) -> (DateTime<Utc>, u8) {
        match (self.pace_reset_at, self.pace_reset_hole) {
            (Some(at), Some(hole)) => (at, hole),
            (Some(at), None) => (at, self.current_hole),
            _ => (self.started_at, self.start_hole),
        }
    }
}

/// Session pointer document, keyed by (club, session key).
///
/// Created with Firestore insert (document-create) semantics, so it doubles
/// as the uniqueness constraint closing the join-or-create race: exactly one
/// concurrent caller can create it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionPointer {
    pub flight_id: String,
    pub club_id: String,
    pub session_key: String,
    pub created_at: DateTime<Utc>,
}
