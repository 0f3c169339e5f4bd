// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Hole statistics aggregation from zone transitions.
//!
//! Each position sample resolves to a zone; when a player's resolved zone
//! changes, the segment they just left is closed and its dwell time
//! accrued into the matching `HoleStat` bucket. Last-seen zone state is
//! persisted per (flight, player) so tracking survives restarts and
//! multiple server instances.

use crate::db::FirestoreDb;
use crate::error::Result;
use crate::models::{
    Flight, HoleStat, PlayerHoleStats, PlayerZoneState, ResolvedZone, SegmentBucket,
};
use chrono::{DateTime, Utc};

/// Decide what a new resolved zone means relative to the persisted state.
#[derive(Debug, PartialEq, Eq)]
enum Transition {
    /// Same zone as before; nothing to close, `entered_at` stands.
    Unchanged,
    /// Zone changed; the prior segment (if timed) closes now.
    Changed,
}

fn classify(prior: &PlayerZoneState, resolved: Option<&ResolvedZone>) -> Transition {
    let same = match resolved {
        Some(zone) => {
            prior.zone_kind == Some(zone.kind) && prior.hole_number == zone.hole_number
        }
        None => prior.zone_kind.is_none(),
    };
    if same {
        Transition::Unchanged
    } else {
        Transition::Changed
    }
}

#[derive(Clone)]
pub struct HoleStatAggregator {
    db: FirestoreDb,
}

impl HoleStatAggregator {
    pub fn new(db: FirestoreDb) -> Self {
        Self { db }
    }

    /// Feed one resolved position sample into the aggregator.
    ///
    /// Closes the previous segment when the player's zone changed and
    /// persists the new zone state. A sample in the same zone as before is
    /// a no-op (no writes), so the common case of successive samples on
    /// one fairway costs nothing beyond the state read.
    pub async fn record_transition(
        &self,
        flight_id: &str,
        player_id: &str,
        player_name: &str,
        resolved: Option<ResolvedZone>,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let prior = self.db.get_player_state(flight_id, player_id).await?;

        if let Some(ref prior) = prior {
            if classify(prior, resolved.as_ref()) == Transition::Unchanged {
                return Ok(());
            }
            self.close_segment(prior, now).await?;
        }

        let state = PlayerZoneState {
            flight_id: flight_id.to_string(),
            player_id: player_id.to_string(),
            player_name: player_name.to_string(),
            zone_kind: resolved.as_ref().map(|z| z.kind),
            hole_number: resolved.as_ref().and_then(|z| z.hole_number),
            entered_at: now,
        };
        self.db.set_player_state(&state).await?;

        tracing::debug!(
            flight_id,
            player_id,
            zone = ?state.zone_kind,
            hole = ?state.hole_number,
            "Zone transition recorded"
        );
        Ok(())
    }

    /// Accrue the dwell time of a finished segment, if it was a timed zone
    /// on a known hole. Facility and out-of-bounds dwell is untimed.
    async fn close_segment(&self, prior: &PlayerZoneState, now: DateTime<Utc>) -> Result<()> {
        let (Some(kind), Some(hole)) = (prior.zone_kind, prior.hole_number) else {
            return Ok(());
        };
        let Some(bucket) = SegmentBucket::from_zone(kind) else {
            return Ok(());
        };

        let seconds = (now - prior.entered_at).num_seconds();
        let mut stat = self
            .db
            .get_hole_stat(&prior.flight_id, &prior.player_id, hole)
            .await?
            .unwrap_or_else(|| HoleStat::new(&prior.flight_id, &prior.player_id, hole, now));

        stat.apply_segment(bucket, seconds, now);
        self.db.set_hole_stat(&stat).await
    }

    /// Pull-based stats snapshot for a flight, grouped per participant.
    ///
    /// Participants with no closed segments yet appear with an empty hole
    /// list; stats rows without a matching participant are skipped.
    pub async fn flight_stats(&self, flight: &Flight) -> Result<Vec<PlayerHoleStats>> {
        let rows = self.db.get_flight_hole_stats(&flight.id).await?;

        let mut result: Vec<PlayerHoleStats> = flight
            .participants_sorted()
            .into_iter()
            .map(|p| PlayerHoleStats {
                player_id: p.player_id.clone(),
                name: p.name.clone(),
                holes: Vec::new(),
            })
            .collect();

        for stat in rows {
            if let Some(entry) = result.iter_mut().find(|e| e.player_id == stat.player_id) {
                entry.holes.push(stat);
            }
        }

        Ok(result)
    }
}

impl HoleStatAggregator {
    /// Offline aggregator for handler tests.
    #[cfg(test)]
    pub fn new_mock() -> Self {
        Self {
            db: FirestoreDb::new_mock(),
        }
    }
}
