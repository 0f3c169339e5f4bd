// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session formation: join-or-create for flights.
//!
//! The hard part here is the race when several players scan the same QR
//! code within a few hundred milliseconds. Formation is serialized through
//! a session pointer document created with Firestore insert semantics, so
//! exactly one caller wins creation and everyone else joins the winner's
//! flight.

use crate::db::FirestoreDb;
use crate::error::{AppError, Result};
use crate::models::{Flight, SessionKey, SessionPointer};
use crate::services::scan::normalize_club_id;
use chrono::Utc;

/// Bounded retry for the claim loop. A retry only happens when a stale
/// pointer (completed or vanished flight) had to be cleaned up first.
const MAX_CLAIM_ATTEMPTS: u32 = 3;

/// Result of a join-or-create call.
#[derive(Debug, Clone)]
pub struct JoinOutcome {
    pub flight_id: String,
    pub session_key: String,
    /// True for exactly one logical winner per session key.
    pub is_new_flight: bool,
}

/// Parameters for joining a session, after HTTP-level deserialization.
#[derive(Debug, Clone)]
pub struct JoinParams {
    /// Raw club identifier; scan strings (URLs, app schemes) are accepted
    /// and normalized.
    pub club_id: String,
    pub course_id: String,
    pub player_id: String,
    pub player_name: String,
    pub session_key: String,
    pub start_hole: u8,
}

#[derive(Clone)]
pub struct SessionService {
    db: FirestoreDb,
}

impl SessionService {
    pub fn new(db: FirestoreDb) -> Self {
        Self { db }
    }

    /// Join the flight for a session key, creating it if none exists.
    ///
    /// Validation happens before any storage access: a malformed session
    /// key or out-of-range start hole never reaches Firestore. The claim
    /// loop then either wins the pointer insert (create path) or reads the
    /// existing pointer and joins (join path); a stale pointer is deleted
    /// and the attempt retried a bounded number of times.
    pub async fn join_or_create(&self, params: JoinParams) -> Result<JoinOutcome> {
        let key = SessionKey::parse(&params.session_key).map_err(|e| {
            AppError::Validation(format!(
                "Invalid session key '{}': {}",
                params.session_key, e
            ))
        })?;

        if !(1..=18).contains(&params.start_hole) {
            return Err(AppError::Validation(format!(
                "Start hole must be 1-18, got {}",
                params.start_hole
            )));
        }
        if params.player_id.trim().is_empty() {
            return Err(AppError::Validation("Player id must not be empty".to_string()));
        }

        let club_id = normalize_club_id(&params.club_id);
        if club_id != key.club_id {
            return Err(AppError::Validation(format!(
                "Session key club '{}' does not match club '{}'",
                key.club_id, club_id
            )));
        }

        for attempt in 1..=MAX_CLAIM_ATTEMPTS {
            let now = Utc::now();
            let flight_id = format!("{}_{}", params.session_key, now.timestamp_millis());

            let pointer = SessionPointer {
                flight_id: flight_id.clone(),
                club_id: club_id.clone(),
                session_key: params.session_key.clone(),
                created_at: now,
            };

            if self.db.try_claim_session(&pointer).await? {
                // Won the pointer insert: this caller forms the flight.
                let flight = Flight::new(
                    flight_id.clone(),
                    club_id.clone(),
                    params.course_id.clone(),
                    params.session_key.clone(),
                    params.start_hole,
                    params.player_id.clone(),
                    params.player_name.clone(),
                    now,
                );
                self.db.create_flight(&flight).await?;

                tracing::info!(
                    flight_id = %flight_id,
                    session_key = %params.session_key,
                    player_id = %params.player_id,
                    "Formed new flight"
                );
                return Ok(JoinOutcome {
                    flight_id,
                    session_key: params.session_key,
                    is_new_flight: true,
                });
            }

            // Lost the insert: someone else owns this session. Follow the
            // pointer and join their flight.
            let Some(existing) = self.db.get_session_pointer(&params.session_key).await? else {
                // Pointer vanished between insert and read (completion in
                // flight). Retry the claim.
                tracing::debug!(
                    session_key = %params.session_key,
                    attempt,
                    "Session pointer disappeared, retrying claim"
                );
                continue;
            };

            match self.db.get_flight(&existing.flight_id).await? {
                Some(flight) if flight.is_active() => {
                    self.db
                        .join_flight(&existing.flight_id, &params.player_id, &params.player_name)
                        .await?;

                    tracing::info!(
                        flight_id = %existing.flight_id,
                        session_key = %params.session_key,
                        player_id = %params.player_id,
                        "Joined existing flight"
                    );
                    return Ok(JoinOutcome {
                        flight_id: existing.flight_id,
                        session_key: params.session_key,
                        is_new_flight: false,
                    });
                }
                _ => {
                    // Completed or missing flight behind the pointer: the
                    // pointer is stale. Clean it up and retry.
                    tracing::warn!(
                        flight_id = %existing.flight_id,
                        session_key = %params.session_key,
                        attempt,
                        "Stale session pointer, cleaning up"
                    );
                    self.db.delete_session_pointer(&params.session_key).await?;
                }
            }
        }

        Err(AppError::Conflict(format!(
            "Could not claim or join session '{}' after {} attempts",
            params.session_key, MAX_CLAIM_ATTEMPTS
        )))
    }

    /// Mark a flight completed and release its session key.
    ///
    /// Idempotent: calling it on an already-completed flight succeeds and
    /// preserves the first `completed_at`. The flight update and the
    /// pointer delete commit in one transaction, so a key is never left
    /// pointing at a terminal flight.
    pub async fn force_complete(&self, flight_id: &str) -> Result<()> {
        let mut flight = self
            .db
            .get_flight(flight_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Flight {} not found", flight_id)))?;

        if !flight.is_active() {
            tracing::debug!(flight_id, "Flight already completed (idempotent skip)");
            return Ok(());
        }

        let now = Utc::now();
        flight.status = crate::models::FlightStatus::Completed;
        flight.completed_at = Some(now);
        flight.last_update = now;

        self.db.complete_flight(&flight).await?;

        tracing::info!(
            flight_id,
            session_key = %flight.session_key,
            participants = flight.participants.len(),
            "Flight completed"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> JoinParams {
        JoinParams {
            club_id: "club_pinetina".to_string(),
            course_id: "default".to_string(),
            player_id: "player-1".to_string(),
            player_name: "Anna".to_string(),
            session_key: "club_pinetina_20250120_tee1".to_string(),
            start_hole: 1,
        }
    }

    // Validation failures must surface before any storage call, so they
    // are exercised against the offline mock database.

    #[tokio::test]
    async fn test_invalid_session_key_rejected_before_storage() {
        let service = SessionService::new(FirestoreDb::new_mock());
        let result = service
            .join_or_create(JoinParams {
                session_key: "not a key".to_string(),
                ..params()
            })
            .await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_out_of_range_start_hole_rejected() {
        let service = SessionService::new(FirestoreDb::new_mock());
        for hole in [0u8, 19, 255] {
            let result = service
                .join_or_create(JoinParams {
                    start_hole: hole,
                    ..params()
                })
                .await;
            assert!(matches!(result, Err(AppError::Validation(_))));
        }
    }

    #[tokio::test]
    async fn test_club_mismatch_rejected() {
        let service = SessionService::new(FirestoreDb::new_mock());
        let result = service
            .join_or_create(JoinParams {
                club_id: "club_other".to_string(),
                ..params()
            })
            .await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_scan_string_club_id_is_normalized() {
        let service = SessionService::new(FirestoreDb::new_mock());
        // A full scan URL for the matching club passes validation and only
        // then fails on the missing storage backend.
        let result = service
            .join_or_create(JoinParams {
                club_id: "https://playtrack.app/join?clubId=club_pinetina".to_string(),
                ..params()
            })
            .await;
        assert!(matches!(result, Err(AppError::Database(_))));
    }

    #[tokio::test]
    async fn test_empty_player_id_rejected() {
        let service = SessionService::new(FirestoreDb::new_mock());
        let result = service
            .join_or_create(JoinParams {
                player_id: "  ".to_string(),
                ..params()
            })
            .await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }
}
