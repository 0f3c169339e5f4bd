// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Flights (live session aggregates)
//! - Session pointers (create-if-absent formation lock)
//! - Course layouts and club facilities (zone documents)
//! - Pace configs (per-hole targets)
//! - Hole stats and player zone state (timing aggregation)

use crate::db::collections;
use crate::error::AppError;
use crate::models::zone::ZoneDoc;
use crate::models::{Flight, HoleStat, PaceConfig, PlayerZoneState, SessionPointer};
use serde::{Deserialize, Serialize};

/// Course layout document, keyed `{club_id}_{course_id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourseLayoutDoc {
    pub club_id: String,
    pub course_id: String,
    #[serde(default)]
    pub zones: Vec<ZoneDoc>,
}

/// Club root document - only the fields this core reads.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClubDoc {
    #[serde(default)]
    pub facilities: Vec<ZoneDoc>,
}

/// Commit attempts for a contended participant join before giving up.
const MAX_JOIN_TXN_ATTEMPTS: u32 = 3;

/// Firestore document id for a session pointer.
pub fn session_pointer_id(session_key: &str) -> String {
    urlencoding::encode(session_key).into_owned()
}

/// Firestore document id for a (club, course) keyed document.
pub fn course_doc_id(club_id: &str, course_id: &str) -> String {
    format!("{}_{}", club_id, course_id)
}

/// Firestore document id for a hole stat record.
pub fn hole_stat_id(flight_id: &str, player_id: &str, hole_number: u8) -> String {
    format!("{}_{}_{}", flight_id, player_id, hole_number)
}

/// Firestore document id for a player zone state record.
pub fn player_state_id(flight_id: &str, player_id: &str) -> String {
    format!("{}_{}", flight_id, player_id)
}

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        // If the emulator environment variable is set, use unauthenticated connection
        // to avoid local credential warnings and leakage.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        // Use ExternalJwtFunctionSource to provide a dummy token without needing async-trait
        // or a custom TokenSource implementation struct.
        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a mock Firestore client for testing (offline mode).
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    /// Helper to get the client or return an error if offline.
    fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }

    /// Client clone whose reads are bound to `transaction`.
    ///
    /// Documents read through this clone enter the transaction's read set,
    /// so the commit fails if another writer touches them first. A plain
    /// read alongside a transaction gives no such guarantee.
    fn transaction_reader(
        client: &firestore::FirestoreDb,
        transaction: &firestore::FirestoreTransaction,
    ) -> Result<firestore::FirestoreDb, AppError> {
        Ok(client.clone_with_consistency_selector(
            firestore::FirestoreConsistencySelector::Transaction(
                transaction.transaction_id().clone(),
            ),
        ))
    }

    // ─── Session Pointer Operations ──────────────────────────────

    /// Atomically create the session pointer for a session key.
    ///
    /// Uses Firestore document-create semantics: if a pointer already
    /// exists, the create fails and `Ok(false)` is returned. Exactly one
    /// concurrent caller observes `Ok(true)`, which makes this the
    /// storage-level uniqueness constraint for flight formation.
    pub async fn try_claim_session(
        &self,
        pointer: &SessionPointer,
    ) -> Result<bool, AppError> {
        let doc_id = session_pointer_id(&pointer.session_key);

        let result: Result<SessionPointer, _> = self
            .get_client()?
            .fluent()
            .insert()
            .into(collections::FLIGHT_SESSIONS)
            .document_id(&doc_id)
            .object(pointer)
            .execute()
            .await;

        match result {
            Ok(_) => Ok(true),
            Err(firestore::errors::FirestoreError::DataConflictError(_)) => Ok(false),
            Err(e) => Err(AppError::Database(e.to_string())),
        }
    }

    /// Read the session pointer for a session key, if any.
    pub async fn get_session_pointer(
        &self,
        session_key: &str,
    ) -> Result<Option<SessionPointer>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::FLIGHT_SESSIONS)
            .obj()
            .one(&session_pointer_id(session_key))
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Remove a stale session pointer (its flight is gone or completed).
    pub async fn delete_session_pointer(&self, session_key: &str) -> Result<(), AppError> {
        self.get_client()?
            .fluent()
            .delete()
            .from(collections::FLIGHT_SESSIONS)
            .document_id(session_pointer_id(session_key))
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    // ─── Flight Operations ───────────────────────────────────────

    /// Get a flight by its id.
    pub async fn get_flight(&self, flight_id: &str) -> Result<Option<Flight>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::ACTIVE_FLIGHTS)
            .obj()
            .one(flight_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Store a freshly formed flight.
    pub async fn create_flight(&self, flight: &Flight) -> Result<(), AppError> {
        let _: Flight = self
            .get_client()?
            .fluent()
            .insert()
            .into(collections::ACTIVE_FLIGHTS)
            .document_id(&flight.id)
            .object(flight)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Masked, conditional flight update for the shared telemetry fields.
    ///
    /// The write commits only if the stored `last_position_sync` still
    /// equals `expected_sync`, the value the caller made its debounce
    /// decision against. The flight is read through the transaction, so a
    /// concurrent sample that commits first invalidates this one; the
    /// loser is dropped and `Ok(false)` returned. At most one sample per
    /// debounce window can therefore land, no matter how samples
    /// interleave. The mask keeps the write disjoint from participant
    /// joins.
    pub async fn update_flight_telemetry(
        &self,
        flight: &Flight,
        expected_sync: Option<chrono::DateTime<chrono::Utc>>,
    ) -> Result<bool, AppError> {
        let client = self.get_client()?;

        let mut transaction = client
            .begin_transaction()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;
        let reader = Self::transaction_reader(client, &transaction)?;

        let stored: Option<Flight> = reader
            .fluent()
            .select()
            .by_id_in(collections::ACTIVE_FLIGHTS)
            .obj()
            .one(&flight.id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let stored = match stored {
            Some(stored) => stored,
            None => {
                let _ = transaction.rollback().await;
                return Err(AppError::NotFound(format!("Flight {} not found", flight.id)));
            }
        };

        if stored.last_position_sync != expected_sync {
            tracing::debug!(flight_id = %flight.id, "Another sample won the sync window, dropping");
            let _ = transaction.rollback().await;
            return Ok(false);
        }

        client
            .fluent()
            .update()
            .fields(firestore::paths!(Flight::{
                location,
                current_area,
                current_hole,
                delay_minutes,
                accuracy,
                heading,
                speed,
                last_update,
                last_position_sync
            }))
            .in_col(collections::ACTIVE_FLIGHTS)
            .document_id(&flight.id)
            .object(flight)
            .add_to_transaction(&mut transaction)
            .map_err(|e| {
                AppError::Database(format!("Failed to add telemetry to transaction: {}", e))
            })?;

        // A commit rejected for contention means a concurrent writer beat
        // this sample to the window; that is a drop, not a failure.
        match transaction.commit().await {
            Ok(_) => Ok(true),
            Err(e) => {
                tracing::debug!(flight_id = %flight.id, error = %e, "Telemetry commit contended, dropping sample");
                Ok(false)
            }
        }
    }

    /// Masked flight update touching only the pace checkpoint fields.
    pub async fn update_flight_pace(&self, flight: &Flight) -> Result<(), AppError> {
        let _: Flight = self
            .get_client()?
            .fluent()
            .update()
            .fields(firestore::paths!(Flight::{
                pace_reset_at,
                pace_reset_hole,
                delay_minutes,
                last_update
            }))
            .in_col(collections::ACTIVE_FLIGHTS)
            .document_id(&flight.id)
            .object(flight)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Add a participant inside a transaction.
    ///
    /// The flight is read through the transaction, so the commit fails if
    /// another joiner writes the participant map between this read and the
    /// commit; contended commits are retried with a fresh read and the
    /// maps merge instead of overwriting each other. No-ops if the player
    /// is already in the set (the original `joined_at` is preserved).
    /// Returns `true` if the set changed.
    pub async fn join_flight(
        &self,
        flight_id: &str,
        player_id: &str,
        player_name: &str,
    ) -> Result<bool, AppError> {
        let client = self.get_client()?;

        let mut attempt = 0;
        loop {
            attempt += 1;
            let now = chrono::Utc::now();

            let mut transaction = client
                .begin_transaction()
                .await
                .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;
            let reader = Self::transaction_reader(client, &transaction)?;

            let found: Option<Flight> = reader
                .fluent()
                .select()
                .by_id_in(collections::ACTIVE_FLIGHTS)
                .obj()
                .one(flight_id)
                .await
                .map_err(|e| AppError::Database(e.to_string()))?;

            let mut flight = match found {
                Some(flight) => flight,
                None => {
                    let _ = transaction.rollback().await;
                    return Err(AppError::NotFound(format!("Flight {} not found", flight_id)));
                }
            };

            if !flight.add_participant(player_id, player_name, now) {
                tracing::debug!(
                    flight_id,
                    player_id,
                    "Participant already joined (idempotent skip)"
                );
                let _ = transaction.rollback().await;
                return Ok(false);
            }
            flight.last_update = now;

            client
                .fluent()
                .update()
                .fields(firestore::paths!(Flight::{participants, last_update}))
                .in_col(collections::ACTIVE_FLIGHTS)
                .document_id(flight_id)
                .object(&flight)
                .add_to_transaction(&mut transaction)
                .map_err(|e| {
                    AppError::Database(format!("Failed to add join to transaction: {}", e))
                })?;

            match transaction.commit().await {
                Ok(_) => return Ok(true),
                Err(e) if attempt < MAX_JOIN_TXN_ATTEMPTS => {
                    tracing::debug!(
                        flight_id,
                        player_id,
                        attempt,
                        error = %e,
                        "Join commit contended, retrying"
                    );
                }
                Err(e) => {
                    return Err(AppError::Database(format!(
                        "Transaction commit failed: {}",
                        e
                    )));
                }
            }
        }
    }

    /// Atomically mark a flight completed and drop its session pointer.
    ///
    /// The flight passed in must already carry the terminal fields; this
    /// method only makes the two writes succeed or fail together.
    pub async fn complete_flight(&self, flight: &Flight) -> Result<(), AppError> {
        let client = self.get_client()?;

        let mut transaction = client
            .begin_transaction()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

        client
            .fluent()
            .update()
            .in_col(collections::ACTIVE_FLIGHTS)
            .document_id(&flight.id)
            .object(flight)
            .add_to_transaction(&mut transaction)
            .map_err(|e| {
                AppError::Database(format!("Failed to add completion to transaction: {}", e))
            })?;

        client
            .fluent()
            .delete()
            .from(collections::FLIGHT_SESSIONS)
            .document_id(session_pointer_id(&flight.session_key))
            .add_to_transaction(&mut transaction)
            .map_err(|e| {
                AppError::Database(format!("Failed to add pointer delete to transaction: {}", e))
            })?;

        transaction
            .commit()
            .await
            .map_err(|e| AppError::Database(format!("Transaction commit failed: {}", e)))?;

        Ok(())
    }

    // ─── Layout Operations ───────────────────────────────────────

    /// Get the stored zone documents for a (club, course).
    pub async fn get_course_layout(
        &self,
        club_id: &str,
        course_id: &str,
    ) -> Result<Option<CourseLayoutDoc>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::COURSE_LAYOUTS)
            .obj()
            .one(&course_doc_id(club_id, course_id))
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Store a course layout (editor / seeding path).
    pub async fn set_course_layout(&self, layout: &CourseLayoutDoc) -> Result<(), AppError> {
        let _: CourseLayoutDoc = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::COURSE_LAYOUTS)
            .document_id(course_doc_id(&layout.club_id, &layout.course_id))
            .object(layout)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Get a club's global facility zones.
    pub async fn get_club_facilities(&self, club_id: &str) -> Result<Vec<ZoneDoc>, AppError> {
        let club: Option<ClubDoc> = self
            .get_client()?
            .fluent()
            .select()
            .by_id_in(collections::CLUBS)
            .obj()
            .one(club_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(club.map(|c| c.facilities).unwrap_or_default())
    }

    // ─── Pace Config Operations ──────────────────────────────────

    /// Get the pace config for a (club, course).
    pub async fn get_pace_config(
        &self,
        club_id: &str,
        course_id: &str,
    ) -> Result<Option<PaceConfig>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::PACE_CONFIGS)
            .obj()
            .one(&course_doc_id(club_id, course_id))
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Store a pace config (admin / seeding path).
    pub async fn set_pace_config(&self, config: &PaceConfig) -> Result<(), AppError> {
        let _: PaceConfig = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::PACE_CONFIGS)
            .document_id(course_doc_id(&config.club_id, &config.course_id))
            .object(config)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    // ─── Hole Stat Operations ────────────────────────────────────

    /// Get one (player, hole) timing record.
    pub async fn get_hole_stat(
        &self,
        flight_id: &str,
        player_id: &str,
        hole_number: u8,
    ) -> Result<Option<HoleStat>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::HOLE_STATS)
            .obj()
            .one(&hole_stat_id(flight_id, player_id, hole_number))
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Write/overwrite one (player, hole) timing record.
    pub async fn set_hole_stat(&self, stat: &HoleStat) -> Result<(), AppError> {
        let _: HoleStat = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::HOLE_STATS)
            .document_id(hole_stat_id(&stat.flight_id, &stat.player_id, stat.hole_number))
            .object(stat)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// All timing records for a flight (reporting snapshot source).
    pub async fn get_flight_hole_stats(
        &self,
        flight_id: &str,
    ) -> Result<Vec<HoleStat>, AppError> {
        let flight_id = flight_id.to_string();
        self.get_client()?
            .fluent()
            .select()
            .from(collections::HOLE_STATS)
            .filter(move |q| q.field("flight_id").eq(flight_id.clone()))
            .order_by([(
                "hole_number",
                firestore::FirestoreQueryDirection::Ascending,
            )])
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    // ─── Player Zone State Operations ────────────────────────────

    /// Get a player's last-resolved-zone record.
    pub async fn get_player_state(
        &self,
        flight_id: &str,
        player_id: &str,
    ) -> Result<Option<PlayerZoneState>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::PLAYER_ZONE_STATE)
            .obj()
            .one(&player_state_id(flight_id, player_id))
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Write a player's last-resolved-zone record.
    pub async fn set_player_state(&self, state: &PlayerZoneState) -> Result<(), AppError> {
        let _: PlayerZoneState = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::PLAYER_ZONE_STATE)
            .document_id(player_state_id(&state.flight_id, &state.player_id))
            .object(state)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }
}
