//! Database layer (Firestore).

pub mod firestore;

pub use firestore::FirestoreDb;

/// Collection names as constants.
pub mod collections {
    pub const ACTIVE_FLIGHTS: &str = "active_flights";
    /// Session pointer docs keyed by session key; the create-if-absent
    /// uniqueness constraint for flight formation.
    pub const FLIGHT_SESSIONS: &str = "flight_sessions";
    pub const COURSE_LAYOUTS: &str = "course_layouts";
    /// Club root docs (global facility zones)
    pub const CLUBS: &str = "clubs";
    pub const PACE_CONFIGS: &str = "pace_of_play";
    /// Per (flight, player, hole) timing records
    pub const HOLE_STATS: &str = "hole_stats";
    /// Per (flight, player) last-resolved-zone records
    pub const PLAYER_ZONE_STATE: &str = "player_zone_state";
}
