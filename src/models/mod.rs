// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Data models for the application.

pub mod flight;
pub mod pace;
pub mod session_key;
pub mod stats;
pub mod zone;

pub use flight::{Flight, FlightStatus, ParticipantRef, SessionPointer};
pub use pace::PaceConfig;
pub use session_key::{SessionKey, SessionKeyError};
pub use stats::{HoleStat, PlayerHoleStats, PlayerZoneState, SegmentBucket};
pub use zone::{CourseLayout, GeoZone, LatLng, ResolvedZone, ZoneDoc, ZoneKind};
