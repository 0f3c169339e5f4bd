// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Pace-of-play configuration model.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Per-hole target times for one (club, course).
///
/// Stored in the `pace_of_play` collection, keyed `{club_id}_{course_id}`.
/// Holes are keyed by number as strings (Firestore map keys are strings);
/// absent holes contribute 0 minutes to target sums, never an error.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PaceConfig {
    pub club_id: String,
    pub course_id: String,
    #[serde(default)]
    pub holes: HashMap<String, u32>,
}

impl PaceConfig {
    /// Target minutes for a single hole; 0 when unconfigured.
    pub fn hole_target(&self, hole: u8) -> u32 {
        self.holes.get(&hole.to_string()).copied().unwrap_or(0)
    }
}
