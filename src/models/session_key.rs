// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Deterministic session keys used to deduplicate flight formation.

use chrono::{Datelike, NaiveDate};
use std::fmt;

/// A parsed session key: `clubId_YYYYMMDD_teeGroup`.
///
/// The club id itself may contain underscores
/// (`club_pinetina_20250120_tee1`), so the key is anchored from the right:
/// the last segment is the tee group, the second-to-last the date, and
/// everything before is the club id.
///
/// Validation runs before any storage access; malformed keys never reach
/// the session manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionKey {
    pub club_id: String,
    pub date: NaiveDate,
    pub tee_group: String,
}

impl SessionKey {
    /// Parse and validate a raw session key string.
    pub fn parse(raw: &str) -> Result<Self, SessionKeyError> {
        let mut parts = raw.rsplitn(3, '_');
        let tee_group = parts.next().filter(|s| !s.is_empty());
        let date_part = parts.next().filter(|s| !s.is_empty());
        let club_id = parts.next().filter(|s| !s.is_empty());

        let (Some(tee_group), Some(date_part), Some(club_id)) = (tee_group, date_part, club_id)
        else {
            return Err(SessionKeyError::Format);
        };

        if date_part.len() != 8 || !date_part.bytes().all(|b| b.is_ascii_digit()) {
            return Err(SessionKeyError::DateFormat);
        }

        let year: i32 = date_part[0..4].parse().map_err(|_| SessionKeyError::DateFormat)?;
        let month: u32 = date_part[4..6].parse().map_err(|_| SessionKeyError::DateFormat)?;
        let day: u32 = date_part[6..8].parse().map_err(|_| SessionKeyError::DateFormat)?;

        // Construct and round-trip a real date value so leap years and
        // month lengths are checked by the calendar, not by a regex.
        let date =
            NaiveDate::from_ymd_opt(year, month, day).ok_or(SessionKeyError::InvalidDate)?;
        if date.year() != year || date.month() != month || date.day() != day {
            return Err(SessionKeyError::InvalidDate);
        }

        Ok(Self {
            club_id: club_id.to_string(),
            date,
            tee_group: tee_group.to_string(),
        })
    }

    /// Quick validity check.
    pub fn is_valid(raw: &str) -> bool {
        Self::parse(raw).is_ok()
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}_{}_{}",
            self.club_id,
            self.date.format("%Y%m%d"),
            self.tee_group
        )
    }
}

/// Why a session key failed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SessionKeyError {
    #[error("Session key must have club, date and tee-group segments")]
    Format,

    #[error("Session key date segment must be 8 digits (YYYYMMDD)")]
    DateFormat,

    #[error("Session key date is not a valid calendar date")]
    InvalidDate,
}
