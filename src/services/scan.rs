// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Scan-string normalization.
//!
//! On-course QR codes encode the club id either bare, as an app deep link
//! (`fairwaytrack://join?clubId=...`), or as a web URL with a `clubId` or
//! `id` query parameter. This pure parser unwraps all three forms before
//! the club id is ever used as a storage key.

use serde::Serialize;

/// What the scanned code asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanAction {
    Start,
    End,
}

/// Normalized scan result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanTarget {
    pub club_id: String,
    pub action: ScanAction,
}

/// Normalize a raw scanned string into a club id and action.
///
/// Unknown or unparseable input falls back to the trimmed raw string as
/// the club id; this never fails.
pub fn parse_scan_string(raw: &str) -> ScanTarget {
    let trimmed = raw.trim();

    let action = if is_end_action(trimmed) {
        ScanAction::End
    } else {
        ScanAction::Start
    };

    let club_id = normalize_club_id(trimmed);

    ScanTarget { club_id, action }
}

/// An end request is either an `action=end` query parameter or a URL whose
/// final path segment is exactly `end`. Matching the segment rather than a
/// substring keeps paths like `/friend` or `/endless` as start scans.
fn is_end_action(trimmed: &str) -> bool {
    let (path, query) = match trimmed.split_once('?') {
        Some((path, query)) => (path, Some(query)),
        None => (trimmed, None),
    };

    if let Some(query) = query {
        if query_param(query, "action").as_deref() == Some("end") {
            return true;
        }
    }

    let path = path.trim_end_matches('/');
    path == "end" || path.ends_with("/end")
}

/// Extract the club id from a raw scan string.
pub fn normalize_club_id(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return String::new();
    }

    // URL or deep-link form: look for a clubId (or legacy id) query param.
    if let Some(scheme_end) = trimmed.find("://") {
        let rest = &trimmed[scheme_end + 3..];
        if let Some(query) = rest.split_once('?').map(|(_, q)| q) {
            if let Some(value) = query_param(query, "clubId").or_else(|| query_param(query, "id"))
            {
                return value;
            }
        }
        // A URL with no recognizable club parameter stays as-is so the
        // failure is visible downstream instead of silently empty.
        return trimmed.to_string();
    }

    trimmed.to_string()
}

/// Find and percent-decode one query parameter.
fn query_param(query: &str, name: &str) -> Option<String> {
    query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| {
            urlencoding::decode(value)
                .map(|v| v.into_owned())
                .unwrap_or_else(|_| value.to_string())
        })
        .filter(|v| !v.is_empty())
}
