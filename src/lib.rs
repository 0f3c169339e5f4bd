// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Fairway-Tracker: live pace-of-play tracking for golf courses
//!
//! This crate provides the backend API for forming player flights from
//! scanned session keys, resolving GPS positions against course geofences,
//! and computing pace-of-play delay and per-hole timing statistics.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::FirestoreDb;
use services::{HoleStatAggregator, LayoutService, PaceService, SessionService, TelemetryService};

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: FirestoreDb,
    pub layouts: LayoutService,
    pub sessions: SessionService,
    pub pace: PaceService,
    pub telemetry: TelemetryService,
    pub stats: HoleStatAggregator,
}

impl AppState {
    /// Wire up the service graph over one database handle.
    pub fn new(config: Config, db: FirestoreDb) -> Self {
        let layouts = LayoutService::new(db.clone(), config.layout_cache_ttl_secs);
        let sessions = SessionService::new(db.clone());
        let pace = PaceService::new(db.clone());
        let stats = HoleStatAggregator::new(db.clone());
        let telemetry = TelemetryService::new(
            db.clone(),
            layouts.clone(),
            pace.clone(),
            stats.clone(),
            config.sync_min_interval_secs,
        );

        Self {
            config,
            db,
            layouts,
            sessions,
            pace,
            telemetry,
            stats,
        }
    }
}
