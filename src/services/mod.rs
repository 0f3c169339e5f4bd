// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod layout;
pub mod pace;
pub mod scan;
pub mod session;
pub mod stats;
pub mod telemetry;

pub use layout::LayoutService;
pub use pace::PaceService;
pub use scan::{parse_scan_string, ScanAction, ScanTarget};
pub use session::{JoinOutcome, JoinParams, SessionService};
pub use stats::HoleStatAggregator;
pub use telemetry::{PositionSample, SyncResult, TelemetryService};
