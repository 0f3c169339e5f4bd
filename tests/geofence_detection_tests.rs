// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Geofence resolution smoke tests against the demo course layout.
//!
//! These exercise the full GeoJSON → zone resolution pipeline with the
//! committed demo data. Priority and edge-case behavior is covered in unit
//! tests; this file guards the data file and the loader together.

use fairway_tracker::models::{CourseLayout, ZoneKind};
use fairway_tracker::services::layout::{area_label, layout_from_file, resolve_zone};

fn load_demo_course() -> CourseLayout {
    layout_from_file("data/pinetina_course.geojson")
        .expect("Failed to load demo course - is data/ committed?")
}

#[test]
fn test_demo_course_loads() {
    let layout = load_demo_course();

    // 9 polygon zones plus 1 marker.
    assert_eq!(layout.zones.len(), 10);
    assert!(layout
        .zones
        .iter()
        .any(|z| z.kind == ZoneKind::Green && z.hole_number == Some(1)));
    assert!(layout.zones.iter().any(|z| z.kind == ZoneKind::OutOfBounds));
}

#[test]
fn test_green_resolves_over_enclosing_fairway() {
    let layout = load_demo_course();

    // Center of green 1, which sits inside both the hole-1 fairway and the
    // course-wide out-of-bounds rectangle.
    let resolved = resolve_zone(45.5807, 8.9527, &layout).expect("should resolve");
    assert_eq!(resolved.kind, ZoneKind::Green);
    assert_eq!(resolved.hole_number, Some(1));
    assert_eq!(resolved.label(), "GREEN 1");
}

#[test]
fn test_tee_and_fairway_resolution() {
    let layout = load_demo_course();

    let tee = resolve_zone(45.5802, 8.9502, &layout).expect("should resolve");
    assert_eq!(tee.kind, ZoneKind::Tee);
    assert_eq!(tee.label(), "TEE 1");

    // Inside the hole-1 area but outside approach and green.
    let fairway = resolve_zone(45.5813, 8.9510, &layout).expect("should resolve");
    assert_eq!(fairway.kind, ZoneKind::Area);
    assert_eq!(fairway.hole_number, Some(1));
}

#[test]
fn test_facility_without_hole_number() {
    let layout = load_demo_course();

    let dr = resolve_zone(45.5795, 8.9487, &layout).expect("should resolve");
    assert_eq!(dr.kind, ZoneKind::DrivingRange);
    assert_eq!(dr.hole_number, None);
    assert_eq!(dr.label(), "DR");
}

#[test]
fn test_oob_is_last_resort_inside_course() {
    let layout = load_demo_course();

    // Inside the out-of-bounds rectangle but not in any playing zone.
    let resolved = resolve_zone(45.5785, 8.9550, &layout).expect("should resolve");
    assert_eq!(resolved.kind, ZoneKind::OutOfBounds);
}

#[test]
fn test_point_outside_everything() {
    let layout = load_demo_course();

    let resolved = resolve_zone(45.60, 9.00, &layout);
    assert!(resolved.is_none());
    assert_eq!(area_label(resolved), "Outside Areas");
}
