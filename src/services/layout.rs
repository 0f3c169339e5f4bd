// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Course layout loading, caching, and geofence resolution.

use crate::db::firestore::CourseLayoutDoc;
use crate::db::FirestoreDb;
use crate::error::AppError;
use crate::models::zone::{
    CourseLayout, GeoZone, ResolvedZone, ZoneKind, ZoneShape, OUTSIDE_AREA_LABEL,
};
use dashmap::DashMap;
use geo::{Point, Polygon};
use geojson::GeoJson;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Resolve the zone a position falls in.
///
/// Zones may overlap (a tee box can sit inside a hole's outer boundary),
/// so resolution walks the fixed priority order and the first matching
/// zone wins: green > tee > approach > hole/area > facilities > oob.
/// An empty layout deterministically resolves to `None` (outside).
///
/// Pure and synchronous; O(zones x vertices) per call, safe to call from
/// any number of tasks without synchronization.
pub fn resolve_zone(lat: f64, lng: f64, layout: &CourseLayout) -> Option<ResolvedZone> {
    for kind in ZoneKind::PRIORITY {
        if let Some(zone) = layout
            .zones
            .iter()
            .find(|z| z.kind == kind && z.contains(lat, lng))
        {
            return Some(ResolvedZone {
                kind,
                hole_number: zone.hole_number,
            });
        }
    }
    None
}

/// Display label for a resolution result.
pub fn area_label(resolved: Option<ResolvedZone>) -> String {
    match resolved {
        Some(zone) => zone.label(),
        None => OUTSIDE_AREA_LABEL.to_string(),
    }
}

struct CachedLayout {
    layout: Arc<CourseLayout>,
    loaded_at: Instant,
}

/// Service for loading course layouts and resolving positions against them.
///
/// Layouts are immutable per course revision, so they are cached in-process
/// with a TTL; a cache miss or expiry reloads from Firestore.
#[derive(Clone)]
pub struct LayoutService {
    db: FirestoreDb,
    ttl: Duration,
    cache: Arc<DashMap<String, CachedLayout>>,
}

impl LayoutService {
    pub fn new(db: FirestoreDb, ttl_secs: u64) -> Self {
        Self {
            db,
            ttl: Duration::from_secs(ttl_secs),
            cache: Arc::new(DashMap::new()),
        }
    }

    /// Get the layout for a (club, course), from cache when fresh.
    pub async fn course_layout(
        &self,
        club_id: &str,
        course_id: &str,
    ) -> Result<Arc<CourseLayout>, AppError> {
        let cache_key = format!("{}_{}", club_id, course_id);

        if let Some(entry) = self.cache.get(&cache_key) {
            if entry.loaded_at.elapsed() < self.ttl {
                return Ok(entry.layout.clone());
            }
        }

        let layout = Arc::new(self.load(club_id, course_id).await?);
        self.cache.insert(
            cache_key,
            CachedLayout {
                layout: layout.clone(),
                loaded_at: Instant::now(),
            },
        );
        Ok(layout)
    }

    /// Drop a cached layout (course editor saved a new revision).
    pub fn invalidate(&self, club_id: &str, course_id: &str) {
        self.cache.remove(&format!("{}_{}", club_id, course_id));
    }

    /// Load and normalize the course zones plus the club's global
    /// facility zones. A club or course with no stored layout yields an
    /// empty layout, which resolves everything to outside.
    async fn load(&self, club_id: &str, course_id: &str) -> Result<CourseLayout, AppError> {
        let course_doc = self.db.get_course_layout(club_id, course_id).await?;
        let facilities = self.db.get_club_facilities(club_id).await?;

        let mut zones: Vec<GeoZone> = course_doc
            .as_ref()
            .map(|doc| doc.zones.as_slice())
            .unwrap_or_default()
            .iter()
            .filter_map(|doc| doc.normalize())
            .collect();
        zones.extend(facilities.iter().filter_map(|doc| doc.normalize()));

        tracing::info!(
            club_id,
            course_id,
            zones = zones.len(),
            "Loaded course layout"
        );

        Ok(CourseLayout::new(zones))
    }

    /// Seed a layout document (local dev / tests).
    pub async fn seed_layout(&self, doc: &CourseLayoutDoc) -> Result<(), AppError> {
        self.db.set_course_layout(doc).await?;
        self.invalidate(&doc.club_id, &doc.course_id);
        Ok(())
    }
}

// ─── GeoJSON Loading ─────────────────────────────────────────────

/// Load a course layout from a GeoJSON file.
///
/// Features carry `type` (zone kind code) and optional `hole` properties.
/// Used for local development and tests; production layouts come from the
/// course editor via Firestore.
pub fn layout_from_file<P: AsRef<Path>>(path: P) -> Result<CourseLayout, LayoutError> {
    let json_data =
        fs::read_to_string(path.as_ref()).map_err(|e| LayoutError::IoError(e.to_string()))?;
    layout_from_geojson(&json_data)
}

/// Load a course layout from a GeoJSON string.
pub fn layout_from_geojson(json_data: &str) -> Result<CourseLayout, LayoutError> {
    let geojson: GeoJson = json_data
        .parse()
        .map_err(|e: geojson::Error| LayoutError::ParseError(e.to_string()))?;

    let GeoJson::FeatureCollection(collection) = geojson else {
        return Err(LayoutError::ParseError(
            "Expected a FeatureCollection".to_string(),
        ));
    };

    let mut zones = Vec::new();

    for (index, feature) in collection.features.into_iter().enumerate() {
        let kind_code = feature
            .property("type")
            .and_then(|v| v.as_str())
            .unwrap_or("")
            .to_string();

        let Some(kind) = ZoneKind::from_code(&kind_code) else {
            tracing::debug!(index, kind = %kind_code, "Skipping feature with unknown zone kind");
            continue;
        };

        let hole_number = feature
            .property("hole")
            .and_then(|v| v.as_u64())
            .map(|h| h as u8);

        let id = feature
            .property("id")
            .and_then(|v| v.as_str())
            .map(String::from)
            .unwrap_or_else(|| format!("zone-{}", index));

        let Some(geom) = feature.geometry else {
            continue;
        };

        let Some(shape) = convert_geometry(geom.value) else {
            tracing::warn!(zone = %id, "Skipping degenerate or unsupported zone geometry");
            continue;
        };

        zones.push(GeoZone {
            id,
            kind,
            hole_number,
            shape,
        });
    }

    tracing::info!(count = zones.len(), "Loaded course layout from GeoJSON");
    Ok(CourseLayout::new(zones))
}

/// Convert GeoJSON geometry to a zone shape.
///
/// Polygons with fewer than 3 distinct vertices are degenerate and
/// rejected here rather than at query time.
fn convert_geometry(value: geojson::Value) -> Option<ZoneShape> {
    use std::convert::TryInto;

    let poly_result: Result<Polygon<f64>, _> = value.clone().try_into();
    if let Ok(poly) = poly_result {
        // A closed exterior ring repeats its first coordinate, so a
        // triangle has 4 ring entries.
        if poly.exterior().0.len() < 4 {
            return None;
        }
        return Some(ZoneShape::Boundary(poly));
    }

    let point_result: Result<Point<f64>, _> = value.try_into();
    if let Ok(point) = point_result {
        return Some(ZoneShape::Marker(point));
    }

    None
}

/// Errors from layout loading.
#[derive(Debug, thiserror::Error)]
pub enum LayoutError {
    #[error("Failed to read file: {0}")]
    IoError(String),

    #[error("Failed to parse GeoJSON: {0}")]
    ParseError(String),
}
