// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Course zone model and geometry handling.

use geo::{Contains, Point, Polygon};
use serde::{Deserialize, Serialize};

/// Display label used when a position matches no zone.
pub const OUTSIDE_AREA_LABEL: &str = "Outside Areas";

/// Zone classification.
///
/// `PRIORITY` below defines resolution order for overlapping zones
/// (a tee box can sit inside a hole's outer boundary).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZoneKind {
    Green,
    Tee,
    Approach,
    Hole,
    #[serde(rename = "area_buca")]
    Area,
    #[serde(rename = "dr")]
    DrivingRange,
    #[serde(rename = "pg")]
    PuttingGreen,
    Buvette,
    #[serde(rename = "pp")]
    PitchAndPutt,
    Executive,
    #[serde(rename = "oob")]
    OutOfBounds,
}

impl ZoneKind {
    /// Resolution priority for overlapping zones: first match wins.
    pub const PRIORITY: [ZoneKind; 11] = [
        ZoneKind::Green,
        ZoneKind::Tee,
        ZoneKind::Approach,
        ZoneKind::Hole,
        ZoneKind::Area,
        ZoneKind::DrivingRange,
        ZoneKind::PuttingGreen,
        ZoneKind::Buvette,
        ZoneKind::PitchAndPutt,
        ZoneKind::Executive,
        ZoneKind::OutOfBounds,
    ];

    /// Parse the loose type code used in stored layout documents.
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "green" => Some(Self::Green),
            "tee" => Some(Self::Tee),
            "approach" => Some(Self::Approach),
            "hole" => Some(Self::Hole),
            "area_buca" | "area" => Some(Self::Area),
            "dr" => Some(Self::DrivingRange),
            "pg" => Some(Self::PuttingGreen),
            "buvette" => Some(Self::Buvette),
            "pp" => Some(Self::PitchAndPutt),
            "executive" => Some(Self::Executive),
            "oob" => Some(Self::OutOfBounds),
            _ => None,
        }
    }

    /// Uppercase display code, as shown on staff dashboards.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Green => "GREEN",
            Self::Tee => "TEE",
            Self::Approach => "APPROACH",
            Self::Hole => "HOLE",
            Self::Area => "AREA",
            Self::DrivingRange => "DR",
            Self::PuttingGreen => "PG",
            Self::Buvette => "BUVETTE",
            Self::PitchAndPutt => "PP",
            Self::Executive => "EXECUTIVE",
            Self::OutOfBounds => "OOB",
        }
    }

    /// Club-wide facility kinds (no hole number).
    pub fn is_facility(&self) -> bool {
        matches!(
            self,
            Self::DrivingRange
                | Self::PuttingGreen
                | Self::Buvette
                | Self::PitchAndPutt
                | Self::Executive
        )
    }
}

/// A latitude/longitude pair, the wire and storage form of a position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

/// Zone geometry - a marker point or a geofence polygon.
///
/// Only `Boundary` zones participate in geofence resolution; markers are
/// layout annotations (pins, flags) and never match a position.
#[derive(Debug, Clone)]
pub enum ZoneShape {
    Marker(Point<f64>),
    Boundary(Polygon<f64>),
}

/// A normalized course zone. Immutable once loaded for a course revision.
#[derive(Debug, Clone)]
pub struct GeoZone {
    pub id: String,
    pub kind: ZoneKind,
    pub hole_number: Option<u8>,
    pub shape: ZoneShape,
}

impl GeoZone {
    /// Whether the given position falls inside this zone's boundary.
    ///
    /// Boundary ties follow the point-in-polygon algorithm's own edge
    /// convention; there is no special-casing.
    pub fn contains(&self, lat: f64, lng: f64) -> bool {
        match &self.shape {
            ZoneShape::Marker(_) => false,
            ZoneShape::Boundary(poly) => poly.contains(&Point::new(lng, lat)),
        }
    }
}

/// The zone a position resolved to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ResolvedZone {
    pub kind: ZoneKind,
    pub hole_number: Option<u8>,
}

impl ResolvedZone {
    /// Display label, e.g. `"GREEN 1"`, `"TEE 10"`, or `"DR"`.
    pub fn label(&self) -> String {
        match self.hole_number {
            Some(hole) => format!("{} {}", self.kind.label(), hole),
            None => self.kind.label().to_string(),
        }
    }
}

/// Ordered zone set for one (club, course), including the club's global
/// facility zones. Loaded read-only by the geofence resolver.
#[derive(Debug, Clone, Default)]
pub struct CourseLayout {
    pub zones: Vec<GeoZone>,
}

impl CourseLayout {
    pub fn new(zones: Vec<GeoZone>) -> Self {
        Self { zones }
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }
}

/// Loose zone document as stored by the course editor.
///
/// Hole numbers appear either at the root or nested in `metadata`
/// depending on the editor version; [`ZoneDoc::normalize`] collapses both
/// into the canonical [`GeoZone`] shape exactly once, at the boundary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZoneDoc {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<LatLng>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<Vec<LatLng>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hole_number: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ZoneMetadata>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ZoneMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hole_number: Option<u8>,
}

impl ZoneDoc {
    /// Normalize into a [`GeoZone`], or `None` if the document cannot
    /// participate in resolution (unknown kind, degenerate polygon, no
    /// geometry). Rejections are logged, never raised.
    pub fn normalize(&self) -> Option<GeoZone> {
        let kind = match ZoneKind::from_code(&self.kind) {
            Some(kind) => kind,
            None => {
                tracing::debug!(zone = %self.id, kind = %self.kind, "Skipping zone with unknown kind");
                return None;
            }
        };

        let hole_number = self
            .hole_number
            .or_else(|| self.metadata.as_ref().and_then(|m| m.hole_number));

        let shape = if let Some(path) = &self.path {
            match boundary_from_path(path) {
                Some(poly) => ZoneShape::Boundary(poly),
                None => {
                    tracing::warn!(
                        zone = %self.id,
                        vertices = path.len(),
                        "Skipping degenerate zone polygon"
                    );
                    return None;
                }
            }
        } else if let Some(loc) = self.location {
            ZoneShape::Marker(Point::new(loc.lng, loc.lat))
        } else {
            tracing::debug!(zone = %self.id, "Skipping zone with no geometry");
            return None;
        };

        Some(GeoZone {
            id: self.id.clone(),
            kind,
            hole_number,
            shape,
        })
    }
}

/// Build a polygon from a stored vertex path. Fewer than 3 distinct
/// vertices is degenerate and yields `None`.
fn boundary_from_path(path: &[LatLng]) -> Option<Polygon<f64>> {
    let mut coords: Vec<geo::Coord<f64>> = path
        .iter()
        .map(|p| geo::Coord { x: p.lng, y: p.lat })
        .collect();

    // Stored paths may or may not repeat the first vertex at the end.
    if coords.len() > 1 && coords.first() == coords.last() {
        coords.pop();
    }
    if coords.len() < 3 {
        return None;
    }

    Some(Polygon::new(geo::LineString::new(coords), vec![]))
}
