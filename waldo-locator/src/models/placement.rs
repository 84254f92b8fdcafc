//! Geocoded, boundary-aware place representation

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Axis-aligned latitude/longitude box
///
/// Boxes crossing the antimeridian are not special-cased; containment
/// is a bounding-box approximation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub south: f64,
    pub north: f64,
    pub west: f64,
    pub east: f64,
}

impl BoundingBox {
    pub fn new(south: f64, north: f64, west: f64, east: f64) -> Self {
        Self {
            south,
            north,
            west,
            east,
        }
    }

    /// Inclusive point-in-box test
    pub fn contains_point(&self, latitude: f64, longitude: f64) -> bool {
        self.south <= latitude
            && latitude <= self.north
            && self.west <= longitude
            && longitude <= self.east
    }

    /// Whether `other` lies fully inside this box (edges may touch)
    pub fn encloses(&self, other: &BoundingBox) -> bool {
        self.south <= other.south
            && other.north <= self.north
            && self.west <= other.west
            && other.east <= self.east
    }
}

/// Geocoding result for one candidate
///
/// Immutable after creation. Optional fields are explicitly absent when the
/// provider did not supply a usable value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeographicPlacement {
    /// Name the placement was resolved for
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub bounding_box: Option<BoundingBox>,
    /// OSM administrative level (2 = country, 4 = state, 8 = city, ...)
    pub admin_level: Option<i32>,
    pub place_type: Option<String>,
    /// Administrative kind (city, state, country, ...) → name of the area
    /// containing this place
    pub containing_areas: BTreeMap<String, String>,
}

impl GeographicPlacement {
    /// Point placement with no boundary or hierarchy data
    pub fn point(name: impl Into<String>, latitude: f64, longitude: f64) -> Self {
        Self {
            name: name.into(),
            latitude,
            longitude,
            bounding_box: None,
            admin_level: None,
            place_type: None,
            containing_areas: BTreeMap::new(),
        }
    }

    pub fn with_bounding_box(mut self, bbox: BoundingBox) -> Self {
        self.bounding_box = Some(bbox);
        self
    }

    pub fn with_containing_area(mut self, kind: impl Into<String>, name: impl Into<String>) -> Self {
        self.containing_areas.insert(kind.into(), name.into());
        self
    }
}
