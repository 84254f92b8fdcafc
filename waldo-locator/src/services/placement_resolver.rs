//! Geocoding wrapper and the containment predicate
//!
//! `resolve` never fails: every provider error degrades to `None` with a
//! log line, so one bad lookup cannot abort a job.

use super::geocoding::RawPlace;
use super::GeocodingProvider;
use crate::models::{BoundingBox, GeographicPlacement};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Address kinds kept as `containing_areas`, narrowest first
const ADMIN_KINDS: &[&str] = &[
    "neighbourhood",
    "suburb",
    "city",
    "town",
    "village",
    "municipality",
    "county",
    "state_district",
    "state",
    "region",
    "country",
];

pub struct GeoPlacementResolver {
    provider: Arc<dyn GeocodingProvider>,
}

impl GeoPlacementResolver {
    pub fn new(provider: Arc<dyn GeocodingProvider>) -> Self {
        Self { provider }
    }

    /// Geocode `name` into a canonical placement, or `None` if it cannot be placed
    pub async fn resolve(&self, name: &str) -> Option<GeographicPlacement> {
        match self.provider.lookup(name).await {
            Ok(Some(raw)) => {
                let placement = normalize(name, &raw);
                if placement.is_none() {
                    warn!(location = %name, lat = %raw.lat, lon = %raw.lon, "Geocoder returned unparseable coordinates");
                }
                placement
            }
            Ok(None) => {
                debug!(location = %name, "No geocoding match");
                None
            }
            Err(e) => {
                warn!(location = %name, error = %e, "Geocoding failed");
                None
            }
        }
    }
}

/// Convert a provider payload into a placement named `name`
///
/// Coordinates are mandatory. The bounding box survives only if all four
/// edges parse; `admin_level` only if it is an integer.
pub fn normalize(name: &str, raw: &RawPlace) -> Option<GeographicPlacement> {
    let latitude = raw.lat.trim().parse::<f64>().ok()?;
    let longitude = raw.lon.trim().parse::<f64>().ok()?;

    let bounding_box = raw.boundingbox.as_deref().and_then(parse_bounding_box);

    let admin_level = raw
        .extratags
        .as_ref()
        .and_then(|tags| tags.get("admin_level"))
        .and_then(|level| level.trim().parse::<i32>().ok());

    let place_type = raw
        .place_type
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string);

    let containing_areas: BTreeMap<String, String> = raw
        .address
        .as_ref()
        .map(|address| {
            ADMIN_KINDS
                .iter()
                .filter_map(|kind| {
                    address
                        .get(*kind)
                        .map(|v| v.trim())
                        .filter(|v| !v.is_empty())
                        .map(|v| (kind.to_string(), v.to_string()))
                })
                .collect()
        })
        .unwrap_or_default();

    Some(GeographicPlacement {
        name: name.to_string(),
        latitude,
        longitude,
        bounding_box,
        admin_level,
        place_type,
        containing_areas,
    })
}

fn parse_bounding_box(edges: &[String]) -> Option<BoundingBox> {
    let [south, north, west, east] = edges else {
        return None;
    };
    Some(BoundingBox::new(
        south.trim().parse().ok()?,
        north.trim().parse().ok()?,
        west.trim().parse().ok()?,
        east.trim().parse().ok()?,
    ))
}

/// Is `b` geographically inside `a`?
///
/// With boxes on both sides, `b`'s point and its whole box must lie inside
/// `a`'s box. If only `a` has a box, `b`'s point inside it is enough.
/// Otherwise fall back to administrative names: `a` contains `b` when `b`
/// lists `a` among its containing areas. No evidence means unrelated.
pub fn contains(a: &GeographicPlacement, b: &GeographicPlacement) -> bool {
    if a == b {
        return true;
    }

    match (&a.bounding_box, &b.bounding_box) {
        (Some(a_box), Some(b_box)) => {
            a_box.contains_point(b.latitude, b.longitude) && a_box.encloses(b_box)
        }
        (Some(a_box), None) if a_box.contains_point(b.latitude, b.longitude) => true,
        _ => {
            let broader = a.name.to_lowercase();
            b.containing_areas
                .values()
                .any(|area| area.to_lowercase() == broader)
        }
    }
}
