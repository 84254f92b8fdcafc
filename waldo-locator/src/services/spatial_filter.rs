//! Spatial-hierarchy deduplication
//!
//! Keeps the most specific places: any placement that geographically
//! contains another extracted placement is dropped as "broader".

use super::placement_resolver::contains;
use crate::models::GeographicPlacement;
use tracing::info;

#[derive(Debug, Default, Clone, Copy)]
pub struct SpatialDeduplicator;

impl SpatialDeduplicator {
    pub fn new() -> Self {
        Self
    }

    /// Indices of placements to keep, in input order
    ///
    /// When two placements contain each other (equal extents, duplicate
    /// mentions) only the earliest survives. Dropping both would eliminate
    /// the sole remaining candidate for that place.
    pub fn filter(&self, placements: &[GeographicPlacement]) -> Vec<usize> {
        if placements.len() <= 1 {
            return (0..placements.len()).collect();
        }

        (0..placements.len())
            .filter(|&i| {
                let broader_than = placements.iter().enumerate().find(|&(j, other)| {
                    j != i
                        && contains(&placements[i], other)
                        && !(i < j && contains(other, &placements[i]))
                });

                match broader_than {
                    Some((_, other)) => {
                        info!(
                            "Filtering out {} (contains more specific {})",
                            placements[i].name, other.name
                        );
                        false
                    }
                    None => true,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BoundingBox;

    fn placed(name: &str, lat: f64, lon: f64, bbox: (f64, f64, f64, f64)) -> GeographicPlacement {
        GeographicPlacement::point(name, lat, lon)
            .with_bounding_box(BoundingBox::new(bbox.0, bbox.1, bbox.2, bbox.3))
    }

    fn usa() -> GeographicPlacement {
        placed("USA", 39.83, -98.58, (18.91, 71.36, -179.23, 179.86))
    }

    fn washington() -> GeographicPlacement {
        placed("Washington DC", 38.9072, -77.0369, (38.79, 38.996, -77.12, -76.91))
    }

    fn new_york() -> GeographicPlacement {
        placed("New York City", 40.7128, -74.0060, (40.4774, 40.9176, -74.2591, -73.7004))
    }

    fn london() -> GeographicPlacement {
        placed("London", 51.5074, -0.1278, (51.2868, 51.6919, -0.5103, 0.3340))
    }

    #[test]
    fn test_trivial_inputs() {
        let dedup = SpatialDeduplicator::new();
        assert!(dedup.filter(&[]).is_empty());
        assert_eq!(dedup.filter(&[usa()]), vec![0]);
    }

    #[test]
    fn test_country_dropped_for_city() {
        let dedup = SpatialDeduplicator::new();
        assert_eq!(dedup.filter(&[usa(), washington()]), vec![1]);
        assert_eq!(dedup.filter(&[washington(), usa()]), vec![0]);
    }

    #[test]
    fn test_unrelated_places_kept_in_order() {
        let dedup = SpatialDeduplicator::new();
        assert_eq!(dedup.filter(&[new_york(), london()]), vec![0, 1]);
    }

    #[test]
    fn test_state_and_city_by_admin_names() {
        let california = GeographicPlacement::point("California", 36.78, -119.42);
        let los_angeles = GeographicPlacement::point("Los Angeles", 34.05, -118.24)
            .with_containing_area("state", "California");
        let san_francisco = GeographicPlacement::point("San Francisco", 37.77, -122.42)
            .with_containing_area("state", "California");

        let kept = SpatialDeduplicator::new().filter(&[california, los_angeles, san_francisco]);

        assert_eq!(kept, vec![1, 2]);
    }

    #[test]
    fn test_duplicate_mentions_keep_first() {
        let kept = SpatialDeduplicator::new().filter(&[london(), new_york(), london()]);
        assert_eq!(kept, vec![0, 1]);
    }

    #[test]
    fn test_equal_extents_keep_earliest_name() {
        let mut big_apple = new_york();
        big_apple.name = "Big Apple".to_string();

        let kept = SpatialDeduplicator::new().filter(&[big_apple, new_york()]);

        assert_eq!(kept, vec![0]);
    }

    #[test]
    fn test_self_contained_single_placement_survives() {
        let only = washington();
        assert!(contains(&only, &only));
        assert_eq!(SpatialDeduplicator::new().filter(&[only]), vec![0]);
    }

    #[test]
    fn test_three_levels_keep_only_narrowest() {
        let new_york_state = placed("New York State", 42.9, -75.5, (40.49, 45.02, -79.77, -71.85));
        let kept = SpatialDeduplicator::new().filter(&[usa(), new_york_state, new_york()]);
        assert_eq!(kept, vec![2]);
    }
}
