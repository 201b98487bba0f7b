//! Nearest-neighbor proximity counting for "live" followers.
//!
//! Pairwise haversine, O(n²). Fine for follower sets in the tens; this is
//! a documented scale boundary, not a bug — anything larger belongs in a
//! spatial index, not here.

use driftmap_common::geo::{distance_km, GeoPoint};

/// For each point, the number of *other* points within `radius_km`.
/// Invalid points count nothing and are counted by nothing.
pub fn nearby_counts(points: &[GeoPoint], radius_km: f64) -> Vec<usize> {
    points
        .iter()
        .enumerate()
        .map(|(i, a)| {
            if !a.is_valid() {
                return 0;
            }
            points
                .iter()
                .enumerate()
                .filter(|(j, b)| *j != i && b.is_valid() && distance_km(*a, **b) <= radius_km)
                .count()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_exclude_self() {
        let points = vec![GeoPoint::new(44.9778, -93.2650)];
        assert_eq!(nearby_counts(&points, 5.0), vec![0]);
    }

    #[test]
    fn two_clusters_of_followers() {
        // Two downtown, one across the metro (~15km), one in Duluth.
        let points = vec![
            GeoPoint::new(44.9778, -93.2650),
            GeoPoint::new(44.9790, -93.2630),
            GeoPoint::new(44.9537, -93.0900),
            GeoPoint::new(46.7867, -92.1005),
        ];
        assert_eq!(nearby_counts(&points, 5.0), vec![1, 1, 0, 0]);
        assert_eq!(nearby_counts(&points, 20.0), vec![2, 2, 2, 0]);
    }

    #[test]
    fn invalid_points_are_inert() {
        let points = vec![
            GeoPoint::new(44.9778, -93.2650),
            GeoPoint::new(f64::NAN, -93.2650),
            GeoPoint::new(44.9779, -93.2651),
        ];
        assert_eq!(nearby_counts(&points, 5.0), vec![1, 0, 1]);
    }

    #[test]
    fn empty_input() {
        assert!(nearby_counts(&[], 5.0).is_empty());
    }
}
