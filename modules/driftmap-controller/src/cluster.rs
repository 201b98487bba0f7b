//! Spatial clustering of raw items into renderable groups.
//!
//! Items sharing a 3-decimal coordinate bucket (~110m) collapse into one
//! cluster with a representative main item. A zoom-dependent cap bounds
//! the cluster count so a zoomed-out viewport cannot drown the renderer;
//! the cap truncates in arrival order, never samples.

use std::collections::HashMap;

use tracing::debug;

use driftmap_common::geo::{bucket_center, bucket_key};
use driftmap_common::{Cluster, FilterMode, FilterState, MapItem};

use crate::filter;

/// Cluster-count caps per zoom band.
const CAP_ZOOM_14: usize = 1000;
const CAP_ZOOM_12: usize = 500;
const CAP_ZOOM_10: usize = 300;
const CAP_DEFAULT: usize = 150;

/// Maximum clusters worth rendering at a zoom level.
pub fn smart_limit(zoom: f64) -> usize {
    if zoom >= 14.0 {
        CAP_ZOOM_14
    } else if zoom >= 12.0 {
        CAP_ZOOM_12
    } else if zoom >= 10.0 {
        CAP_ZOOM_10
    } else {
        CAP_DEFAULT
    }
}

/// Counters from one build pass.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ClusterStats {
    pub raw_items: usize,
    /// Items with non-finite or out-of-range coordinates, excluded before
    /// any distance math sees them.
    pub invalid_coords: usize,
    pub filtered_out: usize,
    /// Clusters dropped by the smart limit.
    pub capped: usize,
}

/// Group `items` into clusters for rendering at `zoom`.
///
/// Filtering runs before capping so the cap bounds the final rendered
/// set, not the pre-filter set. Clusters emptied by filtering are dropped.
/// Order is stable: buckets appear in first-arrival order and the cap
/// keeps the first N deterministically.
pub fn build(
    items: &[MapItem],
    zoom: f64,
    filters: &FilterState,
    mode: FilterMode,
) -> (Vec<Cluster>, ClusterStats) {
    let mut stats = ClusterStats {
        raw_items: items.len(),
        ..ClusterStats::default()
    };

    // Bucket in arrival order: HashMap for lookup, Vec for order.
    let mut index: HashMap<(i64, i64), usize> = HashMap::new();
    let mut buckets: Vec<((i64, i64), Vec<MapItem>)> = Vec::new();

    for item in items {
        let Some(key) = bucket_key(item.location) else {
            stats.invalid_coords += 1;
            continue;
        };
        if !filter::matches(item, filters, mode) {
            stats.filtered_out += 1;
            continue;
        }
        match index.get(&key) {
            Some(&i) => buckets[i].1.push(item.clone()),
            None => {
                index.insert(key, buckets.len());
                buckets.push((key, vec![item.clone()]));
            }
        }
    }

    let mut clusters: Vec<Cluster> = buckets
        .into_iter()
        .map(|(key, items)| {
            let main = items
                .iter()
                .find(|i| i.has_image())
                .unwrap_or(&items[0])
                .clone();
            Cluster {
                location: bucket_center(key),
                main,
                items,
            }
        })
        .collect();

    let cap = smart_limit(zoom);
    if clusters.len() > cap {
        stats.capped = clusters.len() - cap;
        clusters.truncate(cap);
    }

    debug!(
        raw = stats.raw_items,
        clusters = clusters.len(),
        filtered_out = stats.filtered_out,
        capped = stats.capped,
        zoom,
        "built clusters"
    );
    (clusters, stats)
}
