use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::geo::GeoPoint;

// --- Item Types ---

/// Where an item came from. Drives the source-dimension filter key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemSource {
    /// Community-submitted events.
    User,
    /// Curated/featured events from the platform API.
    Api,
    /// Ticketed events from external ticketing feeds.
    Ticketed,
}

impl ItemSource {
    /// The filter-key this source matches against.
    pub fn filter_key(&self) -> &'static str {
        match self {
            ItemSource::User => "community-events",
            ItemSource::Api => "featured-events",
            ItemSource::Ticketed => "ticketed-events",
        }
    }
}

impl std::fmt::Display for ItemSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ItemSource::User => write!(f, "user"),
            ItemSource::Api => write!(f, "api"),
            ItemSource::Ticketed => write!(f, "ticketed"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
}

impl Category {
    /// Normalized form used in filter keys: lower-cased, spaces to hyphens.
    pub fn slug(&self) -> String {
        normalize_key(&self.name)
    }
}

/// Normalize a display name into a filter-key fragment.
pub fn normalize_key(name: &str) -> String {
    name.trim().to_lowercase().replace(' ', "-")
}

/// A single renderable item: an event or a point-of-interest ("location").
///
/// Immutable once fetched. Items are owned by the fetch cycle that produced
/// them and replaced wholesale by the next successful fetch — stale items
/// are never merged into a newer snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapItem {
    pub id: String,
    pub name: String,
    pub location: GeoPoint,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub categories: Vec<Category>,
    pub source: ItemSource,
    /// True for points-of-interest, false for events.
    pub is_location: bool,
    /// Venue type for locations ("park", "cafe", …).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub venue_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// Locally synthesized placeholder, not yet backed by provider data.
    #[serde(default)]
    pub provisional: bool,
}

impl MapItem {
    pub fn has_image(&self) -> bool {
        self.image.as_deref().is_some_and(|i| !i.is_empty())
    }

    /// Every filter key this item can match, across the four dimensions:
    /// source type, event category, location category, location type.
    pub fn filter_keys(&self) -> Vec<String> {
        let mut keys = Vec::new();
        if self.is_location {
            for cat in &self.categories {
                keys.push(format!("location-{}", cat.slug()));
            }
            if let Some(vt) = &self.venue_type {
                keys.push(format!("type-{}", normalize_key(vt)));
            }
        } else {
            keys.push(self.source.filter_key().to_string());
            for cat in &self.categories {
                keys.push(format!("event-{}", cat.slug()));
            }
        }
        keys
    }
}

// --- Clusters ---

/// Items sharing a 3-decimal coordinate bucket, rendered as one marker.
///
/// Invariants: `items` is non-empty, `main` is a member of `items`, and
/// every item's bucketed coordinates equal `location`'s.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cluster {
    /// Bucket centroid — where the marker is drawn.
    pub location: GeoPoint,
    /// Representative item: the first with an image, else the first.
    pub main: MapItem,
    pub items: Vec<MapItem>,
}

impl Cluster {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

// --- Time frames ---

/// The active temporal window the user is browsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeFrame {
    Today,
    Week,
    Weekend,
}

impl std::fmt::Display for TimeFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TimeFrame::Today => write!(f, "today"),
            TimeFrame::Week => write!(f, "week"),
            TimeFrame::Weekend => write!(f, "weekend"),
        }
    }
}

// --- Filters ---

/// Lenient keeps items none of whose keys appear in the filter map (the
/// anti-empty-state policy); Strict drops them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterMode {
    Lenient,
    Strict,
}

impl Default for FilterMode {
    fn default() -> Self {
        FilterMode::Lenient
    }
}

/// Sparse map of filter-key -> enabled. Keys are only present once the user
/// has touched the corresponding toggle; absent keys are neither included
/// nor excluded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterState {
    toggles: BTreeMap<String, bool>,
}

impl FilterState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: impl Into<String>, enabled: bool) {
        self.toggles.insert(key.into(), enabled);
    }

    pub fn get(&self, key: &str) -> Option<bool> {
        self.toggles.get(key).copied()
    }

    /// No filters configured at all.
    pub fn is_empty(&self) -> bool {
        self.toggles.is_empty()
    }

    /// Every configured toggle is on.
    pub fn all_enabled(&self) -> bool {
        !self.toggles.is_empty() && self.toggles.values().all(|v| *v)
    }

    /// Every configured toggle is off.
    pub fn none_enabled(&self) -> bool {
        !self.toggles.is_empty() && self.toggles.values().all(|v| !*v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, bool)> {
        self.toggles.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

impl FromIterator<(String, bool)> for FilterState {
    fn from_iter<T: IntoIterator<Item = (String, bool)>>(iter: T) -> Self {
        Self {
            toggles: iter.into_iter().collect(),
        }
    }
}

// --- Loading state ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadReason {
    Initial,
    Data,
    Timeframe,
    Filters,
}

/// What the renderer needs to gate visibility: one boolean plus the reason
/// the map is (or was last) not fully loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadingState {
    pub is_fully_loaded: bool,
    pub reason: LoadReason,
}

impl Default for LoadingState {
    fn default() -> Self {
        Self {
            is_fully_loaded: false,
            reason: LoadReason::Initial,
        }
    }
}

// --- Deep links ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetKind {
    Event,
    Location,
}

/// Payload arriving from the host navigation/search subsystem.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeepLink {
    pub target_id: String,
    pub kind: TargetKind,
    pub lat: f64,
    pub lng: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

// --- User location ---

/// Coarse device GPS fix.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GpsFix {
    pub lat: f64,
    pub lng: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heading: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(categories: &[&str], source: ItemSource) -> MapItem {
        MapItem {
            id: "e1".to_string(),
            name: "Test event".to_string(),
            location: GeoPoint::new(44.9778, -93.2650),
            start_time: None,
            end_time: None,
            categories: categories
                .iter()
                .map(|name| Category {
                    id: name.to_string(),
                    name: name.to_string(),
                })
                .collect(),
            source,
            is_location: false,
            venue_type: None,
            address: None,
            image: None,
            provisional: false,
        }
    }

    #[test]
    fn event_filter_keys_carry_source_and_categories() {
        let item = event(&["Live Music", "food"], ItemSource::User);
        let keys = item.filter_keys();
        assert_eq!(
            keys,
            vec!["community-events", "event-live-music", "event-food"]
        );
    }

    #[test]
    fn location_filter_keys_carry_type_and_categories() {
        let mut item = event(&["Coffee Shop"], ItemSource::Api);
        item.is_location = true;
        item.venue_type = Some("Third Place".to_string());
        assert_eq!(
            item.filter_keys(),
            vec!["location-coffee-shop", "type-third-place"]
        );
    }

    #[test]
    fn category_slug_normalizes() {
        let cat = Category {
            id: "c1".to_string(),
            name: " Live  Music".to_string(),
        };
        assert_eq!(cat.slug(), "live--music");
        assert_eq!(normalize_key("Open Mic"), "open-mic");
    }

    #[test]
    fn filter_state_short_circuit_predicates() {
        let mut filters = FilterState::new();
        assert!(filters.is_empty());
        assert!(!filters.all_enabled());
        assert!(!filters.none_enabled());

        filters.set("community-events", true);
        filters.set("ticketed-events", true);
        assert!(filters.all_enabled());

        filters.set("ticketed-events", false);
        assert!(!filters.all_enabled());
        assert!(!filters.none_enabled());

        filters.set("community-events", false);
        assert!(filters.none_enabled());
    }

    #[test]
    fn deep_link_parses_from_host_payload() {
        // The shape the host navigation subsystem actually sends.
        let payload = r#"{
            "target_id": "E1",
            "kind": "event",
            "lat": 40.7128,
            "lng": -74.0060,
            "name": "Rooftop Show"
        }"#;
        let link: DeepLink = serde_json::from_str(payload).unwrap();
        assert_eq!(link.target_id, "E1");
        assert_eq!(link.kind, TargetKind::Event);
        assert!(link.address.is_none());
    }

    #[test]
    fn has_image_ignores_empty_string() {
        let mut item = event(&[], ItemSource::Api);
        assert!(!item.has_image());
        item.image = Some(String::new());
        assert!(!item.has_image());
        item.image = Some("https://example.com/a.webp".to_string());
        assert!(item.has_image());
    }
}
