//! The multi-dimensional OR-filter engine.
//!
//! An item is matched against the sparse toggle map across up to four
//! independent dimensions (source type, event category, location category,
//! location type); any single enabled match wins. Pure function — no
//! hidden state, same inputs always give the same answer.

use std::collections::BTreeSet;

use driftmap_common::{FilterMode, FilterState, MapItem};

/// Evaluate one item against the active filters.
///
/// Short-circuits first:
/// - nothing configured ⇒ show everything,
/// - everything enabled ⇒ show everything (a fully-on toggle set must not
///   hide data over missing keys),
/// - everything disabled ⇒ show nothing.
///
/// Otherwise OR-match the item's derived keys; keys absent from the map
/// are neither included nor excluded. When none of the item's keys appear
/// in the map at all, `Lenient` shows the item (anti-empty-state policy:
/// an uncategorized item should not vanish because unrelated toggles were
/// touched) and `Strict` hides it.
pub fn matches(item: &MapItem, filters: &FilterState, mode: FilterMode) -> bool {
    if filters.is_empty() || filters.all_enabled() {
        return true;
    }
    if filters.none_enabled() {
        return false;
    }

    let mut any_known = false;
    for key in item.filter_keys() {
        match filters.get(&key) {
            Some(true) => return true,
            Some(false) => any_known = true,
            None => {}
        }
    }

    if any_known {
        false
    } else {
        matches!(mode, FilterMode::Lenient)
    }
}

/// Every filter key observable in a snapshot, in stable order. The UI
/// renders its toggle rows from this.
pub fn observable_keys(items: &[MapItem]) -> Vec<String> {
    let mut keys = BTreeSet::new();
    for item in items {
        keys.extend(item.filter_keys());
    }
    keys.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use driftmap_common::{Category, GeoPoint, ItemSource};

    fn event(source: ItemSource, categories: &[&str]) -> MapItem {
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

    fn location(categories: &[&str], venue_type: Option<&str>) -> MapItem {
        let mut item = event(ItemSource::Api, categories);
        item.is_location = true;
        item.venue_type = venue_type.map(|s| s.to_string());
        item
    }

    fn filters(pairs: &[(&str, bool)]) -> FilterState {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), *v))
            .collect()
    }

    #[test]
    fn empty_filters_show_everything() {
        let item = event(ItemSource::Ticketed, &["music"]);
        assert!(matches(&item, &FilterState::new(), FilterMode::Lenient));
        assert!(matches(&item, &FilterState::new(), FilterMode::Strict));
    }

    #[test]
    fn all_enabled_shows_everything() {
        let f = filters(&[("community-events", true), ("event-music", true)]);
        // No overlap with the item's keys, but all-on means show all.
        let item = location(&["park"], None);
        assert!(matches(&item, &f, FilterMode::Lenient));
        assert!(matches(&item, &f, FilterMode::Strict));
    }

    #[test]
    fn none_enabled_shows_nothing() {
        let f = filters(&[("community-events", false), ("event-music", false)]);
        let item = event(ItemSource::User, &["music"]);
        assert!(!matches(&item, &f, FilterMode::Lenient));
    }

    #[test]
    fn source_dimension_or_match() {
        // Community toggled on, ticketed toggled off.
        let f = filters(&[("community-events", true), ("ticketed-events", false)]);
        assert!(matches(&event(ItemSource::User, &[]), &f, FilterMode::Lenient));
        assert!(!matches(&event(ItemSource::Ticketed, &[]), &f, FilterMode::Lenient));
    }

    #[test]
    fn category_match_rescues_disabled_source() {
        let f = filters(&[("ticketed-events", false), ("event-music", true)]);
        let item = event(ItemSource::Ticketed, &["music"]);
        assert!(matches(&item, &f, FilterMode::Lenient));
    }

    #[test]
    fn location_dimensions_match_independently() {
        let f = filters(&[("type-park", true), ("community-events", false)]);
        assert!(matches(&location(&[], Some("park")), &f, FilterMode::Lenient));

        let f = filters(&[("location-coffee", true), ("community-events", false)]);
        assert!(matches(&location(&["coffee"], None), &f, FilterMode::Lenient));
    }

    #[test]
    fn unknown_keys_are_ignored_not_excluded() {
        // The item's key is known-false, an unrelated enabled key exists.
        let f = filters(&[("ticketed-events", false), ("event-music", true)]);
        assert!(!matches(&event(ItemSource::Ticketed, &[]), &f, FilterMode::Lenient));
    }

    #[test]
    fn uncategorized_item_lenient_vs_strict() {
        // Some filters enabled, but none of the item's keys appear at all.
        let f = filters(&[("event-music", true), ("event-food", false)]);
        let item = location(&[], None); // derives no keys
        assert!(matches(&item, &f, FilterMode::Lenient));
        assert!(!matches(&item, &f, FilterMode::Strict));
    }

    #[test]
    fn matches_is_idempotent() {
        let f = filters(&[("community-events", true), ("ticketed-events", false)]);
        let item = event(ItemSource::User, &["music"]);
        let first = matches(&item, &f, FilterMode::Lenient);
        let second = matches(&item, &f, FilterMode::Lenient);
        assert_eq!(first, second);
    }

    #[test]
    fn observable_keys_are_sorted_and_deduped() {
        let items = vec![
            event(ItemSource::User, &["Live Music"]),
            event(ItemSource::User, &["Live Music"]),
            location(&["coffee"], Some("cafe")),
        ];
        assert_eq!(
            observable_keys(&items),
            vec!["community-events", "event-live-music", "location-coffee", "type-cafe"]
        );
    }
}
