//! Deterministic in-memory provider for tests and demos.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use tracing::debug;

use driftmap_common::{haversine_km, MapItem};

use crate::{ItemProvider, ProviderError, ProviderQuery, ProviderResponse};

/// Serves a fixed backing set, filtered by query radius and a coarse
/// temporal window. The precise Now/Today/Weekend split happens in the
/// controller's partitioner; the provider only trims the obviously
/// out-of-window tail, matching how the production backend behaves.
#[derive(Debug, Clone, Default)]
pub struct MemoryProvider {
    events: Vec<MapItem>,
    locations: Vec<MapItem>,
    latency: Option<Duration>,
    fail_with: Option<String>,
}

impl MemoryProvider {
    pub fn new(events: Vec<MapItem>, locations: Vec<MapItem>) -> Self {
        Self {
            events,
            locations,
            latency: None,
            fail_with: None,
        }
    }

    /// Delay every response; lets tests interleave superseding queries.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Fail every fetch with the given message.
    pub fn failing(message: &str) -> Self {
        Self {
            fail_with: Some(message.to_string()),
            ..Self::default()
        }
    }

    /// The backend serves a uniform week-scale window for every time
    /// frame; the controller's partitioner does the precise split, so a
    /// frame switch never needs a refetch.
    fn in_window(item: &MapItem) -> bool {
        let Some(start) = item.start_time else {
            // Locations and undated items are always current.
            return true;
        };
        let now = Utc::now();
        let not_over = item
            .end_time
            .map(|end| end >= now)
            .unwrap_or(start >= now - ChronoDuration::hours(6));
        not_over && start <= now + ChronoDuration::days(8)
    }
}

#[async_trait]
impl ItemProvider for MemoryProvider {
    async fn fetch(&self, query: ProviderQuery) -> Result<ProviderResponse, ProviderError> {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        if let Some(message) = &self.fail_with {
            return Err(ProviderError::Unavailable(message.clone()));
        }

        let radius_km = query.radius_m / 1000.0;
        let within = |item: &&MapItem| {
            item.location.is_valid()
                && haversine_km(
                    query.center.lat,
                    query.center.lng,
                    item.location.lat,
                    item.location.lng,
                ) <= radius_km
        };

        let events: Vec<MapItem> = self
            .events
            .iter()
            .filter(|item| within(item))
            .filter(|item| Self::in_window(item))
            .cloned()
            .collect();
        let locations: Vec<MapItem> = self
            .locations
            .iter()
            .filter(|item| within(item))
            .cloned()
            .collect();

        debug!(
            generation = query.generation,
            time_frame = %query.time_frame,
            events = events.len(),
            locations = locations.len(),
            radius_km,
            "memory provider fetch"
        );

        Ok(ProviderResponse { events, locations })
    }
}
