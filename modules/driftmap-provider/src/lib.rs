//! The external event/location provider boundary.
//!
//! The controller never talks to a transport directly; it issues
//! [`ProviderQuery`] values through the [`ItemProvider`] trait and consumes
//! whatever snapshot comes back. Supersession is handled by the generation
//! stamp: a response carrying a stale generation is dropped on arrival.

pub mod memory;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use driftmap_common::{GeoPoint, MapItem, TimeFrame};

pub use memory::MemoryProvider;

/// One data request: everything the provider needs plus the generation
/// stamp the controller uses to discard superseded responses.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProviderQuery {
    pub center: GeoPoint,
    pub radius_m: f64,
    pub time_frame: TimeFrame,
    /// Monotonically increasing per controller; newer queries supersede
    /// older in-flight ones.
    pub generation: u64,
}

/// One fetched snapshot. Events and locations arrive separately because
/// they come from different upstream endpoints, but downstream they merge
/// into a single item list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProviderResponse {
    pub events: Vec<MapItem>,
    pub locations: Vec<MapItem>,
}

impl ProviderResponse {
    /// Events followed by locations, arrival order preserved within each.
    pub fn into_items(self) -> Vec<MapItem> {
        let mut items = self.events;
        items.extend(self.locations);
        items
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty() && self.locations.is_empty()
    }
}

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("provider unavailable: {0}")]
    Unavailable(String),

    #[error("malformed provider payload: {0}")]
    Malformed(String),
}

/// The data source behind the map. Implementations must be cheap to clone
/// behind an `Arc` and safe to call concurrently; the controller may have
/// several generations in flight at once.
#[async_trait]
pub trait ItemProvider: Send + Sync {
    async fn fetch(&self, query: ProviderQuery) -> Result<ProviderResponse, ProviderError>;
}
