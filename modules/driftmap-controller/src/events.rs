//! Controller input events and the render-boundary output frame.
//!
//! Everything that can touch controller state arrives as one of these
//! events on a single channel and is processed to completion in arrival
//! order — there is no other mutation path.

use driftmap_common::{
    Cluster, DeepLink, FilterState, GeoPoint, GpsFix, LoadingState, MapItem, TimeFrame,
};
use driftmap_provider::ProviderResponse;

#[derive(Debug)]
pub enum ControllerEvent {
    /// Raw viewport change from the map surface; debounced before acting.
    RegionChanged { center: GeoPoint, zoom: f64 },
    /// A provider fetch finished. Stale generations are dropped on
    /// arrival. Errors arrive as strings: the transport error chain is
    /// not actionable here beyond logging.
    FetchCompleted {
        generation: u64,
        result: Result<ProviderResponse, String>,
    },
    /// User switched the active time frame.
    TimeFrameChanged(TimeFrame),
    /// User toggled filters; the whole new state arrives at once.
    FiltersChanged(FilterState),
    /// Deep-link / search selection from the host navigation stack.
    DeepLink(DeepLink),
    /// Coarse device GPS fix.
    GpsFix(GpsFix),
    /// User-configured coordinate override; wins over GPS while set.
    PreferredLocation(Option<GeoPoint>),
    /// The host reported geolocation permission denied.
    GeolocationDenied,
    /// The renderer performed the requested viewport fit; clears the
    /// latched `request_auto_fit` flag.
    AutoFitHandled,
    /// Tear down: cancel timers, stop the task.
    Shutdown,
}

/// The item a deep link put front-and-center, if any.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayedItem {
    pub item: MapItem,
    pub provisional: bool,
}

/// What the renderer consumes, one per render cycle. Clusters are already
/// partitioned to the active time frame, filtered, and capped; the
/// renderer only turns them into markers.
#[derive(Debug, Clone, Default)]
pub struct RenderFrame {
    pub clusters: Vec<Cluster>,
    pub loading: LoadingState,
    pub displayed: Option<DisplayedItem>,
    /// Ask the renderer to fit the viewport to the data. Raised at most
    /// once per controller lifetime and latched in every frame until the
    /// host sends [`ControllerEvent::AutoFitHandled`]: the watch channel
    /// only keeps the latest frame, so an edge-triggered flag could be
    /// overwritten before a slow renderer reads it.
    pub request_auto_fit: bool,
    /// Terminal until a center arrives by deep link or override.
    pub geolocation_denied: bool,
    /// Snapshot generation the clusters came from.
    pub generation: u64,
}
