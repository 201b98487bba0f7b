//! Region-change debouncing.
//!
//! Map viewports emit a change event per animation frame while the user
//! drags. This module buffers the latest raw event and evaluates it once
//! the viewport has been idle for the debounce window (trailing debounce:
//! the last event in a window wins, earlier ones are discarded without
//! side effects). Zoom is tracked independently with 1-level hysteresis so
//! marker-density decisions do not thrash.

use tokio::time::{Duration, Instant};
use tracing::debug;

use driftmap_common::config::DebounceTuning;
use driftmap_common::geo::GeoPoint;

#[derive(Debug, Clone, Copy)]
struct PendingRegion {
    center: GeoPoint,
    zoom: f64,
    deadline: Instant,
}

/// What a settled window produced. Either field may be `None`: a small
/// wiggle settles with no movement past the threshold, a pinch with no
/// pan settles with only a zoom step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SettledRegion {
    /// Present when movement exceeded the radius-scaled threshold (or this
    /// is the very first settled region). Triggers a refetch.
    pub center: Option<GeoPoint>,
    /// Present when zoom moved at least one level. Triggers a re-render.
    pub zoom: Option<f64>,
}

impl SettledRegion {
    pub fn is_noop(&self) -> bool {
        self.center.is_none() && self.zoom.is_none()
    }
}

#[derive(Debug, Clone)]
pub struct RegionDebouncer {
    tuning: DebounceTuning,
    pending: Option<PendingRegion>,
    last_emitted: Option<GeoPoint>,
    last_zoom: Option<f64>,
}

impl RegionDebouncer {
    pub fn new(tuning: DebounceTuning) -> Self {
        Self {
            tuning,
            pending: None,
            last_emitted: None,
            last_zoom: None,
        }
    }

    /// Buffer a raw viewport change. Restarts the idle window; only the
    /// latest buffered event is ever evaluated.
    pub fn observe(&mut self, center: GeoPoint, zoom: f64, now: Instant) {
        self.pending = Some(PendingRegion {
            center,
            zoom,
            deadline: now + Duration::from_millis(self.tuning.window_ms),
        });
    }

    /// When the actor loop should wake us, if anything is buffered.
    pub fn deadline(&self) -> Option<Instant> {
        self.pending.map(|p| p.deadline)
    }

    /// Movement threshold in degrees, scaled with the current radius:
    /// a small radius means a small viewport where small pans matter; a
    /// large radius means the same pan is noise.
    pub fn threshold_deg(&self, radius_m: f64) -> f64 {
        let radius_km = radius_m / 1000.0;
        (radius_km / 1000.0).clamp(self.tuning.min_threshold_deg, self.tuning.max_threshold_deg)
    }

    /// Evaluate the buffered event if its window has elapsed.
    pub fn fire(&mut self, now: Instant, radius_m: f64) -> Option<SettledRegion> {
        let pending = self.pending?;
        if now < pending.deadline {
            return None;
        }
        self.pending = None;

        let threshold = self.threshold_deg(radius_m);
        let center = match self.last_emitted {
            // The very first settled region always emits.
            None => Some(pending.center),
            Some(prev) => {
                let moved = (pending.center.lat - prev.lat).abs() > threshold
                    || (pending.center.lng - prev.lng).abs() > threshold;
                moved.then_some(pending.center)
            }
        };
        if let Some(c) = center {
            self.last_emitted = Some(c);
        }

        let zoom = match self.last_zoom {
            None => Some(pending.zoom),
            Some(prev) => {
                ((pending.zoom - prev).abs() >= self.tuning.zoom_hysteresis).then_some(pending.zoom)
            }
        };
        if let Some(z) = zoom {
            self.last_zoom = Some(z);
        }

        debug!(
            emitted = center.is_some(),
            zoom_step = zoom.is_some(),
            threshold,
            "region window settled"
        );
        Some(SettledRegion { center, zoom })
    }

    /// Drop anything buffered. Used on teardown and time-frame switches so
    /// no timer fires into dismantled state.
    pub fn cancel(&mut self) {
        self.pending = None;
    }
}
