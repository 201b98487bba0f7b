//! Search-radius adaptation.
//!
//! Regional moves grow the radius with a safety margin; long-distance jumps
//! (search navigation across continents) replace the center instead —
//! expanding the radius to span an ocean would over-fetch forever.

use tracing::debug;

use driftmap_common::config::RadiusTuning;
use driftmap_common::geo::{distance_km, GeoPoint};

/// What the caller must do with the viewport after an adjustment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RadiusDecision {
    /// Keep the current center; radius may have grown.
    Regional { radius_m: f64 },
    /// Replace the center with the target outright.
    Relocate { radius_m: f64 },
}

impl RadiusDecision {
    pub fn radius_m(&self) -> f64 {
        match self {
            RadiusDecision::Regional { radius_m } | RadiusDecision::Relocate { radius_m } => {
                *radius_m
            }
        }
    }
}

/// Owns the current search radius. Deterministic: the same
/// `(current_center, target, radius)` inputs always produce the same
/// decision, and nothing mutates the radius except [`adjust`] and
/// [`reset_if_near_home`].
///
/// [`adjust`]: RadiusController::adjust
/// [`reset_if_near_home`]: RadiusController::reset_if_near_home
#[derive(Debug, Clone)]
pub struct RadiusController {
    tuning: RadiusTuning,
    radius_m: f64,
}

impl RadiusController {
    pub fn new(tuning: RadiusTuning) -> Self {
        Self {
            radius_m: tuning.min_m,
            tuning,
        }
    }

    pub fn radius_m(&self) -> f64 {
        self.radius_m
    }

    /// Adapt the radius so that `target` is fetchable from
    /// `current_center`.
    ///
    /// - No current center: be generous — `max(snap, 2 * current)`, and
    ///   the center must be placed at the target.
    /// - Distance beyond the long-jump threshold: snap to the jump radius
    ///   and replace the center.
    /// - Otherwise: required = distance * margin, clamped to
    ///   `[min, max]`, adopted only if larger than the current radius.
    ///   The radius never shrinks on this path.
    pub fn adjust(&mut self, current_center: Option<GeoPoint>, target: GeoPoint) -> RadiusDecision {
        let Some(center) = current_center else {
            self.radius_m = self.tuning.snap_m.max(self.radius_m * 2.0);
            debug!(radius_m = self.radius_m, "no current center, generous radius");
            return RadiusDecision::Relocate {
                radius_m: self.radius_m,
            };
        };

        let d_km = distance_km(center, target);

        if d_km > self.tuning.long_jump_km {
            self.radius_m = self.tuning.snap_m;
            debug!(d_km, radius_m = self.radius_m, "long-distance jump, snapping radius");
            return RadiusDecision::Relocate {
                radius_m: self.radius_m,
            };
        }

        let required_m = (d_km * 1000.0 * self.tuning.margin)
            .clamp(self.tuning.min_m, self.tuning.max_m);
        if required_m > self.radius_m {
            debug!(d_km, from = self.radius_m, to = required_m, "expanding radius");
            self.radius_m = required_m;
        }
        RadiusDecision::Regional {
            radius_m: self.radius_m,
        }
    }

    /// Shrink back to the floor once the user is near their home center
    /// again. Without this, a temporarily expanded radius would keep
    /// over-fetching indefinitely after the user returns.
    ///
    /// Returns `true` if the radius was reset.
    pub fn reset_if_near_home(&mut self, point: GeoPoint, home: GeoPoint) -> bool {
        if distance_km(point, home) < self.tuning.home_km && self.radius_m > self.tuning.min_m {
            debug!(from = self.radius_m, to = self.tuning.min_m, "near home, resetting radius");
            self.radius_m = self.tuning.min_m;
            return true;
        }
        false
    }
}
