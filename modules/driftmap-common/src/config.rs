//! Controller tuning, loaded from environment variables with defaults.
//!
//! The radius bounds and the long-jump threshold were tuned empirically in
//! production; they live here as named fields rather than literals so a
//! deployment can override them without a code change.

use std::env;

use crate::types::FilterMode;

/// Search-radius adaptation parameters (§ radius controller).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RadiusTuning {
    /// Floor for any regional adjustment, meters.
    pub min_m: f64,
    /// Ceiling for any regional adjustment, meters.
    pub max_m: f64,
    /// Radius adopted on a long-distance jump, meters.
    pub snap_m: f64,
    /// Movement beyond this is a long-distance jump, kilometers.
    pub long_jump_km: f64,
    /// Safety margin applied to the movement distance on regional moves.
    pub margin: f64,
    /// Within this distance of home the radius is reset, kilometers.
    pub home_km: f64,
}

impl Default for RadiusTuning {
    fn default() -> Self {
        Self {
            min_m: 50_000.0,
            max_m: 200_000.0,
            snap_m: 100_000.0,
            long_jump_km: 500.0,
            margin: 1.2,
            home_km: 25.0,
        }
    }
}

/// Region-change debounce parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DebounceTuning {
    /// Trailing debounce window, milliseconds.
    pub window_ms: u64,
    /// Movement threshold bounds, degrees.
    pub min_threshold_deg: f64,
    pub max_threshold_deg: f64,
    /// Zoom deltas below this are ignored.
    pub zoom_hysteresis: f64,
}

impl Default for DebounceTuning {
    fn default() -> Self {
        Self {
            window_ms: 2000,
            min_threshold_deg: 0.01,
            max_threshold_deg: 0.05,
            zoom_hysteresis: 1.0,
        }
    }
}

/// Loading-orchestrator settle delays, milliseconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoadingTuning {
    pub data_settle_ms: u64,
    pub timeframe_settle_ms: u64,
    pub filter_settle_ms: u64,
}

impl Default for LoadingTuning {
    fn default() -> Self {
        Self {
            data_settle_ms: 1000,
            timeframe_settle_ms: 600,
            filter_settle_ms: 300,
        }
    }
}

/// Navigation-resolver timing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NavigationTuning {
    /// Repeated requests for the same target within this window are ignored.
    pub dedup_window_ms: u64,
    /// One placeholder-swap retry is scheduled this far out.
    pub retry_ms: u64,
}

impl Default for NavigationTuning {
    fn default() -> Self {
        Self {
            dedup_window_ms: 2000,
            retry_ms: 3000,
        }
    }
}

/// All controller tuning in one place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Tuning {
    pub radius: RadiusTuning,
    pub debounce: DebounceTuning,
    pub loading: LoadingTuning,
    pub navigation: NavigationTuning,
    pub filter_mode: FilterMode,
}

impl Tuning {
    /// Load tuning from environment variables, falling back to defaults.
    /// Malformed values fall back rather than erroring — tuning overrides
    /// must never take the controller down.
    pub fn from_env() -> Self {
        let d = Self::default();
        Self {
            radius: RadiusTuning {
                min_m: env_f64("DRIFTMAP_RADIUS_MIN_M", d.radius.min_m),
                max_m: env_f64("DRIFTMAP_RADIUS_MAX_M", d.radius.max_m),
                snap_m: env_f64("DRIFTMAP_RADIUS_SNAP_M", d.radius.snap_m),
                long_jump_km: env_f64("DRIFTMAP_LONG_JUMP_KM", d.radius.long_jump_km),
                margin: env_f64("DRIFTMAP_RADIUS_MARGIN", d.radius.margin),
                home_km: env_f64("DRIFTMAP_HOME_KM", d.radius.home_km),
            },
            debounce: DebounceTuning {
                window_ms: env_u64("DRIFTMAP_DEBOUNCE_MS", d.debounce.window_ms),
                min_threshold_deg: env_f64(
                    "DRIFTMAP_MIN_THRESHOLD_DEG",
                    d.debounce.min_threshold_deg,
                ),
                max_threshold_deg: env_f64(
                    "DRIFTMAP_MAX_THRESHOLD_DEG",
                    d.debounce.max_threshold_deg,
                ),
                zoom_hysteresis: env_f64("DRIFTMAP_ZOOM_HYSTERESIS", d.debounce.zoom_hysteresis),
            },
            loading: LoadingTuning {
                data_settle_ms: env_u64("DRIFTMAP_DATA_SETTLE_MS", d.loading.data_settle_ms),
                timeframe_settle_ms: env_u64(
                    "DRIFTMAP_TIMEFRAME_SETTLE_MS",
                    d.loading.timeframe_settle_ms,
                ),
                filter_settle_ms: env_u64("DRIFTMAP_FILTER_SETTLE_MS", d.loading.filter_settle_ms),
            },
            navigation: NavigationTuning {
                dedup_window_ms: env_u64(
                    "DRIFTMAP_NAV_DEDUP_MS",
                    d.navigation.dedup_window_ms,
                ),
                retry_ms: env_u64("DRIFTMAP_NAV_RETRY_MS", d.navigation.retry_ms),
            },
            filter_mode: match env::var("DRIFTMAP_FILTER_MODE").as_deref() {
                Ok("strict") => FilterMode::Strict,
                _ => FilterMode::Lenient,
            },
        }
    }
}

fn env_f64(key: &str, default: f64) -> f64 {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .filter(|v: &f64| v.is_finite())
        .unwrap_or(default)
}

fn env_u64(key: &str, default: u64) -> u64 {
    env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_production_constants() {
        let t = Tuning::default();
        assert_eq!(t.radius.min_m, 50_000.0);
        assert_eq!(t.radius.max_m, 200_000.0);
        assert_eq!(t.radius.snap_m, 100_000.0);
        assert_eq!(t.radius.long_jump_km, 500.0);
        assert_eq!(t.debounce.window_ms, 2000);
        assert_eq!(t.loading.data_settle_ms, 1000);
        assert_eq!(t.loading.timeframe_settle_ms, 600);
        assert_eq!(t.loading.filter_settle_ms, 300);
        assert_eq!(t.navigation.retry_ms, 3000);
        assert_eq!(t.filter_mode, FilterMode::Lenient);
    }

    #[test]
    fn malformed_env_falls_back() {
        // Fail closed: a garbage override must not poison the tuning.
        std::env::set_var("DRIFTMAP_RADIUS_MIN_M", "not a number");
        let t = Tuning::from_env();
        assert_eq!(t.radius.min_m, 50_000.0);
        std::env::remove_var("DRIFTMAP_RADIUS_MIN_M");
    }

    #[test]
    fn debounce_thresholds_take_env_overrides() {
        std::env::set_var("DRIFTMAP_MIN_THRESHOLD_DEG", "0.02");
        std::env::set_var("DRIFTMAP_MAX_THRESHOLD_DEG", "0.08");
        std::env::set_var("DRIFTMAP_ZOOM_HYSTERESIS", "0.5");
        let t = Tuning::from_env();
        assert_eq!(t.debounce.min_threshold_deg, 0.02);
        assert_eq!(t.debounce.max_threshold_deg, 0.08);
        assert_eq!(t.debounce.zoom_hysteresis, 0.5);
        std::env::remove_var("DRIFTMAP_MIN_THRESHOLD_DEG");
        std::env::remove_var("DRIFTMAP_MAX_THRESHOLD_DEG");
        std::env::remove_var("DRIFTMAP_ZOOM_HYSTERESIS");
    }
}
