//! Loading-state orchestration.
//!
//! Exposes one boolean plus a reason tag, and gives each transition its
//! own settle delay so markers and images get a beat to start loading
//! before the UI declares the map ready. Only the latest transition's
//! timer may fire: starting a new transition replaces any pending one.

use tokio::time::{Duration, Instant};

use driftmap_common::config::LoadingTuning;
use driftmap_common::{LoadReason, LoadingState};

#[derive(Debug, Clone)]
pub struct LoadingTracker {
    tuning: LoadingTuning,
    state: LoadingState,
    pending: Option<Instant>,
}

impl LoadingTracker {
    pub fn new(tuning: LoadingTuning) -> Self {
        Self {
            tuning,
            state: LoadingState::default(),
            pending: None,
        }
    }

    pub fn state(&self) -> LoadingState {
        self.state
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.pending
    }

    /// A fetch was dispatched. Not loaded until it completes.
    pub fn on_fetch_started(&mut self) {
        self.state = LoadingState {
            is_fully_loaded: false,
            reason: LoadReason::Data,
        };
        self.pending = None;
    }

    /// A fetch completed with `item_count` items. Empty results complete
    /// immediately — there is nothing to wait for.
    pub fn on_fetch_completed(&mut self, item_count: usize, now: Instant) {
        self.state.reason = LoadReason::Data;
        if item_count == 0 {
            self.state.is_fully_loaded = true;
            self.pending = None;
        } else {
            self.state.is_fully_loaded = false;
            self.pending = Some(now + Duration::from_millis(self.tuning.data_settle_ms));
        }
    }

    /// A fetch failed. Resolve to loaded rather than hang; the previous
    /// snapshot stays on screen.
    pub fn on_fetch_failed(&mut self) {
        self.state = LoadingState {
            is_fully_loaded: true,
            reason: LoadReason::Data,
        };
        self.pending = None;
    }

    /// The active time frame switched while data is present.
    pub fn on_timeframe_changed(&mut self, has_data: bool, now: Instant) {
        if !has_data {
            return;
        }
        self.state = LoadingState {
            is_fully_loaded: false,
            reason: LoadReason::Timeframe,
        };
        self.pending = Some(now + Duration::from_millis(self.tuning.timeframe_settle_ms));
    }

    /// The filter set changed. Only debounces visibility if the map had
    /// already fully loaded; mid-load filter flips ride the data settle.
    pub fn on_filters_changed(&mut self, now: Instant) {
        if !self.state.is_fully_loaded {
            return;
        }
        self.state = LoadingState {
            is_fully_loaded: false,
            reason: LoadReason::Filters,
        };
        self.pending = Some(now + Duration::from_millis(self.tuning.filter_settle_ms));
    }

    /// Fire the settle timer if due. Returns `true` when the state
    /// flipped to fully loaded.
    pub fn fire(&mut self, now: Instant) -> bool {
        match self.pending {
            Some(deadline) if now >= deadline => {
                self.pending = None;
                self.state.is_fully_loaded = true;
                true
            }
            _ => false,
        }
    }

    /// Teardown / time-frame switch cancellation.
    pub fn cancel(&mut self) {
        self.pending = None;
    }
}
