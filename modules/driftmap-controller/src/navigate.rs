//! Deep-link / search navigation resolution.
//!
//! A deep link names an item that may not be in the current snapshot at
//! all — the radius gets adjusted and a fetch dispatched, but the UI needs
//! something to show *now*. We synthesize a provisional placeholder from
//! the link metadata and schedule one retry to swap in the real record
//! once the wider fetch lands. Host navigation stacks are also happy to
//! deliver the same deep link twice in quick succession, so repeats within
//! a short window are dropped.

use tokio::time::{Duration, Instant};
use tracing::{debug, info};
use uuid::Uuid;

use driftmap_common::config::NavigationTuning;
use driftmap_common::{DeepLink, GeoPoint, ItemSource, MapItem, TargetKind};

/// Result of handling one navigation request.
#[derive(Debug, Clone, PartialEq)]
pub enum NavOutcome {
    /// Duplicate of a just-handled request; nothing to do.
    Ignored,
    /// The real item was already in the snapshot.
    Resolved(MapItem),
    /// A placeholder synthesized from the link metadata; a retry is
    /// scheduled to swap in the real item.
    Provisional(MapItem),
}

#[derive(Debug, Clone)]
struct PendingRetry {
    target_id: String,
    deadline: Instant,
}

#[derive(Debug, Clone)]
pub struct NavigationResolver {
    tuning: NavigationTuning,
    last_request: Option<(String, Instant)>,
    pending_retry: Option<PendingRetry>,
}

impl NavigationResolver {
    pub fn new(tuning: NavigationTuning) -> Self {
        Self {
            tuning,
            last_request: None,
            pending_retry: None,
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.pending_retry.as_ref().map(|p| p.deadline)
    }

    /// Handle a deep-link request against the current snapshot.
    ///
    /// A new request supersedes any pending retry, including one for a
    /// different target — the user has navigated on.
    pub fn request(&mut self, link: &DeepLink, items: &[MapItem], now: Instant) -> NavOutcome {
        if let Some((id, at)) = &self.last_request {
            let window = Duration::from_millis(self.tuning.dedup_window_ms);
            if id == &link.target_id && now.duration_since(*at) < window {
                debug!(target = %link.target_id, "duplicate deep link ignored");
                return NavOutcome::Ignored;
            }
        }
        self.last_request = Some((link.target_id.clone(), now));
        self.pending_retry = None;

        let request_id = Uuid::new_v4();
        if let Some(item) = items.iter().find(|i| i.id == link.target_id) {
            info!(%request_id, target = %link.target_id, "deep link resolved from snapshot");
            return NavOutcome::Resolved(item.clone());
        }

        self.pending_retry = Some(PendingRetry {
            target_id: link.target_id.clone(),
            deadline: now + Duration::from_millis(self.tuning.retry_ms),
        });
        info!(%request_id, target = %link.target_id, "deep link target not loaded, showing placeholder");
        NavOutcome::Provisional(placeholder(link))
    }

    /// Fire the scheduled retry if due. Returns the real item when the
    /// fresh snapshot has it; `None` means the placeholder stays — an
    /// accepted degraded outcome, not an error.
    pub fn fire(&mut self, items: &[MapItem], now: Instant) -> Option<MapItem> {
        let pending = self.pending_retry.as_ref()?;
        if now < pending.deadline {
            return None;
        }
        let target_id = pending.target_id.clone();
        self.pending_retry = None;

        match items.iter().find(|i| i.id == target_id) {
            Some(item) => {
                info!(target = %target_id, "placeholder swapped for real item");
                Some(item.clone())
            }
            None => {
                debug!(target = %target_id, "retry found nothing, placeholder remains");
                None
            }
        }
    }

    pub fn cancel(&mut self) {
        self.pending_retry = None;
    }
}

/// Build the provisional stand-in from whatever the link carried.
fn placeholder(link: &DeepLink) -> MapItem {
    MapItem {
        id: link.target_id.clone(),
        name: link
            .name
            .clone()
            .unwrap_or_else(|| link.target_id.clone()),
        location: GeoPoint::new(link.lat, link.lng),
        start_time: None,
        end_time: None,
        categories: Vec::new(),
        source: ItemSource::Api,
        is_location: matches!(link.kind, TargetKind::Location),
        venue_type: None,
        address: link.address.clone(),
        image: link.image.clone(),
        provisional: true,
    }
}
