//! The controller task: one owner for all map-control state.
//!
//! Input events arrive on a single mpsc channel and are processed to
//! completion in arrival order; timer-driven work (debounce windows,
//! settle delays, the navigation retry) is modeled as deadlines the loop
//! sleeps toward, so there is exactly one suspension point and no shared
//! mutable state. Render output goes out as an immutable [`RenderFrame`]
//! snapshot on a watch channel.

use std::sync::Arc;

use chrono::Utc;
use futures::future::OptionFuture;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use driftmap_common::{
    DeepLink, DriftmapError, FilterState, GeoPoint, GpsFix, MapItem, TimeFrame, Tuning,
};
use driftmap_provider::{ItemProvider, ProviderQuery, ProviderResponse};

use crate::cluster;
use crate::debounce::{RegionDebouncer, SettledRegion};
use crate::events::{ControllerEvent, DisplayedItem, RenderFrame};
use crate::loading::LoadingTracker;
use crate::navigate::{NavOutcome, NavigationResolver};
use crate::radius::{RadiusController, RadiusDecision};
use crate::timeframe::{self, Partitions};

/// Zoom assumed until the viewport reports one.
const DEFAULT_ZOOM: f64 = 12.0;

/// Handle to a spawned controller: send events in, watch frames out.
pub struct ControllerHandle {
    tx: mpsc::Sender<ControllerEvent>,
    frames: watch::Receiver<RenderFrame>,
    task: JoinHandle<()>,
}

impl ControllerHandle {
    pub async fn send(&self, event: ControllerEvent) -> Result<(), DriftmapError> {
        self.tx
            .send(event)
            .await
            .map_err(|_| DriftmapError::ChannelClosed)
    }

    /// A fresh receiver for render frames.
    pub fn frames(&self) -> watch::Receiver<RenderFrame> {
        self.frames.clone()
    }

    /// Cancel all pending timers and stop the task.
    pub async fn shutdown(self) {
        let _ = self.tx.send(ControllerEvent::Shutdown).await;
        let _ = self.task.await;
    }
}

/// Spawn the controller task.
pub fn spawn(provider: Arc<dyn ItemProvider>, tuning: Tuning) -> ControllerHandle {
    let (tx, rx) = mpsc::channel(64);
    let (frames_tx, frames_rx) = watch::channel(RenderFrame::default());
    let controller = MapController::new(provider, tuning, tx.clone(), frames_tx);
    let task = tokio::spawn(controller.run(rx));
    ControllerHandle {
        tx,
        frames: frames_rx,
        task,
    }
}

struct MapController {
    tuning: Tuning,
    provider: Arc<dyn ItemProvider>,
    /// Fetch completions are fed back through the same input channel so
    /// they queue behind (never race) user events.
    self_tx: mpsc::Sender<ControllerEvent>,
    frames_tx: watch::Sender<RenderFrame>,

    radius: RadiusController,
    debouncer: RegionDebouncer,
    loading: LoadingTracker,
    nav: NavigationResolver,

    filters: FilterState,
    time_frame: TimeFrame,
    center: Option<GeoPoint>,
    zoom: f64,
    /// First resolved user location; anchors the near-home radius reset.
    home: Option<GeoPoint>,
    preferred: Option<GeoPoint>,
    geolocation_denied: bool,

    /// Current fetch cycle's items, replaced wholesale by the next
    /// successful fetch. Consumers only ever see it through clusters.
    snapshot: Vec<MapItem>,
    partitions: Partitions,
    generation: u64,
    auto_fit_done: bool,
    pending_auto_fit: bool,
    displayed: Option<DisplayedItem>,
}

impl MapController {
    fn new(
        provider: Arc<dyn ItemProvider>,
        tuning: Tuning,
        self_tx: mpsc::Sender<ControllerEvent>,
        frames_tx: watch::Sender<RenderFrame>,
    ) -> Self {
        Self {
            radius: RadiusController::new(tuning.radius),
            debouncer: RegionDebouncer::new(tuning.debounce),
            loading: LoadingTracker::new(tuning.loading),
            nav: NavigationResolver::new(tuning.navigation),
            tuning,
            provider,
            self_tx,
            frames_tx,
            filters: FilterState::new(),
            time_frame: TimeFrame::Today,
            center: None,
            zoom: DEFAULT_ZOOM,
            home: None,
            preferred: None,
            geolocation_denied: false,
            snapshot: Vec::new(),
            partitions: Partitions::default(),
            generation: 0,
            auto_fit_done: false,
            pending_auto_fit: false,
            displayed: None,
        }
    }

    async fn run(mut self, mut rx: mpsc::Receiver<ControllerEvent>) {
        loop {
            let sleep: OptionFuture<_> = self.next_deadline().map(tokio::time::sleep_until).into();

            tokio::select! {
                event = rx.recv() => match event {
                    None | Some(ControllerEvent::Shutdown) => break,
                    Some(event) => self.handle(event, Instant::now()),
                },
                Some(()) = sleep => self.on_timer(Instant::now()),
            }
        }
        self.teardown();
    }

    fn next_deadline(&self) -> Option<Instant> {
        [
            self.debouncer.deadline(),
            self.loading.deadline(),
            self.nav.deadline(),
        ]
        .into_iter()
        .flatten()
        .min()
    }

    fn handle(&mut self, event: ControllerEvent, now: Instant) {
        match event {
            ControllerEvent::RegionChanged { center, zoom } => {
                if !center.is_valid() || !zoom.is_finite() {
                    warn!(
                        lat = center.lat,
                        lng = center.lng,
                        zoom,
                        "dropping malformed region change"
                    );
                    return;
                }
                self.debouncer.observe(center, zoom, now);
            }
            ControllerEvent::FetchCompleted { generation, result } => {
                self.on_fetch_completed(generation, result, now);
            }
            ControllerEvent::TimeFrameChanged(frame) => self.on_time_frame(frame, now),
            ControllerEvent::FiltersChanged(filters) => {
                self.filters = filters;
                self.loading.on_filters_changed(now);
                self.publish();
            }
            ControllerEvent::DeepLink(link) => self.on_deep_link(link, now),
            ControllerEvent::GpsFix(fix) => self.on_gps_fix(fix),
            ControllerEvent::PreferredLocation(point) => {
                self.preferred = point.filter(|p| p.is_valid());
                if self.center.is_none() {
                    if let Some(p) = self.preferred {
                        info!(lat = p.lat, lng = p.lng, "preferred location provides first center");
                        self.geolocation_denied = false;
                        self.center = Some(p);
                        self.home.get_or_insert(p);
                        self.start_fetch();
                    }
                }
            }
            ControllerEvent::GeolocationDenied => {
                // Terminal until a center arrives by deep link or override.
                if self.center.is_none() {
                    warn!("geolocation denied with no center available");
                    self.geolocation_denied = true;
                    self.publish();
                }
            }
            ControllerEvent::AutoFitHandled => {
                if self.pending_auto_fit {
                    self.pending_auto_fit = false;
                    self.publish();
                }
            }
            ControllerEvent::Shutdown => unreachable!("handled by the run loop"),
        }
    }

    /// One wakeup services every due deadline; they are all cheap.
    fn on_timer(&mut self, now: Instant) {
        if let Some(settled) = self.debouncer.fire(now, self.radius.radius_m()) {
            self.on_settled(settled);
        }
        if self.loading.fire(now) {
            self.publish();
        }
        if let Some(item) = self.nav.fire(&self.snapshot, now) {
            self.displayed = Some(DisplayedItem {
                provisional: false,
                item,
            });
            self.publish();
        }
    }

    fn on_settled(&mut self, settled: SettledRegion) {
        if let Some(zoom) = settled.zoom {
            self.zoom = zoom;
        }
        match settled.center {
            Some(center) => {
                let decision = self.radius.adjust(self.center, center);
                debug!(?decision, "settled region adjusted radius");
                // The user panned here: the settled center is the new
                // center regardless of the regional/relocate verdict.
                self.center = Some(center);
                if let Some(home) = self.home {
                    self.radius.reset_if_near_home(center, home);
                }
                self.start_fetch();
            }
            None if settled.zoom.is_some() => {
                // Zoom step only: re-cluster under the new smart limit.
                self.publish();
            }
            None => {}
        }
    }

    fn on_fetch_completed(
        &mut self,
        generation: u64,
        result: Result<ProviderResponse, String>,
        now: Instant,
    ) {
        if generation != self.generation {
            debug!(generation, current = self.generation, "ignoring superseded fetch");
            return;
        }
        match result {
            Ok(response) => {
                self.snapshot = response.into_items();
                self.partitions = timeframe::partition(&self.snapshot, Utc::now());
                self.loading.on_fetch_completed(self.snapshot.len(), now);

                if timeframe::should_auto_fit(self.partitions.counts(), self.auto_fit_done) {
                    self.auto_fit_done = true;
                    self.pending_auto_fit = true;
                }
                info!(generation, items = self.snapshot.len(), "snapshot replaced");
            }
            Err(message) => {
                // Keep the previous snapshot on screen; an empty flash is
                // worse than stale markers.
                warn!(generation, %message, "fetch failed, keeping previous snapshot");
                self.loading.on_fetch_failed();
            }
        }
        self.publish();
    }

    fn on_time_frame(&mut self, frame: TimeFrame, now: Instant) {
        if frame == self.time_frame {
            return;
        }
        // A frame switch invalidates every pending timer: nothing queued
        // for the old frame may mutate state under the new one.
        self.debouncer.cancel();
        self.nav.cancel();
        self.time_frame = frame;
        self.loading
            .on_timeframe_changed(!self.snapshot.is_empty(), now);
        info!(%frame, "time frame switched");
        self.publish();
    }

    fn on_deep_link(&mut self, link: DeepLink, now: Instant) {
        let target = GeoPoint::new(link.lat, link.lng);
        if !target.is_valid() {
            warn!(target = %link.target_id, "deep link with malformed coordinates");
            return;
        }

        match self.nav.request(&link, &self.snapshot, now) {
            NavOutcome::Ignored => {}
            NavOutcome::Resolved(item) => {
                self.displayed = Some(DisplayedItem {
                    provisional: false,
                    item,
                });
                // Already on screen; still widen the radius so the next
                // refetch keeps the target covered.
                if self.relocate_for(target) {
                    self.start_fetch();
                } else {
                    self.publish();
                }
            }
            NavOutcome::Provisional(item) => {
                self.displayed = Some(DisplayedItem {
                    provisional: true,
                    item,
                });
                self.relocate_for(target);
                self.start_fetch();
            }
        }
    }

    /// Run the radius controller for a navigation target. Returns `true`
    /// when the center was replaced.
    fn relocate_for(&mut self, target: GeoPoint) -> bool {
        let decision = self.radius.adjust(self.center, target);
        match decision {
            RadiusDecision::Relocate { radius_m } => {
                info!(lat = target.lat, lng = target.lng, radius_m, "relocating center to target");
                self.center = Some(target);
                self.geolocation_denied = false;
                true
            }
            RadiusDecision::Regional { .. } => false,
        }
    }

    fn on_gps_fix(&mut self, fix: GpsFix) {
        let point = GeoPoint::new(fix.lat, fix.lng);
        if !point.is_valid() {
            return;
        }
        self.geolocation_denied = false;

        // The preferred override wins for where the map centers; the raw
        // fix still drives the near-home check below.
        let effective = self.preferred.unwrap_or(point);
        self.home.get_or_insert(effective);

        if self.center.is_none() {
            self.center = Some(effective);
            self.start_fetch();
            return;
        }
        if let Some(home) = self.home {
            self.radius.reset_if_near_home(point, home);
        }
    }

    fn start_fetch(&mut self) {
        let Some(center) = self.center else {
            return;
        };
        self.generation += 1;
        self.loading.on_fetch_started();

        let query = ProviderQuery {
            center,
            radius_m: self.radius.radius_m(),
            time_frame: self.time_frame,
            generation: self.generation,
        };
        debug!(
            generation = query.generation,
            radius_m = query.radius_m,
            "dispatching fetch"
        );

        let provider = Arc::clone(&self.provider);
        let tx = self.self_tx.clone();
        tokio::spawn(async move {
            let result = provider.fetch(query).await.map_err(|e| e.to_string());
            // Send failure means the controller is gone; nothing to do.
            let _ = tx
                .send(ControllerEvent::FetchCompleted {
                    generation: query.generation,
                    result,
                })
                .await;
        });
        self.publish();
    }

    /// Derive the render frame from current state and push it out.
    fn publish(&mut self) {
        let items = self.partitions.render_set(self.time_frame);
        let (clusters, _stats) =
            cluster::build(items, self.zoom, &self.filters, self.tuning.filter_mode);
        let frame = RenderFrame {
            clusters,
            loading: self.loading.state(),
            displayed: self.displayed.clone(),
            // Latched, not edge-triggered: the watch channel keeps only
            // the latest frame, so the flag stays up until the host
            // acknowledges with `AutoFitHandled`.
            request_auto_fit: self.pending_auto_fit,
            geolocation_denied: self.geolocation_denied,
            generation: self.generation,
        };
        let _ = self.frames_tx.send(frame);
    }

    fn teardown(&mut self) {
        self.debouncer.cancel();
        self.loading.cancel();
        self.nav.cancel();
        info!("controller torn down");
    }
}
