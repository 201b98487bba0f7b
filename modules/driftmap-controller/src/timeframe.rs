//! Time-frame partitioning of a fetched snapshot.
//!
//! One fetch serves every time frame: the snapshot is split once into
//! overlapping Now / Today / Tomorrow-or-weekend / Week buckets and the
//! active frame picks its bucket locally, so switching frames never
//! refetches. Locations carry no start time and are always-current in
//! every bucket.

use chrono::{DateTime, Datelike, Days, Duration, NaiveTime, Utc, Weekday};

use driftmap_common::{MapItem, TimeFrame};

/// Events starting within this horizon count as happening "now".
const NOW_HORIZON_HOURS: i64 = 3;

#[derive(Debug, Clone, Default)]
pub struct Partitions {
    pub now: Vec<MapItem>,
    pub today: Vec<MapItem>,
    pub tomorrow_or_weekend: Vec<MapItem>,
    pub week: Vec<MapItem>,
    /// Everything, for the all-partitions-empty fallback.
    pub all: Vec<MapItem>,
}

/// Bucket sizes, used by the one-shot auto-fit decision.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PartitionCounts {
    pub now: usize,
    pub today: usize,
    pub tomorrow_or_weekend: usize,
    pub week: usize,
}

impl Partitions {
    pub fn counts(&self) -> PartitionCounts {
        PartitionCounts {
            now: self.now.len(),
            today: self.today.len(),
            tomorrow_or_weekend: self.tomorrow_or_weekend.len(),
            week: self.week.len(),
        }
    }

    fn bucket(&self, frame: TimeFrame) -> &[MapItem] {
        match frame {
            TimeFrame::Today => &self.today,
            TimeFrame::Weekend => &self.tomorrow_or_weekend,
            TimeFrame::Week => &self.week,
        }
    }

    /// The items to cluster and render for the active frame.
    ///
    /// Fallback-rendering policy: when every partition came out empty but
    /// raw items exist (all-day dateless data, clock skew), render the
    /// whole snapshot rather than an empty map.
    pub fn render_set(&self, frame: TimeFrame) -> &[MapItem] {
        let all_empty = self.now.is_empty()
            && self.today.is_empty()
            && self.tomorrow_or_weekend.is_empty()
            && self.week.is_empty();
        if all_empty && !self.all.is_empty() {
            return &self.all;
        }
        self.bucket(frame)
    }
}

/// Split `items` into time buckets relative to `now`.
pub fn partition(items: &[MapItem], now: DateTime<Utc>) -> Partitions {
    let next_midnight = (now.date_naive() + Days::new(1))
        .and_time(NaiveTime::MIN)
        .and_utc();
    let tomorrow = now.date_naive() + Days::new(1);
    let week_horizon = now + Duration::days(7);
    let now_horizon = now + Duration::hours(NOW_HORIZON_HOURS);

    let mut parts = Partitions::default();

    for item in items {
        parts.all.push(item.clone());

        let Some(start) = item.start_time else {
            // Locations and undated items are current in every bucket.
            parts.now.push(item.clone());
            parts.today.push(item.clone());
            parts.tomorrow_or_weekend.push(item.clone());
            parts.week.push(item.clone());
            continue;
        };

        let ended = item.end_time.map(|end| end < now).unwrap_or(false);
        if ended {
            continue;
        }

        let is_now = start <= now_horizon;
        if is_now {
            parts.now.push(item.clone());
        }
        // "Now" spills into today even across midnight.
        if is_now || start < next_midnight {
            parts.today.push(item.clone());
        }
        if start <= week_horizon
            && (start.date_naive() == tomorrow
                || matches!(start.weekday(), Weekday::Sat | Weekday::Sun))
        {
            parts.tomorrow_or_weekend.push(item.clone());
        }
        if start <= week_horizon {
            parts.week.push(item.clone());
        }
    }

    parts
}

/// One-shot auto-fit: fire when the first snapshot with anything to show
/// arrives, never again. Pure function of the partition sizes plus the
/// controller-owned `already_fit` flag.
pub fn should_auto_fit(counts: PartitionCounts, already_fit: bool) -> bool {
    !already_fit
        && (counts.now > 0 || counts.today > 0 || counts.tomorrow_or_weekend > 0 || counts.week > 0)
}
