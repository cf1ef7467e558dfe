//! Lock-free metrics collection and periodic reporting
//!
//! Uses atomics for hot-path operations to avoid mutex contention.
//! All counter updates are lock-free; reporting is the only operation
//! that needs synchronization (via atomic swap).
//!
//! NOTE: All atomics use Relaxed ordering intentionally. These are statistical
//! counters only. Do NOT use these atomics for coordination or logic decisions.

use crate::domain::types::FitStatus;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing::info;

/// Surface-event handling latency buckets (microseconds), doubling from 10us.
/// The last bucket catches everything above the final bound.
const BUCKET_BOUNDS: [u64; 10] = [10, 20, 40, 80, 160, 320, 640, 1280, 2560, 5120];
const NUM_BUCKETS: usize = BUCKET_BOUNDS.len() + 1;

#[inline]
fn bucket_index(latency_us: u64) -> usize {
    BUCKET_BOUNDS.partition_point(|&bound| bound < latency_us)
}

/// Upper bound reported for bucket `i`; the overflow bucket reports twice the last bound
#[inline]
fn bucket_upper_bound(i: usize) -> u64 {
    BUCKET_BOUNDS.get(i).copied().unwrap_or(BUCKET_BOUNDS[BUCKET_BOUNDS.len() - 1] * 2)
}

#[inline]
fn update_atomic_max(atomic_max: &AtomicU64, new_value: u64) {
    let _ = atomic_max.fetch_update(Ordering::Relaxed, Ordering::Relaxed, |current| {
        (new_value > current).then_some(new_value)
    });
}

/// Drain the window: zero every bucket and return what it held
#[inline]
fn swap_buckets(buckets: &[AtomicU64; NUM_BUCKETS]) -> [u64; NUM_BUCKETS] {
    std::array::from_fn(|i| buckets[i].swap(0, Ordering::Relaxed))
}

/// Upper bound of the bucket containing `percentile` of the samples
fn percentile_from_buckets(buckets: &[u64; NUM_BUCKETS], percentile: f64) -> u64 {
    let total: u64 = buckets.iter().sum();
    if total == 0 {
        return 0;
    }

    let target = (total as f64 * percentile).ceil() as u64;
    let mut cumulative = 0u64;
    for (i, &count) in buckets.iter().enumerate() {
        cumulative += count;
        if cumulative >= target {
            return bucket_upper_bound(i);
        }
    }
    bucket_upper_bound(NUM_BUCKETS - 1)
}

#[inline]
fn status_index(status: FitStatus) -> usize {
    match status {
        FitStatus::MissingData => 0,
        FitStatus::Tight => 1,
        FitStatus::Perfect => 2,
        FitStatus::Loose => 3,
    }
}

/// Lock-free metrics collector
///
/// All recording operations are lock-free using atomics.
/// The `report()` method atomically swaps the windowed counters.
pub struct Metrics {
    /// Presentation sessions started, including restarts (monotonic)
    sessions_started: AtomicU64,
    /// Tours that zoomed into at least one zone (monotonic)
    tours_started: AtomicU64,
    /// Tours skipped because nothing was tight (monotonic)
    tours_skipped: AtomicU64,
    /// Tours that ran to the full-body view without interruption (monotonic)
    tours_completed: AtomicU64,
    /// Zones zoomed into by the automatic tour (monotonic)
    tour_zones_visited: AtomicU64,
    /// Hover focus changes (monotonic)
    manual_focus_total: AtomicU64,
    /// Scheduled steps dropped before they fired (monotonic)
    timers_cancelled: AtomicU64,
    /// Timer firings whose ticket was no longer current (monotonic)
    stale_timers: AtomicU64,
    /// Focus updates published to the surface (monotonic)
    focus_published: AtomicU64,
    /// Focus log entries dropped because the log was full (monotonic)
    focus_log_dropped: AtomicU64,
    /// Verdicts by status: missing, tight, perfect, loose (monotonic)
    verdicts: [AtomicU64; 4],
    /// Catalog data-integrity faults (monotonic)
    catalog_faults: AtomicU64,
    /// Profile lookups that failed in the provider (monotonic)
    profile_lookup_failures: AtomicU64,
    /// Surface events since last report (reset on report)
    events_since_report: AtomicU64,
    /// Surface event handling latency histogram (reset on report)
    latency_buckets: [AtomicU64; NUM_BUCKETS],
    /// Sum of latencies in microseconds (reset on report)
    latency_sum_us: AtomicU64,
    /// Max latency in microseconds (reset on report)
    latency_max_us: AtomicU64,
    /// Last report time (only accessed from reporter)
    last_report_time: parking_lot::Mutex<Instant>,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            sessions_started: AtomicU64::new(0),
            tours_started: AtomicU64::new(0),
            tours_skipped: AtomicU64::new(0),
            tours_completed: AtomicU64::new(0),
            tour_zones_visited: AtomicU64::new(0),
            manual_focus_total: AtomicU64::new(0),
            timers_cancelled: AtomicU64::new(0),
            stale_timers: AtomicU64::new(0),
            focus_published: AtomicU64::new(0),
            focus_log_dropped: AtomicU64::new(0),
            verdicts: std::array::from_fn(|_| AtomicU64::new(0)),
            catalog_faults: AtomicU64::new(0),
            profile_lookup_failures: AtomicU64::new(0),
            events_since_report: AtomicU64::new(0),
            latency_buckets: std::array::from_fn(|_| AtomicU64::new(0)),
            latency_sum_us: AtomicU64::new(0),
            latency_max_us: AtomicU64::new(0),
            last_report_time: parking_lot::Mutex::new(Instant::now()),
        }
    }

    #[inline]
    pub fn record_session_started(&self) {
        self.sessions_started.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_tour_started(&self) {
        self.tours_started.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_tour_skipped(&self) {
        self.tours_skipped.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_tour_completed(&self) {
        self.tours_completed.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_tour_zone_visited(&self) {
        self.tour_zones_visited.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_manual_focus(&self) {
        self.manual_focus_total.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_timer_cancelled(&self) {
        self.timers_cancelled.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_stale_timer(&self) {
        self.stale_timers.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_focus_published(&self) {
        self.focus_published.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_focus_log_dropped(&self) {
        self.focus_log_dropped.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_verdict(&self, status: FitStatus) {
        self.verdicts[status_index(status)].fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_catalog_fault(&self) {
        self.catalog_faults.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_profile_lookup_failure(&self) {
        self.profile_lookup_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Record one handled surface event (lock-free)
    #[inline]
    pub fn record_event_processed(&self, latency_us: u64) {
        self.events_since_report.fetch_add(1, Ordering::Relaxed);
        self.latency_sum_us.fetch_add(latency_us, Ordering::Relaxed);
        update_atomic_max(&self.latency_max_us, latency_us);
        self.latency_buckets[bucket_index(latency_us)].fetch_add(1, Ordering::Relaxed);
    }

    pub fn sessions_started(&self) -> u64 {
        self.sessions_started.load(Ordering::Relaxed)
    }

    pub fn timers_cancelled(&self) -> u64 {
        self.timers_cancelled.load(Ordering::Relaxed)
    }

    pub fn stale_timers(&self) -> u64 {
        self.stale_timers.load(Ordering::Relaxed)
    }

    pub fn manual_focus_total(&self) -> u64 {
        self.manual_focus_total.load(Ordering::Relaxed)
    }

    pub fn tour_zones_visited(&self) -> u64 {
        self.tour_zones_visited.load(Ordering::Relaxed)
    }

    pub fn verdict_count(&self, status: FitStatus) -> u64 {
        self.verdicts[status_index(status)].load(Ordering::Relaxed)
    }

    /// Snapshot counters; windowed latency stats are reset
    pub fn report(&self) -> MetricsSummary {
        let events = self.events_since_report.swap(0, Ordering::Relaxed);
        let latency_sum = self.latency_sum_us.swap(0, Ordering::Relaxed);
        let latency_max = self.latency_max_us.swap(0, Ordering::Relaxed);
        let lat_buckets = swap_buckets(&self.latency_buckets);

        let elapsed = {
            let mut last = self.last_report_time.lock();
            let elapsed = last.elapsed();
            *last = Instant::now();
            elapsed
        };

        let events_per_sec = if elapsed.as_secs_f64() > 0.0 {
            events as f64 / elapsed.as_secs_f64()
        } else {
            0.0
        };

        MetricsSummary {
            sessions_started: self.sessions_started.load(Ordering::Relaxed),
            tours_started: self.tours_started.load(Ordering::Relaxed),
            tours_skipped: self.tours_skipped.load(Ordering::Relaxed),
            tours_completed: self.tours_completed.load(Ordering::Relaxed),
            tour_zones_visited: self.tour_zones_visited.load(Ordering::Relaxed),
            manual_focus_total: self.manual_focus_total.load(Ordering::Relaxed),
            timers_cancelled: self.timers_cancelled.load(Ordering::Relaxed),
            stale_timers: self.stale_timers.load(Ordering::Relaxed),
            focus_published: self.focus_published.load(Ordering::Relaxed),
            focus_log_dropped: self.focus_log_dropped.load(Ordering::Relaxed),
            verdicts_missing: self.verdict_count(FitStatus::MissingData),
            verdicts_tight: self.verdict_count(FitStatus::Tight),
            verdicts_perfect: self.verdict_count(FitStatus::Perfect),
            verdicts_loose: self.verdict_count(FitStatus::Loose),
            catalog_faults: self.catalog_faults.load(Ordering::Relaxed),
            profile_lookup_failures: self.profile_lookup_failures.load(Ordering::Relaxed),
            events,
            events_per_sec,
            avg_latency_us: if events > 0 { latency_sum / events } else { 0 },
            max_latency_us: latency_max,
            lat_p50_us: percentile_from_buckets(&lat_buckets, 0.50),
            lat_p99_us: percentile_from_buckets(&lat_buckets, 0.99),
            lat_buckets,
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug)]
pub struct MetricsSummary {
    pub sessions_started: u64,
    pub tours_started: u64,
    pub tours_skipped: u64,
    pub tours_completed: u64,
    pub tour_zones_visited: u64,
    pub manual_focus_total: u64,
    pub timers_cancelled: u64,
    pub stale_timers: u64,
    pub focus_published: u64,
    pub focus_log_dropped: u64,
    pub verdicts_missing: u64,
    pub verdicts_tight: u64,
    pub verdicts_perfect: u64,
    pub verdicts_loose: u64,
    pub catalog_faults: u64,
    pub profile_lookup_failures: u64,
    /// Surface events since the previous report
    pub events: u64,
    pub events_per_sec: f64,
    pub avg_latency_us: u64,
    pub max_latency_us: u64,
    /// Surface event latency histogram buckets (see `BUCKET_BOUNDS`)
    pub lat_buckets: [u64; NUM_BUCKETS],
    pub lat_p50_us: u64,
    pub lat_p99_us: u64,
}

impl MetricsSummary {
    pub fn log(&self) {
        info!(
            sessions = %self.sessions_started,
            tours = %self.tours_started,
            tours_skipped = %self.tours_skipped,
            tours_completed = %self.tours_completed,
            zones_toured = %self.tour_zones_visited,
            manual_focus = %self.manual_focus_total,
            timers_cancelled = %self.timers_cancelled,
            stale_timers = %self.stale_timers,
            tight = %self.verdicts_tight,
            catalog_faults = %self.catalog_faults,
            events_per_sec = format!("{:.1}", self.events_per_sec),
            p99_us = %self.lat_p99_us,
            "metrics"
        );
    }
}
