//! Presentation session driver
//!
//! Owns one Sequencer and runs it on the tokio clock. The single pending
//! step lives in `pending`; replacing or clearing that field is how a
//! scheduled step gets cancelled. Surface events win ties against a timer
//! that comes due in the same poll, so a hover is always honored before the
//! step it supersedes can fire.

use crate::domain::report::{FitReport, ZoneOutcome};
use crate::infra::metrics::Metrics;
use crate::io::surface::{FocusEvent, FocusSender, SessionHandle, SurfaceEvent};
use crate::services::sequencer::{
    FocusState, Sequencer, SequencerTimings, Ticket, Transition, TransitionKind,
};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::info;
use uuid::Uuid;

/// Buffer for surface events (hover bursts are short)
const SURFACE_EVENT_BUFFER: usize = 32;

/// Generate a new UUIDv7 (time-sortable) session id
fn new_session_id() -> String {
    Uuid::now_v7().to_string()
}

#[derive(Debug, Clone, Copy)]
struct PendingStep {
    ticket: Ticket,
    deadline: Instant,
}

/// Resolve when the pending step comes due
async fn step_due(pending: Option<PendingStep>) -> Ticket {
    match pending {
        Some(p) => {
            tokio::time::sleep_until(p.deadline).await;
            p.ticket
        }
        None => std::future::pending().await,
    }
}

/// One presentation session: a verdict set and its attention tour
pub struct FitSession {
    id: String,
    report: FitReport,
    sequencer: Sequencer,
    pending: Option<PendingStep>,
    started_at: Instant,
    focus_tx: FocusSender,
    metrics: Arc<Metrics>,
}

impl FitSession {
    pub fn new(
        report: FitReport,
        timings: SequencerTimings,
        focus_tx: FocusSender,
        metrics: Arc<Metrics>,
    ) -> Self {
        let sequencer = Sequencer::new(&report, timings);
        Self {
            id: new_session_id(),
            report,
            sequencer,
            pending: None,
            started_at: Instant::now(),
            focus_tx,
            metrics,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn focus(&self) -> FocusState {
        self.sequencer.focus()
    }

    /// Run until the surface closes the session or drops its handle.
    ///
    /// Returns the last focus state.
    pub async fn run(mut self, mut events: mpsc::Receiver<SurfaceEvent>) -> FocusState {
        self.begin();

        loop {
            let pending = self.pending;
            tokio::select! {
                biased;

                event = events.recv() => {
                    match event {
                        Some(SurfaceEvent::Close) | None => break,
                        Some(event) => self.handle_event(event),
                    }
                }
                ticket = step_due(pending), if pending.is_some() => {
                    self.handle_step(ticket);
                }
            }
        }

        let transition = self.sequencer.teardown();
        self.apply(transition);
        info!(session_id = %self.id, state = %self.sequencer.state().as_str(), "session_closed");
        self.sequencer.focus()
    }

    /// Start (or restart) the current verdict set
    fn begin(&mut self) {
        self.started_at = Instant::now();
        self.metrics.record_session_started();
        for zone in &self.report.zones {
            match zone.outcome {
                ZoneOutcome::Verdict(v) => self.metrics.record_verdict(v.status),
                ZoneOutcome::Fault(_) => self.metrics.record_catalog_fault(),
            }
        }

        info!(
            session_id = %self.id,
            sku = %self.report.sku,
            tight = ?self.sequencer.queue(),
            "session_started"
        );

        let transition = self.sequencer.start();
        self.apply(transition);
    }

    fn handle_event(&mut self, event: SurfaceEvent) {
        let process_start = std::time::Instant::now();

        match event {
            SurfaceEvent::HoverEnter(zone) => {
                let transition = self.sequencer.hover_enter(zone);
                self.apply(transition);
            }
            SurfaceEvent::HoverLeave => {
                let transition = self.sequencer.hover_leave();
                self.apply(transition);
            }
            SurfaceEvent::Restart(report) => {
                info!(session_id = %self.id, sku = %report.sku, "session_restart");
                self.id = new_session_id();
                self.started_at = Instant::now();
                let transition = self.sequencer.reset(&report);
                self.apply(transition);
                self.report = *report;
                self.begin();
            }
            SurfaceEvent::Close => {}
        }

        self.metrics.record_event_processed(process_start.elapsed().as_micros() as u64);
    }

    fn handle_step(&mut self, ticket: Ticket) {
        match self.sequencer.fire(ticket) {
            Some(transition) => self.apply(transition),
            None => {
                // superseded while we were waiting on it
                self.metrics.record_stale_timer();
                if self.pending.is_some_and(|p| p.ticket == ticket) {
                    self.pending = None;
                }
            }
        }
    }

    /// Apply a transition's effects: cancel, re-arm, publish
    fn apply(&mut self, transition: Transition) {
        if transition.cancelled.is_some() {
            self.metrics.record_timer_cancelled();
        }

        match (transition.scheduled, self.sequencer.pending()) {
            (Some(step), _) => {
                self.pending =
                    Some(PendingStep { ticket: step.ticket, deadline: Instant::now() + step.delay });
            }
            (None, None) => self.pending = None,
            (None, Some(_)) => {}
        }

        match transition.kind {
            Some(TransitionKind::TourStarted) => {
                self.metrics.record_tour_started();
                self.metrics.record_tour_zone_visited();
            }
            Some(TransitionKind::TourAdvanced) => self.metrics.record_tour_zone_visited(),
            Some(TransitionKind::TourSkipped) => self.metrics.record_tour_skipped(),
            Some(TransitionKind::TourSettled) => self.metrics.record_tour_completed(),
            Some(TransitionKind::ManualFocus) => self.metrics.record_manual_focus(),
            _ => {}
        }

        if let Some(focus) = transition.focus {
            info!(
                session_id = %self.id,
                zone = ?focus.zone,
                viewport = %focus.viewport,
                transition_ms = %focus.transition.as_millis(),
                phase = %focus.phase.as_str(),
                "focus_changed"
            );
            self.focus_tx.publish(&self.id, self.started_at.elapsed(), focus);
        }
    }
}

/// Spawn a session for `report` on the current runtime
pub fn spawn_session(report: FitReport, timings: SequencerTimings, metrics: Arc<Metrics>) -> SessionHandle {
    let (focus_tx, focus_rx) = FocusSender::new(metrics.clone());
    spawn_with(report, timings, metrics, focus_tx, focus_rx)
}

/// Spawn a session that also keeps an ordered focus log
pub fn spawn_session_with_log(
    report: FitReport,
    timings: SequencerTimings,
    metrics: Arc<Metrics>,
    log_capacity: usize,
) -> (SessionHandle, mpsc::Receiver<FocusEvent>) {
    let (mut focus_tx, focus_rx) = FocusSender::new(metrics.clone());
    let log_rx = focus_tx.with_log(log_capacity);
    (spawn_with(report, timings, metrics, focus_tx, focus_rx), log_rx)
}

fn spawn_with(
    report: FitReport,
    timings: SequencerTimings,
    metrics: Arc<Metrics>,
    focus_tx: FocusSender,
    focus_rx: tokio::sync::watch::Receiver<FocusState>,
) -> SessionHandle {
    let (event_tx, event_rx) = mpsc::channel(SURFACE_EVENT_BUFFER);
    let session = FitSession::new(report.clone(), timings, focus_tx, metrics);
    let task = tokio::spawn(session.run(event_rx));
    SessionHandle::new(report, event_tx, focus_rx, task)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::garment::{GarmentMeasurements, GarmentRecord};
    use crate::domain::profile::{Measurements, UserProfile};
    use crate::domain::types::{FitStatus, Zone};
    use crate::services::analysis::analyze;
    use crate::services::sequencer::FocusPhase;
    use std::time::Duration;

    fn report(shoulder: f64, chest: f64, waist: f64, arm: f64) -> FitReport {
        let garment = GarmentRecord {
            sku: "knit-sweater-m".to_string(),
            name: "Premium Knit Sweater".to_string(),
            size: "M".to_string(),
            measurements: GarmentMeasurements::new(44.0, 104.0, 100.0, 65.0),
        };
        let profile = UserProfile::new(
            "u-1",
            Measurements::default()
                .with(Zone::Shoulder, shoulder)
                .with(Zone::Chest, chest)
                .with(Zone::Waist, waist)
                .with(Zone::Arm, arm),
        );
        analyze(Some(&profile), &garment)
    }

    #[tokio::test(start_paused = true)]
    async fn test_session_records_metrics() {
        let metrics = Arc::new(Metrics::new());
        let (handle, mut log) =
            spawn_session_with_log(report(48.0, 96.0, 80.0, 62.0), SequencerTimings::default(), metrics.clone(), 16);

        // zoom to shoulder, then settle
        let first = log.recv().await.unwrap();
        assert_eq!(first.focus.zone, Some(Zone::Shoulder));
        let second = log.recv().await.unwrap();
        assert_eq!(second.focus.phase, FocusPhase::Settled);

        handle.close().await.unwrap();

        assert_eq!(metrics.sessions_started(), 1);
        assert_eq!(metrics.tour_zones_visited(), 1);
        assert_eq!(metrics.verdict_count(FitStatus::Tight), 1);
        assert_eq!(metrics.verdict_count(FitStatus::Perfect), 1);
        assert_eq!(metrics.verdict_count(FitStatus::Loose), 2);
        assert_eq!(metrics.timers_cancelled(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_close_mid_tour_cancels_silently() {
        let metrics = Arc::new(Metrics::new());
        let (handle, mut log) =
            spawn_session_with_log(report(48.0, 96.0, 110.0, 62.0), SequencerTimings::default(), metrics.clone(), 16);

        let first = log.recv().await.unwrap();
        assert_eq!(first.focus.zone, Some(Zone::Shoulder));

        let last = handle.close().await.unwrap();
        assert_eq!(last.zone, Some(Zone::Shoulder));
        assert_eq!(metrics.timers_cancelled(), 1);

        // nothing more is published once the session is gone
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert!(log.recv().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_handle_ends_session() {
        let metrics = Arc::new(Metrics::new());
        let handle = spawn_session(report(48.0, 96.0, 80.0, 62.0), SequencerTimings::default(), metrics.clone());
        let mut focus = handle.subscribe();
        drop(handle);

        // the watch sender goes away with the session task
        while focus.changed().await.is_ok() {}
        assert_eq!(metrics.sessions_started(), 1);
    }
}
