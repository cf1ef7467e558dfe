//! Rendering surface interface
//!
//! The surface sees three things: the verdict set (`FitReport`), the current
//! focus (a `watch` channel, latest value wins), and two hover entry points.
//! An optional bounded focus log carries every focus change in order, for
//! surfaces that animate each step rather than jumping to the latest.

use crate::domain::report::FitReport;
use crate::domain::types::Zone;
use crate::infra::metrics::Metrics;
use crate::services::sequencer::FocusState;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Events the surface sends into a running session
#[derive(Debug)]
pub enum SurfaceEvent {
    HoverEnter(Zone),
    HoverLeave,
    /// New garment or fresh mount
    Restart(Box<FitReport>),
    Close,
}

/// One entry of the focus log
#[derive(Debug, Clone, Serialize)]
pub struct FocusEvent {
    pub session_id: String,
    /// Time since the session (or its last restart) began
    #[serde(rename = "elapsed_ms", serialize_with = "serialize_millis")]
    pub elapsed: Duration,
    pub focus: FocusState,
}

fn serialize_millis<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u64(d.as_millis() as u64)
}

/// Publishing side of the focus stream, owned by the session
pub struct FocusSender {
    tx: watch::Sender<FocusState>,
    log: Option<mpsc::Sender<FocusEvent>>,
    metrics: Arc<Metrics>,
}

impl FocusSender {
    pub fn new(metrics: Arc<Metrics>) -> (Self, watch::Receiver<FocusState>) {
        let (tx, rx) = watch::channel(FocusState::INITIAL);
        (Self { tx, log: None, metrics }, rx)
    }

    /// Attach a bounded ordered log of focus changes
    pub fn with_log(&mut self, capacity: usize) -> mpsc::Receiver<FocusEvent> {
        let (log_tx, log_rx) = mpsc::channel(capacity.max(1));
        self.log = Some(log_tx);
        log_rx
    }

    pub fn publish(&self, session_id: &str, elapsed: Duration, focus: FocusState) {
        self.tx.send_replace(focus);
        self.metrics.record_focus_published();

        let Some(log) = &self.log else {
            return;
        };

        let event = FocusEvent { session_id: session_id.to_string(), elapsed, focus };
        match log.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                self.metrics.record_focus_log_dropped();
                warn!(session_id = %session_id, "focus_log_full_dropped");
            }
            Err(TrySendError::Closed(_)) => {
                debug!(session_id = %session_id, "focus_log_closed");
            }
        }
    }
}

/// Surface-side handle to a running presentation session
pub struct SessionHandle {
    report: FitReport,
    events: mpsc::Sender<SurfaceEvent>,
    focus: watch::Receiver<FocusState>,
    task: JoinHandle<FocusState>,
}

impl SessionHandle {
    pub fn new(
        report: FitReport,
        events: mpsc::Sender<SurfaceEvent>,
        focus: watch::Receiver<FocusState>,
        task: JoinHandle<FocusState>,
    ) -> Self {
        Self { report, events, focus, task }
    }

    /// Current verdict set
    pub fn report(&self) -> &FitReport {
        &self.report
    }

    /// Current focus state
    pub fn focus(&self) -> FocusState {
        *self.focus.borrow()
    }

    /// Independent receiver for the focus stream
    pub fn subscribe(&self) -> watch::Receiver<FocusState> {
        self.focus.clone()
    }

    /// Wait for the next focus change; false once the session has ended
    pub async fn changed(&mut self) -> bool {
        self.focus.changed().await.is_ok()
    }

    pub async fn on_zone_hover_enter(&self, zone: Zone) {
        self.send(SurfaceEvent::HoverEnter(zone)).await;
    }

    pub async fn on_zone_hover_leave(&self) {
        self.send(SurfaceEvent::HoverLeave).await;
    }

    /// Discard the running tour and start over with a new verdict set
    pub async fn restart(&mut self, report: FitReport) {
        self.report = report.clone();
        self.send(SurfaceEvent::Restart(Box::new(report))).await;
    }

    /// End the session and wait for its final focus state
    pub async fn close(self) -> Option<FocusState> {
        self.send(SurfaceEvent::Close).await;
        self.task.await.ok()
    }

    async fn send(&self, event: SurfaceEvent) {
        if self.events.send(event).await.is_err() {
            debug!("surface_event_after_session_end");
        }
    }
}
