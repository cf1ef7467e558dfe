//! Attention sequencing for the fit presentation
//!
//! The Sequencer is a pure state machine: it never sleeps and never spawns.
//! Every timed transition is handed back to the caller as a `ScheduledStep`
//! carrying a `Ticket`. Only the ticket of the single outstanding step is
//! honored, so a timer that fires after a state change is dropped instead of
//! resurrecting an old tour step.
//!
//! States:
//! - `Idle` - before the session starts (waiting out the initial delay)
//! - `AutoTouring` - zooming through the tight zones, one at a time
//! - `ManualFocus` - hover override, supersedes the rest of the tour
//! - `Settled` - full-body view, nothing highlighted

mod transitions;

use crate::domain::report::FitReport;
use crate::domain::types::{ViewBox, Zone};
use serde::{Serialize, Serializer};
use smallvec::SmallVec;
use std::time::Duration;

/// Timing table for the sequencer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SequencerTimings {
    /// Pause before the tour starts so the viewer can orient
    pub initial_delay: Duration,
    /// Viewport animation to a toured zone
    pub tour_zoom: Duration,
    /// Hold on a toured zone after the zoom completes
    pub tour_hold: Duration,
    /// Viewport animation back to the full body after the tour
    pub settle: Duration,
    /// Viewport animation for hover focus and release
    pub manual_zoom: Duration,
}

impl Default for SequencerTimings {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(500),
            tour_zoom: Duration::from_millis(1000),
            tour_hold: Duration::from_millis(1200),
            settle: Duration::from_millis(1000),
            manual_zoom: Duration::from_millis(600),
        }
    }
}

impl SequencerTimings {
    /// Time from session start until the full-body view is reached again,
    /// for an uninterrupted tour over `zones` zones
    pub fn tour_duration(&self, zones: usize) -> Duration {
        self.initial_delay + (self.tour_zoom + self.tour_hold) * zones as u32 + self.settle
    }
}

/// Coarse presentation phase reported alongside the focus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FocusPhase {
    Idle,
    Touring,
    Manual,
    Settled,
}

impl FocusPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            FocusPhase::Idle => "idle",
            FocusPhase::Touring => "touring",
            FocusPhase::Manual => "manual",
            FocusPhase::Settled => "settled",
        }
    }
}

/// Current focus: highlighted zone plus the viewport the surface should
/// animate to over `transition`
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FocusState {
    pub zone: Option<Zone>,
    pub viewport: ViewBox,
    #[serde(rename = "transition_ms", serialize_with = "serialize_millis")]
    pub transition: Duration,
    pub phase: FocusPhase,
}

impl FocusState {
    /// Full body, no animation
    pub const INITIAL: FocusState = FocusState {
        zone: None,
        viewport: ViewBox::FULL_BODY,
        transition: Duration::ZERO,
        phase: FocusPhase::Idle,
    };

    pub fn new(zone: Option<Zone>, transition: Duration, phase: FocusPhase) -> Self {
        Self { zone, viewport: ViewBox::for_focus(zone), transition, phase }
    }
}

impl Default for FocusState {
    fn default() -> Self {
        Self::INITIAL
    }
}

fn serialize_millis<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u64(d.as_millis() as u64)
}

/// Sub-phase of a toured zone
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TourPhase {
    Zooming,
    Holding,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SequencerState {
    Idle,
    AutoTouring { index: usize, phase: TourPhase },
    ManualFocus(Zone),
    Settled,
}

impl SequencerState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SequencerState::Idle => "idle",
            SequencerState::AutoTouring { .. } => "auto_touring",
            SequencerState::ManualFocus(_) => "manual_focus",
            SequencerState::Settled => "settled",
        }
    }
}

/// Cancellation token of a scheduled step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ticket(u64);

impl std::fmt::Display for Ticket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What a scheduled step does when it fires
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Initial delay elapsed
    BeginTour,
    /// Zoom animation for the current tour zone completed
    ZoomComplete,
    /// Hold on the current tour zone elapsed
    HoldComplete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduledStep {
    pub ticket: Ticket,
    pub step: Step,
    pub delay: Duration,
}

/// What happened in a transition, for logging and metrics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionKind {
    Started,
    TourStarted,
    TourSkipped,
    HoldStarted,
    TourAdvanced,
    TourSettled,
    ManualFocus,
    ManualReleased,
    Reset,
    TornDown,
}

/// Effects of one transition.
///
/// The caller must drop the timer for `cancelled` (if any) before arming
/// `scheduled`, and forward `focus` to the rendering surface.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Transition {
    pub kind: Option<TransitionKind>,
    pub cancelled: Option<Ticket>,
    pub scheduled: Option<ScheduledStep>,
    pub focus: Option<FocusState>,
}

impl Transition {
    pub fn is_noop(&self) -> bool {
        self.kind.is_none()
    }
}

/// Attention sequencer for one presentation session
#[derive(Debug)]
pub struct Sequencer {
    state: SequencerState,
    /// Tight zones in enumeration order
    queue: SmallVec<[Zone; 4]>,
    timings: SequencerTimings,
    focus: FocusState,
    /// The single outstanding step, if any
    pending: Option<ScheduledStep>,
    next_ticket: u64,
}

impl Sequencer {
    pub fn new(report: &FitReport, timings: SequencerTimings) -> Self {
        Self::with_queue(report.tight_zones(), timings)
    }

    /// Create a sequencer over an explicit tour queue
    pub fn with_queue(queue: impl IntoIterator<Item = Zone>, timings: SequencerTimings) -> Self {
        Self {
            state: SequencerState::Idle,
            queue: queue.into_iter().collect(),
            timings,
            focus: FocusState::INITIAL,
            pending: None,
            next_ticket: 0,
        }
    }

    pub fn state(&self) -> &SequencerState {
        &self.state
    }

    pub fn focus(&self) -> FocusState {
        self.focus
    }

    pub fn current_zone(&self) -> Option<Zone> {
        self.focus.zone
    }

    pub fn pending(&self) -> Option<ScheduledStep> {
        self.pending
    }

    pub fn queue(&self) -> &[Zone] {
        &self.queue
    }

    pub fn timings(&self) -> &SequencerTimings {
        &self.timings
    }
}
