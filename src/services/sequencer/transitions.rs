//! Transition table for the Sequencer
//!
//! Every entry point funnels through `cancel_pending` before it schedules
//! anything, so at most one step is outstanding per session.

use super::{
    FocusPhase, FocusState, ScheduledStep, Sequencer, SequencerState, Step, Ticket, TourPhase,
    Transition, TransitionKind,
};
use crate::domain::report::FitReport;
use crate::domain::types::Zone;
use std::time::Duration;
use tracing::{debug, info};

impl Sequencer {
    /// Begin the session: arm the initial delay.
    ///
    /// Only valid from a fresh `Idle`; anything else is a no-op.
    pub fn start(&mut self) -> Transition {
        if self.state != SequencerState::Idle || self.pending.is_some() {
            debug!(state = %self.state.as_str(), "start_ignored");
            return Transition::default();
        }

        let scheduled = self.schedule(Step::BeginTour, self.timings.initial_delay);
        info!(
            queue = ?self.queue.as_slice(),
            initial_delay_ms = %self.timings.initial_delay.as_millis(),
            "sequencer_started"
        );

        Transition {
            kind: Some(TransitionKind::Started),
            scheduled: Some(scheduled),
            ..Transition::default()
        }
    }

    /// A scheduled step fired.
    ///
    /// Returns `None` when `ticket` is not the outstanding step (cancelled
    /// or superseded); the caller should drop it.
    pub fn fire(&mut self, ticket: Ticket) -> Option<Transition> {
        let step = match self.pending {
            Some(p) if p.ticket == ticket => p.step,
            _ => {
                debug!(ticket = %ticket, state = %self.state.as_str(), "stale_timer_ignored");
                return None;
            }
        };
        self.pending = None;

        let transition = match (step, self.state.clone()) {
            (Step::BeginTour, SequencerState::Idle) => self.begin_tour(),
            (Step::ZoomComplete, SequencerState::AutoTouring { index, phase: TourPhase::Zooming }) => {
                self.state = SequencerState::AutoTouring { index, phase: TourPhase::Holding };
                let scheduled = self.schedule(Step::HoldComplete, self.timings.tour_hold);
                debug!(zone = %self.queue[index], "tour_hold_started");
                Transition {
                    kind: Some(TransitionKind::HoldStarted),
                    scheduled: Some(scheduled),
                    ..Transition::default()
                }
            }
            (Step::HoldComplete, SequencerState::AutoTouring { index, phase: TourPhase::Holding }) => {
                if index + 1 < self.queue.len() {
                    self.visit(index + 1, TransitionKind::TourAdvanced)
                } else {
                    self.state = SequencerState::Settled;
                    let focus = self.set_focus(None, self.timings.settle, FocusPhase::Settled);
                    info!(toured = %self.queue.len(), "tour_settled");
                    Transition {
                        kind: Some(TransitionKind::TourSettled),
                        focus: Some(focus),
                        ..Transition::default()
                    }
                }
            }
            (step, state) => {
                debug!(step = ?step, state = %state.as_str(), "timer_step_out_of_state");
                Transition::default()
            }
        };

        Some(transition)
    }

    /// Hover entered a zone's control.
    ///
    /// Honored from any state. Cancels whatever step was pending; the
    /// automatic tour does not resume afterwards.
    pub fn hover_enter(&mut self, zone: Zone) -> Transition {
        if self.state == SequencerState::ManualFocus(zone) {
            debug!(zone = %zone, "hover_noop");
            return Transition::default();
        }

        if let SequencerState::AutoTouring { index, .. } = self.state {
            info!(
                zone = %zone,
                touring = %self.queue[index],
                remaining = %(self.queue.len() - index - 1),
                "tour_interrupted"
            );
        }

        let cancelled = self.cancel_pending();
        self.state = SequencerState::ManualFocus(zone);
        let focus = self.set_focus(Some(zone), self.timings.manual_zoom, FocusPhase::Manual);
        info!(zone = %zone, "manual_focus");

        Transition {
            kind: Some(TransitionKind::ManualFocus),
            cancelled,
            focus: Some(focus),
            ..Transition::default()
        }
    }

    /// Hover left the focused zone's control. Only meaningful in `ManualFocus`.
    pub fn hover_leave(&mut self) -> Transition {
        let SequencerState::ManualFocus(zone) = self.state else {
            debug!(state = %self.state.as_str(), "hover_leave_ignored");
            return Transition::default();
        };

        self.state = SequencerState::Settled;
        let focus = self.set_focus(None, self.timings.manual_zoom, FocusPhase::Settled);
        info!(zone = %zone, "manual_focus_released");

        Transition {
            kind: Some(TransitionKind::ManualReleased),
            focus: Some(focus),
            ..Transition::default()
        }
    }

    /// Start over for a new garment or a fresh mount: back to `Idle`
    /// with a new tour queue. Call `start` afterwards.
    pub fn reset(&mut self, report: &FitReport) -> Transition {
        let cancelled = self.cancel_pending();
        self.queue = report.tight_zones();
        self.state = SequencerState::Idle;
        self.focus = FocusState::INITIAL;
        info!(sku = %report.sku, queue = ?self.queue.as_slice(), "sequencer_reset");

        Transition {
            kind: Some(TransitionKind::Reset),
            cancelled,
            focus: Some(self.focus),
            ..Transition::default()
        }
    }

    /// Session is ending; drop the outstanding step without error
    pub fn teardown(&mut self) -> Transition {
        let cancelled = self.cancel_pending();
        debug!(state = %self.state.as_str(), cancelled = ?cancelled, "sequencer_torn_down");
        Transition { kind: Some(TransitionKind::TornDown), cancelled, ..Transition::default() }
    }

    fn begin_tour(&mut self) -> Transition {
        if self.queue.is_empty() {
            self.state = SequencerState::Settled;
            let focus = self.set_focus(None, self.timings.settle, FocusPhase::Settled);
            info!("tour_skipped_no_tight_zones");
            return Transition {
                kind: Some(TransitionKind::TourSkipped),
                focus: Some(focus),
                ..Transition::default()
            };
        }

        info!(zones = %self.queue.len(), "tour_started");
        self.visit(0, TransitionKind::TourStarted)
    }

    /// Zoom to the queued zone at `index`
    fn visit(&mut self, index: usize, kind: TransitionKind) -> Transition {
        let zone = self.queue[index];
        self.state = SequencerState::AutoTouring { index, phase: TourPhase::Zooming };
        let focus = self.set_focus(Some(zone), self.timings.tour_zoom, FocusPhase::Touring);
        let scheduled = self.schedule(Step::ZoomComplete, self.timings.tour_zoom);
        info!(zone = %zone, step = %(index + 1), of = %self.queue.len(), "tour_zone_focused");

        Transition { kind: Some(kind), scheduled: Some(scheduled), focus: Some(focus), ..Transition::default() }
    }

    fn set_focus(&mut self, zone: Option<Zone>, transition: Duration, phase: FocusPhase) -> FocusState {
        self.focus = FocusState::new(zone, transition, phase);
        self.focus
    }

    fn schedule(&mut self, step: Step, delay: Duration) -> ScheduledStep {
        debug_assert!(self.pending.is_none(), "step scheduled while another is outstanding");
        self.next_ticket += 1;
        let scheduled = ScheduledStep { ticket: Ticket(self.next_ticket), step, delay };
        self.pending = Some(scheduled);
        scheduled
    }

    fn cancel_pending(&mut self) -> Option<Ticket> {
        let cancelled = self.pending.take().map(|p| p.ticket);
        if let Some(ticket) = cancelled {
            debug!(ticket = %ticket, "timer_cancelled");
        }
        cancelled
    }
}
