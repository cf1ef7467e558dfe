//! Services - business logic and state management
//!
//! - `classifier` - per-zone fit verdicts
//! - `analysis` - verdict set for a profile and a garment
//! - `sequencer` - attention state machine (tour, hover override, settle)
//! - `session` - async driver running a sequencer on the tokio clock

pub mod analysis;
pub mod classifier;
pub mod sequencer;
pub mod session;

// Re-export commonly used types
pub use analysis::analyze;
pub use classifier::{classify, PERFECT_TOLERANCE_CM};
pub use sequencer::{FocusPhase, FocusState, Sequencer, SequencerState, SequencerTimings};
pub use session::{spawn_session, spawn_session_with_log, FitSession};
