//! Outbound application events.
//!
//! The [`PowerController`](super::controller::PowerController) and the
//! [`FetchOrchestrator`](super::fetch::FetchOrchestrator) emit these through
//! the [`EventSink`](super::ports::EventSink) port.  Adapters on the other
//! side decide what to do with them.

use super::ports::{StorageError, WakeCause};
use crate::error::FetchError;
use crate::fsm::StateId;
use crate::model::{LocationPreference, PowerMode};

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// The controller restored state and picked its first state.
    Booted {
        mode: PowerMode,
        wake: WakeCause,
        state: StateId,
        from_retention: bool,
    },

    /// The FSM transitioned between states.
    StateChanged { from: StateId, to: StateId },

    /// The persisted power mode changed.
    ModeChanged(PowerMode),

    /// The persisted location preference changed.
    LocationPreferenceChanged(LocationPreference),

    /// The info overlay was shown or hidden.
    OverlayToggled(bool),

    /// A fetch sequence finished.
    FetchCompleted(FetchOutcome),

    /// Deep sleep is about to begin.
    SleepScheduled {
        duration_secs: u64,
        wake_at: Option<i64>,
    },

    /// A state checkpoint could not be written.
    PersistFailed(StorageError),
}

/// Result of one [`run_fetch_sequence`](super::fetch::FetchOrchestrator::run_fetch_sequence).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The snapshot was replaced; `slots` forecast hours are filled.
    Updated { slots: usize },
    /// The hourly slots were cleared and the snapshot relabelled.
    Failed(FetchError),
}

impl FetchOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Updated { .. })
    }
}
