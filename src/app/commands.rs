//! Inbound commands to the power controller.
//!
//! Button gestures are mapped to commands here so the
//! [`PowerController`](super::controller::PowerController) never sees raw
//! button identities.

use crate::drivers::button::{ButtonEvent, ButtonId};

/// Commands the outside world can send into the application core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppCommand {
    /// Show or hide the info overlay (network, location source).
    ToggleOverlay,

    /// Flip between IP lookup and fixed coordinates, then refetch.
    /// Ignored unless the overlay is visible.
    ToggleLocationSource,

    /// Switch between Normal and LowPower mode.
    TogglePowerMode,
}

impl AppCommand {
    /// | Button | Short press     | Long press             |
    /// |--------|-----------------|------------------------|
    /// | A      | toggle overlay  | toggle location source |
    /// | B      | (none)          | toggle power mode      |
    pub fn from_gesture(button: ButtonId, event: ButtonEvent) -> Option<Self> {
        match (button, event) {
            (ButtonId::A, ButtonEvent::ShortPress) => Some(Self::ToggleOverlay),
            (ButtonId::A, ButtonEvent::LongPress) => Some(Self::ToggleLocationSource),
            (ButtonId::B, ButtonEvent::LongPress) => Some(Self::TogglePowerMode),
            (ButtonId::B, ButtonEvent::ShortPress) => None,
        }
    }
}
