//! Shared context threaded through every FSM handler.
//!
//! `PowerContext` is the blackboard the state handlers read from and
//! write to.  Inputs are refreshed by the controller before every tick;
//! outputs are drained by the controller after every tick.

use crate::app::commands::AppCommand;
use crate::app::ports::Notice;
use crate::config::SystemConfig;
use crate::model::PersistedState;
use crate::scheduler::SleepPlan;

// ---------------------------------------------------------------------------
// Decision output
// ---------------------------------------------------------------------------

/// What the controller should do after this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Action {
    #[default]
    Idle,
    /// Run the fetch sequence now.  `silent` suppresses progress screens.
    FetchNow { silent: bool },
    /// Save state and deep-sleep.
    Sleep(SleepPlan),
}

// ---------------------------------------------------------------------------
// Session state (RAM only, rebuilt on every wake)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionState {
    /// Info overlay (network, location source) visible.
    pub overlay_visible: bool,
    /// Uptime at which the low-power interactive window closes.
    pub awake_deadline_ms: Option<u64>,
    /// Last slot a scheduled refresh fired for, so it fires once.
    pub last_fired_slot: Option<i64>,
    /// Uptime of the last completed fetch.
    pub last_fetch_ms: Option<u64>,
    /// This wake ran the scheduled refresh for the slot around now.
    pub slot_served: bool,
}

// ---------------------------------------------------------------------------
// Context
// ---------------------------------------------------------------------------

pub struct PowerContext {
    pub config: SystemConfig,
    pub persisted: PersistedState,
    pub session: SessionState,

    // ── Inputs ──
    /// Monotonic uptime (ms).
    pub now_ms: u64,
    /// Local wall-clock seconds, `None` until the clock is set.
    pub local_now: Option<i64>,
    /// User command for this tick, consumed by the handler.
    pub command: Option<AppCommand>,

    // ── Outputs ──
    pub action: Action,
    /// Desired display / backlight power.
    pub display_on: bool,
    /// The dashboard needs redrawing.
    pub redraw: bool,
    /// Persisted state changed and must be checkpointed now.
    pub persist: bool,
    pub notice: Option<Notice>,
}

impl PowerContext {
    pub fn new(config: SystemConfig, persisted: PersistedState) -> Self {
        Self {
            config,
            persisted,
            session: SessionState::default(),
            now_ms: 0,
            local_now: None,
            command: None,
            action: Action::Idle,
            display_on: false,
            redraw: false,
            persist: false,
            notice: None,
        }
    }

    pub fn awake_window_ms(&self) -> u64 {
        u64::from(self.config.awake_window_secs) * 1000
    }

    pub fn fallback_interval_ms(&self) -> u64 {
        u64::from(self.config.fallback_sleep_secs) * 1000
    }
}
