//! Power controller: the hexagonal core.
//!
//! [`PowerController`] owns the FSM, the shared [`PowerContext`] and the
//! fetch orchestrator.  Each loop iteration is split in two:
//!
//! ```text
//!   decide(now, utc, cmd) ──▶ Action        (pure: FSM only, no I/O)
//!   apply(action, ports)                   (notice, display, persist,
//!                                            fetch / sleep, redraw)
//! ```
//!
//! [`tick`](PowerController::tick) runs both.  Every path into deep sleep
//! goes through [`apply`](PowerController::apply), which saves the
//! persisted state before arming the wake sources.

use core::time::Duration;

use log::{info, warn};

use crate::config::SystemConfig;
use crate::fsm::context::{Action, PowerContext, SessionState};
use crate::fsm::states::{boot_state, build_state_table};
use crate::fsm::{Fsm, StateId};
use crate::model::{LocationPreference, PersistedState, PowerMode};
use crate::persist::Restored;

use super::commands::AppCommand;
use super::events::AppEvent;
use super::fetch::FetchOrchestrator;
use super::ports::{DashboardView, Notice, Ports, WakeCause};

/// Values compared before and after a decision to derive events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Checkpoint {
    state: StateId,
    mode: PowerMode,
    preference: LocationPreference,
    overlay: bool,
}

pub struct PowerController {
    fsm: Fsm,
    ctx: PowerContext,
    fetcher: FetchOrchestrator,
    wake: WakeCause,
    from_retention: bool,
    before: Checkpoint,
    /// Display power last pushed to the hardware.
    display_applied: Option<bool>,
    asleep: bool,
}

impl PowerController {
    /// Build the controller from restored state.  Does not touch any
    /// port; call [`boot`](Self::boot) next.
    pub fn new(config: SystemConfig, restored: Restored, wake: WakeCause) -> Self {
        let initial = boot_state(restored.state.mode, wake);
        let fetcher = FetchOrchestrator::new(&config);
        let ctx = PowerContext::new(config, restored.state);
        let before = Checkpoint {
            state: initial,
            mode: ctx.persisted.mode,
            preference: ctx.persisted.location_preference,
            overlay: false,
        };
        Self {
            fsm: Fsm::new(build_state_table(), initial),
            ctx,
            fetcher,
            wake,
            from_retention: restored.from_retention,
            before,
            display_applied: None,
            asleep: false,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Enter the state chosen by `(mode, wake cause)` and carry out its
    /// entry action (a fetch, or straight to sleep on a low-power cold
    /// boot).
    pub fn boot(&mut self, io: &mut Ports<'_>) {
        self.before = self.checkpoint();
        self.refresh_inputs(io.clock.uptime_ms(), io.clock.utc_now());
        self.ctx.action = Action::Idle;

        let state = self.fsm.current_state();
        if self.ctx.persisted.mode == PowerMode::LowPower && self.wake == WakeCause::ColdBoot {
            self.ctx.notice = Some(Notice::Resuming);
        }
        self.fsm.start(&mut self.ctx);

        io.sink.emit(&AppEvent::Booted {
            mode: self.ctx.persisted.mode,
            wake: self.wake,
            state,
            from_retention: self.from_retention,
        });
        info!(
            "PowerController booted: mode={:?} wake={:?} state={:?}",
            self.ctx.persisted.mode, self.wake, state
        );

        let action = self.ctx.action;
        self.apply(action, io);
    }

    // ── Per-tick orchestration ────────────────────────────────

    /// Run one decision and carry it out.  No-op once asleep.
    pub fn tick(&mut self, command: Option<AppCommand>, io: &mut Ports<'_>) {
        if self.asleep {
            return;
        }
        let action = self.decide(io.clock.uptime_ms(), io.clock.utc_now(), command);
        self.apply(action, io);
    }

    /// Advance the state machine for one loop iteration and return what
    /// should happen next.  Performs no I/O.
    pub fn decide(
        &mut self,
        now_ms: u64,
        utc_now: Option<i64>,
        command: Option<AppCommand>,
    ) -> Action {
        self.before = self.checkpoint();
        self.refresh_inputs(now_ms, utc_now);
        self.ctx.command = command;
        self.ctx.action = Action::Idle;
        self.fsm.tick(&mut self.ctx);
        self.ctx.action
    }

    /// Carry out the side effects of the last decision, in order:
    /// notice, display power, checkpoint, fetch or sleep, redraw.
    pub fn apply(&mut self, action: Action, io: &mut Ports<'_>) {
        let notice = self.ctx.notice.take();
        if notice.is_some() && matches!(action, Action::Sleep(_)) {
            // Light the notice before the display goes dark.
            self.ctx.display_on = true;
        }
        if let Some(notice) = notice {
            io.presenter.show_notice(notice);
        }

        self.sync_display(io);

        if self.ctx.persist {
            self.ctx.persist = false;
            self.checkpoint_state(io);
        }

        if self.ctx.session.overlay_visible != self.before.overlay {
            io.sink.emit(&AppEvent::OverlayToggled(self.ctx.session.overlay_visible));
        }

        match action {
            Action::Idle => {}
            Action::FetchNow { silent } => {
                self.fetcher
                    .run_fetch_sequence(&mut self.ctx.persisted, io, silent);
                self.ctx.session.last_fetch_ms = Some(io.clock.uptime_ms());
                self.ctx.redraw = true;
            }
            Action::Sleep(plan) => {
                if notice.is_some() {
                    io.clock.delay(self.notice_dwell());
                }
                self.ctx.display_on = false;
                self.sync_display(io);
                // Mandatory checkpoint before every deep sleep.
                self.save(io);
                io.sink.emit(&AppEvent::SleepScheduled {
                    duration_secs: plan.duration.as_secs(),
                    wake_at: plan.wake_at,
                });
                self.asleep = true;
                io.power.enter_deep_sleep(plan.duration);
            }
        }
        self.ctx.action = Action::Idle;

        if self.ctx.redraw && self.ctx.display_on && !self.asleep {
            self.ctx.redraw = false;
            let view = DashboardView {
                snapshot: &self.ctx.persisted.snapshot,
                mode: self.ctx.persisted.mode,
                location_preference: self.ctx.persisted.location_preference,
                overlay_visible: self.ctx.session.overlay_visible,
                network: io.net.ssid(),
            };
            io.presenter.render(&view);
        }

        let now_state = self.fsm.current_state();
        if now_state != self.before.state {
            io.sink.emit(&AppEvent::StateChanged {
                from: self.before.state,
                to: now_state,
            });
        }
        self.before = self.checkpoint();
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn state(&self) -> StateId {
        self.fsm.current_state()
    }

    pub fn persisted(&self) -> &PersistedState {
        &self.ctx.persisted
    }

    pub fn session(&self) -> &SessionState {
        &self.ctx.session
    }

    pub fn display_on(&self) -> bool {
        self.ctx.display_on
    }

    /// Deep sleep was requested.  On hardware this never becomes
    /// observable; on the host the loop uses it to stop.
    pub fn is_asleep(&self) -> bool {
        self.asleep
    }

    /// How long the main loop should wait before the next tick.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(u64::from(self.ctx.config.loop_interval_ms))
    }

    // ── Internal helpers ──────────────────────────────────────

    fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            state: self.fsm.current_state(),
            mode: self.ctx.persisted.mode,
            preference: self.ctx.persisted.location_preference,
            overlay: self.ctx.session.overlay_visible,
        }
    }

    fn notice_dwell(&self) -> Duration {
        Duration::from_millis(u64::from(self.ctx.config.notice_dwell_ms))
    }

    fn refresh_inputs(&mut self, now_ms: u64, utc_now: Option<i64>) {
        self.ctx.now_ms = now_ms;
        self.ctx.local_now = utc_now.map(|t| self.ctx.persisted.local_time(t));
    }

    fn sync_display(&mut self, io: &mut Ports<'_>) {
        if self.display_applied != Some(self.ctx.display_on) {
            io.power.set_display_power(self.ctx.display_on);
            self.display_applied = Some(self.ctx.display_on);
        }
    }

    /// Mode or preference changed: write both tiers before anything else.
    fn checkpoint_state(&mut self, io: &mut Ports<'_>) {
        self.save(io);
        if self.ctx.persisted.mode != self.before.mode {
            io.sink.emit(&AppEvent::ModeChanged(self.ctx.persisted.mode));
        }
        if self.ctx.persisted.location_preference != self.before.preference {
            io.sink.emit(&AppEvent::LocationPreferenceChanged(
                self.ctx.persisted.location_preference,
            ));
        }
    }

    fn save(&mut self, io: &mut Ports<'_>) {
        if let Err(e) = io.store.save(&self.ctx.persisted) {
            warn!("State checkpoint failed: {}", e);
            io.sink.emit(&AppEvent::PersistFailed(e));
        }
    }
}
