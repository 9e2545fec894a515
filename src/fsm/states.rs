//! Concrete state handler functions and table builder.
//!
//! ```text
//!   boot ──(mode, wake cause)──┐
//!                              │
//!   Normal/any ───────────▶ NORMAL ◀────────[B long]────────┐
//!                             │                              │
//!                          [B long]                          │
//!                             ▼                              │
//!   LowPower/cold ──────▶ SLEEPING ◀──[window expired]── LOW_POWER_AWAKE
//!                             ▲                              ▲
//!                        [fetch done]                        │
//!                             │                              │
//!   LowPower/timer ─▶ LOW_POWER_REFRESH      LowPower/button ┘
//! ```

use log::{debug, info, warn};

use super::context::{Action, PowerContext};
use super::{StateDescriptor, StateId};
use crate::app::commands::AppCommand;
use crate::app::ports::{Notice, WakeCause};
use crate::model::PowerMode;
use crate::scheduler::{ScheduleQuery, compute_next_slot, plan_sleep};

// ═══════════════════════════════════════════════════════════════════════════
//  Table builder and boot dispatch
// ═══════════════════════════════════════════════════════════════════════════

pub fn build_state_table() -> [StateDescriptor; StateId::COUNT] {
    [
        StateDescriptor {
            id: StateId::Normal,
            name: "Normal",
            on_enter: Some(normal_enter),
            on_exit: None,
            on_update: normal_update,
        },
        StateDescriptor {
            id: StateId::LowPowerRefresh,
            name: "LowPowerRefresh",
            on_enter: Some(refresh_enter),
            on_exit: None,
            on_update: refresh_update,
        },
        StateDescriptor {
            id: StateId::LowPowerAwake,
            name: "LowPowerAwake",
            on_enter: Some(awake_enter),
            on_exit: Some(awake_exit),
            on_update: awake_update,
        },
        StateDescriptor {
            id: StateId::Sleeping,
            name: "Sleeping",
            on_enter: Some(sleeping_enter),
            on_exit: None,
            on_update: sleeping_update,
        },
    ]
}

/// Initial state for a boot or wake.
///
/// | persisted mode | wake cause | state            |
/// |----------------|------------|------------------|
/// | Normal         | any        | Normal           |
/// | LowPower       | timer      | LowPowerRefresh  |
/// | LowPower       | button     | LowPowerAwake    |
/// | LowPower       | cold boot  | Sleeping         |
pub fn boot_state(mode: PowerMode, wake: WakeCause) -> StateId {
    match (mode, wake) {
        (PowerMode::Normal, _) => StateId::Normal,
        (PowerMode::LowPower, WakeCause::Timer) => StateId::LowPowerRefresh,
        (PowerMode::LowPower, WakeCause::Button) => StateId::LowPowerAwake,
        (PowerMode::LowPower, WakeCause::ColdBoot) => StateId::Sleeping,
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  Shared handlers
// ═══════════════════════════════════════════════════════════════════════════

/// Overlay and location commands behave the same in every lit state.
fn handle_ui_command(ctx: &mut PowerContext, cmd: AppCommand) {
    match cmd {
        AppCommand::ToggleOverlay => {
            ctx.session.overlay_visible = !ctx.session.overlay_visible;
            ctx.redraw = true;
        }
        AppCommand::ToggleLocationSource => {
            if !ctx.session.overlay_visible {
                debug!("Location toggle ignored: overlay hidden");
                return;
            }
            let pref = ctx.persisted.location_preference.toggled();
            ctx.persisted.location_preference = pref;
            ctx.persist = true;
            ctx.notice = Some(Notice::LocationSource(pref));
            ctx.action = Action::FetchNow { silent: false };
            info!("Location preference -> {:?}", pref);
        }
        AppCommand::TogglePowerMode => {}
    }
}

fn switch_mode(ctx: &mut PowerContext, mode: PowerMode, notice: Notice) {
    ctx.persisted.mode = mode;
    ctx.persist = true;
    ctx.notice = Some(notice);
    info!("Power mode -> {:?}", mode);
}

/// Continuous-mode schedule check.  Each due slot fires once.
fn refresh_due(ctx: &mut PowerContext) -> bool {
    let Some(now) = ctx.local_now else {
        return fallback_refresh_due(ctx);
    };
    let query = ScheduleQuery::new(
        now,
        ctx.config.normal_slots_per_hour,
        ctx.config.anchor_minute,
        true,
    )
    .with_tolerance(ctx.config.due_tolerance_secs);

    match compute_next_slot(&query) {
        Ok(d) if d.due_now && d.due_slot != ctx.session.last_fired_slot => {
            ctx.session.last_fired_slot = d.due_slot;
            true
        }
        Ok(_) => false,
        Err(e) => {
            warn!("Schedule check failed ({}), using fallback interval", e);
            fallback_refresh_due(ctx)
        }
    }
}

/// Without a wall clock, refresh every fallback interval of uptime.
fn fallback_refresh_due(ctx: &PowerContext) -> bool {
    ctx.session
        .last_fetch_ms
        .is_none_or(|t| ctx.now_ms.saturating_sub(t) >= ctx.fallback_interval_ms())
}

// ═══════════════════════════════════════════════════════════════════════════
//  NORMAL state
// ═══════════════════════════════════════════════════════════════════════════

fn normal_enter(ctx: &mut PowerContext) {
    ctx.display_on = true;
    ctx.redraw = true;
    ctx.session.awake_deadline_ms = None;
    ctx.action = Action::FetchNow { silent: false };
    // The entry fetch covers a slot that happens to be due right now.
    let _ = refresh_due(ctx);
    info!("NORMAL: always-on, polling schedule");
}

fn normal_update(ctx: &mut PowerContext) -> Option<StateId> {
    match ctx.command.take() {
        Some(AppCommand::TogglePowerMode) => {
            switch_mode(ctx, PowerMode::LowPower, Notice::LowPowerEnabled);
            return Some(StateId::Sleeping);
        }
        Some(cmd) => handle_ui_command(ctx, cmd),
        None => {}
    }

    if ctx.action == Action::Idle && refresh_due(ctx) {
        info!("NORMAL: scheduled refresh due");
        ctx.action = Action::FetchNow { silent: false };
    }
    None
}

// ═══════════════════════════════════════════════════════════════════════════
//  LOW_POWER_REFRESH state
// ═══════════════════════════════════════════════════════════════════════════

fn refresh_enter(ctx: &mut PowerContext) {
    ctx.display_on = false;
    ctx.action = Action::FetchNow { silent: true };
    ctx.session.slot_served = true;
    info!("LOW_POWER_REFRESH: timer wake, silent fetch");
}

fn refresh_update(_ctx: &mut PowerContext) -> Option<StateId> {
    // The fetch requested on entry has run by now.
    Some(StateId::Sleeping)
}

// ═══════════════════════════════════════════════════════════════════════════
//  LOW_POWER_AWAKE state
// ═══════════════════════════════════════════════════════════════════════════

fn awake_enter(ctx: &mut PowerContext) {
    ctx.display_on = true;
    ctx.redraw = true;
    ctx.session.awake_deadline_ms = Some(ctx.now_ms + ctx.awake_window_ms());
    info!(
        "LOW_POWER_AWAKE: interactive for {}s",
        ctx.config.awake_window_secs
    );
}

fn awake_exit(ctx: &mut PowerContext) {
    ctx.session.awake_deadline_ms = None;
}

fn awake_update(ctx: &mut PowerContext) -> Option<StateId> {
    match ctx.command.take() {
        Some(AppCommand::TogglePowerMode) => {
            switch_mode(ctx, PowerMode::Normal, Notice::NormalEnabled);
            return Some(StateId::Normal);
        }
        Some(cmd) => {
            handle_ui_command(ctx, cmd);
            ctx.session.awake_deadline_ms = Some(ctx.now_ms + ctx.awake_window_ms());
        }
        None => {}
    }

    match ctx.session.awake_deadline_ms {
        Some(deadline) if ctx.now_ms < deadline => None,
        _ => Some(StateId::Sleeping),
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  SLEEPING state
// ═══════════════════════════════════════════════════════════════════════════

fn sleeping_enter(ctx: &mut PowerContext) {
    ctx.display_on = false;
    // An early timer wake must not re-arm for the slot it just refreshed.
    let served = ctx
        .session
        .slot_served
        .then_some(ctx.config.due_tolerance_secs);
    let plan = plan_sleep(
        ctx.local_now,
        ctx.config.low_power_slots_per_hour,
        ctx.config.anchor_minute,
        served,
        core::time::Duration::from_secs(u64::from(ctx.config.fallback_sleep_secs)),
    );
    info!("SLEEPING: next wake in {}s", plan.duration.as_secs());
    ctx.action = Action::Sleep(plan);
}

fn sleeping_update(_ctx: &mut PowerContext) -> Option<StateId> {
    None
}
