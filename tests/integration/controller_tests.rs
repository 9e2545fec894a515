//! Integration tests for the boot → FSM → ports pipeline.
//!
//! Every test drives a [`PowerController`] through the mock rig exactly
//! the way `main()` drives it on the device: boot once, then tick with
//! optional button commands until deep sleep is requested.

use std::time::Duration;

use crate::mock_hw::{Call, Rig, at};

use uvmonitor::app::commands::AppCommand;
use uvmonitor::app::events::{AppEvent, FetchOutcome};
use uvmonitor::app::ports::{Notice, WakeCause};
use uvmonitor::error::FetchError;
use uvmonitor::fsm::StateId;
use uvmonitor::model::{FetchStatus, LocationPreference, PersistedState, PowerMode};

/// Put a LowPower record in retention + NVS, as a previous session
/// would have left it.
fn seed_low_power(rig: &mut Rig) {
    use uvmonitor::app::ports::StatePort;
    let mut state = PersistedState::initial(&rig.config);
    state.mode = PowerMode::LowPower;
    rig.store.inner.save(&state).unwrap();
}

// ── Normal mode ──────────────────────────────────────────────

#[test]
fn normal_cold_boot_fetches_and_lights_display() {
    let mut rig = Rig::new();
    let c = rig.boot();

    assert_eq!(c.state(), StateId::Normal);
    assert!(rig.power.display);
    assert_eq!(rig.net.attempts, ["Office", "Home"]);
    assert_eq!(rig.forecast.requests.len(), 1);
    assert_eq!(rig.presenter.statuses.len(), 3, "visible fetch shows progress");
    assert!(rig.presenter.renders >= 1);

    let snap = &c.persisted().snapshot;
    assert!(snap.is_valid());
    assert_eq!(snap.last_update_label.as_str(), "14:07");
    assert_eq!(snap.location_label.as_str(), "Dubai");
    assert_eq!(snap.hourly()[0].unwrap().hour(), 14);
    assert_eq!(snap.filled_slots(), 6);
    assert!(rig.power.sleeps.is_empty());
}

#[test]
fn normal_mode_refreshes_once_per_due_slot() {
    let mut rig = Rig::new();
    let mut c = rig.boot();
    assert_eq!(rig.forecast.requests.len(), 1);

    // 14:19:40, twenty seconds before the :20 slot.
    rig.advance(760_000);
    rig.tick(&mut c, None);
    assert_eq!(rig.forecast.requests.len(), 2);

    rig.advance(1_000);
    rig.tick(&mut c, None);
    rig.advance(39_000);
    rig.tick(&mut c, None);
    assert_eq!(rig.forecast.requests.len(), 2, "same slot must not fire twice");

    // Far from any slot.
    rig.advance(300_000);
    rig.tick(&mut c, None);
    assert_eq!(rig.forecast.requests.len(), 2);
}

#[test]
fn boot_fetch_covers_slot_due_at_boot() {
    let mut rig = Rig::new();
    rig.clock.utc = Some(at(14, 4, 50));
    rig.clock.sync_to = None;
    let mut c = rig.boot();
    assert_eq!(rig.forecast.requests.len(), 1);

    rig.advance(20_000);
    rig.tick(&mut c, None);
    assert_eq!(rig.forecast.requests.len(), 1);
}

#[test]
fn without_clock_refresh_falls_back_to_uptime_interval() {
    let mut rig = Rig::new();
    rig.clock.utc = None;
    rig.clock.sync_to = None;
    let mut c = rig.boot();
    assert_eq!(c.persisted().snapshot.status(), FetchStatus::NoTime);
    assert_eq!(c.persisted().snapshot.last_update_label.as_str(), "No Time");

    rig.advance(899_000);
    rig.tick(&mut c, None);
    assert_eq!(rig.forecast.requests.len(), 1);

    rig.advance(1_000);
    rig.tick(&mut c, None);
    assert_eq!(rig.forecast.requests.len(), 2);
}

// ── Buttons ──────────────────────────────────────────────────

#[test]
fn location_toggle_requires_overlay() {
    let mut rig = Rig::new();
    let mut c = rig.boot();

    rig.tick(&mut c, Some(AppCommand::ToggleLocationSource));
    assert_eq!(
        c.persisted().location_preference,
        LocationPreference::IpLocation
    );
    assert_eq!(rig.forecast.requests.len(), 1);

    rig.tick(&mut c, Some(AppCommand::ToggleOverlay));
    assert!(c.session().overlay_visible);
    assert_eq!(rig.presenter.last_overlay, Some(true));
    assert_eq!(rig.presenter.last_network.as_deref(), Some("Home"));
    assert!(rig.sink.events.contains(&AppEvent::OverlayToggled(true)));

    let locates = rig.locator.calls;
    rig.tick(&mut c, Some(AppCommand::ToggleLocationSource));
    assert_eq!(
        c.persisted().location_preference,
        LocationPreference::FixedCoordinates
    );
    assert_eq!(rig.forecast.requests.len(), 2, "toggle triggers a fetch");
    assert_eq!(rig.locator.calls, locates, "fixed source skips the locator");
    let fixed = rig.config.fixed_location;
    assert_eq!(rig.forecast.requests[1], fixed);
    assert_eq!(c.persisted().snapshot.location_label.as_str(), "Fixed");
    assert!(rig.presenter.notices.contains(&Notice::LocationSource(
        LocationPreference::FixedCoordinates
    )));
    assert!(rig.sink.events.contains(&AppEvent::LocationPreferenceChanged(
        LocationPreference::FixedCoordinates
    )));
}

#[test]
fn enabling_low_power_saves_before_sleeping() {
    let mut rig = Rig::new();
    let mut c = rig.boot();
    rig.journal.borrow_mut().clear();

    rig.tick(&mut c, Some(AppCommand::TogglePowerMode));

    assert_eq!(c.state(), StateId::Sleeping);
    assert!(c.is_asleep());
    assert_eq!(c.persisted().mode, PowerMode::LowPower);
    assert_eq!(rig.presenter.notices, [Notice::LowPowerEnabled]);
    assert!(rig.sink.events.contains(&AppEvent::ModeChanged(PowerMode::LowPower)));

    // 14:07 → next hourly slot at 15:05.
    assert_eq!(rig.power.sleeps, [Duration::from_secs(58 * 60)]);

    let journal = rig.journal.borrow();
    let sleep_at = journal
        .iter()
        .position(|c| matches!(c, Call::Sleep(_)))
        .unwrap();
    assert_eq!(journal[sleep_at - 1], Call::Save(PowerMode::LowPower));
    assert!(!journal[..sleep_at].contains(&Call::Display(true)));
    assert_eq!(sleep_at, journal.len() - 1, "nothing after deep sleep");

    // The notice stays lit for the dwell, then the display goes dark.
    let dwell = Duration::from_millis(u64::from(rig.config.notice_dwell_ms));
    let delay_at = journal.iter().position(|c| *c == Call::Delay(dwell)).unwrap();
    let dark_at = journal.iter().position(|c| *c == Call::Display(false)).unwrap();
    assert!(delay_at < dark_at && dark_at < sleep_at);
}

#[test]
fn ticks_after_sleep_are_ignored() {
    let mut rig = Rig::new();
    let mut c = rig.boot();
    rig.tick(&mut c, Some(AppCommand::TogglePowerMode));
    let saves = rig.store.saves;

    rig.advance(5_000);
    rig.tick(&mut c, Some(AppCommand::ToggleOverlay));
    assert_eq!(rig.store.saves, saves);
    assert_eq!(rig.power.sleeps.len(), 1);
}

// ── Low-power wakes ──────────────────────────────────────────

#[test]
fn timer_wake_fetches_silently_then_sleeps() {
    let mut rig = Rig::new();
    seed_low_power(&mut rig);
    rig.clock.utc = Some(at(15, 5, 0));
    rig.clock.sync_to = Some(at(15, 5, 0));
    rig.wake_from_sleep(WakeCause::Timer);

    let mut c = rig.boot();
    assert_eq!(c.state(), StateId::LowPowerRefresh);
    assert!(!rig.power.display);
    assert_eq!(rig.forecast.requests.len(), 1);
    assert!(rig.presenter.statuses.is_empty(), "silent fetch");
    assert_eq!(rig.presenter.renders, 0, "display stays dark");
    assert_eq!(rig.net.disconnects, 1, "radio released after silent fetch");
    assert!(c.persisted().snapshot.is_valid());

    rig.tick(&mut c, None);
    assert_eq!(c.state(), StateId::Sleeping);
    assert_eq!(rig.power.sleeps, [Duration::from_secs(3600)]);
    assert!(!rig.journal.borrow().contains(&Call::Display(true)));
}

#[test]
fn early_timer_wake_arms_for_following_slot() {
    let mut rig = Rig::new();
    seed_low_power(&mut rig);
    // RTC drift: ten seconds ahead of the 15:05 slot.
    rig.clock.utc = Some(at(15, 4, 50));
    rig.clock.sync_to = Some(at(15, 4, 50));
    rig.wake_from_sleep(WakeCause::Timer);

    let mut c = rig.boot();
    assert_eq!(rig.forecast.requests.len(), 1);
    rig.tick(&mut c, None);

    assert_eq!(c.state(), StateId::Sleeping);
    assert_eq!(rig.power.sleeps, [Duration::from_secs(3610)]);
}

#[test]
fn timer_wake_without_wifi_still_sleeps() {
    let mut rig = Rig::new();
    seed_low_power(&mut rig);
    rig.net.reachable.clear();
    rig.wake_from_sleep(WakeCause::Timer);

    let mut c = rig.boot();
    let snap = &c.persisted().snapshot;
    assert!(!snap.is_valid());
    assert_eq!(snap.last_update_label.as_str(), "Offline");
    assert_eq!(snap.filled_slots(), 0);
    assert!(rig.sink.events.iter().any(|e| matches!(
        e,
        AppEvent::FetchCompleted(FetchOutcome::Failed(FetchError::NoNetwork(_)))
    )));

    rig.tick(&mut c, None);
    assert!(c.is_asleep());
    // 14:07 → 15:05.
    assert_eq!(rig.power.sleeps, [Duration::from_secs(58 * 60)]);
}

#[test]
fn timer_wake_without_clock_uses_fallback_sleep() {
    let mut rig = Rig::new();
    seed_low_power(&mut rig);
    rig.net.reachable.clear();
    rig.clock.utc = None;
    rig.clock.sync_to = None;
    rig.wake_from_sleep(WakeCause::Timer);

    let mut c = rig.boot();
    rig.tick(&mut c, None);
    assert_eq!(rig.power.sleeps, [Duration::from_secs(15 * 60)]);
    assert!(rig.sink.events.contains(&AppEvent::SleepScheduled {
        duration_secs: 900,
        wake_at: None,
    }));
}

#[test]
fn button_wake_opens_window_without_fetch() {
    let mut rig = Rig::new();
    seed_low_power(&mut rig);
    rig.wake_from_sleep(WakeCause::Button);

    let mut c = rig.boot();
    assert_eq!(c.state(), StateId::LowPowerAwake);
    assert!(rig.power.display);
    assert!(rig.presenter.renders >= 1);
    assert!(rig.forecast.requests.is_empty(), "no automatic fetch");

    rig.advance(29_000);
    rig.tick(&mut c, None);
    assert!(!c.is_asleep());

    rig.advance(1_000);
    rig.tick(&mut c, None);
    assert!(c.is_asleep());
    assert!(rig.forecast.requests.is_empty());
    // 14:07:30 → 15:05:00, recomputed at expiry.
    assert_eq!(rig.power.sleeps, [Duration::from_secs(3450)]);
    assert!(!rig.power.display);
}

#[test]
fn input_extends_awake_window() {
    let mut rig = Rig::new();
    seed_low_power(&mut rig);
    rig.wake_from_sleep(WakeCause::Button);
    let mut c = rig.boot();

    rig.advance(20_000);
    rig.tick(&mut c, Some(AppCommand::ToggleOverlay));
    rig.advance(20_000);
    rig.tick(&mut c, None);
    assert!(!c.is_asleep(), "window restarted at 20s");

    rig.advance(10_000);
    rig.tick(&mut c, None);
    assert!(c.is_asleep());
}

#[test]
fn disabling_low_power_from_awake_window() {
    let mut rig = Rig::new();
    seed_low_power(&mut rig);
    rig.wake_from_sleep(WakeCause::Button);
    let mut c = rig.boot();

    rig.tick(&mut c, Some(AppCommand::TogglePowerMode));
    assert_eq!(c.state(), StateId::Normal);
    assert_eq!(c.persisted().mode, PowerMode::Normal);
    assert_eq!(rig.presenter.notices, [Notice::NormalEnabled]);
    assert_eq!(rig.forecast.requests.len(), 1, "normal entry fetches");
    assert!(rig.sink.events.contains(&AppEvent::StateChanged {
        from: StateId::LowPowerAwake,
        to: StateId::Normal,
    }));

    // Long past the old window: still on.
    rig.advance(120_000);
    rig.tick(&mut c, None);
    assert!(!c.is_asleep());

    // The durable byte followed the change.
    rig.power_cycle();
    let c = rig.boot();
    assert_eq!(c.state(), StateId::Normal);
}

#[test]
fn power_loss_in_low_power_resumes_sleeping() {
    let mut rig = Rig::new();
    let mut c = rig.boot();
    rig.tick(&mut c, Some(AppCommand::TogglePowerMode));

    rig.power_cycle();
    let c = rig.boot();
    assert_eq!(c.persisted().mode, PowerMode::LowPower);
    assert!(c.is_asleep(), "cold boot in low power goes straight to sleep");
    assert_eq!(rig.presenter.notices, [Notice::Resuming]);
    assert!(rig.forecast.requests.is_empty());
    assert_eq!(rig.power.sleeps.len(), 1);

    let dwell = Duration::from_millis(u64::from(rig.config.notice_dwell_ms));
    let journal = rig.journal.borrow();
    let lit: Vec<&Call> = journal
        .iter()
        .filter(|c| matches!(c, Call::Display(_) | Call::Delay(_)))
        .collect();
    assert_eq!(
        lit,
        [&Call::Display(true), &Call::Delay(dwell), &Call::Display(false)],
        "notice is lit, held, then the display goes dark"
    );
    assert!(rig.sink.events.contains(&AppEvent::Booted {
        mode: PowerMode::LowPower,
        wake: WakeCause::ColdBoot,
        state: StateId::Sleeping,
        from_retention: false,
    }));
}

#[test]
fn failed_checkpoint_is_reported_but_sleep_proceeds() {
    let mut rig = Rig::new();
    let mut c = rig.boot();
    rig.store.fail = true;

    rig.tick(&mut c, Some(AppCommand::TogglePowerMode));
    assert!(rig
        .sink
        .events
        .iter()
        .any(|e| matches!(e, AppEvent::PersistFailed(_))));
    assert_eq!(rig.power.sleeps.len(), 1);
}
