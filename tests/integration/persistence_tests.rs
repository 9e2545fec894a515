//! Integration tests for two-tier persistence over the host backends of
//! the RTC retention and NVS adapters.

use uvmonitor::adapters::nvs::NvsAdapter;
use uvmonitor::adapters::rtc_memory::RtcRetention;
use uvmonitor::app::ports::{DurableStore, StatePort, WakeCause};
use uvmonitor::config::SystemConfig;
use uvmonitor::model::{
    FORECAST_SLOTS, HourlyUv, LocationPreference, PersistedState, PowerMode, fit_label,
};
use uvmonitor::persist::PersistentStore;

use crate::mock_hw::{Rig, fresh_store};

fn populated(cfg: &SystemConfig) -> PersistedState {
    let mut s = PersistedState::initial(cfg);
    let mut window = [None; FORECAST_SLOTS];
    for (i, slot) in window.iter_mut().enumerate().take(4) {
        *slot = Some(HourlyUv::new(14 + i as u8, 3.5 + i as f32));
    }
    s.snapshot.apply_forecast(window, Some(7.25), "14:05");
    s.snapshot.location_label = fit_label("Saint-Remy-de-Provence Nord");
    s.location_preference = LocationPreference::FixedCoordinates;
    s.mode = PowerMode::LowPower;
    s.utc_offset_secs = -18_000;
    s
}

#[test]
fn sleep_wake_cycle_restores_every_field() {
    let cfg = SystemConfig::default();
    let mut store = fresh_store();
    let state = populated(&cfg);
    store.save(&state).unwrap();

    let (retention, nvs) = store.into_parts();
    let mut woken = PersistentStore::new(retention, nvs);
    let restored = woken.load(&cfg);
    assert!(restored.from_retention);
    assert_eq!(restored.state, state);
    assert!(restored.state.snapshot.location_label.ends_with("..."));
}

#[test]
fn power_cycle_keeps_only_the_mode() {
    let cfg = SystemConfig::default();
    let mut store = fresh_store();
    store.save(&populated(&cfg)).unwrap();

    let (mut retention, nvs) = store.into_parts();
    retention.power_cycle();
    let restored = PersistentStore::new(retention, nvs).load(&cfg);
    assert!(!restored.from_retention);
    assert_eq!(restored.state.mode, PowerMode::LowPower);
    assert_eq!(
        restored.state.location_preference,
        LocationPreference::IpLocation
    );
    assert_eq!(restored.state.snapshot.filled_slots(), 0);
}

#[test]
fn first_boot_initialises_durable_byte() {
    let cfg = SystemConfig::default();
    let mut store = PersistentStore::new(RtcRetention::new(), NvsAdapter::new().unwrap());
    let restored = store.load(&cfg);
    assert_eq!(restored.state, PersistedState::initial(&cfg));

    let (_, nvs) = store.into_parts();
    assert_eq!(nvs.load_byte(), Ok(Some(0)));
}

#[test]
fn durable_byte_wins_over_retained_mode() {
    let cfg = SystemConfig::default();
    let mut store = fresh_store();
    store.save(&populated(&cfg)).unwrap();

    let (retention, mut nvs) = store.into_parts();
    nvs.save_byte(PowerMode::Normal.as_byte()).unwrap();
    let restored = PersistentStore::new(retention, nvs).load(&cfg);
    assert!(restored.from_retention);
    assert_eq!(restored.state.mode, PowerMode::Normal);
}

#[test]
fn forecast_survives_controller_sleep_cycle() {
    let mut rig = Rig::new();
    let mut c = rig.boot();
    let before = c.persisted().snapshot.clone();
    rig.tick(&mut c, Some(uvmonitor::app::commands::AppCommand::TogglePowerMode));
    assert!(c.is_asleep());

    rig.wake_from_sleep(WakeCause::Button);
    let c = rig.boot();
    assert_eq!(c.persisted().snapshot, before);
    assert_eq!(c.persisted().mode, PowerMode::LowPower);
}
