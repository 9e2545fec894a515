//! Mock adapters for integration tests.
//!
//! Every mock records its calls so tests can assert on the full side
//! effect history without touching real radios, timers or flash.  Calls
//! that must be ordered against each other (saves, display power, deep
//! sleep) also go into a shared [`Journal`].

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use uvmonitor::adapters::nvs::NvsAdapter;
use uvmonitor::adapters::rtc_memory::RtcRetention;
use uvmonitor::app::controller::PowerController;
use uvmonitor::app::events::AppEvent;
use uvmonitor::app::ports::{
    ClockPort, ConnectivityError, ConnectivityPort, DashboardView, EventSink, ForecastEntry,
    ForecastPort, HourlyForecast, Location, LocatorPort, Notice, Ports, PowerPort, Presenter,
    StatePort, StorageError, WakeCause,
};
use uvmonitor::app::commands::AppCommand;
use uvmonitor::config::{NetworkCredential, SystemConfig};
use uvmonitor::error::FetchError;
use uvmonitor::model::{Coordinates, PersistedState, PowerMode};
use uvmonitor::persist::PersistentStore;

/// 2024-06-01 00:00:00 UTC.
pub const DAY: i64 = 1_717_200_000;

pub fn at(h: i64, m: i64, s: i64) -> i64 {
    DAY + h * 3600 + m * 60 + s
}

// ── Shared journal ────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Save(PowerMode),
    Display(bool),
    Delay(Duration),
    Sleep(Duration),
}

pub type Journal = Rc<RefCell<Vec<Call>>>;

// ── Store ─────────────────────────────────────────────────────

pub type DeviceStore = PersistentStore<RtcRetention, NvsAdapter>;

pub fn fresh_store() -> DeviceStore {
    PersistentStore::new(RtcRetention::new(), NvsAdapter::new().unwrap())
}

/// Wraps the real two-tier store and journals every save.
pub struct JournaledStore {
    pub inner: DeviceStore,
    pub saves: usize,
    pub fail: bool,
    journal: Journal,
}

impl StatePort for JournaledStore {
    fn save(&mut self, state: &PersistedState) -> Result<(), StorageError> {
        self.saves += 1;
        self.journal.borrow_mut().push(Call::Save(state.mode));
        if self.fail {
            return Err(StorageError::IoError);
        }
        self.inner.save(state)
    }
}

// ── Network ───────────────────────────────────────────────────

#[derive(Default)]
pub struct MockNet {
    /// SSIDs that accept a connection.
    pub reachable: Vec<String>,
    pub attempts: Vec<String>,
    pub disconnects: usize,
    connected: Option<String>,
}

impl ConnectivityPort for MockNet {
    fn connect(
        &mut self,
        credential: &NetworkCredential,
        _timeout: Duration,
    ) -> Result<(), ConnectivityError> {
        self.attempts.push(credential.ssid.as_str().to_owned());
        if self.reachable.iter().any(|s| s == credential.ssid.as_str()) {
            self.connected = Some(credential.ssid.as_str().to_owned());
            Ok(())
        } else {
            Err(ConnectivityError::Timeout)
        }
    }

    fn disconnect(&mut self) {
        self.disconnects += 1;
        self.connected = None;
    }

    fn is_connected(&self) -> bool {
        self.connected.is_some()
    }

    fn ssid(&self) -> Option<&str> {
        self.connected.as_deref()
    }
}

// ── Locator / forecast ────────────────────────────────────────

pub struct MockLocator {
    pub result: Result<Location, FetchError>,
    pub calls: usize,
}

impl LocatorPort for MockLocator {
    fn locate(&mut self) -> Result<Location, FetchError> {
        self.calls += 1;
        self.result.clone()
    }
}

pub struct MockForecast {
    pub result: Result<HourlyForecast, FetchError>,
    pub requests: Vec<Coordinates>,
}

impl ForecastPort for MockForecast {
    fn fetch(&mut self, at: Coordinates) -> Result<HourlyForecast, FetchError> {
        self.requests.push(at);
        self.result.clone()
    }
}

/// A full day of hourly entries, UV rising with the hour.
pub fn day_forecast(utc_offset_secs: i32) -> HourlyForecast {
    HourlyForecast {
        utc_offset_secs,
        current_uv: Some(5.5),
        entries: (0..24)
            .map(|h| ForecastEntry {
                hour: h,
                uv_index: f32::from(h) / 2.0,
            })
            .collect(),
    }
}

pub fn dubai() -> Location {
    Location {
        coordinates: Coordinates {
            latitude: 25.2,
            longitude: 55.3,
        },
        city: "Dubai".to_owned(),
    }
}

// ── Clock ─────────────────────────────────────────────────────

pub struct MockClock {
    pub uptime_ms: u64,
    pub utc: Option<i64>,
    /// Value a sync installs on an unset clock; `None` = no time source.
    pub sync_to: Option<i64>,
    pub syncs: usize,
    journal: Journal,
}

impl ClockPort for MockClock {
    fn uptime_ms(&self) -> u64 {
        self.uptime_ms
    }

    fn utc_now(&self) -> Option<i64> {
        self.utc
    }

    fn sync(&mut self, _timeout: Duration) -> bool {
        self.syncs += 1;
        if self.utc.is_none() {
            self.utc = self.sync_to;
        }
        self.utc.is_some()
    }

    fn delay(&mut self, duration: Duration) {
        self.uptime_ms += duration.as_millis() as u64;
        self.journal.borrow_mut().push(Call::Delay(duration));
    }
}

// ── Presenter ─────────────────────────────────────────────────

#[derive(Default)]
pub struct MockPresenter {
    pub renders: usize,
    pub last_overlay: Option<bool>,
    pub last_network: Option<String>,
    pub statuses: Vec<String>,
    pub notices: Vec<Notice>,
}

impl Presenter for MockPresenter {
    fn render(&mut self, view: &DashboardView<'_>) {
        self.renders += 1;
        self.last_overlay = Some(view.overlay_visible);
        self.last_network = view.network.map(str::to_owned);
    }

    fn show_status(&mut self, line: &str) {
        self.statuses.push(line.to_owned());
    }

    fn show_notice(&mut self, notice: Notice) {
        self.notices.push(notice);
    }
}

// ── Power ─────────────────────────────────────────────────────

pub struct MockPower {
    pub wake: WakeCause,
    pub display: bool,
    pub sleeps: Vec<Duration>,
    journal: Journal,
}

impl PowerPort for MockPower {
    fn wake_cause(&self) -> WakeCause {
        self.wake
    }

    fn set_display_power(&mut self, on: bool) {
        self.display = on;
        self.journal.borrow_mut().push(Call::Display(on));
    }

    fn enter_deep_sleep(&mut self, duration: Duration) {
        self.display = false;
        self.sleeps.push(duration);
        self.journal.borrow_mut().push(Call::Sleep(duration));
    }
}

// ── Event sink ────────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn count(&self, pred: impl Fn(&AppEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}

// ── Test rig ──────────────────────────────────────────────────

/// One simulated device: every port plus the config it boots with.
pub struct Rig {
    pub config: SystemConfig,
    pub journal: Journal,
    pub store: JournaledStore,
    pub net: MockNet,
    pub locator: MockLocator,
    pub forecast: MockForecast,
    pub clock: MockClock,
    pub presenter: MockPresenter,
    pub power: MockPower,
    pub sink: RecordingSink,
}

pub fn test_config() -> SystemConfig {
    let mut cfg = SystemConfig::default();
    cfg.networks.clear();
    for (ssid, pass) in [("Office", "password1"), ("Home", "password2")] {
        let _ = cfg.networks.push(NetworkCredential::new(ssid, pass).unwrap());
    }
    cfg
}

#[allow(dead_code)]
impl Rig {
    /// Fresh flash, clock at 14:07 UTC, "Home" in range, working APIs.
    pub fn new() -> Self {
        let journal: Journal = Rc::new(RefCell::new(Vec::new()));
        Self {
            config: test_config(),
            store: JournaledStore {
                inner: fresh_store(),
                saves: 0,
                fail: false,
                journal: journal.clone(),
            },
            net: MockNet {
                reachable: vec!["Home".to_owned()],
                ..Default::default()
            },
            locator: MockLocator {
                result: Ok(dubai()),
                calls: 0,
            },
            forecast: MockForecast {
                result: Ok(day_forecast(0)),
                requests: Vec::new(),
            },
            clock: MockClock {
                uptime_ms: 0,
                utc: Some(at(14, 7, 0)),
                sync_to: Some(at(14, 7, 0)),
                syncs: 0,
                journal: journal.clone(),
            },
            presenter: MockPresenter::default(),
            power: MockPower {
                wake: WakeCause::ColdBoot,
                display: false,
                sleeps: Vec::new(),
                journal: journal.clone(),
            },
            sink: RecordingSink::default(),
            journal,
        }
    }

    pub fn ports(&mut self) -> Ports<'_> {
        Ports {
            store: &mut self.store,
            net: &mut self.net,
            locator: &mut self.locator,
            forecast: &mut self.forecast,
            clock: &mut self.clock,
            presenter: &mut self.presenter,
            power: &mut self.power,
            sink: &mut self.sink,
        }
    }

    /// Restore state from the store and boot a controller, the way
    /// `main()` does after every reset.
    pub fn boot(&mut self) -> PowerController {
        let restored = self.store.inner.load(&self.config);
        let wake = self.power.wake;
        let mut controller = PowerController::new(self.config.clone(), restored, wake);
        controller.boot(&mut self.ports());
        controller
    }

    pub fn tick(&mut self, controller: &mut PowerController, command: Option<AppCommand>) {
        controller.tick(command, &mut self.ports());
    }

    /// Advance uptime and the wall clock together.
    pub fn advance(&mut self, ms: u64) {
        self.clock.uptime_ms += ms;
        if let Some(t) = self.clock.utc.as_mut() {
            *t += (ms / 1000) as i64;
        }
    }

    /// Simulate waking from deep sleep: RAM is lost, retention memory
    /// and NVS survive, uptime restarts.  Recorded calls are cleared.
    pub fn wake_from_sleep(&mut self, wake: WakeCause) {
        let old = std::mem::replace(&mut self.store.inner, fresh_store());
        let (retention, nvs) = old.into_parts();
        self.store.inner = PersistentStore::new(retention, nvs);
        self.reset_for_boot(wake);
    }

    /// Simulate a full power cycle: retention memory is wiped, NVS
    /// survives.
    pub fn power_cycle(&mut self) {
        let old = std::mem::replace(&mut self.store.inner, fresh_store());
        let (mut retention, nvs) = old.into_parts();
        retention.power_cycle();
        self.store.inner = PersistentStore::new(retention, nvs);
        self.reset_for_boot(WakeCause::ColdBoot);
    }

    fn reset_for_boot(&mut self, wake: WakeCause) {
        self.power.wake = wake;
        self.power.display = false;
        self.power.sleeps.clear();
        self.journal.borrow_mut().clear();
        self.store.saves = 0;
        self.clock.uptime_ms = 0;
        self.net.disconnect();
        self.net.attempts.clear();
        self.net.disconnects = 0;
        self.locator.calls = 0;
        self.forecast.requests.clear();
        self.presenter = MockPresenter::default();
        self.sink.events.clear();
    }
}
