//! UV Monitor Firmware: Main Entry Point
//!
//! Hexagonal architecture around a deep-sleep power controller.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  HardwareAdapter   LogEventSink   NvsAdapter    SystemClock    │
//! │  (PowerPort)       (EventSink)    (Config+Byte) (ClockPort)    │
//! │  WifiAdapter       OpenMeteo      IpLocator     LogPresenter   │
//! │  (Connectivity)    (Forecast)     (Locator)     (Presenter)    │
//! │  RtcRetention + NvsAdapter ──▶ PersistentStore (StatePort)     │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │          PowerController (pure decisions)              │    │
//! │  │  FSM · Scheduler · FetchOrchestrator                   │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  ButtonPair (polled) ──▶ AppCommand ──▶ controller.tick()      │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use anyhow::Result;
use core::time::Duration;
use log::{error, info, warn};

use esp_idf_hal::gpio::{PinDriver, Pull};
use esp_idf_hal::peripherals::Peripherals;
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::nvs::EspDefaultNvsPartition;

use uvmonitor::adapters::hardware::HardwareAdapter;
use uvmonitor::adapters::http::EspHttpClient;
use uvmonitor::adapters::ip_locator::IpLocator;
use uvmonitor::adapters::log_sink::LogEventSink;
use uvmonitor::adapters::nvs::NvsAdapter;
use uvmonitor::adapters::open_meteo::OpenMeteoProvider;
use uvmonitor::adapters::presenter::LogPresenter;
use uvmonitor::adapters::rtc_memory::RtcRetention;
use uvmonitor::adapters::time::SystemClock;
use uvmonitor::adapters::wifi::WifiAdapter;
use uvmonitor::app::commands::AppCommand;
use uvmonitor::app::controller::PowerController;
use uvmonitor::app::ports::{ConfigPort, PowerPort, Ports};
use uvmonitor::config::SystemConfig;
use uvmonitor::drivers::button::{ButtonPair, ButtonTiming, PinButton};
use uvmonitor::drivers::hw_init;
use uvmonitor::drivers::watchdog::Watchdog;
use uvmonitor::persist::PersistentStore;
use uvmonitor::pins;

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  UV Monitor v{}                      ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    if let Err(e) = hw_init::init_peripherals() {
        error!("GPIO init failed: {}, display stays dark", e);
    }

    // ── 2. Load config from NVS (or defaults) ─────────────────
    let nvs = NvsAdapter::new().map_err(|e| anyhow::anyhow!("NVS init failed: {}", e))?;
    let config = match nvs.load() {
        Ok(cfg) => cfg,
        Err(e) => {
            warn!("NVS config load failed ({}), using defaults", e);
            SystemConfig::default()
        }
    };

    // ── 3. Restore persisted state + wake cause ───────────────
    let mut store = PersistentStore::new(RtcRetention::new(), nvs);
    let restored = store.load(&config);
    let mut hw = HardwareAdapter::new();
    let wake = hw.wake_cause();
    info!(
        "Boot: wake={:?} mode={:?} retained={}",
        wake, restored.state.mode, restored.from_retention
    );

    // ── 4. Construct adapters ─────────────────────────────────
    let peripherals = Peripherals::take()?;
    let sysloop = EspSystemEventLoop::take()?;
    let nvs_partition = EspDefaultNvsPartition::take()?;

    let mut wifi = WifiAdapter::new(peripherals.modem, sysloop, Some(nvs_partition))?;
    let mut clock = SystemClock::new();
    let http_timeout = Duration::from_millis(u64::from(config.http_timeout_ms));
    let mut forecast = OpenMeteoProvider::new(EspHttpClient::new(http_timeout));
    let mut locator = IpLocator::new(EspHttpClient::new(http_timeout));
    let mut presenter = LogPresenter::new();
    let mut sink = LogEventSink::new();

    // ── 5. Buttons + watchdog ─────────────────────────────────
    let timing = ButtonTiming::from_config(&config);
    let mut pin_a = PinDriver::input(peripherals.pins.gpio0)?;
    pin_a.set_pull(Pull::Up)?;
    // GPIO35 is input-only; the pull-up is on the board.
    let pin_b = PinDriver::input(peripherals.pins.gpio35)?;
    let mut buttons = ButtonPair::new(
        PinButton::new(pin_a, true, timing),
        PinButton::new(pin_b, true, timing),
    );
    info!(
        "Buttons: A=GPIO{} B=GPIO{} (wake source)",
        pins::BUTTON_A_GPIO,
        pins::BUTTON_B_GPIO
    );

    let watchdog = Watchdog::new(config.watchdog_timeout_secs);

    // ── 6. Controller ─────────────────────────────────────────
    let mut controller = PowerController::new(config, restored, wake);
    let mut io = Ports {
        store: &mut store,
        net: &mut wifi,
        locator: &mut locator,
        forecast: &mut forecast,
        clock: &mut clock,
        presenter: &mut presenter,
        power: &mut hw,
        sink: &mut sink,
    };
    controller.boot(&mut io);
    watchdog.feed();

    info!("System ready. Entering main loop.");

    // ── 7. Main loop ──────────────────────────────────────────
    while !controller.is_asleep() {
        let now_ms = io.clock.uptime_ms() as u32;

        let mut handled = false;
        for (id, gesture) in buttons.poll(now_ms) {
            info!("Button {:?}: {:?}", id, gesture);
            if let Some(cmd) = AppCommand::from_gesture(id, gesture) {
                controller.tick(Some(cmd), &mut io);
                handled = true;
            }
        }
        if !handled {
            controller.tick(None, &mut io);
        }

        watchdog.feed();
        std::thread::sleep(controller.poll_interval());
    }

    // Only reachable if deep sleep entry returned.
    watchdog.release();
    warn!("Deep sleep did not take effect");
    Ok(())
}
