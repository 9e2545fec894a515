//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the ESP-IDF logger (UART / USB-CDC on the device, stderr on the host).

use log::{info, warn};

use crate::app::events::{AppEvent, FetchOutcome};
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] as one tagged line.
#[derive(Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Booted {
                mode,
                wake,
                state,
                from_retention,
            } => {
                info!(
                    "BOOT  | mode={:?} wake={:?} state={:?} retained={}",
                    mode, wake, state, from_retention
                );
            }
            AppEvent::StateChanged { from, to } => {
                info!("STATE | {:?} -> {:?}", from, to);
            }
            AppEvent::ModeChanged(mode) => {
                info!("MODE  | {:?}", mode);
            }
            AppEvent::LocationPreferenceChanged(pref) => {
                info!("MODE  | location={:?}", pref);
            }
            AppEvent::OverlayToggled(visible) => {
                info!("STATE | overlay={}", if *visible { "on" } else { "off" });
            }
            AppEvent::FetchCompleted(FetchOutcome::Updated { slots }) => {
                info!("FETCH | ok, {} hourly slots", slots);
            }
            AppEvent::FetchCompleted(FetchOutcome::Failed(e)) => {
                warn!("FETCH | failed ({:?}): {}", e.class(), e);
            }
            AppEvent::SleepScheduled {
                duration_secs,
                wake_at,
            } => match wake_at {
                Some(at) => info!("SLEEP | {}s, wake at local {}", duration_secs, at),
                None => info!("SLEEP | {}s (fallback, no clock)", duration_secs),
            },
            AppEvent::PersistFailed(e) => {
                warn!("STORE | checkpoint failed: {}", e);
            }
        }
    }
}
