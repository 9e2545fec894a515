//! Text presenter.
//!
//! Implements [`Presenter`] by rendering the dashboard as log lines:
//!
//! ```text
//! UV   | now 6.2 (High)              Dubai  @ 14:05
//! UV   | 14h ████████░░░░░░░░░░░░  6.2
//! UV   | 15h ██████░░░░░░░░░░░░░░  4.8
//! UV   | 16h --
//! INFO | net=HomeWiFi loc=IP mode=Normal
//! ```
//!
//! Pixel output is not modelled.  The last frame is kept so host tests
//! can inspect what would have been drawn.

use std::string::String;
use std::vec::Vec;

use heapless::String as FixedString;
use log::info;

use crate::app::ports::{DashboardView, Notice, Presenter};
use crate::model::{
    ForecastSnapshot, HourlyUv, LocationPreference, NETWORK_LABEL_LEN, PowerMode, UV_GRAPH_CAP,
    UvBand, fit_label,
};

/// Width of a full-scale bar in characters.
pub const BAR_WIDTH: usize = 20;

/// Bar length for `uv`, scaled so [`UV_GRAPH_CAP`] fills `width`.
pub fn bar_len(uv: f32, width: usize) -> usize {
    let ratio = (uv / UV_GRAPH_CAP).clamp(0.0, 1.0);
    (ratio * width as f32).round() as usize
}

#[derive(Default)]
pub struct LogPresenter {
    last_frame: Vec<String>,
    last_status: Option<String>,
    last_notice: Option<Notice>,
}

impl LogPresenter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_frame(&self) -> &[String] {
        &self.last_frame
    }

    pub fn last_status(&self) -> Option<&str> {
        self.last_status.as_deref()
    }

    pub fn last_notice(&self) -> Option<Notice> {
        self.last_notice
    }

    fn header(snapshot: &ForecastSnapshot) -> String {
        let now = match snapshot.current_uv() {
            Some(uv) => format!("now {:.1} ({})", uv, UvBand::classify(uv).label()),
            None => "now --".to_owned(),
        };
        format!(
            "{:<28} {} @ {}",
            now,
            snapshot.location_label.as_str(),
            snapshot.last_update_label.as_str()
        )
    }

    fn bar(slot: &HourlyUv) -> String {
        let filled = bar_len(slot.uv_index(), BAR_WIDTH);
        let mut bar = String::with_capacity(BAR_WIDTH * 3);
        bar.extend(core::iter::repeat_n('█', filled));
        bar.extend(core::iter::repeat_n('░', BAR_WIDTH - filled));
        format!("{:02}h {} {:4.1}", slot.hour(), bar, slot.uv_index())
    }

    fn overlay(view: &DashboardView<'_>) -> String {
        let network: FixedString<NETWORK_LABEL_LEN> =
            fit_label(view.network.unwrap_or("(none)"));
        let location = match view.location_preference {
            LocationPreference::IpLocation => "IP",
            LocationPreference::FixedCoordinates => "Fixed",
        };
        let mode = match view.mode {
            PowerMode::Normal => "Normal",
            PowerMode::LowPower => "LowPower",
        };
        format!("net={} loc={} mode={}", network.as_str(), location, mode)
    }
}

impl Presenter for LogPresenter {
    fn render(&mut self, view: &DashboardView<'_>) {
        let mut frame = Vec::with_capacity(8);
        frame.push(format!("UV   | {}", Self::header(view.snapshot)));
        for slot in view.snapshot.hourly() {
            match slot {
                Some(h) => frame.push(format!("UV   | {}", Self::bar(h))),
                None => frame.push("UV   | --".to_owned()),
            }
        }
        if view.overlay_visible {
            frame.push(format!("INFO | {}", Self::overlay(view)));
        }
        for line in &frame {
            info!("{}", line);
        }
        self.last_frame = frame;
    }

    fn show_status(&mut self, line: &str) {
        info!("UI   | {}", line);
        self.last_status = Some(line.to_owned());
    }

    fn show_notice(&mut self, notice: Notice) {
        info!("UI   | {}", notice.text());
        self.last_notice = Some(notice);
    }
}
