//! Integration tests for the fetch sequence: connectivity, location
//! fallback, forecast alignment and failure labelling.

use uvmonitor::adapters::http::CannedHttp;
use uvmonitor::adapters::ip_locator::IpLocator;
use uvmonitor::adapters::open_meteo::OpenMeteoProvider;
use uvmonitor::app::events::{AppEvent, FetchOutcome};
use uvmonitor::app::fetch::{FIXED_FALLBACK_LABEL, FIXED_LABEL, FetchOrchestrator};
use uvmonitor::app::ports::{ConnectivityError, ForecastEntry, HourlyForecast, Location, Ports};
use uvmonitor::error::FetchError;
use uvmonitor::model::{
    Coordinates, FORECAST_SLOTS, FetchStatus, LocationPreference, PersistedState,
};

use crate::mock_hw::{Rig, day_forecast, dubai};

fn run(rig: &mut Rig, state: &mut PersistedState, silent: bool) -> FetchOutcome {
    let fetcher = FetchOrchestrator::new(&rig.config);
    fetcher.run_fetch_sequence(state, &mut rig.ports(), silent)
}

fn initial(rig: &Rig) -> PersistedState {
    PersistedState::initial(&rig.config)
}

#[test]
fn success_installs_window_and_checkpoints() {
    let mut rig = Rig::new();
    let mut state = initial(&rig);

    let outcome = run(&mut rig, &mut state, false);
    assert_eq!(outcome, FetchOutcome::Updated { slots: 6 });
    assert_eq!(state.snapshot.status(), FetchStatus::Fresh);
    assert_eq!(state.snapshot.current_uv(), Some(5.5));
    assert_eq!(state.snapshot.coordinates, dubai().coordinates);
    assert_eq!(rig.store.saves, 1);
    assert!(rig.sink.events.contains(&AppEvent::FetchCompleted(outcome)));
    assert_eq!(rig.clock.syncs, 1);
}

#[test]
fn provider_offset_shifts_local_hour() {
    let mut rig = Rig::new();
    rig.forecast.result = Ok(day_forecast(4 * 3600));
    let mut state = initial(&rig);

    run(&mut rig, &mut state, true);
    assert_eq!(state.utc_offset_secs, 14_400);
    assert_eq!(state.snapshot.hourly()[0].unwrap().hour(), 18);
    assert_eq!(state.snapshot.last_update_label.as_str(), "18:07");
}

#[test]
fn locator_failure_falls_back_to_fixed() {
    let mut rig = Rig::new();
    rig.locator.result = Err(FetchError::Transport);
    let mut state = initial(&rig);

    assert!(run(&mut rig, &mut state, false).is_success());
    assert_eq!(
        state.snapshot.location_label.as_str(),
        FIXED_FALLBACK_LABEL
    );
    assert_eq!(rig.forecast.requests, [rig.config.fixed_location]);
}

#[test]
fn implausible_location_falls_back_to_fixed() {
    let mut rig = Rig::new();
    rig.locator.result = Ok(Location {
        coordinates: Coordinates {
            latitude: 123.0,
            longitude: 0.0,
        },
        city: "Nowhere".to_owned(),
    });
    let mut state = initial(&rig);

    run(&mut rig, &mut state, false);
    assert_eq!(
        state.snapshot.location_label.as_str(),
        FIXED_FALLBACK_LABEL
    );
}

#[test]
fn fixed_preference_skips_locator() {
    let mut rig = Rig::new();
    let mut state = initial(&rig);
    state.location_preference = LocationPreference::FixedCoordinates;

    run(&mut rig, &mut state, false);
    assert_eq!(rig.locator.calls, 0);
    assert_eq!(state.snapshot.location_label.as_str(), FIXED_LABEL);
}

#[test]
fn networks_tried_in_order_until_one_joins() {
    let mut rig = Rig::new();
    rig.net.reachable = vec!["Office".to_owned(), "Home".to_owned()];
    let mut state = initial(&rig);

    run(&mut rig, &mut state, false);
    assert_eq!(rig.net.attempts, ["Office"]);
}

#[test]
fn existing_association_is_reused() {
    let mut rig = Rig::new();
    let mut state = initial(&rig);
    run(&mut rig, &mut state, false);
    let attempts = rig.net.attempts.len();

    run(&mut rig, &mut state, false);
    assert_eq!(rig.net.attempts.len(), attempts);
}

#[test]
fn no_credentials_is_offline() {
    let mut rig = Rig::new();
    rig.config.networks.clear();
    let mut state = initial(&rig);

    let outcome = run(&mut rig, &mut state, false);
    assert_eq!(
        outcome,
        FetchOutcome::Failed(FetchError::NoNetwork(ConnectivityError::NoCredentials))
    );
    assert_eq!(state.snapshot.last_update_label.as_str(), "Offline");
    assert!(rig.forecast.requests.is_empty());
}

#[test]
fn failure_labels_are_distinct() {
    let cases = [
        (FetchError::HttpStatus(503), "HTTP Err"),
        (FetchError::Transport, "Offline"),
        (FetchError::Malformed("forecast JSON"), "No Data"),
        (FetchError::MissingField("hourly"), "No Data"),
    ];
    for (err, label) in cases {
        let mut rig = Rig::new();
        rig.forecast.result = Err(err);
        let mut state = initial(&rig);
        run(&mut rig, &mut state, false);
        assert_eq!(state.snapshot.last_update_label.as_str(), label, "{err:?}");
    }
}

#[test]
fn no_remaining_hour_is_no_data() {
    let mut rig = Rig::new();
    rig.forecast.result = Ok(HourlyForecast {
        utc_offset_secs: 0,
        current_uv: None,
        entries: (0..10)
            .map(|h| ForecastEntry {
                hour: h,
                uv_index: 1.0,
            })
            .collect(),
    });
    let mut state = initial(&rig);

    assert_eq!(
        run(&mut rig, &mut state, false),
        FetchOutcome::Failed(FetchError::NoMatchingHour)
    );
    assert_eq!(state.snapshot.status(), FetchStatus::NoData);
}

#[test]
fn failure_after_success_clears_stale_values() {
    let mut rig = Rig::new();
    let mut state = initial(&rig);
    run(&mut rig, &mut state, false);
    assert_eq!(state.snapshot.filled_slots(), FORECAST_SLOTS);

    rig.forecast.result = Err(FetchError::Transport);
    run(&mut rig, &mut state, false);
    assert_eq!(state.snapshot.filled_slots(), 0);
    assert_eq!(state.snapshot.current_uv(), None);
    assert!(!state.snapshot.is_valid());
}

#[test]
fn silent_fetch_shows_nothing_and_disconnects() {
    let mut rig = Rig::new();
    let mut state = initial(&rig);

    run(&mut rig, &mut state, true);
    assert!(rig.presenter.statuses.is_empty());
    assert_eq!(rig.net.disconnects, 1);
}

// ── Real adapters over canned HTTP ───────────────────────────

fn open_meteo_body() -> String {
    let times: Vec<String> = (0..24)
        .map(|h| format!("\"2024-06-01T{h:02}:00\""))
        .collect();
    let values: Vec<String> = (0..24)
        .map(|h| match h {
            20 => "null".to_owned(),
            _ => format!("{:.1}", f32::from(h as u8) / 2.0),
        })
        .collect();
    format!(
        r#"{{"utc_offset_seconds":14400,"current":{{"uv_index":8.1}},"hourly":{{"time":[{}],"uv_index":[{}]}}}}"#,
        times.join(","),
        values.join(",")
    )
}

#[test]
fn end_to_end_with_http_adapters() {
    let mut rig = Rig::new();
    let body = open_meteo_body();
    let mut forecast = OpenMeteoProvider::new(
        CannedHttp::new().route("https://api.open-meteo.com/", Ok(body.as_str())),
    );
    let mut locator = IpLocator::new(CannedHttp::new().route(
        "http://ip-api.com/",
        Ok(r#"{"status":"success","city":"Abu Dhabi","lat":24.4539,"lon":54.3773}"#),
    ));
    let fetcher = FetchOrchestrator::new(&rig.config);
    let mut state = initial(&rig);

    let outcome = {
        let mut io = Ports {
            store: &mut rig.store,
            net: &mut rig.net,
            locator: &mut locator,
            forecast: &mut forecast,
            clock: &mut rig.clock,
            presenter: &mut rig.presenter,
            power: &mut rig.power,
            sink: &mut rig.sink,
        };
        fetcher.run_fetch_sequence(&mut state, &mut io, false)
    };

    assert_eq!(outcome, FetchOutcome::Updated { slots: 6 });
    assert_eq!(state.snapshot.location_label.as_str(), "Abu Dhabi");
    assert!(forecast.http().requests[0].contains("latitude=24.4539"));
    // 14:07 UTC is 18:07 local; the null at 20:00 reads as zero.
    let w = state.snapshot.hourly();
    assert_eq!(w[0].unwrap().hour(), 18);
    assert_eq!(w[2].unwrap().uv_index(), 0.0);
    assert_eq!(state.snapshot.current_uv(), Some(8.1));
}
