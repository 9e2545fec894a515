//! Fuzz target: provider response parsing
//!
//! Runs arbitrary UTF-8 through the forecast and locator parsers.  Both
//! must return an error rather than panic, and any forecast they accept
//! must carry hours in 0–23.
//!
//! cargo fuzz run fuzz_forecast_json

#![no_main]

use libfuzzer_sys::fuzz_target;
use uvmonitor::adapters::ip_locator::parse_location;
use uvmonitor::adapters::open_meteo::parse_forecast;

fuzz_target!(|data: &[u8]| {
    let Ok(body) = core::str::from_utf8(data) else {
        return;
    };

    if let Ok(forecast) = parse_forecast(body) {
        assert!(forecast.entries.iter().all(|e| e.hour < 24));
    }
    let _ = parse_location(body);
});
