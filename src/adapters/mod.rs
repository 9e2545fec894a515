//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter        | Implements         | Connects to                 |
//! |----------------|--------------------|-----------------------------|
//! | `hardware`     | PowerPort          | Sleep controller, backlight |
//! | `http`         | HttpClient         | ESP-IDF HTTP(S) client      |
//! | `ip_locator`   | LocatorPort        | ip-api.com                  |
//! | `log_sink`     | EventSink          | Serial log output           |
//! | `nvs`          | ConfigPort         | NVS / in-memory store       |
//! |                | DurableStore       |                             |
//! | `open_meteo`   | ForecastPort       | api.open-meteo.com          |
//! | `presenter`    | Presenter          | Log lines (text dashboard)  |
//! | `rtc_memory`   | RetentionStore     | RTC slow memory             |
//! | `time`         | ClockPort          | ESP32 timer, RTC, SNTP      |
//! | `wifi`         | ConnectivityPort   | ESP-IDF WiFi STA            |

pub mod hardware;
pub mod http;
pub mod ip_locator;
pub mod log_sink;
pub mod nvs;
pub mod open_meteo;
pub mod presenter;
pub mod rtc_memory;
pub mod time;
pub mod wifi;
