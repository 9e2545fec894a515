//! GPIO assignments for the UV monitor board (ESP32 with a 135x240 TFT
//! and two user buttons).
//!
//! Single source of truth: every driver references this module rather than
//! hard-coding pin numbers.

// ---------------------------------------------------------------------------
// User buttons (active-low)
// ---------------------------------------------------------------------------

/// Button A: overlay (short) / location source (long).
/// Strapping pin; internal pull-up.
pub const BUTTON_A_GPIO: i32 = 0;

/// Button B: power mode (long).  Input-only pin with external pull-up;
/// also the deep-sleep ext0 wake source.
pub const BUTTON_B_GPIO: i32 = 35;

/// Level on [`BUTTON_B_GPIO`] that wakes the chip (pressed = LOW).
pub const WAKE_LEVEL: i32 = 0;

// ---------------------------------------------------------------------------
// Display
// ---------------------------------------------------------------------------

/// TFT backlight enable (active HIGH).
pub const BACKLIGHT_GPIO: i32 = 4;
