//! Polled, debounced button router with short and long press detection.
//!
//! ## Hardware
//!
//! Two active-low momentary switches.  Button A sits on a strapping pin
//! with the internal pull-up; button B has an external pull-up and is
//! also the deep-sleep wake source.  Both are sampled from the main loop
//! at the loop interval; there is no ISR.
//!
//! ## Gesture detection
//!
//! | Gesture     | Condition                                 | Event        |
//! |-------------|-------------------------------------------|--------------|
//! | Short press | Released before `short_press_max_ms`      | `ShortPress` |
//! | Long press  | Held for `long_press_ms` (fires while held)| `LongPress`  |
//! | (none)      | Released between the two thresholds       | -            |
//!
//! A level change is trusted only after it has been stable for
//! `debounce_ms`.  Press duration is measured between the first samples
//! of the accepted press and release edges.

use embedded_hal::digital::InputPin;
use heapless::Vec;

use crate::config::SystemConfig;

/// Which physical button produced an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonId {
    /// Overlay / location source.
    A,
    /// Power mode, wake source.
    B,
}

/// Button events emitted after gesture classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonEvent {
    ShortPress,
    LongPress,
}

/// Gesture thresholds, all in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ButtonTiming {
    pub debounce_ms: u32,
    pub short_press_max_ms: u32,
    pub long_press_ms: u32,
}

impl ButtonTiming {
    pub fn from_config(cfg: &SystemConfig) -> Self {
        Self {
            debounce_ms: cfg.debounce_ms,
            short_press_max_ms: cfg.short_press_max_ms,
            long_press_ms: cfg.long_press_ms,
        }
    }
}

impl Default for ButtonTiming {
    fn default() -> Self {
        Self::from_config(&SystemConfig::default())
    }
}

/// Internal state machine for gesture detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    Pressed { since_ms: u32, long_fired: bool },
}

pub struct ButtonRouter {
    timing: ButtonTiming,
    /// Debounced level (`true` = pressed).
    stable: bool,
    /// Most recent raw level and when it was first seen.
    candidate: bool,
    candidate_since_ms: u32,
    phase: Phase,
}

impl ButtonRouter {
    pub fn new(timing: ButtonTiming) -> Self {
        Self {
            timing,
            stable: false,
            candidate: false,
            candidate_since_ms: 0,
            phase: Phase::Idle,
        }
    }

    /// Feed one raw sample.  `raw_active` is the logical pressed level
    /// (already inverted for active-low wiring); `now_ms` is monotonic.
    pub fn tick(&mut self, raw_active: bool, now_ms: u32) -> Option<ButtonEvent> {
        if raw_active != self.candidate {
            self.candidate = raw_active;
            self.candidate_since_ms = now_ms;
        }

        if self.candidate != self.stable
            && now_ms.wrapping_sub(self.candidate_since_ms) >= self.timing.debounce_ms
        {
            self.stable = self.candidate;
            if let Some(ev) = self.on_edge(self.candidate_since_ms) {
                return Some(ev);
            }
        }

        match self.phase {
            Phase::Pressed {
                since_ms,
                long_fired: false,
            } if now_ms.wrapping_sub(since_ms) >= self.timing.long_press_ms => {
                self.phase = Phase::Pressed {
                    since_ms,
                    long_fired: true,
                };
                Some(ButtonEvent::LongPress)
            }
            _ => None,
        }
    }

    /// Debounced level.
    pub fn is_pressed(&self) -> bool {
        self.stable
    }

    fn on_edge(&mut self, edge_ms: u32) -> Option<ButtonEvent> {
        match (self.stable, self.phase) {
            (true, Phase::Idle) => {
                self.phase = Phase::Pressed {
                    since_ms: edge_ms,
                    long_fired: false,
                };
                None
            }
            (
                false,
                Phase::Pressed {
                    since_ms,
                    long_fired,
                },
            ) => {
                self.phase = Phase::Idle;
                let held = edge_ms.wrapping_sub(since_ms);
                (!long_fired && held < self.timing.short_press_max_ms)
                    .then_some(ButtonEvent::ShortPress)
            }
            _ => None,
        }
    }
}

/// A router bound to an `embedded-hal` input pin.
pub struct PinButton<P> {
    pin: P,
    active_low: bool,
    router: ButtonRouter,
}

impl<P: InputPin> PinButton<P> {
    pub fn new(pin: P, active_low: bool, timing: ButtonTiming) -> Self {
        Self {
            pin,
            active_low,
            router: ButtonRouter::new(timing),
        }
    }

    /// Sample the pin and run the router.  A failed read counts as
    /// released.
    pub fn poll(&mut self, now_ms: u32) -> Option<ButtonEvent> {
        let level = match self.pin.is_high() {
            Ok(high) => high != self.active_low,
            Err(_) => false,
        };
        self.router.tick(level, now_ms)
    }
}

/// Both buttons, polled together.  The routers share no state.
pub struct ButtonPair<A, B> {
    a: PinButton<A>,
    b: PinButton<B>,
}

impl<A: InputPin, B: InputPin> ButtonPair<A, B> {
    pub fn new(a: PinButton<A>, b: PinButton<B>) -> Self {
        Self { a, b }
    }

    pub fn poll(&mut self, now_ms: u32) -> Vec<(ButtonId, ButtonEvent), 2> {
        let mut out = Vec::new();
        if let Some(ev) = self.a.poll(now_ms) {
            let _ = out.push((ButtonId::A, ev));
        }
        if let Some(ev) = self.b.poll(now_ms) {
            let _ = out.push((ButtonId::B, ev));
        }
        out
    }
}
