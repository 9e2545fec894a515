//! Error types for the fetch pipeline and the scheduler.
//!
//! Every failure a refresh can hit funnels into [`FetchError`], which
//! also knows which user-visible [`FetchStatus`] it maps to.  All
//! variants are `Copy` so they can ride along in [`AppEvent`]s without
//! allocation.
//!
//! [`AppEvent`]: crate::app::events::AppEvent

use core::fmt;

use crate::app::ports::ConnectivityError;
use crate::model::FetchStatus;

// ---------------------------------------------------------------------------
// Fetch errors
// ---------------------------------------------------------------------------

/// Why a refresh did not produce a fresh forecast.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchError {
    /// No candidate network could be joined.
    NoNetwork(ConnectivityError),
    /// The request never produced a response (DNS, TLS, socket, timeout).
    Transport,
    /// The server answered with a non-success status code.
    HttpStatus(u16),
    /// The body was not the JSON document we expected.
    Malformed(&'static str),
    /// A required field was absent.
    MissingField(&'static str),
    /// No forecast entry is at or after the current local hour.
    NoMatchingHour,
    /// Local time is unknown, so forecast hours cannot be aligned.
    ClockUnavailable,
}

/// Coarse failure class used for recovery and labelling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    Connectivity,
    Data,
    Clock,
}

impl FetchError {
    pub fn class(&self) -> FailureClass {
        match self {
            Self::NoNetwork(_) | Self::Transport | Self::HttpStatus(_) => {
                FailureClass::Connectivity
            }
            Self::Malformed(_) | Self::MissingField(_) | Self::NoMatchingHour => {
                FailureClass::Data
            }
            Self::ClockUnavailable => FailureClass::Clock,
        }
    }

    /// Status recorded in the snapshot when this error ends a refresh.
    pub fn status(&self) -> FetchStatus {
        match self {
            Self::NoNetwork(_) | Self::Transport => FetchStatus::Offline,
            Self::HttpStatus(_) => FetchStatus::HttpError,
            Self::Malformed(_) | Self::MissingField(_) | Self::NoMatchingHour => {
                FetchStatus::NoData
            }
            Self::ClockUnavailable => FetchStatus::NoTime,
        }
    }
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoNetwork(e) => write!(f, "no network: {e}"),
            Self::Transport => write!(f, "transport failure"),
            Self::HttpStatus(code) => write!(f, "HTTP status {code}"),
            Self::Malformed(what) => write!(f, "malformed response: {what}"),
            Self::MissingField(name) => write!(f, "missing field '{name}'"),
            Self::NoMatchingHour => write!(f, "no forecast entry at or after current hour"),
            Self::ClockUnavailable => write!(f, "local time unavailable"),
        }
    }
}

impl std::error::Error for FetchError {}

impl From<ConnectivityError> for FetchError {
    fn from(e: ConnectivityError) -> Self {
        Self::NoNetwork(e)
    }
}

// ---------------------------------------------------------------------------
// Schedule errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleError {
    /// Slots per hour outside 1–60.
    InvalidSlotCount(u8),
    /// Anchor minute outside 0–59.
    InvalidAnchor(u8),
}

impl fmt::Display for ScheduleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidSlotCount(n) => write!(f, "slots per hour {n} not in 1–60"),
            Self::InvalidAnchor(m) => write!(f, "anchor minute {m} not in 0–59"),
        }
    }
}

impl std::error::Error for ScheduleError {}
