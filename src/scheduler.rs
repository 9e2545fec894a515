//! Wall-clock-aligned refresh scheduler.
//!
//! Pure computation, no state.  Refresh slots repeat every hour at
//! `anchor_minute + k * interval` for `k = 0..slots_per_hour`.  Given the
//! current local time the scheduler answers two questions:
//!
//! 1. Is a slot due right now? (always-on mode polls this every loop)
//! 2. When is the next slot strictly after now, and how long to sleep
//!    until then? (low-power mode arms the wake timer with this)
//!
//! ```text
//!   anchor=5, slots=4
//!
//!   13:50      14:05      14:20      14:35      14:50      15:05
//!     │          │          │          │          │          │
//!  ───┼──────────┼────▲─────┼──────────┼──────────┼──────────┼──▶
//!                     now=14:07        next = 14:20
//! ```
//!
//! All times are seconds in the *local* wall-clock frame (UTC epoch plus
//! the provider-reported offset).  When the clock is unknown callers use
//! [`plan_sleep`] with `None`, which yields the fixed fallback duration.

use core::time::Duration;

use crate::error::ScheduleError;

const SECS_PER_HOUR: i64 = 3600;

/// Upper bound on a computed sleep.  Anything longer means the clock or
/// the inputs are wrong; one nominal interval is used instead.
pub const MAX_SLEEP_SECS: i64 = 3 * SECS_PER_HOUR;

/// Default due-now tolerance (seconds).
pub const DEFAULT_DUE_TOLERANCE_SECS: u32 = 30;

// ═══════════════════════════════════════════════════════════════
//  Query / decision types
// ═══════════════════════════════════════════════════════════════

/// Inputs for one scheduling decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleQuery {
    /// Local wall-clock time, seconds.
    pub now: i64,
    pub slots_per_hour: u8,
    pub anchor_minute: u8,
    /// True for the always-on polling check; enables `due_now`.
    pub continuous_check: bool,
    /// Slots within this many seconds of `now` count as due.  Capped at
    /// one interval.
    pub due_tolerance_secs: u32,
}

impl ScheduleQuery {
    pub fn new(now: i64, slots_per_hour: u8, anchor_minute: u8, continuous_check: bool) -> Self {
        Self {
            now,
            slots_per_hour,
            anchor_minute,
            continuous_check,
            due_tolerance_secs: DEFAULT_DUE_TOLERANCE_SECS,
        }
    }

    pub fn with_tolerance(mut self, secs: u32) -> Self {
        self.due_tolerance_secs = secs;
        self
    }

    /// Seconds between consecutive slots.
    pub fn interval_secs(&self) -> i64 {
        SECS_PER_HOUR / i64::from(self.slots_per_hour.max(1))
    }
}

/// Result of [`compute_next_slot`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotDecision {
    /// First slot strictly after `now` and after any slot firing now.
    pub next_epoch: i64,
    /// Microseconds to sleep until `next_epoch`, bounded by
    /// [`MAX_SLEEP_SECS`].
    pub sleep_micros: u64,
    /// A slot is due at this instant (continuous checks only).
    pub due_now: bool,
    /// The slot that is due, so callers can avoid firing it twice.
    pub due_slot: Option<i64>,
}

impl SlotDecision {
    pub fn sleep(&self) -> Duration {
        Duration::from_micros(self.sleep_micros)
    }
}

// ═══════════════════════════════════════════════════════════════
//  Slot computation
// ═══════════════════════════════════════════════════════════════

/// Compute the due state and the next slot for `query`.
///
/// Candidates span the previous, current and next two hours.  The
/// previous hour catches a late check just past the top of the hour; the
/// extra trailing hour guarantees a successor even when the due slot is
/// the first slot of the next hour.  When several slots fall inside the
/// tolerance the one closest to `now` is due, ties going to the earlier.
pub fn compute_next_slot(query: &ScheduleQuery) -> Result<SlotDecision, ScheduleError> {
    if !(1..=60).contains(&query.slots_per_hour) {
        return Err(ScheduleError::InvalidSlotCount(query.slots_per_hour));
    }
    if query.anchor_minute > 59 {
        return Err(ScheduleError::InvalidAnchor(query.anchor_minute));
    }

    let now = query.now;
    let interval = query.interval_secs();
    let tolerance = interval.min(i64::from(query.due_tolerance_secs));
    let hour_start = now - now.rem_euclid(SECS_PER_HOUR);
    let anchor = i64::from(query.anchor_minute) * 60;

    let due_slot = if query.continuous_check {
        candidates(hour_start, anchor, interval, query.slots_per_hour)
            .filter(|s| (s - now).abs() <= tolerance)
            .min_by_key(|s| ((s - now).abs(), *s))
    } else {
        None
    };

    let floor = due_slot.map_or(now, |d| d.max(now));
    let next_epoch =
        candidates(hour_start, anchor, interval, query.slots_per_hour).find(|&s| s > floor);

    // The trailing hour always holds a slot past now + tolerance.
    let next_epoch = next_epoch.unwrap_or(hour_start + 2 * SECS_PER_HOUR + anchor);
    let sleep_secs = bounded_sleep_secs(next_epoch - now, interval);

    Ok(SlotDecision {
        next_epoch,
        sleep_micros: sleep_secs as u64 * 1_000_000,
        due_now: due_slot.is_some(),
        due_slot,
    })
}

/// Slot instants for the previous, current and next two hours, ascending.
fn candidates(hour_start: i64, anchor: i64, interval: i64, slots: u8) -> impl Iterator<Item = i64> {
    (-1..=2).flat_map(move |h| {
        let base = hour_start + h * SECS_PER_HOUR + anchor;
        (0..i64::from(slots)).map(move |k| base + k * interval)
    })
}

fn bounded_sleep_secs(gap: i64, interval: i64) -> i64 {
    if gap > MAX_SLEEP_SECS || gap <= 0 {
        interval
    } else {
        gap
    }
}

// ═══════════════════════════════════════════════════════════════
//  Sleep planning
// ═══════════════════════════════════════════════════════════════

/// How long to deep-sleep and why.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SleepPlan {
    pub duration: Duration,
    /// Local wall-clock wake target, when the clock is known.
    pub wake_at: Option<i64>,
}

/// Plan a deep sleep from an optional local time.
///
/// With `served_tolerance_secs`, a slot within that distance of `now` has
/// just been served and the wake targets the slot after it.  Unknown
/// clock (or an invalid slot grid) yields `fallback`.
pub fn plan_sleep(
    local_now: Option<i64>,
    slots_per_hour: u8,
    anchor_minute: u8,
    served_tolerance_secs: Option<u32>,
    fallback: Duration,
) -> SleepPlan {
    let fallback_plan = SleepPlan {
        duration: fallback,
        wake_at: None,
    };
    let Some(now) = local_now else {
        return fallback_plan;
    };
    let query = match served_tolerance_secs {
        Some(t) => ScheduleQuery::new(now, slots_per_hour, anchor_minute, true).with_tolerance(t),
        None => ScheduleQuery::new(now, slots_per_hour, anchor_minute, false),
    };
    match compute_next_slot(&query) {
        Ok(d) => SleepPlan {
            duration: d.sleep(),
            wake_at: Some(d.next_epoch),
        },
        Err(e) => {
            log::warn!("Scheduler: {}, using fallback sleep", e);
            fallback_plan
        }
    }
}

// ═══════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════
