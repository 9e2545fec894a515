//! Function-pointer finite state machine for the power modes.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │  StateTable                                                    │
//! │  ┌─────────────────┬──────────┬─────────┬───────────────────┐  │
//! │  │ StateId         │ on_enter │ on_exit │ on_update         │  │
//! │  ├─────────────────┼──────────┼─────────┼───────────────────┤  │
//! │  │ Normal          │ fn(ctx)  │ -       │ fn(ctx)->Option<> │  │
//! │  │ LowPowerRefresh │ fn(ctx)  │ -       │ fn(ctx)->Option<> │  │
//! │  │ LowPowerAwake   │ fn(ctx)  │ fn(ctx) │ fn(ctx)->Option<> │  │
//! │  │ Sleeping        │ fn(ctx)  │ -       │ fn(ctx)->Option<> │  │
//! │  └─────────────────┴──────────┴─────────┴───────────────────┘  │
//! └────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Handlers never perform I/O.  They read the inputs in
//! [`PowerContext`] (uptime, local time, the pending command) and write
//! their decisions back into it (an [`Action`](context::Action), display
//! power, redraw / persist flags).  The controller applies those
//! decisions through the ports after every tick.
//!
//! `Sleeping` stands for the moment before deep-sleep entry; the sleeping
//! device itself has no in-RAM state.

pub mod context;
pub mod states;

use context::PowerContext;
use log::info;

// ---------------------------------------------------------------------------
// State identity
// ---------------------------------------------------------------------------

/// Every in-RAM power state.
/// Must stay in sync with the table built in [`states::build_state_table`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum StateId {
    /// Always-on: display lit, schedule polled every loop.
    Normal = 0,
    /// Timer wake in low-power mode: silent fetch, then sleep.
    LowPowerRefresh = 1,
    /// Button wake in low-power mode: interactive window.
    LowPowerAwake = 2,
    /// Save and enter deep sleep.
    Sleeping = 3,
}

impl StateId {
    pub const COUNT: usize = 4;

    /// Convert a table index back to `StateId`.  Out-of-range indices
    /// map to `Sleeping`, the state that always makes progress.
    pub fn from_index(idx: usize) -> Self {
        match idx {
            0 => Self::Normal,
            1 => Self::LowPowerRefresh,
            2 => Self::LowPowerAwake,
            3 => Self::Sleeping,
            _ => {
                debug_assert!(false, "invalid state index: {idx}");
                Self::Sleeping
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Function-pointer type aliases
// ---------------------------------------------------------------------------

/// `on_enter` / `on_exit`: run exactly once per transition.
pub type StateActionFn = fn(&mut PowerContext);

/// Per-tick handler.  `Some(next)` requests a transition.
pub type StateUpdateFn = fn(&mut PowerContext) -> Option<StateId>;

/// One row of the state table.
pub struct StateDescriptor {
    pub id: StateId,
    pub name: &'static str,
    pub on_enter: Option<StateActionFn>,
    pub on_exit: Option<StateActionFn>,
    pub on_update: StateUpdateFn,
}

// ---------------------------------------------------------------------------
// FSM engine
// ---------------------------------------------------------------------------

pub struct Fsm {
    /// Fixed-size table indexed by `StateId as usize`.
    table: [StateDescriptor; StateId::COUNT],
    current: usize,
    tick_count: u64,
    state_entry_tick: u64,
}

impl Fsm {
    pub fn new(table: [StateDescriptor; StateId::COUNT], initial: StateId) -> Self {
        Self {
            table,
            current: initial as usize,
            tick_count: 0,
            state_entry_tick: 0,
        }
    }

    /// Run `on_enter` for the initial state.  Call once, before `tick()`.
    pub fn start(&mut self, ctx: &mut PowerContext) {
        info!("FSM starting in state: {}", self.table[self.current].name);
        if let Some(enter) = self.table[self.current].on_enter {
            enter(ctx);
        }
    }

    /// Run the current state's `on_update` and follow any transition it
    /// requests.  A transition runs `on_exit(current)` then
    /// `on_enter(next)` within the same tick.
    pub fn tick(&mut self, ctx: &mut PowerContext) {
        self.tick_count += 1;
        if let Some(next) = (self.table[self.current].on_update)(ctx) {
            self.transition(next, ctx);
        }
    }

    pub fn current_state(&self) -> StateId {
        StateId::from_index(self.current)
    }

    pub fn ticks_in_current_state(&self) -> u64 {
        self.tick_count - self.state_entry_tick
    }

    fn transition(&mut self, next_id: StateId, ctx: &mut PowerContext) {
        let next_idx = next_id as usize;

        info!(
            "FSM transition: {} -> {} after {} ticks",
            self.table[self.current].name,
            self.table[next_idx].name,
            self.ticks_in_current_state()
        );

        if let Some(exit) = self.table[self.current].on_exit {
            exit(ctx);
        }

        self.current = next_idx;
        self.state_entry_tick = self.tick_count;

        if let Some(enter) = self.table[self.current].on_enter {
            enter(ctx);
        }
    }
}
