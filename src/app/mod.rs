//! Application core: domain logic behind port traits.
//!
//! This module holds the business rules of the UV monitor: power-mode
//! orchestration and the fetch sequence.  All interaction with hardware
//! and the network happens through **port traits** defined in [`ports`],
//! keeping this layer fully testable without real peripherals.

pub mod commands;
pub mod controller;
pub mod events;
pub mod fetch;
pub mod ports;
