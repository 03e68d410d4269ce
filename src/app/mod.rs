//! Application core — domain logic behind port traits.
//!
//! The business rules of the alarm (mode machine orchestration, passcode
//! entry, breach handling, display blanking) live in [`service`].  All
//! interaction with hardware happens through the **port traits** defined
//! in [`ports`], keeping this layer fully testable without real peripherals.

pub mod events;
pub mod ports;
pub mod service;
