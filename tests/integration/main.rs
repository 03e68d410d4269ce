//! Integration test driver for the `tests/integration/` submodules.
//!
//! Each `mod` below maps to a file that exercises a subsystem through
//! `AlarmSystem`'s thread steps and interrupt entry points against mock
//! adapters.  All tests run on the host with no real hardware required.

mod debounce_tests;
mod idle_timer_tests;
mod mock_hw;
mod sensor_tests;
