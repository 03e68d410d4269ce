//! Peripheral drivers, hardware initialisation and thread helpers.

pub mod hw_init;
pub mod hw_timer;
pub mod keypad;
pub mod task_pin;
pub mod watchdog;
