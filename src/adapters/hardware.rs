//! Hardware adapter — bridges the board to the domain port traits.
//!
//! Implements [`DigitalIo`], [`DelayPort`], [`ClockPort`] and
//! [`WatchdogPort`] on top of the raw GPIO helpers, the ESP-IDF delay
//! providers, the boot clock and the task watchdog.  This is the only
//! module the runtime loops see the hardware through.  On non-espidf
//! targets the underlying helpers fall back to simulation.

use crate::app::ports::{ClockPort, DelayPort, DigitalIo, WatchdogPort};
use crate::drivers::hw_init::{gpio_read, gpio_write};
use crate::drivers::watchdog::Watchdog;
use crate::pins::Pin;

use super::time::uptime_us;

/// The board as seen by [`AlarmSystem`](crate::system::AlarmSystem).
/// Shared by reference between interrupt context and every thread.
pub struct HardwareAdapter {
    watchdog: Watchdog,
}

impl HardwareAdapter {
    pub fn new(watchdog: Watchdog) -> Self {
        Self { watchdog }
    }

    pub fn watchdog(&self) -> &Watchdog {
        &self.watchdog
    }
}

// ── DigitalIo ─────────────────────────────────────────────────

impl DigitalIo for HardwareAdapter {
    fn read(&self, pin: Pin) -> bool {
        gpio_read(pin)
    }

    fn write(&self, pin: Pin, high: bool) {
        gpio_write(pin, high);
    }
}

// ── DelayPort ─────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
impl DelayPort for HardwareAdapter {
    /// Yields to the scheduler (FreeRTOS ticks, rounded up).
    fn delay_ms(&self, ms: u32) {
        esp_idf_hal::delay::FreeRtos::delay_ms(ms);
    }

    /// Busy-waits; safe in the esp_timer task.
    fn delay_us(&self, us: u32) {
        esp_idf_hal::delay::Ets::delay_us(us);
    }
}

#[cfg(not(target_os = "espidf"))]
impl DelayPort for HardwareAdapter {
    fn delay_ms(&self, ms: u32) {
        std::thread::sleep(std::time::Duration::from_millis(u64::from(ms)));
    }

    fn delay_us(&self, us: u32) {
        std::thread::sleep(std::time::Duration::from_micros(u64::from(us)));
    }
}

// ── ClockPort / WatchdogPort ──────────────────────────────────

impl ClockPort for HardwareAdapter {
    fn now_us(&self) -> u64 {
        uptime_us()
    }
}

impl WatchdogPort for HardwareAdapter {
    fn subscribe(&self) {
        self.watchdog.subscribe_current_task();
    }

    fn kick(&self) {
        self.watchdog.feed();
    }
}
