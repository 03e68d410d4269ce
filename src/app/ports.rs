//! Port traits — the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ AlarmService (domain)
//! ```
//!
//! Driven adapters (GPIO, LCD, clocks, watchdog, event sinks) implement
//! these traits.  The [`AlarmService`](super::service::AlarmService) and
//! [`AlarmSystem`](crate::system::AlarmSystem) consume them via generics,
//! so the domain core never touches hardware directly.
//!
//! Pin ports take `&self`: the same board is shared by interrupt entry
//! points and three threads, and every implementation is backed by
//! registers or atomics.

use crate::pins::Pin;

// ───────────────────────────────────────────────────────────────
// Digital I/O port (driven adapter: domain ↔ GPIO)
// ───────────────────────────────────────────────────────────────

/// Level read/write for every named line on the board.
pub trait DigitalIo {
    /// Current level of `pin` (`true` = high).
    fn read(&self, pin: Pin) -> bool;

    /// Drive `pin` to `high`.
    fn write(&self, pin: Pin, high: bool);

    /// Invert the driven level of an output.
    fn toggle(&self, pin: Pin) {
        let level = self.read(pin);
        self.write(pin, !level);
    }
}

// ───────────────────────────────────────────────────────────────
// Display port (driven adapter: domain → character LCD)
// ───────────────────────────────────────────────────────────────

/// Opaque text/cursor device.  Calls block until the device has accepted
/// them and never fail from the caller's point of view.
pub trait DisplayPort {
    fn clear(&mut self);

    /// Write `text` at the cursor, advancing it.
    fn print(&mut self, text: &str);

    /// Move the cursor to `col` on line `row` (both zero-based).
    fn set_cursor(&mut self, col: u8, row: u8);

    fn backlight(&mut self);

    fn no_backlight(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Timing ports
// ───────────────────────────────────────────────────────────────

/// Blocking waits.  May be called while holding the system lock.
pub trait DelayPort {
    fn delay_ms(&self, ms: u32);
    fn delay_us(&self, us: u32);
}

/// Monotonic microsecond clock.
pub trait ClockPort {
    fn now_us(&self) -> u64;
}

// ───────────────────────────────────────────────────────────────
// Supervision port
// ───────────────────────────────────────────────────────────────

/// Liveness supervision.  The task that calls [`subscribe`](Self::subscribe)
/// must call [`kick`](Self::kick) within the configured window or the
/// board restarts.
pub trait WatchdogPort {
    /// Register the calling task with the watchdog.
    fn subscribe(&self);

    /// Heartbeat from the subscribed task.
    fn kick(&self);
}

/// Everything the runtime loops need from the board, in one bound.
pub trait Board: DigitalIo + DelayPort + ClockPort + WatchdogPort {}

impl<T: DigitalIo + DelayPort + ClockPort + WatchdogPort> Board for T {}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}
