//! Outbound application events.
//!
//! The [`AlarmService`](super::service::AlarmService) emits these through
//! the [`EventSink`](super::ports::EventSink) port.  None of them carries
//! passcode material; key events report only how far entry has progressed.

use crate::fsm::SystemMode;

/// Which sensor path detected an intrusion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreachSource {
    Microphone,
    Ultrasonic,
}

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    /// The service has started (carries the initial mode).
    Started(SystemMode),

    /// The mode machine moved between modes.
    ModeChanged { from: SystemMode, to: SystemMode },

    /// A debounced key was dispatched to the handler of `mode`.
    /// `filled` is the attempt length after the key was handled.
    KeyAccepted { mode: SystemMode, filled: u8 },

    /// Setup captured a complete passcode.
    PasscodeSet,

    /// A complete attempt did not match; the mode is unchanged.
    PasscodeRejected(SystemMode),

    /// A sensor breach moved the system to Triggered.
    Breach(BreachSource),

    /// The idle timer blanked the display.
    DisplayBlanked,
}
