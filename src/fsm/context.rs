//! Shared mutable context threaded through every mode handler.
//!
//! `AlarmContext` is the blackboard the handlers read from and write to:
//! the stored passcode, the attempt in progress, and a list of output
//! [`Effect`]s.  Handlers never touch the display or pins directly; the
//! service replays the effects against the ports after the handler
//! returns, while still holding the system lock.

use heapless::Vec;
use log::warn;

use crate::pins::Pin;

/// Digits in a passcode.
pub const PASSCODE_LEN: usize = 4;

/// Upper bound on effects produced by one dispatch (incorrect sequence
/// plus a transition fits with room to spare).
pub const MAX_EFFECTS: usize = 24;

// ---------------------------------------------------------------------------
// Passcode storage
// ---------------------------------------------------------------------------

/// The passcode captured in Setup.  Immutable afterwards; never persisted.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Passcode([u8; PASSCODE_LEN]);

impl core::fmt::Debug for Passcode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("Passcode(****)")
    }
}

/// Fixed-size entry buffer with a fill position in `0..=PASSCODE_LEN`.
#[derive(Clone, Default)]
pub struct PasscodeAttempt {
    digits: [u8; PASSCODE_LEN],
    len: usize,
}

impl core::fmt::Debug for PasscodeAttempt {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "PasscodeAttempt({}/{})", self.len, PASSCODE_LEN)
    }
}

impl PasscodeAttempt {
    /// Append a digit.  Returns `true` once the buffer holds a full code.
    /// Digits past a full buffer are dropped.
    pub fn push(&mut self, digit: char) -> bool {
        if self.len < PASSCODE_LEN {
            self.digits[self.len] = digit as u8;
            self.len += 1;
        }
        self.is_full()
    }

    pub fn reset(&mut self) {
        self.digits = [0; PASSCODE_LEN];
        self.len = 0;
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_full(&self) -> bool {
        self.len == PASSCODE_LEN
    }

    /// Take the completed code, if full.
    pub fn to_passcode(&self) -> Option<Passcode> {
        self.is_full().then_some(Passcode(self.digits))
    }

    pub fn matches(&self, passcode: &Passcode) -> bool {
        self.is_full() && self.digits == passcode.0
    }
}

// ---------------------------------------------------------------------------
// Output effects (written by handlers; applied by the service)
// ---------------------------------------------------------------------------

/// One output action requested by a mode handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    Clear,
    Print(&'static str),
    SetCursor { col: u8, row: u8 },
    Backlight(bool),
    Drive(Pin, bool),
    /// Blocking pause (the incorrect-passcode message).
    Delay { ms: u32 },
}

/// How a completed entry ended, for event reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryOutcome {
    PasscodeSet,
    Accepted,
    Rejected,
}

// ---------------------------------------------------------------------------
// AlarmContext
// ---------------------------------------------------------------------------

/// The shared context passed to every mode handler.
pub struct AlarmContext {
    /// Set once by Setup.
    pub passcode: Option<Passcode>,
    /// Entry in progress (Setup collects the new code here too).
    pub attempt: PasscodeAttempt,
    /// `A` has opened entry outside Setup.
    pub entering: bool,
    /// Pending outputs, drained by the service after every handler.
    pub effects: Vec<Effect, MAX_EFFECTS>,
    /// Set when a handler completes an entry; taken by the service.
    pub outcome: Option<EntryOutcome>,
    /// How long the incorrect-passcode message stays up.
    pub incorrect_display_ms: u32,
}

impl AlarmContext {
    pub fn new(incorrect_display_ms: u32) -> Self {
        Self {
            passcode: None,
            attempt: PasscodeAttempt::default(),
            entering: false,
            effects: Vec::new(),
            outcome: None,
            incorrect_display_ms,
        }
    }

    /// Queue an output.  Overflow drops the effect with a warning.
    pub fn emit(&mut self, effect: Effect) {
        if self.effects.push(effect).is_err() {
            warn!("effect buffer full, dropping {:?}", effect);
        }
    }

    /// Abandon any entry in progress.
    pub fn reset_entry(&mut self) {
        self.attempt.reset();
        self.entering = false;
    }

    /// Move the queued effects out, leaving the buffer empty.
    pub fn take_effects(&mut self) -> Vec<Effect, MAX_EFFECTS> {
        core::mem::take(&mut self.effects)
    }
}
