//! Flags shared between interrupt context and the worker threads.
//!
//! ```text
//!  column ISR ──▶ key_pressed / debounced ◀── key dispatcher
//!  echo ISR   ──▶ echo_active            ◀── timer tick (ticker, echo timeout)
//!  timer tick ──▶ display_on             ◀── key dispatcher, deferred worker
//!  service    ──▶ mode mirror            ◀── timer tick, echo timeout
//! ```
//!
//! Everything here is a single atomic word so it can be touched from an
//! ISR without a lock.  The authoritative mode lives in the service behind
//! the system lock; `mode` is only a mirror published after every locked
//! operation so interrupt paths can pre-filter cheaply.

use core::sync::atomic::{AtomicBool, AtomicU8, Ordering};

use crate::fsm::SystemMode;

pub struct InterruptState {
    key_pressed: AtomicBool,
    debounced: AtomicBool,
    echo_active: AtomicBool,
    display_on: AtomicBool,
    breach_pending: AtomicBool,
    mode: AtomicU8,
}

impl Default for InterruptState {
    fn default() -> Self {
        Self::new()
    }
}

impl InterruptState {
    pub const fn new() -> Self {
        Self {
            key_pressed: AtomicBool::new(false),
            debounced: AtomicBool::new(false),
            echo_active: AtomicBool::new(false),
            display_on: AtomicBool::new(true),
            breach_pending: AtomicBool::new(false),
            mode: AtomicU8::new(SystemMode::Setup as u8),
        }
    }

    // ── Keypad ────────────────────────────────────────────────

    /// Column rising edge.
    pub fn press(&self) {
        self.key_pressed.store(true, Ordering::Release);
    }

    /// Column falling edge: the key is gone and must debounce again.
    pub fn release(&self) {
        self.key_pressed.store(false, Ordering::Release);
        self.debounced.store(false, Ordering::Release);
    }

    pub fn key_pressed(&self) -> bool {
        self.key_pressed.load(Ordering::Acquire)
    }

    pub fn debounced(&self) -> bool {
        self.debounced.load(Ordering::Acquire)
    }

    pub fn mark_debounced(&self) {
        self.debounced.store(true, Ordering::Release);
    }

    // ── Ultrasonic echo ───────────────────────────────────────

    pub fn set_echo_active(&self, active: bool) {
        self.echo_active.store(active, Ordering::Release);
    }

    pub fn echo_active(&self) -> bool {
        self.echo_active.load(Ordering::Acquire)
    }

    /// Claim the single pending-breach slot.  `false` if one is queued already.
    pub fn claim_breach(&self) -> bool {
        !self.breach_pending.swap(true, Ordering::AcqRel)
    }

    pub fn clear_breach(&self) {
        self.breach_pending.store(false, Ordering::Release);
    }

    pub fn breach_pending(&self) -> bool {
        self.breach_pending.load(Ordering::Acquire)
    }

    // ── Display ───────────────────────────────────────────────

    pub fn display_on(&self) -> bool {
        self.display_on.load(Ordering::Acquire)
    }

    pub fn set_display_on(&self, on: bool) {
        self.display_on.store(on, Ordering::Release);
    }

    /// Turn the flag off; `true` if it was on (at most once per quiet period).
    pub fn take_display_on(&self) -> bool {
        self.display_on.swap(false, Ordering::AcqRel)
    }

    // ── Mode mirror ───────────────────────────────────────────

    pub fn publish_mode(&self, mode: SystemMode) {
        self.mode.store(mode as u8, Ordering::Release);
    }

    pub fn mode(&self) -> SystemMode {
        SystemMode::from_u8(self.mode.load(Ordering::Acquire)).unwrap_or(SystemMode::Setup)
    }
}
