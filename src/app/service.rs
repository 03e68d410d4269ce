//! Application service — the hexagonal core.
//!
//! [`AlarmService`] owns the mode machine, its context, the row scanner,
//! the display and the event sink.  It is the state protected by the
//! system lock: every method assumes the caller holds it.  Pin and delay
//! access flows through ports passed at call sites.
//!
//! ```text
//!  DigitalIo ──▶ ┌─────────────────────────┐ ──▶ EventSink
//!                │      AlarmService       │
//!  DelayPort ──▶ │ ModeMachine · RowScanner│ ──▶ DisplayPort
//!                └─────────────────────────┘
//! ```

use log::{debug, info};

use crate::config::AlarmConfig;
use crate::drivers::keypad::{Key, RowScanner, read_columns};
use crate::fsm::context::{AlarmContext, Effect, EntryOutcome};
use crate::fsm::modes::{build_mode_table, idle_prompt};
use crate::fsm::{ModeMachine, SystemMode, Transition};

use super::events::{AppEvent, BreachSource};
use super::ports::{DelayPort, DigitalIo, DisplayPort, EventSink};

pub struct AlarmService<D, S> {
    machine: ModeMachine,
    ctx: AlarmContext,
    scanner: RowScanner,
    display: D,
    sink: S,
}

impl<D: DisplayPort, S: EventSink> AlarmService<D, S> {
    /// Construct the service.  Does **not** start the mode machine — call
    /// [`start`](Self::start) next.
    pub fn new(config: &AlarmConfig, display: D, sink: S) -> Self {
        Self {
            machine: ModeMachine::new(build_mode_table(), SystemMode::Setup),
            ctx: AlarmContext::new(config.incorrect_passcode_display_ms),
            scanner: RowScanner::new(),
            display,
            sink,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Enter Setup: energize the first row and show the passcode prompt.
    pub fn start(&mut self, io: &(impl DigitalIo + DelayPort)) {
        self.scanner.energize(io);
        self.machine.start(&mut self.ctx);
        self.apply_effects(io);
        self.sink.emit(&AppEvent::Started(self.mode()));
        info!("AlarmService started in {}", self.mode().name());
    }

    // ── Keypad ────────────────────────────────────────────────

    /// Advance the row scanner by one row.
    pub fn scan_next_row(&mut self, io: &impl DigitalIo) {
        self.scanner.advance(io);
    }

    pub fn row(&self) -> usize {
        self.scanner.row()
    }

    /// Resolve the key under the energized row from the live column levels.
    /// Digits take precedence only where the current mode accepts them.
    pub fn read_key(&self, io: &impl DigitalIo) -> Option<Key> {
        let digits_first = self.mode() == SystemMode::Setup || self.ctx.entering;
        Key::from_columns(self.scanner.row(), read_columns(io), digits_first)
    }

    /// Read the pressed key and hand it to the current mode.  Returns the
    /// key that was dispatched, if any column was still asserted.
    pub fn handle_key(&mut self, io: &(impl DigitalIo + DelayPort)) -> Option<Key> {
        let key = self.read_key(io)?;
        let mode = self.mode();
        debug!("key dispatch in {} (row {})", mode.name(), self.scanner.row());

        let transition = self.machine.handle_key(key, &mut self.ctx);
        self.apply_effects(io);

        self.sink.emit(&AppEvent::KeyAccepted {
            mode,
            filled: self.ctx.attempt.len() as u8,
        });
        match self.ctx.outcome.take() {
            Some(EntryOutcome::PasscodeSet) => self.sink.emit(&AppEvent::PasscodeSet),
            Some(EntryOutcome::Rejected) => self.sink.emit(&AppEvent::PasscodeRejected(mode)),
            Some(EntryOutcome::Accepted) | None => {}
        }
        self.report(transition);
        Some(key)
    }

    // ── Sensors ───────────────────────────────────────────────

    /// Armed → Triggered.  Re-checks the mode under the lock; returns
    /// `false` (and changes nothing) if the system is not armed.
    pub fn trigger_breach(
        &mut self,
        source: BreachSource,
        io: &(impl DigitalIo + DelayPort),
    ) -> bool {
        if self.mode() != SystemMode::Armed {
            return false;
        }
        let transition = self
            .machine
            .force_transition(SystemMode::Triggered, &mut self.ctx);
        self.apply_effects(io);
        let moved = matches!(transition, Transition::Moved { .. });
        if moved {
            self.sink.emit(&AppEvent::Breach(source));
        }
        self.report(transition);
        moved
    }

    // ── Display power ─────────────────────────────────────────

    /// Idle blank: backlight off, screen reset to the mode's prompt, any
    /// entry in progress abandoned.
    pub fn blank_display(&mut self, io: &(impl DigitalIo + DelayPort)) {
        self.ctx.reset_entry();
        self.ctx.emit(Effect::Backlight(false));
        self.ctx.emit(Effect::Clear);
        let mode = self.mode();
        idle_prompt(&mut self.ctx, mode);
        self.apply_effects(io);
        self.sink.emit(&AppEvent::DisplayBlanked);
    }

    pub fn wake_display(&mut self) {
        self.display.backlight();
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn mode(&self) -> SystemMode {
        self.machine.current()
    }

    pub fn is_entering(&self) -> bool {
        self.ctx.entering
    }

    pub fn attempt_len(&self) -> usize {
        self.ctx.attempt.len()
    }

    pub fn has_passcode(&self) -> bool {
        self.ctx.passcode.is_some()
    }

    pub fn display(&self) -> &D {
        &self.display
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    // ── Internal ──────────────────────────────────────────────

    fn apply_effects(&mut self, io: &(impl DigitalIo + DelayPort)) {
        for effect in self.ctx.take_effects() {
            match effect {
                Effect::Clear => self.display.clear(),
                Effect::Print(text) => self.display.print(text),
                Effect::SetCursor { col, row } => self.display.set_cursor(col, row),
                Effect::Backlight(true) => self.display.backlight(),
                Effect::Backlight(false) => self.display.no_backlight(),
                Effect::Drive(pin, level) => io.write(pin, level),
                Effect::Delay { ms } => io.delay_ms(ms),
            }
        }
    }

    fn report(&mut self, transition: Transition) {
        if let Transition::Moved { from, to } = transition {
            self.sink.emit(&AppEvent::ModeChanged { from, to });
        }
    }
}
