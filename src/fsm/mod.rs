//! Function-pointer mode machine.
//!
//! Classic embedded FSM pattern:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  ModeTable                                                   │
//! │  ┌───────────┬───────────┬──────────┬──────────────────────┐ │
//! │  │ Mode      │ on_enter  │ on_exit  │ on_key               │ │
//! │  ├───────────┼───────────┼──────────┼──────────────────────┤ │
//! │  │ Setup     │ fn(ctx)   │    -     │ fn(ctx,key)->Option<>│ │
//! │  │ Unarmed   │ fn(ctx)   │    -     │ fn(ctx,key)->Option<>│ │
//! │  │ Armed     │ fn(ctx)   │    -     │ fn(ctx,key)->Option<>│ │
//! │  │ Triggered │ fn(ctx)   │ fn(ctx)  │ fn(ctx,key)->Option<>│ │
//! │  └───────────┴───────────┴──────────┴──────────────────────┘ │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every debounced key is handed to `on_key` of the **current** mode.  If
//! it returns `Some(next)` and the edge is legal, the engine runs
//! `on_exit` for the current mode, resets the entry buffer, then runs
//! `on_enter` for the next.  Sensor breaches use
//! [`ModeMachine::force_transition`] and go through the same legality
//! check.

pub mod context;
pub mod modes;

use context::AlarmContext;
use log::{info, warn};

use crate::drivers::keypad::Key;

// ---------------------------------------------------------------------------
// Mode identity
// ---------------------------------------------------------------------------

/// Operating modes of the alarm.
/// Must stay in sync with the table built in [`modes::build_mode_table`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum SystemMode {
    Setup = 0,
    Unarmed = 1,
    Armed = 2,
    Triggered = 3,
}

impl SystemMode {
    /// Total number of modes — sizes the table array.
    pub const COUNT: usize = 4;

    /// Decode a mirrored mode byte.
    pub fn from_u8(raw: u8) -> Option<Self> {
        match raw {
            0 => Some(Self::Setup),
            1 => Some(Self::Unarmed),
            2 => Some(Self::Armed),
            3 => Some(Self::Triggered),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Setup => "Setup",
            Self::Unarmed => "Unarmed",
            Self::Armed => "Armed",
            Self::Triggered => "Triggered",
        }
    }

    /// Edges of the mode graph.  Everything else is rejected.
    pub fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Setup, Self::Unarmed)
                | (Self::Unarmed, Self::Armed)
                | (Self::Armed, Self::Unarmed)
                | (Self::Armed, Self::Triggered)
                | (Self::Triggered, Self::Unarmed)
        )
    }
}

// ---------------------------------------------------------------------------
// Function-pointer type aliases
// ---------------------------------------------------------------------------

/// Signature for `on_enter` and `on_exit` actions.
pub type ModeActionFn = fn(&mut AlarmContext);

/// Signature for the per-key handler.
/// Returns `Some(next)` to request a transition, or `None` to stay.
pub type ModeKeyFn = fn(&mut AlarmContext, Key) -> Option<SystemMode>;

/// Static descriptor for one mode.  Stored in a fixed-size array.
pub struct ModeDescriptor {
    pub mode: SystemMode,
    pub name: &'static str,
    pub on_enter: Option<ModeActionFn>,
    pub on_exit: Option<ModeActionFn>,
    pub on_key: ModeKeyFn,
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Result of a transition request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// The mode changed.
    Moved { from: SystemMode, to: SystemMode },
    /// No transition was requested.
    Stayed,
    /// The requested edge is not in the mode graph; nothing happened.
    Rejected { from: SystemMode, to: SystemMode },
}

pub struct ModeMachine {
    /// Fixed-size table indexed by `SystemMode as usize`.
    table: [ModeDescriptor; SystemMode::COUNT],
    current: usize,
}

impl ModeMachine {
    pub fn new(table: [ModeDescriptor; SystemMode::COUNT], initial: SystemMode) -> Self {
        Self {
            table,
            current: initial as usize,
        }
    }

    /// Run the initial `on_enter`.  Call once before the first key.
    pub fn start(&mut self, ctx: &mut AlarmContext) {
        info!("mode machine starting in {}", self.table[self.current].name);
        if let Some(enter) = self.table[self.current].on_enter {
            enter(ctx);
        }
    }

    pub fn current(&self) -> SystemMode {
        self.table[self.current].mode
    }

    /// Hand one key to the current mode's handler.
    pub fn handle_key(&mut self, key: Key, ctx: &mut AlarmContext) -> Transition {
        match (self.table[self.current].on_key)(ctx, key) {
            Some(next) => self.force_transition(next, ctx),
            None => Transition::Stayed,
        }
    }

    /// Request a transition from outside the key path.
    pub fn force_transition(&mut self, next: SystemMode, ctx: &mut AlarmContext) -> Transition {
        let from = self.current();
        if !from.can_transition_to(next) {
            warn!("rejected mode transition {} -> {}", from.name(), next.name());
            return Transition::Rejected { from, to: next };
        }

        info!("mode transition: {} -> {}", from.name(), next.name());

        if let Some(exit) = self.table[self.current].on_exit {
            exit(ctx);
        }
        ctx.reset_entry();
        self.current = next as usize;
        if let Some(enter) = self.table[self.current].on_enter {
            enter(ctx);
        }
        Transition::Moved { from, to: next }
    }
}
