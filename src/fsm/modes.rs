//! Concrete mode handler functions and table builder.
//!
//! Each mode is three plain `fn` pointers — no closures, no dynamic
//! dispatch, no heap.
//!
//! ```text
//!   SETUP ──[4 digits]──▶ UNARMED ◀──[A + code]── ARMED
//!                            │                     ▲ │
//!                            └──────[A + code]─────┘ │
//!                            ▲                   [breach]
//!                            │                       ▼
//!                            └──────[A + code]── TRIGGERED
//! ```

use super::context::{AlarmContext, Effect, EntryOutcome};
use super::{ModeDescriptor, SystemMode};
use crate::drivers::keypad::{BEGIN_ENTRY_KEY, Key};
use crate::pins::Pin;

// ═══════════════════════════════════════════════════════════════════════════
//  Table builder
// ═══════════════════════════════════════════════════════════════════════════

/// Build the static mode table.  Called once at startup.
pub fn build_mode_table() -> [ModeDescriptor; SystemMode::COUNT] {
    [
        ModeDescriptor {
            mode: SystemMode::Setup,
            name: "Setup",
            on_enter: Some(setup_enter),
            on_exit: None,
            on_key: setup_key,
        },
        ModeDescriptor {
            mode: SystemMode::Unarmed,
            name: "Unarmed",
            on_enter: Some(unarmed_enter),
            on_exit: None,
            on_key: unarmed_key,
        },
        ModeDescriptor {
            mode: SystemMode::Armed,
            name: "Armed",
            on_enter: Some(armed_enter),
            on_exit: None,
            on_key: armed_key,
        },
        ModeDescriptor {
            mode: SystemMode::Triggered,
            name: "Triggered",
            on_enter: Some(triggered_enter),
            on_exit: Some(triggered_exit),
            on_key: triggered_key,
        },
    ]
}

/// Queue the resting prompt for `mode` (display assumed cleared).
pub fn idle_prompt(ctx: &mut AlarmContext, mode: SystemMode) {
    match mode {
        SystemMode::Setup => {
            ctx.emit(Effect::Print("Set Passcode: "));
            ctx.emit(Effect::SetCursor { col: 0, row: 1 });
        }
        other => ctx.emit(Effect::Print(other.name())),
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  SETUP — capture the passcode
// ═══════════════════════════════════════════════════════════════════════════

fn setup_enter(ctx: &mut AlarmContext) {
    idle_prompt(ctx, SystemMode::Setup);
}

fn setup_key(ctx: &mut AlarmContext, key: Key) -> Option<SystemMode> {
    let Key::Digit(d) = key else {
        return None;
    };
    ctx.emit(Effect::Print("*"));
    if ctx.attempt.push(d) {
        ctx.passcode = ctx.attempt.to_passcode();
        ctx.outcome = Some(EntryOutcome::PasscodeSet);
        return Some(SystemMode::Unarmed);
    }
    None
}

// ═══════════════════════════════════════════════════════════════════════════
//  UNARMED / ARMED / TRIGGERED — shared entry handling
// ═══════════════════════════════════════════════════════════════════════════

/// `A` opens entry, digits fill it, the fourth digit decides.
fn entry_key(
    ctx: &mut AlarmContext,
    key: Key,
    mode: SystemMode,
    on_success: SystemMode,
) -> Option<SystemMode> {
    match key {
        Key::Function(BEGIN_ENTRY_KEY) if !ctx.entering => {
            ctx.entering = true;
            ctx.emit(Effect::Clear);
            ctx.emit(Effect::Print("Enter Passcode: "));
            ctx.emit(Effect::SetCursor { col: 0, row: 1 });
            None
        }
        Key::Digit(d) if ctx.entering => {
            ctx.emit(Effect::Print("*"));
            if !ctx.attempt.push(d) {
                return None;
            }
            let correct = ctx
                .passcode
                .as_ref()
                .is_some_and(|code| ctx.attempt.matches(code));
            ctx.reset_entry();
            if correct {
                ctx.outcome = Some(EntryOutcome::Accepted);
                Some(on_success)
            } else {
                ctx.outcome = Some(EntryOutcome::Rejected);
                incorrect_passcode(ctx, mode);
                None
            }
        }
        _ => None,
    }
}

fn incorrect_passcode(ctx: &mut AlarmContext, mode: SystemMode) {
    ctx.emit(Effect::Clear);
    ctx.emit(Effect::Print("Incorrect"));
    ctx.emit(Effect::SetCursor { col: 0, row: 1 });
    ctx.emit(Effect::Print("Passcode"));
    ctx.emit(Effect::Delay {
        ms: ctx.incorrect_display_ms,
    });
    ctx.emit(Effect::Clear);
    idle_prompt(ctx, mode);
}

// ═══════════════════════════════════════════════════════════════════════════
//  UNARMED
// ═══════════════════════════════════════════════════════════════════════════

fn unarmed_enter(ctx: &mut AlarmContext) {
    ctx.emit(Effect::Clear);
    idle_prompt(ctx, SystemMode::Unarmed);
}

fn unarmed_key(ctx: &mut AlarmContext, key: Key) -> Option<SystemMode> {
    entry_key(ctx, key, SystemMode::Unarmed, SystemMode::Armed)
}

// ═══════════════════════════════════════════════════════════════════════════
//  ARMED — sensors live
// ═══════════════════════════════════════════════════════════════════════════

fn armed_enter(ctx: &mut AlarmContext) {
    ctx.emit(Effect::Drive(Pin::MicrophoneEnable, true));
    ctx.emit(Effect::Clear);
    idle_prompt(ctx, SystemMode::Armed);
}

fn armed_key(ctx: &mut AlarmContext, key: Key) -> Option<SystemMode> {
    entry_key(ctx, key, SystemMode::Armed, SystemMode::Unarmed)
}

// ═══════════════════════════════════════════════════════════════════════════
//  TRIGGERED — alarm sounding
// ═══════════════════════════════════════════════════════════════════════════

fn triggered_enter(ctx: &mut AlarmContext) {
    ctx.emit(Effect::Drive(Pin::AlarmLeds, true));
    ctx.emit(Effect::Drive(Pin::MicrophoneEnable, false));
    ctx.emit(Effect::Drive(Pin::Buzzer, true));
    ctx.emit(Effect::Clear);
    idle_prompt(ctx, SystemMode::Triggered);
}

fn triggered_exit(ctx: &mut AlarmContext) {
    ctx.emit(Effect::Drive(Pin::Buzzer, false));
    ctx.emit(Effect::Drive(Pin::AlarmLeds, false));
}

fn triggered_key(ctx: &mut AlarmContext, key: Key) -> Option<SystemMode> {
    entry_key(ctx, key, SystemMode::Triggered, SystemMode::Unarmed)
}
