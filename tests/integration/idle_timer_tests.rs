//! Idle blanking: a 10 s quiet period turns the backlight off once; any
//! validated keypress re-arms the timer and relights the display.

use crate::mock_hw::{boot, boot_with, events, line, press_key, press_keys, run_for, TestSystem};

use alarmctl::app::events::AppEvent;
use alarmctl::config::AlarmConfig;
use alarmctl::fsm::SystemMode;
use alarmctl::timers::TimerId;

const SECOND: u64 = 1_000_000;

fn lit(system: &TestSystem) -> bool {
    system.with_service(|s| s.display().lit)
}

fn blanks(system: &TestSystem) -> usize {
    events(system)
        .iter()
        .filter(|e| matches!(e, AppEvent::DisplayBlanked))
        .count()
}

#[test]
fn quiet_period_blanks_once() {
    let (system, board) = boot();
    run_for(&system, &board, 9 * SECOND);
    assert!(lit(&system));

    run_for(&system, &board, 2 * SECOND);
    assert!(!lit(&system));
    assert!(!system.irq().display_on());
    assert_eq!(blanks(&system), 1);

    run_for(&system, &board, 30 * SECOND);
    assert_eq!(blanks(&system), 1);
    assert!(!system.timers().is_armed(TimerId::IdleTimeout));
}

#[test]
fn keypress_before_deadline_defers_blank() {
    let (system, board) = boot();
    run_for(&system, &board, 9 * SECOND);
    press_key(&system, &board, '1');
    run_for(&system, &board, 9 * SECOND);
    assert!(lit(&system), "timer was re-armed by the keypress");
    run_for(&system, &board, 2 * SECOND);
    assert!(!lit(&system));
}

#[test]
fn blank_redraws_idle_prompt_for_mode() {
    let (system, board) = boot();
    press_keys(&system, &board, "12");
    run_for(&system, &board, 11 * SECOND);
    assert_eq!(line(&system, 0), "Set Passcode:");
    assert_eq!(line(&system, 1), "");
    assert_eq!(system.with_service(|s| s.attempt_len()), 0);

    press_keys(&system, &board, "5678");
    assert_eq!(system.mode(), SystemMode::Unarmed);
    run_for(&system, &board, 11 * SECOND);
    assert_eq!(line(&system, 0), "Unarmed");
}

#[test]
fn blank_abandons_entry_in_progress() {
    let (system, board) = boot();
    press_keys(&system, &board, "1234A12");
    assert!(system.with_service(|s| s.is_entering()));
    run_for(&system, &board, 11 * SECOND);
    assert!(!system.with_service(|s| s.is_entering()));

    // The remaining digits of the old attempt no longer count.
    press_keys(&system, &board, "34");
    assert_eq!(system.mode(), SystemMode::Unarmed);
}

#[test]
fn keypress_wakes_display_and_is_handled() {
    let (system, board) = boot();
    press_keys(&system, &board, "1234");
    run_for(&system, &board, 11 * SECOND);
    assert!(!lit(&system));

    assert!(press_key(&system, &board, 'A'));
    assert!(lit(&system));
    assert!(system.irq().display_on());
    assert_eq!(line(&system, 0), "Enter Passcode:");
    assert!(system.timers().is_armed(TimerId::IdleTimeout));
}

#[test]
fn keypress_between_expiry_and_worker_cancels_blank() {
    let (system, board) = boot();
    board.advance(10 * SECOND);
    // Expiry fires in interrupt context; the worker has not run yet.
    system.on_timer_tick(&board);
    assert!(!system.irq().display_on());
    assert_eq!(system.deferred().len(), 1);

    press_key(&system, &board, '1');
    assert!(system.irq().display_on());

    system.deferred_step(&board);
    assert!(lit(&system));
    assert_eq!(blanks(&system), 0);
}

#[test]
fn custom_idle_timeout_is_honoured() {
    let config = AlarmConfig {
        idle_timeout_ms: 2_000,
        ..AlarmConfig::default()
    };
    let (system, board) = boot_with(config);
    run_for(&system, &board, SECOND);
    assert!(lit(&system));
    run_for(&system, &board, 2 * SECOND);
    assert!(!lit(&system));
}
