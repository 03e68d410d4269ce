//! Microphone and ultrasonic breach paths: ISR entry point → deferred
//! queue → locked mode check.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::mock_hw::{armed_with, boot, events, press_keys, run_for, MockBoard, TestSystem};

use alarmctl::app::events::{AppEvent, BreachSource};
use alarmctl::app::ports::DigitalIo;
use alarmctl::deferred::DeferredWork;
use alarmctl::fsm::SystemMode;
use alarmctl::pins::Pin;

/// One echo pulse of `width_us`, then enough ticks to pass the timeout mark.
fn echo_pulse(system: &TestSystem, board: &MockBoard, width_us: u64) {
    board.set_level(Pin::UltrasonicEcho, true);
    system.on_echo_rise(board);
    run_for(system, board, width_us);
    board.set_level(Pin::UltrasonicEcho, false);
    system.on_echo_fall();
    run_for(system, board, 1_000);
}

fn breaches(system: &TestSystem) -> usize {
    events(system)
        .iter()
        .filter(|e| matches!(e, AppEvent::Breach(_)))
        .count()
}

// ── Microphone ────────────────────────────────────────────────

#[test]
fn microphone_edge_gates_line_and_triggers_when_armed() {
    let (system, board) = armed_with("1234");
    assert!(board.read(Pin::MicrophoneEnable));

    system.on_microphone_rise(&board);
    assert!(!board.read(Pin::MicrophoneEnable), "gated in interrupt context");
    assert_eq!(system.deferred().len(), 1);
    assert_eq!(system.mode(), SystemMode::Armed, "nothing happens until the worker runs");

    system.deferred_step(&board);
    assert_eq!(system.mode(), SystemMode::Triggered);
    assert!(!board.read(Pin::MicrophoneEnable));
    assert!(events(&system).contains(&AppEvent::Breach(BreachSource::Microphone)));
}

#[test]
fn microphone_edge_when_unarmed_reenables_gate() {
    let (system, board) = boot();
    press_keys(&system, &board, "1234");
    system.on_microphone_rise(&board);
    assert!(!board.read(Pin::MicrophoneEnable));
    system.deferred_step(&board);
    assert_eq!(system.mode(), SystemMode::Unarmed);
    assert!(board.read(Pin::MicrophoneEnable));
    assert_eq!(breaches(&system), 0);
}

#[test]
fn repeated_microphone_work_triggers_once() {
    let (system, board) = armed_with("1234");
    system.on_microphone_rise(&board);
    system.on_microphone_rise(&board);
    assert_eq!(system.deferred().len(), 2);
    system.deferred_step(&board);
    assert_eq!(system.mode(), SystemMode::Triggered);
    assert_eq!(breaches(&system), 1);
    // The second item found the system no longer armed and reopened the gate.
    assert!(board.read(Pin::MicrophoneEnable));
    assert!(board.read(Pin::Buzzer));
}

#[test]
fn microphone_edge_reaches_polling_worker_thread() {
    let (system, board) = armed_with("1234");
    let system = Arc::new(system);
    let board = Arc::new(board);
    // Empty polls sleep for real so the worker thread stays cheap.
    board.on_delay(|_, _| std::thread::sleep(Duration::from_millis(1)));
    {
        let system = Arc::clone(&system);
        let board = Arc::clone(&board);
        std::thread::spawn(move || {
            system.run_deferred_worker(&*board);
        });
    }

    system.on_microphone_rise(&*board);
    let deadline = Instant::now() + Duration::from_secs(5);
    while system.mode() != SystemMode::Triggered && Instant::now() < deadline {
        std::thread::sleep(Duration::from_millis(2));
    }
    assert_eq!(system.mode(), SystemMode::Triggered);
    assert!(system.deferred().is_empty());
    assert!(board.read(Pin::Buzzer));
}

// ── Ultrasonic ────────────────────────────────────────────────

#[test]
fn short_echo_when_armed_triggers() {
    let (system, board) = armed_with("1234");
    echo_pulse(&system, &board, 300);
    assert_eq!(system.mode(), SystemMode::Triggered);
    assert!(board.read(Pin::Buzzer));
    assert!(!board.read(Pin::MicrophoneEnable));
    assert!(events(&system).contains(&AppEvent::Breach(BreachSource::Ultrasonic)));
    assert!(!system.irq().breach_pending());
}

#[test]
fn long_echo_is_out_of_range() {
    let (system, board) = armed_with("1234");
    echo_pulse(&system, &board, 2_000);
    assert_eq!(system.mode(), SystemMode::Armed);
    assert_eq!(breaches(&system), 0);
}

#[test]
fn short_echo_when_unarmed_is_ignored() {
    let (system, board) = boot();
    press_keys(&system, &board, "1234");
    echo_pulse(&system, &board, 300);
    assert_eq!(system.mode(), SystemMode::Unarmed);
    assert_eq!(breaches(&system), 0);
    assert!(system.deferred().is_empty());
}

#[test]
fn pending_breach_blocks_a_second_post() {
    let (system, board) = armed_with("1234");
    assert!(system.irq().claim_breach());
    echo_pulse(&system, &board, 300);
    assert_eq!(system.mode(), SystemMode::Armed);
    assert!(system.deferred().is_empty());
}

#[test]
fn rearmed_echo_timeout_measures_from_latest_rise() {
    let (system, board) = armed_with("1234");
    board.set_level(Pin::UltrasonicEcho, true);
    system.on_echo_rise(&board);
    run_for(&system, &board, 500);
    // A second rise replaces the pending timeout.
    system.on_echo_rise(&board);
    run_for(&system, &board, 500);
    board.set_level(Pin::UltrasonicEcho, false);
    system.on_echo_fall();
    run_for(&system, &board, 1_000);
    assert_eq!(system.mode(), SystemMode::Triggered);
}

#[test]
fn trigger_pulse_skipped_while_echo_active() {
    let (system, board) = armed_with("1234");
    board.set_level(Pin::UltrasonicEcho, true);
    system.on_echo_rise(&board);
    let fired_before = system.timers().deadline(alarmctl::timers::TimerId::TriggerTicker);
    // Hold the echo high across a ticker deadline.
    run_for(&system, &board, 600_000);
    assert!(!board.read(Pin::UltrasonicTrigger));
    assert_ne!(
        system.timers().deadline(alarmctl::timers::TimerId::TriggerTicker),
        fired_before
    );
    assert_eq!(system.mode(), SystemMode::Armed);
}

#[test]
fn ultrasonic_work_rechecks_mode_under_lock() {
    let (system, board) = armed_with("1234");
    // Disarm between the post and the worker run.
    assert!(system.irq().claim_breach());
    system.deferred().post(DeferredWork::UltrasonicBreach);
    press_keys(&system, &board, "A1234");
    assert_eq!(system.mode(), SystemMode::Unarmed);

    system.deferred_step(&board);
    assert_eq!(system.mode(), SystemMode::Unarmed);
    assert!(!system.irq().breach_pending(), "claim released");
}
