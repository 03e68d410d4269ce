//! Debounce: an edge must survive the settle delay, and a key dispatches
//! at most once per press.

use std::sync::Arc;

use crate::mock_hw::{MockBoard, MockDisplay, RecordingSink, TestSystem, boot, position};

use alarmctl::app::ports::{ClockPort, DigitalIo};
use alarmctl::config::AlarmConfig;
use alarmctl::pins::COLUMN_PINS;
use alarmctl::system::AlarmSystem;

/// Put the scanner on `key`'s row and raise its column.
fn hold(system: &TestSystem, board: &MockBoard, key: char) -> usize {
    let (row, col) = position(key);
    while system.current_row() != row {
        system.row_scan_step(board);
    }
    board.set_level(COLUMN_PINS[col], true);
    system.on_column_rise();
    col
}

#[test]
fn bounce_released_inside_settle_window_is_dropped() {
    let board = MockBoard::new();
    let system = Arc::new(AlarmSystem::new(
        AlarmConfig::default(),
        MockDisplay::new(),
        RecordingSink::default(),
    ));
    system.start(&board);

    let col = hold(&system, &board, '5');
    let sys = Arc::clone(&system);
    board.on_delay(move |b, _ms| {
        b.set_level(COLUMN_PINS[col], false);
        sys.on_column_fall();
    });

    assert!(!system.key_dispatch_step(&board));
    assert_eq!(system.with_service(|s| s.attempt_len()), 0);
    assert!(!system.irq().debounced());
}

#[test]
fn settle_delay_is_the_configured_debounce() {
    let (system, board) = boot();
    hold(&system, &board, '1');
    let before = board.now_us();
    assert!(system.key_dispatch_step(&board));
    assert_eq!(board.now_us() - before, 10_000);
}

#[test]
fn no_press_no_delay() {
    let (system, board) = boot();
    assert!(!system.key_dispatch_step(&board));
    assert_eq!(board.now_us(), 0);
}

#[test]
fn release_and_repress_dispatches_again() {
    let (system, board) = boot();
    let col = hold(&system, &board, '7');
    assert!(system.key_dispatch_step(&board));
    assert!(!system.key_dispatch_step(&board));

    board.set_level(COLUMN_PINS[col], false);
    system.on_column_fall();
    board.set_level(COLUMN_PINS[col], true);
    system.on_column_rise();
    assert!(system.key_dispatch_step(&board));
    assert_eq!(system.with_service(|s| s.attempt_len()), 2);
}

#[test]
fn flag_without_column_level_debounces_but_dispatches_nothing() {
    let (system, board) = boot();
    // Edge seen, but the line is already low when the dispatcher reads it.
    system.on_column_rise();
    assert!(!system.key_dispatch_step(&board));
    assert!(system.irq().debounced());
    assert!(!board.read(COLUMN_PINS[0]));
    assert_eq!(system.with_service(|s| s.attempt_len()), 0);
}
