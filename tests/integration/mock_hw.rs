//! Mock board, display and event sink for integration tests.
//!
//! `MockBoard` keeps pin levels in an atomic bitmap and runs a virtual
//! clock that only moves when the code under test delays (or a test calls
//! [`MockBoard::advance`]).  A delay hook lets a test inject edges while
//! the dispatcher sits in its settle window.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};

use alarmctl::app::events::AppEvent;
use alarmctl::app::ports::{ClockPort, DelayPort, DigitalIo, DisplayPort, EventSink, WatchdogPort};
use alarmctl::config::AlarmConfig;
use alarmctl::drivers::keypad::{COLUMNS, ROWS, key_at};
use alarmctl::pins::{COLUMN_PINS, Pin};
use alarmctl::system::AlarmSystem;

pub type DelayHook = Box<dyn FnMut(&MockBoard, u32) + Send>;

// ── MockBoard ─────────────────────────────────────────────────

pub struct MockBoard {
    levels: AtomicU32,
    now_us: AtomicU64,
    kicks: AtomicU32,
    subscribed: AtomicBool,
    delay_hook: Mutex<Option<DelayHook>>,
}

#[allow(dead_code)]
impl MockBoard {
    pub fn new() -> Self {
        Self {
            levels: AtomicU32::new(0),
            now_us: AtomicU64::new(0),
            kicks: AtomicU32::new(0),
            subscribed: AtomicBool::new(false),
            delay_hook: Mutex::new(None),
        }
    }

    /// Drive an input line (no interrupt is raised).
    pub fn set_level(&self, pin: Pin, high: bool) {
        if high {
            self.levels.fetch_or(pin.bit(), Ordering::SeqCst);
        } else {
            self.levels.fetch_and(!pin.bit(), Ordering::SeqCst);
        }
    }

    pub fn level(&self, pin: Pin) -> bool {
        self.levels.load(Ordering::SeqCst) & pin.bit() != 0
    }

    pub fn advance(&self, us: u64) {
        self.now_us.fetch_add(us, Ordering::SeqCst);
    }

    pub fn kicks(&self) -> u32 {
        self.kicks.load(Ordering::SeqCst)
    }

    pub fn is_subscribed(&self) -> bool {
        self.subscribed.load(Ordering::SeqCst)
    }

    /// Called with the requested milliseconds after every `delay_ms`.
    pub fn on_delay(&self, hook: impl FnMut(&MockBoard, u32) + Send + 'static) {
        *self.delay_hook.lock().unwrap() = Some(Box::new(hook));
    }

    pub fn clear_delay_hook(&self) {
        *self.delay_hook.lock().unwrap() = None;
    }
}

impl Default for MockBoard {
    fn default() -> Self {
        Self::new()
    }
}

impl DigitalIo for MockBoard {
    fn read(&self, pin: Pin) -> bool {
        self.level(pin)
    }

    fn write(&self, pin: Pin, high: bool) {
        self.set_level(pin, high);
    }
}

impl DelayPort for MockBoard {
    fn delay_ms(&self, ms: u32) {
        self.advance(u64::from(ms) * 1000);
        // Take the hook out while it runs so it may delay in turn.
        let hook = self.delay_hook.lock().unwrap().take();
        if let Some(mut hook) = hook {
            hook(self, ms);
            let mut slot = self.delay_hook.lock().unwrap();
            if slot.is_none() {
                *slot = Some(hook);
            }
        }
    }

    fn delay_us(&self, us: u32) {
        self.advance(u64::from(us));
    }
}

impl ClockPort for MockBoard {
    fn now_us(&self) -> u64 {
        self.now_us.load(Ordering::SeqCst)
    }
}

impl WatchdogPort for MockBoard {
    fn subscribe(&self) {
        self.subscribed.store(true, Ordering::SeqCst);
    }

    fn kick(&self) {
        self.kicks.fetch_add(1, Ordering::SeqCst);
    }
}

// ── MockDisplay (16×2) ────────────────────────────────────────

pub const DISPLAY_COLS: usize = 16;
pub const DISPLAY_ROWS: usize = 2;

pub struct MockDisplay {
    cells: [[u8; DISPLAY_COLS]; DISPLAY_ROWS],
    col: usize,
    row: usize,
    pub lit: bool,
    pub clears: u32,
}

#[allow(dead_code)]
impl MockDisplay {
    pub fn new() -> Self {
        Self {
            cells: [[b' '; DISPLAY_COLS]; DISPLAY_ROWS],
            col: 0,
            row: 0,
            lit: true,
            clears: 0,
        }
    }

    /// Visible text of `row`, trailing blanks trimmed.
    pub fn line(&self, row: usize) -> String {
        String::from_utf8_lossy(&self.cells[row]).trim_end().to_string()
    }

    pub fn cursor(&self) -> (usize, usize) {
        (self.col, self.row)
    }
}

impl Default for MockDisplay {
    fn default() -> Self {
        Self::new()
    }
}

impl DisplayPort for MockDisplay {
    fn clear(&mut self) {
        self.cells = [[b' '; DISPLAY_COLS]; DISPLAY_ROWS];
        self.col = 0;
        self.row = 0;
        self.clears += 1;
    }

    fn print(&mut self, text: &str) {
        for b in text.bytes() {
            if self.col < DISPLAY_COLS {
                self.cells[self.row][self.col] = b;
            }
            self.col += 1;
        }
    }

    fn set_cursor(&mut self, col: u8, row: u8) {
        self.col = usize::from(col);
        self.row = usize::from(row).min(DISPLAY_ROWS - 1);
    }

    fn backlight(&mut self) {
        self.lit = true;
    }

    fn no_backlight(&mut self) {
        self.lit = false;
    }
}

// ── RecordingSink ─────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn count(&self, pred: impl Fn(&AppEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}

// ── Harness ───────────────────────────────────────────────────

pub type TestSystem = AlarmSystem<MockDisplay, RecordingSink>;

#[allow(dead_code)]
pub fn boot() -> (TestSystem, MockBoard) {
    boot_with(AlarmConfig::default())
}

pub fn boot_with(config: AlarmConfig) -> (TestSystem, MockBoard) {
    let board = MockBoard::new();
    let system = AlarmSystem::new(config, MockDisplay::new(), RecordingSink::default());
    system.start(&board);
    (system, board)
}

/// Keypad position of `key`.
pub fn position(key: char) -> (usize, usize) {
    for row in 0..ROWS {
        for col in 0..COLUMNS {
            if key_at(row, col) == key {
                return (row, col);
            }
        }
    }
    panic!("{key:?} is not on the keypad");
}

/// Scan to the key's row, assert its column through the edge entry point,
/// run one dispatcher step, then release.  Returns whether it dispatched.
#[allow(dead_code)]
pub fn press_key(system: &TestSystem, board: &MockBoard, key: char) -> bool {
    let (row, col) = position(key);
    while system.current_row() != row {
        system.row_scan_step(board);
    }
    board.set_level(COLUMN_PINS[col], true);
    system.on_column_rise();
    let dispatched = system.key_dispatch_step(board);
    board.set_level(COLUMN_PINS[col], false);
    system.on_column_fall();
    dispatched
}

#[allow(dead_code)]
pub fn press_keys(system: &TestSystem, board: &MockBoard, keys: &str) {
    for k in keys.chars() {
        press_key(system, board, k);
    }
}

/// Advance the clock tick by tick for `us`, firing timers and running any
/// deferred work they post.
#[allow(dead_code)]
pub fn run_for(system: &TestSystem, board: &MockBoard, us: u64) {
    let tick = u64::from(system.config().timer_tick_us);
    let mut elapsed = 0;
    while elapsed < us {
        board.advance(tick);
        elapsed += tick;
        system.on_timer_tick(board);
        system.deferred_step(board);
    }
}

/// Boot, set `code` and arm with it.
#[allow(dead_code)]
pub fn armed_with(code: &str) -> (TestSystem, MockBoard) {
    let (system, board) = boot();
    press_keys(&system, &board, code);
    press_keys(&system, &board, "A");
    press_keys(&system, &board, code);
    (system, board)
}

#[allow(dead_code)]
pub fn line(system: &TestSystem, row: usize) -> String {
    system.with_service(|s| s.display().line(row))
}

#[allow(dead_code)]
pub fn events(system: &TestSystem) -> Vec<AppEvent> {
    system.with_service(|s| s.sink().events.clone())
}
