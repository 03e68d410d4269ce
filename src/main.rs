//! alarmctl firmware — main entry point.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  HardwareAdapter          LcdDisplay         LogEventSink      │
//! │  (Io+Delay+Clock+Wdt)     (DisplayPort)      (EventSink)       │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │          AlarmSystem · AlarmService · ModeMachine      │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  GPIO ISRs · esp_timer tick · row scanner · key dispatcher     │
//! │  deferred worker (this thread)                                 │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use std::sync::OnceLock;

use anyhow::Result;
use esp_idf_hal::delay::Ets;
use esp_idf_hal::i2c::{I2cConfig, I2cDriver};
use esp_idf_hal::peripherals::Peripherals;
use esp_idf_hal::units::FromValueType;
use log::{info, warn};

use alarmctl::adapters::hardware::HardwareAdapter;
use alarmctl::adapters::lcd_display::LcdDisplay;
use alarmctl::adapters::log_sink::LogEventSink;
use alarmctl::config::AlarmConfig;
use alarmctl::drivers::hw_init::{self, IsrHandlers};
use alarmctl::drivers::task_pin::{Core, spawn_on_core};
use alarmctl::drivers::{hw_timer, watchdog};
use alarmctl::error::Error;
use alarmctl::pins;
use alarmctl::system::AlarmSystem;

type Display = LcdDisplay<'static, I2cDriver<'static>, Ets>;

static SYSTEM: OnceLock<AlarmSystem<Display, LogEventSink>> = OnceLock::new();
static BOARD: OnceLock<HardwareAdapter> = OnceLock::new();

// ── Interrupt and tick handlers ───────────────────────────────
//
// Registered as plain fn pointers; each one is a no-op until both
// statics are populated.

fn column_rise() {
    if let Some(s) = SYSTEM.get() {
        s.on_column_rise();
    }
}

fn column_fall() {
    if let Some(s) = SYSTEM.get() {
        s.on_column_fall();
    }
}

fn microphone_rise() {
    if let (Some(s), Some(b)) = (SYSTEM.get(), BOARD.get()) {
        s.on_microphone_rise(b);
    }
}

fn echo_rise() {
    if let (Some(s), Some(b)) = (SYSTEM.get(), BOARD.get()) {
        s.on_echo_rise(b);
    }
}

fn echo_fall() {
    if let Some(s) = SYSTEM.get() {
        s.on_echo_fall();
    }
}

fn tick() {
    if let (Some(s), Some(b)) = (SYSTEM.get(), BOARD.get()) {
        s.on_timer_tick(b);
    }
}

// ── Main ──────────────────────────────────────────────────────

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;
    info!("alarmctl v{}", env!("CARGO_PKG_VERSION"));

    if watchdog::last_reset_was_watchdog() {
        warn!("Boot: previous reset was a watchdog reset");
    }

    let config = AlarmConfig::from_build_env();

    // ── 2. Peripherals ────────────────────────────────────────
    hw_init::init_gpio().map_err(Error::from)?;

    let peripherals = Peripherals::take()?;
    // SDA/SCL must match pins::I2C_SDA_GPIO / pins::I2C_SCL_GPIO.
    let i2c = I2cDriver::new(
        peripherals.i2c0,
        peripherals.pins.gpio8,
        peripherals.pins.gpio9,
        &I2cConfig::new().baudrate(100.kHz().into()),
    )?;
    // The display borrows its bus and delay for the life of the firmware.
    let i2c: &'static mut I2cDriver<'static> = Box::leak(Box::new(i2c));
    let delay: &'static mut Ets = Box::leak(Box::new(Ets));
    let lcd = LcdDisplay::init(i2c, delay, pins::LCD_I2C_ADDRESS).map_err(Error::from)?;
    info!("LCD ready at 0x{:02x}", pins::LCD_I2C_ADDRESS);

    let board = BOARD.get_or_init(|| {
        HardwareAdapter::new(watchdog::Watchdog::configure(config.watchdog_timeout_ms))
    });

    // ── 3. Domain core ────────────────────────────────────────
    let system = SYSTEM.get_or_init(|| AlarmSystem::new(config.clone(), lcd, LogEventSink::new()));
    system.start(board);

    // ── 4. Interrupts and tick ────────────────────────────────
    hw_init::init_isr_service(IsrHandlers {
        column_rise,
        column_fall,
        microphone_rise,
        echo_rise,
        echo_fall,
    })
    .map_err(Error::from)?;
    hw_timer::start_tick(config.timer_tick_us, tick).map_err(Error::from)?;

    // ── 5. Worker threads ─────────────────────────────────────
    spawn_on_core(Core::App, 5, 6, "row-scan\0", move || {
        system.run_row_scanner(board);
    })?;
    spawn_on_core(Core::App, 5, 8, "key-dispatch\0", move || {
        system.run_key_dispatcher(board);
    })?;

    // ── 6. This thread becomes the deferred worker ────────────
    system.run_deferred_worker(board)
}
