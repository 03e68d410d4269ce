//! Logical pin names and their GPIO assignments on the alarm main board.
//!
//! Single source of truth — every driver and port implementation refers to
//! a [`Pin`] rather than a raw GPIO number.  Change a number here and it
//! propagates everywhere.

/// Every digital line the controller reads or drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Pin {
    // ── Keypad rows (outputs, one energized at a time) ────────
    Row0 = 0,
    Row1 = 1,
    Row2 = 2,
    Row3 = 3,

    // ── Keypad columns (inputs, pulled down, edge interrupts) ─
    Col0 = 4,
    Col1 = 5,
    Col2 = 6,
    Col3 = 7,

    // ── Sensors ───────────────────────────────────────────────
    /// Microphone module digital output (rising edge = sound).
    Microphone = 8,
    /// Output gating the microphone line through an AND gate.
    /// LOW masks the microphone interrupt at the hardware level.
    MicrophoneEnable = 9,
    /// HC-SR04 echo line (pulse width ∝ distance).
    UltrasonicEcho = 10,
    /// HC-SR04 trigger line (10 µs pulse starts a measurement).
    UltrasonicTrigger = 11,

    // ── Alarm outputs ─────────────────────────────────────────
    Buzzer = 12,
    AlarmLeds = 13,
}

impl Pin {
    /// Number of logical pins (sizes host-side level bitmaps).
    pub const COUNT: usize = 14;

    /// ESP32-S3 GPIO number wired to this line.
    pub const fn gpio(self) -> i32 {
        match self {
            Self::Row0 => 4,
            Self::Row1 => 5,
            Self::Row2 => 6,
            Self::Row3 => 7,
            Self::Col0 => 15,
            Self::Col1 => 16,
            Self::Col2 => 17,
            Self::Col3 => 18,
            Self::Microphone => 1,
            Self::MicrophoneEnable => 2,
            Self::UltrasonicEcho => 10,
            Self::UltrasonicTrigger => 11,
            Self::Buzzer => 12,
            Self::AlarmLeds => 13,
        }
    }

    /// Bit position of this pin in a level bitmap.
    pub const fn bit(self) -> u32 {
        1 << (self as u8)
    }
}

/// Row output lines indexed by row number.
pub const ROW_PINS: [Pin; 4] = [Pin::Row0, Pin::Row1, Pin::Row2, Pin::Row3];

/// Column input lines indexed by column number.
pub const COLUMN_PINS: [Pin; 4] = [Pin::Col0, Pin::Col1, Pin::Col2, Pin::Col3];

/// Lines configured as push-pull outputs (driven low at boot).
pub const OUTPUT_PINS: [Pin; 8] = [
    Pin::Row0,
    Pin::Row1,
    Pin::Row2,
    Pin::Row3,
    Pin::MicrophoneEnable,
    Pin::UltrasonicTrigger,
    Pin::Buzzer,
    Pin::AlarmLeds,
];

/// Lines configured as pulled-down inputs.
pub const INPUT_PINS: [Pin; 6] = [
    Pin::Col0,
    Pin::Col1,
    Pin::Col2,
    Pin::Col3,
    Pin::Microphone,
    Pin::UltrasonicEcho,
];

// ---------------------------------------------------------------------------
// I²C bus (LCD backpack)
// ---------------------------------------------------------------------------

pub const I2C_SDA_GPIO: i32 = 8;
pub const I2C_SCL_GPIO: i32 = 9;

/// PCF8574 backpack address of the 16×2 LCD.
pub const LCD_I2C_ADDRESS: u8 = 0x27;
