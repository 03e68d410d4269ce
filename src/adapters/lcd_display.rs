//! `DisplayPort` over a 16×2 LCM1602 (HD44780 + PCF8574 I²C backpack).
//!
//! The panel protocol lives in `lcd_lcm1602_i2c`; this adapter only maps
//! the port calls onto it, clamps the cursor to the panel and keeps bus
//! failures away from the caller.  A dead display must never stop the
//! alarm, so errors are counted and only the first one is logged.

use core::fmt::Debug;

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;
use lcd_lcm1602_i2c::Backlight;
use lcd_lcm1602_i2c::sync_lcd::Lcd;
use log::warn;

use crate::app::ports::DisplayPort;
use crate::drivers::hw_init::HwInitError;

pub const LCD_COLUMNS: u8 = 16;
pub const LCD_ROWS: u8 = 2;

pub struct LcdDisplay<'a, I, D>
where
    I: I2c,
    D: DelayNs,
{
    lcd: Lcd<'a, I, D>,
    backlit: bool,
    write_errors: u32,
}

impl<'a, I, D> LcdDisplay<'a, I, D>
where
    I: I2c,
    D: DelayNs,
{
    /// Run the panel's power-on sequence at `address` and switch the
    /// backlight on.
    pub fn init(i2c: &'a mut I, delay: &'a mut D, address: u8) -> Result<Self, HwInitError> {
        let lcd = Lcd::new(i2c, delay)
            .with_address(address)
            .with_cursor_on(false)
            .with_rows(LCD_ROWS)
            .init()
            .map_err(|e| {
                warn!("LCD init at 0x{:02x} failed: {:?}", address, e);
                HwInitError::DisplayInitFailed
            })?;
        let mut display = Self {
            lcd,
            backlit: false,
            write_errors: 0,
        };
        display.backlight();
        Ok(display)
    }

    pub fn is_backlit(&self) -> bool {
        self.backlit
    }

    /// I²C transfers that failed since init.
    pub fn write_errors(&self) -> u32 {
        self.write_errors
    }

    fn check<E: Debug>(&mut self, result: Result<(), E>) {
        if let Err(e) = result {
            if self.write_errors == 0 {
                warn!("LCD write failed: {:?} (further failures counted silently)", e);
            }
            self.write_errors = self.write_errors.saturating_add(1);
        }
    }
}

impl<I, D> DisplayPort for LcdDisplay<'_, I, D>
where
    I: I2c,
    D: DelayNs,
{
    fn clear(&mut self) {
        let r = self.lcd.clear();
        self.check(r);
    }

    /// Non-ASCII characters have no glyph in the HD44780 ROM; they show as `?`.
    fn print(&mut self, text: &str) {
        if text.is_ascii() {
            let r = self.lcd.write_str(text);
            self.check(r);
            return;
        }
        let mut buf = [0u8; 4];
        for c in text.chars() {
            let c = if c.is_ascii() { c } else { '?' };
            let r = self.lcd.write_str(c.encode_utf8(&mut buf));
            self.check(r);
        }
    }

    fn set_cursor(&mut self, col: u8, row: u8) {
        let r = self
            .lcd
            .set_cursor(row.min(LCD_ROWS - 1), col.min(LCD_COLUMNS - 1));
        self.check(r);
    }

    fn backlight(&mut self) {
        let r = self.lcd.backlight(Backlight::On);
        self.check(r);
        self.backlit = true;
    }

    fn no_backlight(&mut self) {
        let r = self.lcd.backlight(Backlight::Off);
        self.check(r);
        self.backlit = false;
    }
}
