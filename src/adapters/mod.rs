//! Adapters — concrete implementations of the hexagonal port traits.
//!
//! | Adapter    | Implements                         | Connects to          |
//! |------------|------------------------------------|----------------------|
//! | `hardware` | DigitalIo, DelayPort, ClockPort,   | ESP32 GPIO, delays,  |
//! |            | WatchdogPort                       | esp_timer, TWDT      |
//! | `lcd_display` | DisplayPort                     | LCM1602 over I²C     |
//! | `log_sink` | EventSink                          | Serial log output    |
//! | `time`     | (clock helpers)                    | ESP32 system timer   |

pub mod hardware;
pub mod lcd_display;
pub mod log_sink;
pub mod time;
