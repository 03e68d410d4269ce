//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the ESP-IDF logger (UART / USB-CDC in production).  Key events carry
//! progress only; no passcode digit ever reaches the log.

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;
use crate::fsm::context::PASSCODE_LEN;

/// Adapter that logs every [`AppEvent`] to the serial console.
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Started(mode) => {
                info!("START | initial_mode={}", mode.name());
            }
            AppEvent::ModeChanged { from, to } => {
                info!("MODE | {} -> {}", from.name(), to.name());
            }
            AppEvent::KeyAccepted { mode, filled } => {
                info!("KEY | mode={} | entry {}/{}", mode.name(), filled, PASSCODE_LEN);
            }
            AppEvent::PasscodeSet => {
                info!("MODE | passcode stored");
            }
            AppEvent::PasscodeRejected(mode) => {
                info!("KEY | incorrect passcode in {}", mode.name());
            }
            AppEvent::Breach(source) => {
                warn!("BREACH | source={:?}", source);
            }
            AppEvent::DisplayBlanked => {
                info!("IDLE | display blanked");
            }
        }
    }
}
