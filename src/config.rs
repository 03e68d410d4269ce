//! System configuration parameters
//!
//! Every timing constant of the alarm controller lives here.  The defaults
//! match the reference board; a JSON override can be baked in at build
//! time through `ALARM_CONFIG_JSON`.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Core timing configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlarmConfig {
    // --- Keypad ---
    /// Settle delay a key edge must survive before it is dispatched (ms)
    pub debounce_ms: u32,
    /// Pause between row-scanner iterations (µs)
    pub row_scan_interval_us: u32,
    /// Pause between key-dispatcher polls (µs)
    pub key_poll_interval_us: u32,

    // --- Display ---
    /// Quiet period after the last validated keypress before the backlight is blanked (ms)
    pub idle_timeout_ms: u32,
    /// How long "Incorrect Passcode" stays on screen (ms)
    pub incorrect_passcode_display_ms: u32,

    // --- Ultrasonic ---
    /// Echo pulse width marking the detection distance threshold (µs)
    pub echo_timeout_us: u32,
    /// Interval between trigger pulses (ms)
    pub trigger_period_ms: u32,
    /// Width of the trigger pulse (µs)
    pub trigger_pulse_us: u32,

    // --- Supervision ---
    /// Watchdog window; the row scanner must kick within it (ms)
    pub watchdog_timeout_ms: u32,
    /// Resolution of the timer wheel tick (µs)
    pub timer_tick_us: u32,
    /// Sleep between deferred-queue polls when the queue is empty (ms)
    pub deferred_poll_ms: u32,
}

impl Default for AlarmConfig {
    fn default() -> Self {
        Self {
            debounce_ms: 10,
            row_scan_interval_us: 500,
            key_poll_interval_us: 200,

            idle_timeout_ms: 10_000,
            incorrect_passcode_display_ms: 2_000,

            echo_timeout_us: 888, // ≈15 cm round trip
            trigger_period_ms: 500,
            trigger_pulse_us: 10,

            watchdog_timeout_ms: 5_000,
            timer_tick_us: 100,
            deferred_poll_ms: 2,
        }
    }
}

impl AlarmConfig {
    /// Reject combinations that would break the sensing or supervision model.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.debounce_ms == 0 {
            return Err(ConfigError::ValidationFailed("debounce_ms must be non-zero"));
        }
        if self.idle_timeout_ms == 0 {
            return Err(ConfigError::ValidationFailed("idle_timeout_ms must be non-zero"));
        }
        if self.trigger_period_ms == 0 || self.trigger_pulse_us == 0 {
            return Err(ConfigError::ValidationFailed("trigger timing must be non-zero"));
        }
        if u64::from(self.echo_timeout_us) >= u64::from(self.trigger_period_ms) * 1000 {
            return Err(ConfigError::ValidationFailed(
                "echo_timeout_us must be shorter than trigger_period_ms",
            ));
        }
        if self.timer_tick_us == 0 || self.timer_tick_us > self.echo_timeout_us {
            return Err(ConfigError::ValidationFailed(
                "timer_tick_us must be in 1..=echo_timeout_us",
            ));
        }
        // Breach latency is bounded by the poll interval.
        if !(1..=100).contains(&self.deferred_poll_ms) {
            return Err(ConfigError::ValidationFailed("deferred_poll_ms must be in 1..=100"));
        }
        // A full four-row sweep must fit comfortably inside the watchdog window.
        if u64::from(self.row_scan_interval_us) * 4 >= u64::from(self.watchdog_timeout_ms) * 100 {
            return Err(ConfigError::ValidationFailed(
                "row_scan_interval_us too slow for watchdog_timeout_ms",
            ));
        }
        // The dispatcher holds the system lock across the incorrect-passcode
        // pause, which starves the heartbeat for that long.
        if self.incorrect_passcode_display_ms >= self.watchdog_timeout_ms {
            return Err(ConfigError::ValidationFailed(
                "incorrect_passcode_display_ms must be shorter than watchdog_timeout_ms",
            ));
        }
        Ok(())
    }

    /// Parse a JSON override (missing fields keep their defaults) and validate it.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let cfg: Self = serde_json::from_str(text).map_err(|_| ConfigError::Malformed)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Configuration baked in at build time through `ALARM_CONFIG_JSON`.
    pub fn from_build_env() -> Self {
        Self::resolve(option_env!("ALARM_CONFIG_JSON"))
    }

    /// Apply an optional JSON override.  A bad override is logged and the
    /// defaults are used instead: the alarm must still boot.
    pub fn resolve(json: Option<&str>) -> Self {
        let Some(text) = json else {
            return Self::default();
        };
        match Self::from_json(text) {
            Ok(cfg) => {
                log::info!("config: build-time override applied");
                cfg
            }
            Err(e) => {
                log::warn!("config: override rejected ({}), using defaults", e);
                Self::default()
            }
        }
    }

    pub fn idle_timeout_us(&self) -> u64 {
        u64::from(self.idle_timeout_ms) * 1000
    }

    pub fn trigger_period_us(&self) -> u64 {
        u64::from(self.trigger_period_ms) * 1000
    }
}
