//! Task Watchdog Timer (TWDT) driver.
//!
//! The row-scanner thread is the only subscriber: it feeds the watchdog
//! once per scan step, so a stalled scanner (or a scanner starved by a
//! stuck system lock) resets the board after `watchdog_timeout_ms`.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

use log::info;

pub struct Watchdog {
    timeout_ms: u32,
    #[cfg(not(target_os = "espidf"))]
    feeds: core::sync::atomic::AtomicU32,
}

impl Watchdog {
    /// Reconfigure the TWDT timeout (panic + reset on expiry).  Does not
    /// subscribe any task.
    #[cfg(target_os = "espidf")]
    pub fn configure(timeout_ms: u32) -> Self {
        let cfg = esp_task_wdt_config_t {
            timeout_ms,
            idle_core_mask: 0,
            trigger_panic: true,
        };
        // SAFETY: plain config struct; TWDT is initialized by ESP-IDF at boot.
        let ret = unsafe { esp_task_wdt_reconfigure(&cfg) };
        if ret == ESP_OK as i32 {
            info!("watchdog: {} ms timeout, panic on expiry", timeout_ms);
        } else {
            log::warn!("watchdog: reconfigure returned {} (may already be configured)", ret);
        }
        Self { timeout_ms }
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn configure(timeout_ms: u32) -> Self {
        info!("watchdog(sim): {} ms timeout, feeds counted only", timeout_ms);
        Self {
            timeout_ms,
            feeds: core::sync::atomic::AtomicU32::new(0),
        }
    }

    pub fn timeout_ms(&self) -> u32 {
        self.timeout_ms
    }

    /// Subscribe the calling task.  Returns `false` if the TWDT refused.
    #[cfg(target_os = "espidf")]
    pub fn subscribe_current_task(&self) -> bool {
        // SAFETY: null handle = calling task.
        let ret = unsafe { esp_task_wdt_add(core::ptr::null_mut()) };
        if ret == ESP_OK as i32 {
            info!("watchdog: current task subscribed");
            true
        } else {
            log::warn!("watchdog: failed to subscribe ({})", ret);
            false
        }
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn subscribe_current_task(&self) -> bool {
        true
    }

    /// Feed from a subscribed task.  Harmless from any other task.
    #[cfg(target_os = "espidf")]
    pub fn feed(&self) {
        // SAFETY: resets the calling task's TWDT entry.
        unsafe {
            esp_task_wdt_reset();
        }
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn feed(&self) {
        self.feeds.fetch_add(1, core::sync::atomic::Ordering::Relaxed);
    }

    /// Feeds since construction (host builds only).
    #[cfg(not(target_os = "espidf"))]
    pub fn feed_count(&self) -> u32 {
        self.feeds.load(core::sync::atomic::Ordering::Relaxed)
    }
}

/// `true` if the last reset came from a watchdog (task or interrupt WDT).
#[cfg(target_os = "espidf")]
pub fn last_reset_was_watchdog() -> bool {
    // SAFETY: reads the latched reset reason.
    let reason = unsafe { esp_reset_reason() };
    reason == esp_reset_reason_t_ESP_RST_TASK_WDT
        || reason == esp_reset_reason_t_ESP_RST_INT_WDT
        || reason == esp_reset_reason_t_ESP_RST_WDT
}

#[cfg(not(target_os = "espidf"))]
pub fn last_reset_was_watchdog() -> bool {
    false
}
