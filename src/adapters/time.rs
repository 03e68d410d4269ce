//! Monotonic time since boot.
//!
//! - **`target_os = "espidf"`**: `esp_timer_get_time()`, the ESP-IDF
//!   high-resolution timer (microsecond precision, ISR-safe).
//! - **otherwise**: `std::time::Instant` against a lazily captured epoch.

/// Microseconds since boot.
#[cfg(target_os = "espidf")]
pub fn uptime_us() -> u64 {
    // SAFETY: RTC counter read; safe from any context.
    (unsafe { esp_idf_svc::sys::esp_timer_get_time() }).max(0) as u64
}

/// Microseconds since the first call.
#[cfg(not(target_os = "espidf"))]
pub fn uptime_us() -> u64 {
    static EPOCH: std::sync::OnceLock<std::time::Instant> = std::sync::OnceLock::new();
    EPOCH.get_or_init(std::time::Instant::now).elapsed().as_micros() as u64
}
