//! Periodic tick source for the timer wheel.
//!
//! On ESP-IDF a single `esp_timer` fires every `timer_tick_us` and calls
//! the registered tick function from the esp_timer task.  On simulation
//! targets a plain thread sleeps between ticks.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

use super::hw_init::HwInitError;

#[cfg(target_os = "espidf")]
static TICK_FN: std::sync::OnceLock<fn()> = std::sync::OnceLock::new();

#[cfg(target_os = "espidf")]
static mut TICK_TIMER: esp_timer_handle_t = core::ptr::null_mut();

#[cfg(target_os = "espidf")]
unsafe extern "C" fn tick_cb(_arg: *mut core::ffi::c_void) {
    if let Some(f) = TICK_FN.get() {
        f();
    }
}

/// Start calling `tick` every `period_us`.
#[cfg(target_os = "espidf")]
pub fn start_tick(period_us: u32, tick: fn()) -> Result<(), HwInitError> {
    if TICK_FN.set(tick).is_err() {
        log::warn!("hw_timer: tick already running");
        return Ok(());
    }
    // SAFETY: TICK_TIMER is written here once at boot from the main task
    // before the callback can fire.
    unsafe {
        let args = esp_timer_create_args_t {
            callback: Some(tick_cb),
            arg: core::ptr::null_mut(),
            dispatch_method: esp_timer_dispatch_t_ESP_TIMER_TASK,
            name: c"alarm-tick".as_ptr(),
            skip_unhandled_events: true,
        };
        let ret = esp_timer_create(&args, &raw mut TICK_TIMER);
        if ret != ESP_OK as i32 {
            return Err(HwInitError::TimerFailed(ret));
        }
        let ret = esp_timer_start_periodic(TICK_TIMER, u64::from(period_us));
        if ret != ESP_OK as i32 {
            return Err(HwInitError::TimerFailed(ret));
        }
    }
    log::info!("hw_timer: tick every {} us", period_us);
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn start_tick(period_us: u32, tick: fn()) -> Result<(), HwInitError> {
    let period = std::time::Duration::from_micros(u64::from(period_us.max(1)));
    std::thread::Builder::new()
        .name("alarm-tick".into())
        .spawn(move || {
            loop {
                std::thread::sleep(period);
                tick();
            }
        })
        .map_err(|e| HwInitError::TimerFailed(e.raw_os_error().unwrap_or(-1)))?;
    log::info!("hw_timer(sim): tick thread every {} us", period_us);
    Ok(())
}
