//! One-shot GPIO initialization and the edge-interrupt trampolines.
//!
//! Configures every [`Pin`] with raw ESP-IDF sys calls and installs the
//! per-pin GPIO ISR service.  Called once from `main()` before the worker
//! threads start.
//!
//! Interrupt handlers are plain `fn()` pointers registered through
//! [`IsrHandlers`]; the `extern "C"` trampolines here read the line level
//! to tell a rising edge from a falling one and call the matching handler.
//!
//! Host builds keep the line levels in an atomic bitmap so tests and the
//! simulator can drive inputs with [`set_sim_level`].

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

use std::sync::OnceLock;

use crate::pins::Pin;
#[cfg(target_os = "espidf")]
use crate::pins::{COLUMN_PINS, INPUT_PINS, OUTPUT_PINS};

// ── Error type ────────────────────────────────────────────────

/// Errors during one-shot peripheral initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwInitError {
    GpioConfigFailed(i32),
    IsrInstallFailed(i32),
    TimerFailed(i32),
    /// The LCD did not acknowledge its power-on sequence.
    DisplayInitFailed,
}

impl core::fmt::Display for HwInitError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::GpioConfigFailed(rc) => write!(f, "GPIO config failed (rc={})", rc),
            Self::IsrInstallFailed(rc) => write!(f, "GPIO ISR service install failed (rc={})", rc),
            Self::TimerFailed(rc) => write!(f, "tick timer setup failed (rc={})", rc),
            Self::DisplayInitFailed => write!(f, "LCD init failed"),
        }
    }
}

impl std::error::Error for HwInitError {}

// ── GPIO ──────────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
fn mask_of(pins: &[Pin]) -> u64 {
    pins.iter().fold(0u64, |m, p| m | (1u64 << p.gpio()))
}

/// Outputs start low; inputs are pulled down with interrupts disabled
/// until [`init_isr_service`] picks their edge type.
#[cfg(target_os = "espidf")]
pub fn init_gpio() -> Result<(), HwInitError> {
    // Input+output so `gpio_get_level` reads back what we drive (LED toggle).
    let out_cfg = gpio_config_t {
        pin_bit_mask: mask_of(&OUTPUT_PINS),
        mode: gpio_mode_t_GPIO_MODE_INPUT_OUTPUT,
        pull_up_en: gpio_pullup_t_GPIO_PULLUP_DISABLE,
        pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
        intr_type: gpio_int_type_t_GPIO_INTR_DISABLE,
    };
    // SAFETY: called once from main() before any thread or ISR touches GPIO.
    let ret = unsafe { gpio_config(&out_cfg) };
    if ret != ESP_OK as i32 {
        return Err(HwInitError::GpioConfigFailed(ret));
    }
    for pin in OUTPUT_PINS {
        // SAFETY: pin configured as output just above.
        unsafe { gpio_set_level(pin.gpio(), 0) };
    }

    let in_cfg = gpio_config_t {
        pin_bit_mask: mask_of(&INPUT_PINS),
        mode: gpio_mode_t_GPIO_MODE_INPUT,
        pull_up_en: gpio_pullup_t_GPIO_PULLUP_DISABLE,
        pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_ENABLE,
        intr_type: gpio_int_type_t_GPIO_INTR_DISABLE,
    };
    // SAFETY: as above.
    let ret = unsafe { gpio_config(&in_cfg) };
    if ret != ESP_OK as i32 {
        return Err(HwInitError::GpioConfigFailed(ret));
    }

    log::info!(
        "hw_init: {} outputs low, {} inputs pulled down",
        OUTPUT_PINS.len(),
        INPUT_PINS.len()
    );
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn init_gpio() -> Result<(), HwInitError> {
    SIM_LEVELS.store(0, core::sync::atomic::Ordering::SeqCst);
    log::info!("hw_init(sim): GPIO levels reset");
    Ok(())
}

#[cfg(target_os = "espidf")]
pub fn gpio_read(pin: Pin) -> bool {
    // SAFETY: register read on a configured pin; ISR-safe.
    (unsafe { gpio_get_level(pin.gpio()) }) != 0
}

#[cfg(target_os = "espidf")]
pub fn gpio_write(pin: Pin, high: bool) {
    // SAFETY: register write on a configured output; ISR-safe.
    unsafe {
        gpio_set_level(pin.gpio(), u32::from(high));
    }
}

// ── Host simulation ───────────────────────────────────────────

#[cfg(not(target_os = "espidf"))]
static SIM_LEVELS: core::sync::atomic::AtomicU32 = core::sync::atomic::AtomicU32::new(0);

#[cfg(not(target_os = "espidf"))]
pub fn gpio_read(pin: Pin) -> bool {
    SIM_LEVELS.load(core::sync::atomic::Ordering::SeqCst) & pin.bit() != 0
}

#[cfg(not(target_os = "espidf"))]
pub fn gpio_write(pin: Pin, high: bool) {
    set_sim_level(pin, high);
}

/// Drive a simulated line (host builds only).  Does not fire handlers;
/// call [`dispatch_edge`] for that.
#[cfg(not(target_os = "espidf"))]
pub fn set_sim_level(pin: Pin, high: bool) {
    use core::sync::atomic::Ordering;
    if high {
        SIM_LEVELS.fetch_or(pin.bit(), Ordering::SeqCst);
    } else {
        SIM_LEVELS.fetch_and(!pin.bit(), Ordering::SeqCst);
    }
}

// ── GPIO ISR Service ──────────────────────────────────────────

/// Edge handlers, called from interrupt context.  Must not block, lock a
/// mutex or log.
#[derive(Debug, Clone, Copy)]
pub struct IsrHandlers {
    pub column_rise: fn(),
    pub column_fall: fn(),
    pub microphone_rise: fn(),
    pub echo_rise: fn(),
    pub echo_fall: fn(),
}

static HANDLERS: OnceLock<IsrHandlers> = OnceLock::new();

/// Route an edge on `pin` (whose line now reads `high`) to the registered
/// handler.  The trampolines call this; host code may call it directly to
/// simulate an interrupt.
pub fn dispatch_edge(pin: Pin, high: bool) {
    let Some(h) = HANDLERS.get() else { return };
    match pin {
        Pin::Col0 | Pin::Col1 | Pin::Col2 | Pin::Col3 => {
            if high {
                (h.column_rise)();
            } else {
                (h.column_fall)();
            }
        }
        Pin::Microphone if high => (h.microphone_rise)(),
        Pin::UltrasonicEcho => {
            if high {
                (h.echo_rise)();
            } else {
                (h.echo_fall)();
            }
        }
        _ => {}
    }
}

#[cfg(target_os = "espidf")]
unsafe extern "C" fn edge_isr(arg: *mut core::ffi::c_void) {
    // `arg` carries the logical pin discriminant.
    let pin = match arg as usize {
        4 => Pin::Col0,
        5 => Pin::Col1,
        6 => Pin::Col2,
        7 => Pin::Col3,
        8 => Pin::Microphone,
        10 => Pin::UltrasonicEcho,
        _ => return,
    };
    dispatch_edge(pin, gpio_read(pin));
}

#[cfg(target_os = "espidf")]
unsafe fn attach(pin: Pin, intr: gpio_int_type_t) -> Result<(), HwInitError> {
    // SAFETY: caller guarantees the ISR service is installed.
    unsafe {
        let ret = gpio_set_intr_type(pin.gpio(), intr);
        if ret != ESP_OK as i32 {
            return Err(HwInitError::IsrInstallFailed(ret));
        }
        let ret = gpio_isr_handler_add(pin.gpio(), Some(edge_isr), pin as usize as *mut _);
        if ret != ESP_OK as i32 {
            return Err(HwInitError::IsrInstallFailed(ret));
        }
        gpio_intr_enable(pin.gpio());
    }
    Ok(())
}

/// Install the per-pin GPIO ISR service and enable edge interrupts on
/// the columns (any edge), the microphone (rising) and the echo line
/// (any edge).  Call after the system is started.
#[cfg(target_os = "espidf")]
pub fn init_isr_service(handlers: IsrHandlers) -> Result<(), HwInitError> {
    if HANDLERS.set(handlers).is_err() {
        log::warn!("hw_init: ISR handlers already registered, keeping the first set");
    }
    // SAFETY: ESP_ERR_INVALID_STATE means the service is already installed.
    // Handlers only touch atomics, the timer wheel and the deferred queue.
    unsafe {
        let ret = gpio_install_isr_service(0);
        if ret != ESP_OK as i32 && ret != ESP_ERR_INVALID_STATE as i32 {
            return Err(HwInitError::IsrInstallFailed(ret));
        }
        for pin in COLUMN_PINS {
            attach(pin, gpio_int_type_t_GPIO_INTR_ANYEDGE)?;
        }
        attach(Pin::Microphone, gpio_int_type_t_GPIO_INTR_POSEDGE)?;
        attach(Pin::UltrasonicEcho, gpio_int_type_t_GPIO_INTR_ANYEDGE)?;
    }
    log::info!("hw_init: ISR service installed (columns×4, microphone, echo)");
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn init_isr_service(handlers: IsrHandlers) -> Result<(), HwInitError> {
    if HANDLERS.set(handlers).is_err() {
        log::warn!("hw_init(sim): ISR handlers already registered, keeping the first set");
    }
    log::info!("hw_init(sim): edges delivered through dispatch_edge()");
    Ok(())
}
