//! One-shot PIR interrupt setup.
//!
//! Configures the PIR GPIO with raw ESP-IDF sys calls and registers the
//! edge handler that feeds [`PIR_DEBOUNCER`](crate::motion::PIR_DEBOUNCER).
//! Called once by the task scheduler before the loops start.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

// ── Error type ────────────────────────────────────────────────

/// Errors during one-shot peripheral initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwInitError {
    GpioConfigFailed(i32),
    IsrInstallFailed(i32),
    HandlerAddFailed(i32),
}

impl core::fmt::Display for HwInitError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::GpioConfigFailed(rc) => write!(f, "GPIO config failed (rc={})", rc),
            Self::IsrInstallFailed(rc) => write!(f, "GPIO ISR service install failed (rc={})", rc),
            Self::HandlerAddFailed(rc) => write!(f, "GPIO ISR handler add failed (rc={})", rc),
        }
    }
}

impl From<HwInitError> for crate::error::Error {
    fn from(e: HwInitError) -> Self {
        match e {
            HwInitError::GpioConfigFailed(_) => Self::Init("PIR GPIO config failed"),
            HwInitError::IsrInstallFailed(_) => Self::Init("GPIO ISR service install failed"),
            HwInitError::HandlerAddFailed(_) => Self::Init("PIR ISR handler add failed"),
        }
    }
}

// ── PIR ISR ───────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
use crate::pins;

#[cfg(target_os = "espidf")]
unsafe extern "C" fn pir_gpio_isr(_arg: *mut core::ffi::c_void) {
    // SAFETY: esp_timer_get_time is a RTC counter read; safe in ISR context.
    let now_ms = (unsafe { esp_timer_get_time() } / 1_000) as u32;
    crate::motion::PIR_DEBOUNCER.on_edge_interrupt(now_ms);
}

/// Configure the PIR pin (input, pull-down, rising edge) and arm its ISR.
#[cfg(target_os = "espidf")]
pub fn init_motion_interrupt() -> Result<(), HwInitError> {
    let cfg = gpio_config_t {
        pin_bit_mask: 1u64 << pins::PIR_GPIO,
        mode: gpio_mode_t_GPIO_MODE_INPUT,
        pull_up_en: gpio_pullup_t_GPIO_PULLUP_DISABLE,
        pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_ENABLE,
        intr_type: gpio_int_type_t_GPIO_INTR_POSEDGE,
    };
    // SAFETY: called once from the scheduler before the loops start;
    // the handler only touches atomics.
    unsafe {
        let ret = gpio_config(&cfg);
        if ret != ESP_OK as i32 {
            return Err(HwInitError::GpioConfigFailed(ret));
        }

        esp_idf_hal::delay::FreeRtos::delay_ms(pins::PIR_SETTLE_MS);

        // ESP_ERR_INVALID_STATE means the service is already installed.
        let ret = gpio_install_isr_service(0);
        if ret != ESP_OK as i32 && ret != ESP_ERR_INVALID_STATE as i32 {
            return Err(HwInitError::IsrInstallFailed(ret));
        }

        let ret = gpio_isr_handler_add(pins::PIR_GPIO, Some(pir_gpio_isr), core::ptr::null_mut());
        if ret != ESP_OK as i32 {
            return Err(HwInitError::HandlerAddFailed(ret));
        }
        gpio_intr_enable(pins::PIR_GPIO);
    }
    log::info!("hw_init: PIR interrupt armed on GPIO{}", pins::PIR_GPIO);
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn init_motion_interrupt() -> Result<(), HwInitError> {
    log::info!("hw_init(sim): PIR interrupt skipped");
    Ok(())
}
