//! Flow-sensor GPIO and its edge interrupt.
//!
//! Configures the pulse pin as a pulled-up input and routes rising edges to
//! [`flow_isr_handler`](crate::sensors::pulse::flow_isr_handler) through
//! the per-pin GPIO ISR service. Called once from `main()` before the
//! control loop starts.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

// ── Error type ────────────────────────────────────────────────

/// Errors while wiring the pulse interrupt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IsrInitError {
    GpioConfigFailed(i32),
    IsrInstallFailed(i32),
    HandlerAddFailed(i32),
}

impl core::fmt::Display for IsrInitError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::GpioConfigFailed(rc) => write!(f, "flow GPIO config failed (rc={})", rc),
            Self::IsrInstallFailed(rc) => write!(f, "GPIO ISR service install failed (rc={})", rc),
            Self::HandlerAddFailed(rc) => write!(f, "flow ISR handler add failed (rc={})", rc),
        }
    }
}

impl std::error::Error for IsrInitError {}

#[cfg(target_os = "espidf")]
use crate::pins;
#[cfg(target_os = "espidf")]
use crate::sensors::pulse::flow_isr_handler;

#[cfg(target_os = "espidf")]
unsafe extern "C" fn flow_gpio_isr(_arg: *mut core::ffi::c_void) {
    flow_isr_handler();
}

/// Configure the flow pin and register its rising-edge handler.
#[cfg(target_os = "espidf")]
pub fn install_flow_isr() -> Result<(), IsrInitError> {
    let cfg = gpio_config_t {
        pin_bit_mask: 1u64 << pins::FLOW_PULSE_GPIO,
        mode: gpio_mode_t_GPIO_MODE_INPUT,
        pull_up_en: gpio_pullup_t_GPIO_PULLUP_ENABLE,
        pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
        intr_type: gpio_int_type_t_GPIO_INTR_POSEDGE,
    };
    // SAFETY: single call from main() before any ISR is registered.
    let ret = unsafe { gpio_config(&cfg) };
    if ret != ESP_OK as i32 {
        return Err(IsrInitError::GpioConfigFailed(ret));
    }

    // SAFETY: ESP_ERR_INVALID_STATE means the service is already installed.
    // The handler only touches atomics in a `static`.
    unsafe {
        let ret = gpio_install_isr_service(0);
        if ret != ESP_OK as i32 && ret != ESP_ERR_INVALID_STATE as i32 {
            return Err(IsrInitError::IsrInstallFailed(ret));
        }

        let ret = gpio_isr_handler_add(
            pins::FLOW_PULSE_GPIO,
            Some(flow_gpio_isr),
            core::ptr::null_mut(),
        );
        if ret != ESP_OK as i32 {
            return Err(IsrInitError::HandlerAddFailed(ret));
        }
        gpio_intr_enable(pins::FLOW_PULSE_GPIO);
    }

    log::info!("isr: flow pulse on GPIO{} (rising edge)", pins::FLOW_PULSE_GPIO);
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn install_flow_isr() -> Result<(), IsrInitError> {
    log::info!("isr(sim): flow ISR skipped, edges are injected by tests");
    Ok(())
}
