//! One-shot button GPIO and interrupt setup.
//!
//! Configures both button pins as inputs with the pull that matches their
//! wiring, enables any-edge interrupts and installs one ISR per pin using
//! raw ESP-IDF sys calls.  Called once from `main()` before the worker
//! loop starts.  The ISRs stay inert until the controller arms the
//! detectors.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

use crate::drivers::button::EdgeDetector;
use crate::events::EventQueue;

// ── Error type ────────────────────────────────────────────────

/// Errors during one-shot peripheral initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwInitError {
    GpioConfigFailed(i32),
    IsrInstallFailed(i32),
    IsrHandlerFailed(i32),
}

impl core::fmt::Display for HwInitError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::GpioConfigFailed(rc) => write!(f, "GPIO config failed (rc={})", rc),
            Self::IsrInstallFailed(rc) => write!(f, "GPIO ISR service install failed (rc={})", rc),
            Self::IsrHandlerFailed(rc) => write!(f, "GPIO ISR handler add failed (rc={})", rc),
        }
    }
}

impl std::error::Error for HwInitError {}

/// Route a sampled pin level to the matching edge handler.
///
/// The ISR samples the pin right after the interrupt; a high level means
/// the line just rose.
pub fn dispatch_edge(detector: &EdgeDetector, pin_high: bool, queue: &EventQueue) {
    if pin_high {
        detector.on_rising_edge(queue);
    } else {
        detector.on_falling_edge(queue);
    }
}

// ── ESP-IDF ───────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
use crate::drivers::button::{ButtonId, INPUTS};
#[cfg(target_os = "espidf")]
use crate::pins;

#[cfg(target_os = "espidf")]
pub fn init_button_inputs() -> Result<(), HwInitError> {
    // SAFETY: Called once from main() before the worker loop; single-threaded.
    unsafe {
        configure_button(pins::BUTTON_A_GPIO, true)?;
        configure_button(pins::BUTTON_B_GPIO, false)?;

        let ret = gpio_install_isr_service(0);
        // ESP_ERR_INVALID_STATE: service already installed by another driver.
        if ret != ESP_OK as i32 && ret != ESP_ERR_INVALID_STATE as i32 {
            return Err(HwInitError::IsrInstallFailed(ret));
        }

        add_handler(pins::BUTTON_A_GPIO, ButtonId::A)?;
        add_handler(pins::BUTTON_B_GPIO, ButtonId::B)?;
    }
    log::info!("hw_init: button ISRs installed");
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn init_button_inputs() -> Result<(), HwInitError> {
    log::info!("hw_init(sim): button ISR setup skipped");
    Ok(())
}

#[cfg(target_os = "espidf")]
unsafe fn configure_button(pin: i32, pull_up: bool) -> Result<(), HwInitError> {
    let cfg = gpio_config_t {
        pin_bit_mask: 1u64 << pin,
        mode: gpio_mode_t_GPIO_MODE_INPUT,
        pull_up_en: if pull_up {
            gpio_pullup_t_GPIO_PULLUP_ENABLE
        } else {
            gpio_pullup_t_GPIO_PULLUP_DISABLE
        },
        pull_down_en: if pull_up {
            gpio_pulldown_t_GPIO_PULLDOWN_DISABLE
        } else {
            gpio_pulldown_t_GPIO_PULLDOWN_ENABLE
        },
        intr_type: gpio_int_type_t_GPIO_INTR_ANYEDGE,
    };
    let ret = unsafe { gpio_config(&cfg) };
    if ret != ESP_OK as i32 {
        return Err(HwInitError::GpioConfigFailed(ret));
    }
    Ok(())
}

#[cfg(target_os = "espidf")]
unsafe fn add_handler(pin: i32, id: ButtonId) -> Result<(), HwInitError> {
    // The ISR argument carries the button, not a pointer.
    let arg = id as usize as *mut core::ffi::c_void;
    let ret = unsafe { gpio_isr_handler_add(pin, Some(button_isr), arg) };
    if ret != ESP_OK as i32 {
        return Err(HwInitError::IsrHandlerFailed(ret));
    }
    Ok(())
}

/// Interrupt context: sample the pin, hand the edge to its detector.
#[cfg(target_os = "espidf")]
unsafe extern "C" fn button_isr(arg: *mut core::ffi::c_void) {
    let (pin, detector) = if arg as usize == ButtonId::A as usize {
        (pins::BUTTON_A_GPIO, &INPUTS.a)
    } else {
        (pins::BUTTON_B_GPIO, &INPUTS.b)
    };
    // SAFETY: read-only register access on a configured input pin.
    let high = unsafe { gpio_get_level(pin) } != 0;
    dispatch_edge(detector, high, &crate::events::EVENT_QUEUE);
}
