//! Peripheral configuration parameters
//!
//! All tunable parameters for the ButtonLED peripheral.  Pin numbers and
//! input polarity are wiring facts and live in [`crate::pins`] instead.

use serde::{Deserialize, Serialize};

/// Maximum device name length accepted in the configuration.
pub const DEVICE_NAME_MAX: usize = 24;

/// Core peripheral configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeripheralConfig {
    // --- Advertising ---
    /// Local name carried in the advertising payload
    pub device_name: heapless::String<DEVICE_NAME_MAX>,
    /// Legacy advertising interval (milliseconds)
    pub advertising_interval_ms: u32,

    // --- Timing ---
    /// Heartbeat blink period while not connected (milliseconds)
    pub blink_interval_ms: u32,
    /// Runtime diagnostics report period (milliseconds, 0 disables)
    pub diagnostics_interval_ms: u32,

    // --- Initial characteristic values ---
    /// Initial "Button State" value
    pub initial_button_state: u8,
    /// Initial "Button Colour" value
    pub initial_button_colour: u8,
    /// Initial "LED State" value, also the actuated LED's power-on level
    pub initial_led_state: u8,
}

impl Default for PeripheralConfig {
    fn default() -> Self {
        let mut device_name = heapless::String::new();
        // "ButtonLED" always fits DEVICE_NAME_MAX.
        let _ = device_name.push_str("ButtonLED");

        Self {
            device_name,
            advertising_interval_ms: 1000,

            blink_interval_ms: 500,
            diagnostics_interval_ms: 0,

            initial_button_state: 0,
            initial_button_colour: 0,
            initial_led_state: 1,
        }
    }
}

impl PeripheralConfig {
    /// Power-on level of the actuated LED.
    pub fn initial_led_on(&self) -> bool {
        self.initial_led_state != 0
    }
}
