//! Single-colour LED on a digital output.
//!
//! Generic over any `embedded_hal::digital::OutputPin`: on ESP-IDF that is
//! an `esp_idf_hal` `PinDriver`, on the host a test double.  The driver
//! remembers the commanded state, so reads never touch the pin.

use embedded_hal::digital::OutputPin;
use log::warn;

pub struct Led<P> {
    pin: P,
    on: bool,
}

impl<P: OutputPin> Led<P> {
    /// Take the pin and drive it to `initially_on`.
    pub fn new(pin: P, initially_on: bool) -> Self {
        let mut led = Self { pin, on: !initially_on };
        led.set(initially_on);
        led
    }

    pub fn set(&mut self, on: bool) {
        let result = if on {
            self.pin.set_high()
        } else {
            self.pin.set_low()
        };
        match result {
            Ok(()) => self.on = on,
            Err(e) => warn!("LED: pin write failed: {:?}", e),
        }
    }

    pub fn toggle(&mut self) {
        self.set(!self.on);
    }

    pub fn is_on(&self) -> bool {
        self.on
    }
}
