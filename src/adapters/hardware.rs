//! Hardware adapter: bridges the indicator LEDs to the domain port.
//!
//! Owns the three [`Led`] drivers and exposes them through
//! [`OutputPort`].  Generic over the pin type so the same adapter runs on
//! `esp_idf_hal` pin drivers and on host test doubles.

use embedded_hal::digital::OutputPin;

use crate::app::ports::{Indicator, OutputPort};
use crate::drivers::led::Led;

/// Concrete adapter that combines the LEDs behind [`OutputPort`].
pub struct HardwareAdapter<P> {
    status: Led<P>,
    activity: Led<P>,
    actuated: Led<P>,
}

impl<P: OutputPin> HardwareAdapter<P> {
    /// Status and activity LEDs power on lit; the actuated LED starts at
    /// `actuated_on`.
    pub fn new(status: P, activity: P, actuated: P, actuated_on: bool) -> Self {
        Self {
            status: Led::new(status, true),
            activity: Led::new(activity, true),
            actuated: Led::new(actuated, actuated_on),
        }
    }

    fn led(&self, indicator: Indicator) -> &Led<P> {
        match indicator {
            Indicator::Status => &self.status,
            Indicator::Activity => &self.activity,
            Indicator::Actuated => &self.actuated,
        }
    }

    fn led_mut(&mut self, indicator: Indicator) -> &mut Led<P> {
        match indicator {
            Indicator::Status => &mut self.status,
            Indicator::Activity => &mut self.activity,
            Indicator::Actuated => &mut self.actuated,
        }
    }
}

// ── OutputPort implementation ─────────────────────────────────

impl<P: OutputPin> OutputPort for HardwareAdapter<P> {
    fn set(&mut self, indicator: Indicator, on: bool) {
        self.led_mut(indicator).set(on);
    }

    fn is_on(&self, indicator: Indicator) -> bool {
        self.led(indicator).is_on()
    }

    fn toggle(&mut self, indicator: Indicator) {
        self.led_mut(indicator).toggle();
    }
}
