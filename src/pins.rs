//! GPIO pin assignments for the ButtonLED board.
//!
//! Single source of truth: every driver references this module rather than
//! hard-coding pin numbers.  Input polarity is part of the wiring and is
//! declared next to the pin it belongs to.

use crate::drivers::button::Polarity;

// ---------------------------------------------------------------------------
// Indicator LEDs (active HIGH, series resistor to GND)
// ---------------------------------------------------------------------------

/// Status LED: heartbeat blink while not connected, steady on when connected.
pub const STATUS_LED_GPIO: i32 = 4;
/// Activity LED: on while advertising, off while connected.
pub const ACTIVITY_LED_GPIO: i32 = 5;
/// LED driven by writes to the "LED State" characteristic.
pub const ACTUATED_LED_GPIO: i32 = 6;

// ---------------------------------------------------------------------------
// Buttons
// ---------------------------------------------------------------------------

/// Button A: momentary switch to GND with internal pull-up.
pub const BUTTON_A_GPIO: i32 = 0;
/// Pressing button A pulls the line low, so a press is a falling edge.
pub const BUTTON_A_POLARITY: Polarity = Polarity::ActiveLow;

/// Button B: momentary switch to 3V3 with internal pull-down.
pub const BUTTON_B_GPIO: i32 = 7;
/// Inverted relative to button A: a press is a rising edge.
pub const BUTTON_B_POLARITY: Polarity = Polarity::ActiveHigh;
