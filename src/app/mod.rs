//! Application core: pure domain logic, zero I/O.
//!
//! This module contains the rules for the ButtonLED peripheral: turning
//! button levels into characteristic updates, applying peer writes to the
//! actuated LED, and driving the connection state machine.  All
//! interaction with the BLE stack and GPIO happens through **port traits**
//! defined in [`ports`], keeping this layer fully testable without a radio.

pub mod controller;
pub mod events;
pub mod ports;
