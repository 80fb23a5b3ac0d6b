//! Button and LED drivers, and one-shot GPIO interrupt setup.

pub mod button;
pub mod hw_init;
pub mod led;
