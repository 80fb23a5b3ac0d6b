//! Adapters — concrete implementations of the hexagonal port traits.
//!
//! | Adapter    | Implements         | Connects to                  |
//! |------------|--------------------|------------------------------|
//! | `ble`      | StackPort          | Bluedroid controller + host  |
//! |            | GattServerPort     | Bluedroid GATT server        |
//! |            | GapPort            | Bluedroid GAP advertising    |
//! | `hardware` | OutputPort         | Indicator LEDs (GPIO)        |
//! | `log_sink` | EventSink          | Serial log output            |
//! | `time`     | TimePort           | ESP32 system timer           |

pub mod ble;
pub mod hardware;
pub mod log_sink;
pub mod time;
