//! Outbound application events.
//!
//! The [`PeripheralController`](super::controller::PeripheralController),
//! the state machine and the characteristic store emit these through the
//! [`EventSink`](super::ports::EventSink) port.  Adapters on the other side
//! decide what to do with them (serial log, test recorder).

use crate::diagnostics::RuntimeMetrics;
use crate::drivers::button::ButtonId;
use crate::error::{AdvertisingCall, BleError};
use crate::fsm::ConnectionState;
use crate::gatt::{AttrHandle, CHARACTERISTIC_COUNT, Role};

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    /// The controller started and asked the stack to initialise.
    Started,

    /// Stack initialisation failed; the peripheral stays idle.
    InitFailed(BleError),

    /// Stack is up.  Carries the device address when known.
    StackReady { address: Option<[u8; 6]> },

    /// The GATT table was built.
    ServiceRegistered {
        handles: [AttrHandle; CHARACTERISTIC_COUNT],
    },

    /// The connection state machine moved.
    StateChanged {
        from: ConnectionState,
        to: ConnectionState,
    },

    /// Advertising was (re)started.
    AdvertisingStarted { interval_ms: u32 },

    /// An advertising call failed.  Not retried.
    AdvertisingFailed {
        call: AdvertisingCall,
        error: BleError,
    },

    /// A central connected.  `led_on` is the actuated LED at that moment.
    Connected { led_on: bool },

    /// The central left.  `led_on` is the actuated LED at that moment.
    Disconnected { led_on: bool },

    /// A button was released after a press.
    ButtonClicked(ButtonId),

    /// A read/notify value was pushed to the GATT server.
    ValueNotified {
        handle: AttrHandle,
        role: Role,
        value: u8,
        changed: bool,
    },

    /// The peer wrote the LED characteristic.
    LedWritten { on: bool, changed: bool },

    /// An inbound write was discarded for having the wrong length.
    MalformedWrite { handle: AttrHandle, len: usize },

    /// A peer subscribed to notifications.
    UpdatesEnabled(AttrHandle),

    /// A peer unsubscribed.
    UpdatesDisabled(AttrHandle),

    /// A peer confirmed an indication.
    ConfirmationReceived(AttrHandle),

    /// Periodic runtime counters.
    Diagnostics(RuntimeMetrics),
}
