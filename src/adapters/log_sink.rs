//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the `log` facade (the ESP-IDF logger on the device, UART / USB-CDC in
//! production).

use log::{debug, info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

fn on_off(on: bool) -> &'static str {
    if on { "ON" } else { "OFF" }
}

/// Adapter that logs every [`AppEvent`] to the serial console.
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Started => info!("START | waiting for BLE stack"),
            AppEvent::InitFailed(e) => warn!("BLE | initialization failed: {}", e),
            AppEvent::StackReady { address } => match address {
                Some(a) => info!(
                    "BLE | ready, address {:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
                    a[5], a[4], a[3], a[2], a[1], a[0]
                ),
                None => info!("BLE | ready"),
            },
            AppEvent::ServiceRegistered { handles } => {
                info!("GATT | service registered, value handles {:?}", handles);
            }
            AppEvent::StateChanged { from, to } => info!("STATE | {} -> {}", from, to),
            AppEvent::AdvertisingStarted { interval_ms } => {
                info!("ADV | advertising every {} ms", interval_ms);
            }
            AppEvent::AdvertisingFailed { call, error } => warn!("ADV | {} failed: {}", call, error),
            AppEvent::Connected { led_on } => {
                info!("CONN | Now Connected... Starting LED State is {}", on_off(*led_on));
            }
            AppEvent::Disconnected { led_on } => {
                info!("CONN | Now Disconnected. LED State remains {}", on_off(*led_on));
            }
            AppEvent::ButtonClicked(button) => info!("INPUT | Button {} was pressed!", button.number()),
            AppEvent::ValueNotified {
                handle,
                role,
                value,
                changed,
            } => {
                if *changed {
                    info!("GATT | {} = {} (handle {})", role.description(), value, handle.0);
                } else {
                    debug!(
                        "GATT | {} = {} (handle {}), value unchanged",
                        role.description(),
                        value,
                        handle.0
                    );
                }
            }
            AppEvent::LedWritten { on, changed } => {
                if *changed {
                    info!("LED | LED State is now {}", on_off(*on));
                } else {
                    info!("LED | LED State is still {}", on_off(*on));
                }
            }
            AppEvent::MalformedWrite { handle, len } => {
                warn!("GATT | discarded {}-byte write to handle {}", len, handle.0);
            }
            AppEvent::UpdatesEnabled(h) => info!("GATT | updates enabled on handle {}", h.0),
            AppEvent::UpdatesDisabled(h) => info!("GATT | updates disabled on handle {}", h.0),
            AppEvent::ConfirmationReceived(h) => {
                info!("GATT | confirmation received on handle {}", h.0);
            }
            AppEvent::Diagnostics(m) => info!(
                "DIAG | handled={} dropped={} malformed={} adv_failures={} notified={} heap={}",
                m.tasks_handled,
                m.tasks_dropped,
                m.malformed_writes,
                m.advertising_failures,
                m.notifications,
                m.heap_free,
            ),
        }
    }
}
