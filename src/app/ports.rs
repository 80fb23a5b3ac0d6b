//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ PeripheralController (domain)
//!   BLE stack ──▶ StackEvent ──▶ StackEventHandler (controller)
//! ```
//!
//! Driven adapters (BLE stack, LEDs, clock, event sinks) implement these
//! traits.  The [`PeripheralController`](super::controller::PeripheralController)
//! consumes them via generics, so the domain core never touches the radio or
//! GPIO directly.  All stack errors are typed as [`BleError`].

use crate::advertising::{AdvHandle, AdvertisingParameters, AdvertisingPayload};
use crate::error::BleError;
use crate::gatt::{AttrHandle, CHARACTERISTIC_COUNT, ServiceDefinition};

// ───────────────────────────────────────────────────────────────
// Stack port (driven adapter: domain → BLE stack lifecycle)
// ───────────────────────────────────────────────────────────────

pub trait StackPort {
    /// Start bringing the stack up.  Completion (success or failure) is
    /// delivered later as `StackEvent::InitComplete` on the task queue.
    fn initialize(&mut self);

    /// Public device address, once the stack knows it.
    fn address(&self) -> Option<[u8; 6]> {
        None
    }
}

// ───────────────────────────────────────────────────────────────
// GATT server port (driven adapter: domain → attribute table)
// ───────────────────────────────────────────────────────────────

pub trait GattServerPort {
    /// Ask the server to build the service's attribute table.  Returns once
    /// the request is queued; the value handles (in the order of
    /// `def.characteristics`) arrive later as
    /// `StackEvent::ServiceRegistered` on the task queue.
    fn register_service(&mut self, def: &ServiceDefinition) -> Result<(), BleError>;

    /// Set an attribute value and notify subscribed peers.
    fn write(&mut self, handle: AttrHandle, value: &[u8]) -> Result<(), BleError>;
}

// ───────────────────────────────────────────────────────────────
// GAP port (driven adapter: domain → advertising)
// ───────────────────────────────────────────────────────────────

pub trait GapPort {
    fn set_advertising_parameters(
        &mut self,
        handle: AdvHandle,
        params: &AdvertisingParameters,
    ) -> Result<(), BleError>;

    fn set_advertising_payload(
        &mut self,
        handle: AdvHandle,
        payload: &AdvertisingPayload,
    ) -> Result<(), BleError>;

    fn start_advertising(&mut self, handle: AdvHandle) -> Result<(), BleError>;
}

/// Everything the controller needs from the BLE stack.
pub trait BlePort: StackPort + GattServerPort + GapPort {}

impl<T: StackPort + GattServerPort + GapPort> BlePort for T {}

// ───────────────────────────────────────────────────────────────
// Output port (driven adapter: domain → indicator LEDs)
// ───────────────────────────────────────────────────────────────

/// The three LEDs the firmware drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Indicator {
    /// Heartbeat while not connected, steady on while connected.
    Status = 0,
    /// On while advertising.
    Activity = 1,
    /// Mirrors the "LED State" characteristic.
    Actuated = 2,
}

pub trait OutputPort {
    fn set(&mut self, indicator: Indicator, on: bool);

    fn is_on(&self, indicator: Indicator) -> bool;

    fn toggle(&mut self, indicator: Indicator) {
        let on = !self.is_on(indicator);
        self.set(indicator, on);
    }
}

// ───────────────────────────────────────────────────────────────
// Time port (driven adapter: domain ← monotonic clock)
// ───────────────────────────────────────────────────────────────

pub trait TimePort {
    /// Milliseconds since boot (monotonic).
    fn now_ms(&self) -> u64;

    /// Sleep the worker for at most `max_ms`.  May return early.
    fn idle(&self, max_ms: u32);
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Stack event handler (driving port: BLE stack → domain)
// ───────────────────────────────────────────────────────────────

/// Closed set of stack notifications.  Implemented once, by the
/// controller; the stack adapter never calls it directly but posts a
/// [`StackEvent`](crate::events::StackEvent) that the worker routes here.
pub trait StackEventHandler {
    fn on_init_complete(&mut self, status: Result<(), BleError>);
    fn on_service_registered(&mut self, result: Result<[AttrHandle; CHARACTERISTIC_COUNT], BleError>);
    fn on_connection_complete(&mut self);
    fn on_disconnection_complete(&mut self);
    /// `len` is the write's length on the air; `data` may be truncated.
    fn on_data_written(&mut self, handle: AttrHandle, data: &[u8], len: usize);
    fn on_updates_enabled(&mut self, handle: AttrHandle);
    fn on_updates_disabled(&mut self, handle: AttrHandle);
    fn on_confirmation_received(&mut self, handle: AttrHandle);
}
