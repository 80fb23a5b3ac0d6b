//! Automation IO GATT service and its characteristic store.
//!
//! ```text
//! Automation IO service (0x1815)
//! ├── Button State   0x2A56  read + notify   "Button State"
//! ├── Button Colour  0x2A56  read + notify   "Button Colour"
//! └── LED State      0x2A56  write only      "LED State"
//! ```
//!
//! Every characteristic is one byte and carries a User Description
//! descriptor (0x2901).  The store is the worker-side mirror of the values;
//! handles come from the GATT server once, at registration, and stay valid
//! for the life of the service.

use crate::app::events::AppEvent;
use crate::app::ports::{EventSink, GattServerPort, Indicator, OutputPort};
use crate::config::PeripheralConfig;
use crate::error::{Error, Result};

/// Automation IO service.
pub const AUTOMATION_IO_SERVICE_UUID: u16 = 0x1815;
/// Digital characteristic type.
pub const DIGITAL_CHARACTERISTIC_UUID: u16 = 0x2A56;
/// Characteristic User Description descriptor.
pub const USER_DESCRIPTION_UUID: u16 = 0x2901;
/// Client Characteristic Configuration descriptor.
pub const CLIENT_CONFIG_UUID: u16 = 0x2902;

/// Number of characteristics in the service.
pub const CHARACTERISTIC_COUNT: usize = 3;

/// Attribute handle issued by the GATT server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AttrHandle(pub u16);

/// What a peer may do with a characteristic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    /// Readable, pushes notifications on update.
    ReadNotify,
    /// Writable by the peer, never read back.
    WriteOnly,
}

/// The three values the service exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    ButtonState,
    ButtonColour,
    LedState,
}

impl Role {
    /// Registration order, which is also the order of the returned handles.
    pub const ALL: [Role; CHARACTERISTIC_COUNT] = [Role::ButtonState, Role::ButtonColour, Role::LedState];

    pub const fn description(self) -> &'static str {
        match self {
            Self::ButtonState => "Button State",
            Self::ButtonColour => "Button Colour",
            Self::LedState => "LED State",
        }
    }

    pub const fn access(self) -> Access {
        match self {
            Self::ButtonState | Self::ButtonColour => Access::ReadNotify,
            Self::LedState => Access::WriteOnly,
        }
    }

    const fn index(self) -> usize {
        match self {
            Self::ButtonState => 0,
            Self::ButtonColour => 1,
            Self::LedState => 2,
        }
    }
}

// ── Service definition (handed to the GATT server) ────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CharacteristicDefinition {
    pub role: Role,
    pub uuid: u16,
    pub access: Access,
    pub initial: u8,
    pub description: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceDefinition {
    pub uuid: u16,
    pub characteristics: [CharacteristicDefinition; CHARACTERISTIC_COUNT],
}

impl ServiceDefinition {
    /// The Automation IO service seeded with the configured initial values.
    pub fn automation_io(config: &PeripheralConfig) -> Self {
        let initial = |role: Role| match role {
            Role::ButtonState => config.initial_button_state,
            Role::ButtonColour => config.initial_button_colour,
            Role::LedState => config.initial_led_state,
        };
        Self {
            uuid: AUTOMATION_IO_SERVICE_UUID,
            characteristics: Role::ALL.map(|role| CharacteristicDefinition {
                role,
                uuid: DIGITAL_CHARACTERISTIC_UUID,
                access: role.access(),
                initial: initial(role),
                description: role.description(),
            }),
        }
    }
}

// ── Store ─────────────────────────────────────────────────────

/// Worker-side mirror of one characteristic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Characteristic {
    pub handle: AttrHandle,
    pub role: Role,
    pub access: Access,
    value: u8,
    written: bool,
}

impl Characteristic {
    pub fn value(&self) -> u8 {
        self.value
    }

    /// Whether the value has been set since registration.
    pub fn written(&self) -> bool {
        self.written
    }
}

/// Result of [`CharacteristicStore::update_notifiable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueChange {
    Changed,
    Unchanged,
}

/// Result of [`CharacteristicStore::on_external_write`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The actuated LED was switched to the given state.
    Switched(bool),
    /// The LED already was in the requested state.
    Unchanged(bool),
    /// The handle is not writable; nothing happened.
    Ignored,
}

/// The service's characteristic values, keyed by handle.
#[derive(Debug)]
pub struct CharacteristicStore {
    characteristics: [Characteristic; CHARACTERISTIC_COUNT],
}

impl CharacteristicStore {
    /// Mirror `def` with the value handles the GATT server issued for it.
    pub fn new(def: &ServiceDefinition, handles: [AttrHandle; CHARACTERISTIC_COUNT]) -> Self {
        let characteristics = core::array::from_fn(|i| {
            let d = &def.characteristics[i];
            Characteristic {
                handle: handles[i],
                role: d.role,
                access: d.access,
                value: d.initial,
                written: false,
            }
        });
        Self { characteristics }
    }

    pub fn handle(&self, role: Role) -> AttrHandle {
        self.characteristics[role.index()].handle
    }

    pub fn characteristics(&self) -> &[Characteristic] {
        &self.characteristics
    }

    pub fn get(&self, handle: AttrHandle) -> Option<&Characteristic> {
        self.characteristics.iter().find(|c| c.handle == handle)
    }

    pub fn value(&self, handle: AttrHandle) -> Option<u8> {
        self.get(handle).map(Characteristic::value)
    }

    /// Fixed user description for `handle`.
    pub fn describe(&self, handle: AttrHandle) -> Option<&'static str> {
        self.get(handle).map(|c| c.role.description())
    }

    /// Overwrite a read/notify value and push it to the GATT server.
    ///
    /// The push happens even when the value is unchanged; the emitted
    /// [`AppEvent::ValueNotified`] tells the two cases apart.
    pub fn update_notifiable<G, S>(
        &mut self,
        handle: AttrHandle,
        value: u8,
        gatt: &mut G,
        sink: &mut S,
    ) -> Result<ValueChange>
    where
        G: GattServerPort + ?Sized,
        S: EventSink + ?Sized,
    {
        let ch = self
            .characteristics
            .iter_mut()
            .find(|c| c.handle == handle)
            .ok_or(Error::UnknownHandle(handle))?;
        if ch.access != Access::ReadNotify {
            return Err(Error::NotNotifiable(handle));
        }

        // Only a value the server accepted counts as stored.
        gatt.write(handle, &[value])
            .map_err(|source| Error::GattWrite { handle, source })?;
        let changed = ch.value != value;
        ch.value = value;
        ch.written = true;

        sink.emit(&AppEvent::ValueNotified {
            handle,
            role: ch.role,
            value,
            changed,
        });
        Ok(if changed {
            ValueChange::Changed
        } else {
            ValueChange::Unchanged
        })
    }

    /// Apply a peer write.
    ///
    /// Only single-byte writes are accepted.  A write to the LED
    /// characteristic switches the actuated LED (non-zero = on) only if it
    /// differs from the LED's current state.
    pub fn on_external_write<O, S>(
        &mut self,
        handle: AttrHandle,
        bytes: &[u8],
        outputs: &mut O,
        sink: &mut S,
    ) -> Result<WriteOutcome>
    where
        O: OutputPort + ?Sized,
        S: EventSink + ?Sized,
    {
        if bytes.len() != 1 {
            return Err(self.reject_write(handle, bytes.len(), sink));
        }
        let ch = self
            .characteristics
            .iter_mut()
            .find(|c| c.handle == handle)
            .ok_or(Error::UnknownHandle(handle))?;
        if ch.role != Role::LedState {
            return Ok(WriteOutcome::Ignored);
        }

        let on = bytes[0] != 0;
        let changed = outputs.is_on(Indicator::Actuated) != on;
        ch.value = u8::from(on);
        ch.written = true;
        if changed {
            outputs.set(Indicator::Actuated, on);
        }

        sink.emit(&AppEvent::LedWritten { on, changed });
        Ok(if changed {
            WriteOutcome::Switched(on)
        } else {
            WriteOutcome::Unchanged(on)
        })
    }

    /// Report a write of `len` bytes as malformed.  Used directly for
    /// writes that were truncated before they reached the worker.
    pub fn reject_write<S: EventSink + ?Sized>(&self, handle: AttrHandle, len: usize, sink: &mut S) -> Error {
        sink.emit(&AppEvent::MalformedWrite { handle, len });
        Error::MalformedWrite { handle, len }
    }
}
