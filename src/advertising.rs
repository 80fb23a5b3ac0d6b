//! Legacy advertising parameters and payload.
//!
//! The payload is three AD structures, each `[len, type, data..]`:
//!
//! ```text
//! ┌──────────┬───────────────────────────┬──────────────────────┐
//! │ Flags    │ Complete 16-bit UUID list │ Complete local name  │
//! │ 02 01 06 │ 03 03 15 18               │ NN 09 'B' 'u' ...    │
//! └──────────┴───────────────────────────┴──────────────────────┘
//! ```
//!
//! A name that would overflow the 31-byte legacy payload is cut and sent
//! as a Shortened Local Name (type 0x08) instead.

use crate::config::PeripheralConfig;
use crate::gatt::AUTOMATION_IO_SERVICE_UUID;

/// Maximum legacy advertising payload length.
pub const LEGACY_PAYLOAD_MAX: usize = 31;

/// Flags: LE General Discoverable, BR/EDR not supported.
pub const FLAGS_GENERAL_DISCOVERABLE_LE_ONLY: u8 = 0x06;

const AD_FLAGS: u8 = 0x01;
const AD_COMPLETE_UUID16_LIST: u8 = 0x03;
const AD_SHORTENED_LOCAL_NAME: u8 = 0x08;
const AD_COMPLETE_LOCAL_NAME: u8 = 0x09;

/// Advertising set handle.  Only the legacy set is used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdvHandle(pub u8);

impl AdvHandle {
    pub const LEGACY: AdvHandle = AdvHandle(0);
}

/// PDU type for legacy advertising.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvertisingType {
    ConnectableUndirected,
    NonConnectable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdvertisingParameters {
    pub kind: AdvertisingType,
    pub interval_ms: u32,
}

impl AdvertisingParameters {
    pub fn from_config(config: &PeripheralConfig) -> Self {
        Self {
            kind: AdvertisingType::ConnectableUndirected,
            interval_ms: config.advertising_interval_ms,
        }
    }

    /// Interval in controller units of 0.625 ms, clamped to the legal
    /// range 0x0020..=0x4000.
    pub fn interval_units(&self) -> u16 {
        let units = self.interval_ms.saturating_mul(8) / 5;
        units.clamp(0x0020, 0x4000) as u16
    }
}

/// Encoded legacy advertising payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdvertisingPayload {
    bytes: heapless::Vec<u8, LEGACY_PAYLOAD_MAX>,
}

impl AdvertisingPayload {
    pub fn builder() -> AdvertisingPayloadBuilder {
        AdvertisingPayloadBuilder::default()
    }

    /// Flags, the Automation IO service UUID and the configured name.
    pub fn from_config(config: &PeripheralConfig) -> Self {
        Self::builder()
            .flags(FLAGS_GENERAL_DISCOVERABLE_LE_ONLY)
            .service_uuid(AUTOMATION_IO_SERVICE_UUID)
            .name(&config.device_name)
            .build()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

#[derive(Debug, Clone, Default)]
pub struct AdvertisingPayloadBuilder {
    flags: Option<u8>,
    uuids: heapless::Vec<u16, 4>,
    name: heapless::String<LEGACY_PAYLOAD_MAX>,
}

impl AdvertisingPayloadBuilder {
    pub fn flags(mut self, flags: u8) -> Self {
        self.flags = Some(flags);
        self
    }

    /// Add a 16-bit service UUID.  UUIDs beyond the fourth are ignored.
    pub fn service_uuid(mut self, uuid: u16) -> Self {
        let _ = self.uuids.push(uuid);
        self
    }

    pub fn name(mut self, name: &str) -> Self {
        self.name.clear();
        for c in name.chars() {
            if self.name.push(c).is_err() {
                break;
            }
        }
        self
    }

    pub fn build(self) -> AdvertisingPayload {
        let mut bytes: heapless::Vec<u8, LEGACY_PAYLOAD_MAX> = heapless::Vec::new();

        if let Some(flags) = self.flags {
            let _ = bytes.extend_from_slice(&[2, AD_FLAGS, flags]);
        }

        if !self.uuids.is_empty() {
            let len = 1 + 2 * self.uuids.len();
            if bytes.len() + 1 + len <= LEGACY_PAYLOAD_MAX {
                let _ = bytes.extend_from_slice(&[len as u8, AD_COMPLETE_UUID16_LIST]);
                for uuid in &self.uuids {
                    let _ = bytes.extend_from_slice(&uuid.to_le_bytes());
                }
            }
        }

        let name = self.name.as_bytes();
        // Header is two bytes: length and AD type.
        let room = LEGACY_PAYLOAD_MAX.saturating_sub(bytes.len() + 2);
        if !name.is_empty() && room > 0 {
            let (ad_type, take) = if name.len() <= room {
                (AD_COMPLETE_LOCAL_NAME, name.len())
            } else {
                (AD_SHORTENED_LOCAL_NAME, floor_char_boundary(&self.name, room))
            };
            if take > 0 {
                let _ = bytes.extend_from_slice(&[(take + 1) as u8, ad_type]);
                let _ = bytes.extend_from_slice(&name[..take]);
            }
        }

        AdvertisingPayload { bytes }
    }
}

fn floor_char_boundary(s: &str, max: usize) -> usize {
    let mut i = max.min(s.len());
    while i > 0 && !s.is_char_boundary(i) {
        i -= 1;
    }
    i
}
