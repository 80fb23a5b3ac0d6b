//! Unified error types for the ButtonLED firmware.
//!
//! A single `Error` enum that every subsystem converts into, so the worker's
//! handling of stack, advertising and GATT failures stays uniform.  All
//! variants are `Copy` so they can travel through the task queue and the
//! state machine without allocation.

use core::fmt;

use crate::gatt::AttrHandle;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

/// Every fallible operation on the worker funnels into this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The BLE stack failed to come up (or the GATT table could not be built).
    Init(BleError),
    /// One of the advertising configuration calls failed.
    Advertising {
        call: AdvertisingCall,
        source: BleError,
    },
    /// Pushing a value into the GATT server failed.
    GattWrite { handle: AttrHandle, source: BleError },
    /// Inbound write with a length other than one byte.
    MalformedWrite { handle: AttrHandle, len: usize },
    /// Handle does not belong to the service.
    UnknownHandle(AttrHandle),
    /// Handle is not a read/notify characteristic.
    NotNotifiable(AttrHandle),
    /// No free periodic timer slot, or a zero interval was requested.
    Scheduler(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Init(e) => write!(f, "init: {e}"),
            Self::Advertising { call, source } => write!(f, "{call} failed: {source}"),
            Self::GattWrite { handle, source } => {
                write!(f, "GATT write to handle {} failed: {source}", handle.0)
            }
            Self::MalformedWrite { handle, len } => {
                write!(f, "malformed write to handle {} (len={len})", handle.0)
            }
            Self::UnknownHandle(h) => write!(f, "unknown handle {}", h.0),
            Self::NotNotifiable(h) => write!(f, "handle {} is not notifiable", h.0),
            Self::Scheduler(msg) => write!(f, "scheduler: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

/// Crate-wide result alias.
pub type Result<T> = core::result::Result<T, Error>;

// ---------------------------------------------------------------------------
// BLE stack status codes
// ---------------------------------------------------------------------------

/// Status reported by the BLE stack for a failed request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BleError {
    /// Stack not initialised or already torn down.
    NotInitialized,
    /// The stack is busy with a previous request.
    Busy,
    /// A parameter was rejected.
    InvalidParam,
    /// The request is not valid in the current stack state.
    InvalidState,
    /// The stack ran out of memory or attribute slots.
    NoResources,
    /// The stack did not answer in time.
    Timeout,
    /// Vendor-specific status code.
    Stack(i32),
}

impl fmt::Display for BleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotInitialized => write!(f, "stack not initialized"),
            Self::Busy => write!(f, "stack busy"),
            Self::InvalidParam => write!(f, "invalid parameter"),
            Self::InvalidState => write!(f, "invalid state"),
            Self::NoResources => write!(f, "out of resources"),
            Self::Timeout => write!(f, "timed out"),
            Self::Stack(code) => write!(f, "stack error {code}"),
        }
    }
}

impl std::error::Error for BleError {}

impl From<BleError> for Error {
    fn from(e: BleError) -> Self {
        Self::Init(e)
    }
}

// ---------------------------------------------------------------------------
// Advertising calls
// ---------------------------------------------------------------------------

/// Identifies which advertising call failed, for the error log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvertisingCall {
    SetParameters,
    SetPayload,
    Start,
}

impl fmt::Display for AdvertisingCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SetParameters => write!(f, "set_advertising_parameters()"),
            Self::SetPayload => write!(f, "set_advertising_payload()"),
            Self::Start => write!(f, "start_advertising()"),
        }
    }
}

impl AdvertisingCall {
    /// Wrap a stack status into an [`Error::Advertising`] for this call.
    pub fn failed(self, source: BleError) -> Error {
        Error::Advertising { call: self, source }
    }
}
